//! # Vec3d
//!
//! Double-precision 3-vector used for vertex positions and geometric queries.
//! Wraps [`glam::DVec3`] and adds the mesh library vocabulary on top of it:
//! `norm`, `sqrnorm`, `l1_norm`, `l8_norm` and `%` as the cross product.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, Mul, MulAssign, Neg, Rem, Sub, SubAssign};

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A 3-component `f64` vector. Serializes as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vec3d(DVec3);

impl Vec3d {
    /// All zeros
    pub const ZERO: Self = Self(DVec3::ZERO);
    /// All ones
    pub const ONE: Self = Self(DVec3::ONE);

    /// Create a vector from its components
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self(DVec3::new(x, y, z))
    }

    /// Create a vector with all components set to `v`
    #[inline]
    pub const fn splat(v: f64) -> Self {
        Self(DVec3::splat(v))
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.0.z
    }

    /// Underlying glam vector
    #[inline]
    pub fn as_dvec3(&self) -> DVec3 {
        self.0
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 3] {
        self.0.to_array()
    }

    /// Right-handed cross product.
    ///
    /// `(a.y*b.z - a.z*b.y, a.z*b.x - a.x*b.z, a.x*b.y - a.y*b.x)`
    #[inline]
    pub fn cross(&self, rhs: Vec3d) -> Vec3d {
        Self(self.0.cross(rhs.0))
    }

    /// Dot product
    #[inline]
    pub fn dot(&self, rhs: Vec3d) -> f64 {
        self.0.dot(rhs.0)
    }

    /// Euclidean (L2) length
    #[inline]
    pub fn norm(&self) -> f64 {
        self.0.length()
    }

    /// Alias of [`norm`](Self::norm)
    #[inline]
    pub fn length(&self) -> f64 {
        self.norm()
    }

    /// Squared Euclidean length
    #[inline]
    pub fn sqrnorm(&self) -> f64 {
        self.0.length_squared()
    }

    /// Sum of absolute components
    #[inline]
    pub fn l1_norm(&self) -> f64 {
        self.0.abs().element_sum()
    }

    /// Infinity norm: `max(|x|, |y|, |z|)`
    #[inline]
    pub fn l8_norm(&self) -> f64 {
        self.max_abs()
    }

    /// Largest absolute component
    #[inline]
    pub fn max_abs(&self) -> f64 {
        self.0.abs().max_element()
    }

    /// Smallest absolute component
    #[inline]
    pub fn min_abs(&self) -> f64 {
        self.0.abs().min_element()
    }

    /// Largest component
    #[inline]
    pub fn max_component(&self) -> f64 {
        self.0.max_element()
    }

    /// Smallest component
    #[inline]
    pub fn min_component(&self) -> f64 {
        self.0.min_element()
    }

    /// Arithmetic mean of the components
    #[inline]
    pub fn mean(&self) -> f64 {
        self.0.element_sum() / 3.0
    }

    /// Componentwise minimum
    #[inline]
    pub fn min(&self, rhs: Vec3d) -> Vec3d {
        Self(self.0.min(rhs.0))
    }

    /// Componentwise maximum
    #[inline]
    pub fn max(&self, rhs: Vec3d) -> Vec3d {
        Self(self.0.max(rhs.0))
    }

    /// Unit vector in the same direction. Zero vectors yield NaN components.
    #[inline]
    pub fn normalized(&self) -> Vec3d {
        *self / self.norm()
    }

    /// Unit vector in the same direction, or zero if the length is zero
    #[inline]
    pub fn normalized_or_zero(&self) -> Vec3d {
        Self(self.0.normalize_or_zero())
    }

    /// True if every component is finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

/// Cross product as a free function, same as [`Vec3d::cross`]
#[inline]
pub fn cross(a: Vec3d, b: Vec3d) -> Vec3d {
    a.cross(b)
}

/// Dot product as a free function, same as [`Vec3d::dot`]
#[inline]
pub fn dot(a: Vec3d, b: Vec3d) -> f64 {
    a.dot(b)
}

/// `a % b` is the cross product
impl Rem for Vec3d {
    type Output = Vec3d;

    #[inline]
    fn rem(self, rhs: Vec3d) -> Vec3d {
        self.cross(rhs)
    }
}

impl Add for Vec3d {
    type Output = Vec3d;

    #[inline]
    fn add(self, rhs: Vec3d) -> Vec3d {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Vec3d {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3d) {
        self.0 += rhs.0;
    }
}

impl Sub for Vec3d {
    type Output = Vec3d;

    #[inline]
    fn sub(self, rhs: Vec3d) -> Vec3d {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Vec3d {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3d) {
        self.0 -= rhs.0;
    }
}

impl Neg for Vec3d {
    type Output = Vec3d;

    #[inline]
    fn neg(self) -> Vec3d {
        Self(-self.0)
    }
}

impl Mul<f64> for Vec3d {
    type Output = Vec3d;

    #[inline]
    fn mul(self, rhs: f64) -> Vec3d {
        Self(self.0 * rhs)
    }
}

impl Mul<Vec3d> for f64 {
    type Output = Vec3d;

    #[inline]
    fn mul(self, rhs: Vec3d) -> Vec3d {
        Vec3d(self * rhs.0)
    }
}

impl MulAssign<f64> for Vec3d {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        self.0 *= rhs;
    }
}

impl Div<f64> for Vec3d {
    type Output = Vec3d;

    #[inline]
    fn div(self, rhs: f64) -> Vec3d {
        Self(self.0 / rhs)
    }
}

impl Index<usize> for Vec3d {
    type Output = f64;

    #[inline]
    fn index(&self, idx: usize) -> &f64 {
        &self.0[idx]
    }
}

impl From<DVec3> for Vec3d {
    #[inline]
    fn from(v: DVec3) -> Self {
        Self(v)
    }
}

impl From<Vec3d> for DVec3 {
    #[inline]
    fn from(v: Vec3d) -> Self {
        v.0
    }
}

impl From<[f64; 3]> for Vec3d {
    #[inline]
    fn from(a: [f64; 3]) -> Self {
        Self(DVec3::from_array(a))
    }
}

impl From<(f64, f64, f64)> for Vec3d {
    #[inline]
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for Vec3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_area_from_cross() {
        //  vec1
        //   x
        //   |
        //   x------>x vec2
        let vec1 = Vec3d::new(0.0, 1.0, 0.0);
        let vec2 = Vec3d::new(1.0, 0.0, 0.0);

        let area = 0.5 * cross(vec1, vec2).norm();
        assert_eq!(area, 0.5);

        let area = 0.5 * (vec1 % vec2).norm();
        assert_eq!(area, 0.5);
    }

    #[test]
    fn test_cross_components() {
        let a = Vec3d::new(1.0, 2.0, 3.0);
        let b = Vec3d::new(-4.0, 0.5, 2.0);
        let c = a.cross(b);
        assert_eq!(c, Vec3d::new(2.0 * 2.0 - 3.0 * 0.5, 3.0 * -4.0 - 1.0 * 2.0, 1.0 * 0.5 - 2.0 * -4.0));
        assert_eq!(a % b, cross(a, b));
        assert_eq!(b % a, -c);
    }

    #[test]
    fn test_right_handed() {
        let x = Vec3d::new(1.0, 0.0, 0.0);
        let y = Vec3d::new(0.0, 1.0, 0.0);
        assert_eq!(x % y, Vec3d::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_norms() {
        let v = Vec3d::new(0.5, 0.5, -0.5);
        assert_eq!(v.l8_norm(), 0.5);
        assert_eq!(v.l1_norm(), 1.5);
        assert_eq!(v.sqrnorm(), 0.75);

        let v = Vec3d::new(3.0, -4.0, 0.0);
        assert_eq!(v.norm(), 5.0);
        assert_eq!(v.l8_norm(), 4.0);
        assert_eq!(v.min_abs(), 0.0);
        assert_eq!(v.min_component(), -4.0);
        assert!((v.normalized().norm() - 1.0).abs() < 1e-12);
        assert_eq!(Vec3d::ZERO.normalized_or_zero(), Vec3d::ZERO);
    }

    #[test]
    fn test_arithmetic() {
        let a = Vec3d::new(1.0, 2.0, 3.0);
        let b = Vec3d::splat(1.0);
        assert_eq!(a + b, Vec3d::new(2.0, 3.0, 4.0));
        assert_eq!(a - b, Vec3d::new(0.0, 1.0, 2.0));
        assert_eq!(a * 2.0, 2.0 * a);
        assert_eq!(a / 2.0, Vec3d::new(0.5, 1.0, 1.5));
        assert_eq!(a.dot(b), 6.0);
        assert_eq!(a[2], 3.0);
        assert_eq!(a.mean(), 2.0);
        assert_eq!(Vec3d::from([1.0, 2.0, 3.0]), a);
    }

    #[test]
    fn test_non_finite_propagates() {
        let v = Vec3d::new(f64::NAN, 0.0, 1.0);
        assert!(!v.is_finite());
        assert!(v.norm().is_nan());
    }

    #[test]
    fn test_serde_as_array() {
        #[derive(Serialize, Deserialize)]
        struct Anchor {
            position: Vec3d,
        }

        let text = toml::to_string(&Anchor {
            position: Vec3d::new(1.0, 2.5, -3.0),
        })
        .expect("serialize");
        assert!(text.contains('['), "{}", text);

        let back: Anchor = toml::from_str(&text).expect("deserialize");
        assert_eq!(back.position, Vec3d::new(1.0, 2.5, -3.0));
    }
}
