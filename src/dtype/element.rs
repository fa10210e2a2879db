//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

/// Trait for types that can be elements of a graphr container
///
/// Connects Rust's type system to the runtime dtype system and provides
/// the conversions used by mixed-type point access (`set_int` on a float
/// container and friends). The arithmetic supertraits cover exactly what
/// the predefined operators need.
pub trait Element:
    Copy
    + Clone
    + Send
    + Sync
    + Pod
    + Zeroable
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Debug
    + 'static
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64
    fn from_f64(v: f64) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;

    /// Raw 32-bit pattern of the value (used to seed typed device cells)
    fn to_bits_u32(self) -> u32;
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as i32
    }

    #[inline]
    fn zero() -> Self {
        0
    }

    #[inline]
    fn one() -> Self {
        1
    }

    #[inline]
    fn to_bits_u32(self) -> u32 {
        self as u32
    }
}

impl Element for u32 {
    const DTYPE: DType = DType::U32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as u32
    }

    #[inline]
    fn zero() -> Self {
        0
    }

    #[inline]
    fn one() -> Self {
        1
    }

    #[inline]
    fn to_bits_u32(self) -> u32 {
        self
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn to_bits_u32(self) -> u32 {
        self.to_bits()
    }
}

/// Zero-sized element of `DType::Void` containers
///
/// Void containers store structure only; every value is this unit. The
/// arithmetic impls are trivial so that `Void` can flow through generic
/// kernels that never look at values.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
#[repr(C)]
pub struct Void;

// SAFETY: Void is a zero-sized type; any (empty) bit pattern is valid.
unsafe impl Zeroable for Void {}
// SAFETY: zero-sized, no padding, no interior mutability.
unsafe impl Pod for Void {}

impl Add for Void {
    type Output = Void;
    fn add(self, _: Void) -> Void {
        Void
    }
}

impl Sub for Void {
    type Output = Void;
    fn sub(self, _: Void) -> Void {
        Void
    }
}

impl Mul for Void {
    type Output = Void;
    fn mul(self, _: Void) -> Void {
        Void
    }
}

impl Element for Void {
    const DTYPE: DType = DType::Void;

    #[inline]
    fn to_f64(self) -> f64 {
        0.0
    }

    #[inline]
    fn from_f64(_: f64) -> Self {
        Void
    }

    #[inline]
    fn zero() -> Self {
        Void
    }

    #[inline]
    fn one() -> Self {
        Void
    }

    #[inline]
    fn to_bits_u32(self) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_dtype() {
        assert_eq!(i32::DTYPE, DType::I32);
        assert_eq!(u32::DTYPE, DType::U32);
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(Void::DTYPE, DType::Void);
    }

    #[test]
    fn test_element_conversions() {
        assert_eq!(i32::from_f64(42.9), 42);
        assert_eq!(u32::from_f64(7.0), 7);
        assert_eq!(f32::from_f64(0.5).to_f64(), 0.5);
        assert_eq!(Void::from_f64(3.0), Void);
    }

    #[test]
    fn test_element_bits() {
        assert_eq!(1.0f32.to_bits_u32(), 0x3f80_0000);
        assert_eq!((-1i32).to_bits_u32(), u32::MAX);
        assert_eq!(5u32.to_bits_u32(), 5);
    }

    #[test]
    fn test_void_is_zero_sized() {
        assert_eq!(std::mem::size_of::<Void>(), 0);
    }
}
