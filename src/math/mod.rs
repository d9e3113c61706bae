//! Numeric helpers and special functions.

pub mod gamma;

use num::Float;


/// Maximum of `a` and `b`, propagating `NaN` from either operand.
///
/// Unlike `Float::max`, which silently drops a `NaN` operand.
#[inline]
pub fn max_nan<T: Float>(a: T, b: T) -> T {
    if a.is_nan() || b.is_nan() {
        T::nan()
    } else {
        a.max(b)
    }
}

/// Minimum of `a` and `b`, propagating `NaN` from either operand.
#[inline]
pub fn min_nan<T: Float>(a: T, b: T) -> T {
    if a.is_nan() || b.is_nan() {
        T::nan()
    } else {
        a.min(b)
    }
}


/// Lossy primitive conversion without the `Option` of `num::ToPrimitive`.
///
/// Implemented for the float types the estimators are instantiated with,
/// plus `usize` for bin and frame counts.
pub trait ToPrimitiveUnchecked {
    fn to_usize_unchecked(&self) -> usize;
    fn to_f32_unchecked(&self) -> f32;
    fn to_f64_unchecked(&self) -> f64;
}

pub trait NumCastUnchecked: Sized + ToPrimitiveUnchecked {
    fn from_unchecked<T: ToPrimitiveUnchecked>(n: T) -> Self;
}

impl ToPrimitiveUnchecked for f32 {
    fn to_usize_unchecked(&self) -> usize { *self as _ }
    fn to_f32_unchecked(&self) -> f32 { *self as _ }
    fn to_f64_unchecked(&self) -> f64 { *self as _ }
}

impl NumCastUnchecked for f32 {
    fn from_unchecked<T: ToPrimitiveUnchecked>(n: T) -> Self {
        n.to_f32_unchecked()
    }
}

impl ToPrimitiveUnchecked for f64 {
    fn to_usize_unchecked(&self) -> usize { *self as _ }
    fn to_f32_unchecked(&self) -> f32 { *self as _ }
    fn to_f64_unchecked(&self) -> f64 { *self as _ }
}

impl NumCastUnchecked for f64 {
    fn from_unchecked<T: ToPrimitiveUnchecked>(n: T) -> Self {
        n.to_f64_unchecked()
    }
}

impl ToPrimitiveUnchecked for usize {
    fn to_usize_unchecked(&self) -> usize { *self }
    fn to_f32_unchecked(&self) -> f32 { *self as _ }
    fn to_f64_unchecked(&self) -> f64 { *self as _ }
}
