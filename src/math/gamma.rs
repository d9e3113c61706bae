use super::NumCastUnchecked;

use num::Float;


/// Arguments above this leave `Γ(a, x)` below `e^-x`, far under anything
/// that can still move `exp(Γ(a, x))` away from one.
const TAIL_X_MAX: f64 = 500.0;


/// Gamma function `Γ(x)`.
pub fn gamma<T: Float + NumCastUnchecked>(x: T) -> T {
    T::from_unchecked(rgsl::gamma_beta::gamma::gamma(x.to_f64_unchecked()))
}

/// Regularized upper incomplete gamma function `Q(a, x) = Γ(a, x) / Γ(a)`.
///
/// Requires `a > 0` and `x >= 0`.
#[allow(non_snake_case)]
pub fn gamma_inc_Q<T: Float + NumCastUnchecked>(a: T, x: T) -> T {
    T::from_unchecked(rgsl::gamma_beta::incomplete_gamma::gamma_inc_Q(
        a.to_f64_unchecked(),
        x.to_f64_unchecked(),
    ))
}

/// Non-normalized upper incomplete gamma `Γ(a, x) = Γ(a) Q(a, x)`, with the
/// prefactor `gamma_a = Γ(a)` supplied by the caller.
///
/// Invalid arguments (`NaN`, negative `x`) yield `NaN` instead of reaching
/// GSL, whose default error handler aborts the process.
pub fn gamma_tail<T: Float + NumCastUnchecked>(a: T, gamma_a: T, x: T) -> T {
    if x.is_nan() || x < T::zero() {
        T::nan()
    } else if x.to_f64_unchecked() >= TAIL_X_MAX {
        T::zero()
    } else {
        gamma_a * gamma_inc_Q(a, x)
    }
}
