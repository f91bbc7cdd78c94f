use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Seconds per minute, used to report per-minute rates.
pub const SECONDS_PER_MINUTE: i32 = 60;

/// Convert an f64 to Fixed64. Use only for initialization and data loading.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Checked division for Fixed64 that returns None on zero divisor.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

/// Convert a per-second rate into a per-minute rate, saturating on overflow.
#[inline]
pub fn per_minute(per_second: Fixed64) -> Fixed64 {
    per_second.saturating_mul_int(SECONDS_PER_MINUTE.into())
}
