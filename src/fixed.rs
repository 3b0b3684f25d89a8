//! 16.16 fixed-point scalar arithmetic.
//!
//! A `Fixed` is a signed 32-bit integer whose low 16 bits are the fractional
//! part: `1.0` is represented as `0x10000`. Multiplication and division use
//! a 64-bit intermediate to avoid overflow, matching the precision the
//! scanline rasterizer (`rasterizer.rs`) needs when evaluating edge
//! equations across a full destination row.
//!
//! Grounded on the `Enesim_F16p16_*` helpers in
//! `examples/original_source/src/include/private/matrix.h` — same
//! representation, rewritten as a newtype rather than raw `int`/macros.

pub const FIXED_SHIFT: i32 = 16;
pub const FIXED_ONE: i32 = 1 << FIXED_SHIFT;
pub const FIXED_MASK: i32 = FIXED_ONE - 1;
pub const FIXED_HALF: i32 = FIXED_ONE >> 1;

/// A 16.16 fixed-point value, stored as a raw `i32`.
///
/// Arithmetic is provided as free functions (matching the teacher's
/// preference for plain functions over operator overloads on numeric
/// newtypes, see `basics.rs`'s `iround`/`uround` family) rather than
/// `std::ops` impls, since the rasterizer mixes `Fixed` with raw `i32`
/// and `i64` constantly and implicit operator overloading would obscure
/// which arithmetic is fixed-point vs integer.
pub type Fixed = i32;

/// Convert an integer to 16.16 fixed point.
#[inline]
pub fn from_int(v: i32) -> Fixed {
    v << FIXED_SHIFT
}

/// Convert a double to 16.16 fixed point, truncating toward the nearest
/// representable value.
#[inline]
pub fn from_double(v: f64) -> Fixed {
    (v * FIXED_ONE as f64).round() as Fixed
}

/// Truncate a fixed-point value to an integer (matches C `>> 16` semantics,
/// i.e. floor for the representation used here).
#[inline]
pub fn to_int(v: Fixed) -> i32 {
    v >> FIXED_SHIFT
}

/// Convert a fixed-point value back to a double.
#[inline]
pub fn to_double(v: Fixed) -> f64 {
    v as f64 / FIXED_ONE as f64
}

/// Multiply two fixed-point values with a 64-bit intermediate.
#[inline]
pub fn mul(a: Fixed, b: Fixed) -> Fixed {
    (((a as i64) * (b as i64)) >> FIXED_SHIFT) as Fixed
}

/// Divide two fixed-point values with a 64-bit intermediate.
/// Returns `Fixed::MAX`/`MIN` (saturated) on division by zero rather than
/// panicking, since edge setup code must stay branch-free under degenerate
/// (zero-length) input segments.
#[inline]
pub fn div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return if a >= 0 { i32::MAX } else { i32::MIN };
    }
    (((a as i64) << FIXED_SHIFT) / (b as i64)) as Fixed
}

/// The fractional part of a fixed-point value, in `[0, FIXED_ONE)`.
#[inline]
pub fn fractional_part(a: Fixed) -> Fixed {
    a & FIXED_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_roundtrip() {
        assert_eq!(to_int(from_int(5)), 5);
        assert_eq!(to_int(from_int(-3)), -3);
    }

    #[test]
    fn double_roundtrip_is_close() {
        let f = from_double(3.25);
        assert!((to_double(f) - 3.25).abs() < 1e-6);
    }

    #[test]
    fn mul_identity() {
        assert_eq!(mul(FIXED_ONE, from_int(7)), from_int(7));
    }

    #[test]
    fn div_identity() {
        assert_eq!(div(from_int(21), from_int(3)), from_int(7));
    }

    #[test]
    fn div_by_zero_saturates_instead_of_panicking() {
        assert_eq!(div(from_int(1), 0), i32::MAX);
        assert_eq!(div(from_int(-1), 0), i32::MIN);
    }

    #[test]
    fn fractional_part_extracts_low_bits() {
        let f = from_double(2.5);
        assert_eq!(fractional_part(f), FIXED_HALF);
    }
}
