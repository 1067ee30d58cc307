//! Bit-width arithmetic for big-endian packed values.
//!
//! P4 runtime values are packed big-endian into the minimum number of
//! bytes able to hold their bit-width. When the bit-width is not a
//! multiple of 8, the most significant byte (byte 0) is only partially
//! occupied and its unused high bits must be zero on the wire.

use crate::ParseError;

/// Returns the number of bytes needed to hold a value of `bitwidth` bits.
pub const fn bytes_for_bitwidth(bitwidth: usize) -> usize {
    bitwidth.div_ceil(8)
}

/// Returns the mask for the most significant occupied byte of a value of
/// `bitwidth` bits.
///
/// The mask is `0xff` when `bitwidth` is a multiple of 8, otherwise it
/// keeps the low `bitwidth % 8` bits.
///
/// # Examples
///
/// ```
/// use pi_types::byte0_mask;
///
/// assert_eq!(byte0_mask(11), 0x07);
/// assert_eq!(byte0_mask(16), 0xff);
/// assert_eq!(byte0_mask(128), 0xff);
/// ```
pub const fn byte0_mask(bitwidth: usize) -> u8 {
    match bitwidth % 8 {
        0 => 0xff,
        rem => ((1u16 << rem) - 1) as u8,
    }
}

/// Clears the bits above `bitwidth` in a big-endian packed value.
///
/// # Errors
///
/// Returns an error if `value` is not exactly
/// [`bytes_for_bitwidth(bitwidth)`](bytes_for_bitwidth) bytes long.
pub fn mask_be_value(value: &mut [u8], bitwidth: usize) -> Result<(), ParseError> {
    let expected = bytes_for_bitwidth(bitwidth);
    if value.len() != expected {
        return Err(ParseError::ValueWidth {
            bitwidth,
            expected,
            actual: value.len(),
        });
    }
    if let Some(byte0) = value.first_mut() {
        *byte0 &= byte0_mask(bitwidth);
    }
    Ok(())
}
