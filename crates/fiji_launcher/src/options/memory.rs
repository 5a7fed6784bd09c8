//! Heap size parsing and defaults

use crate::error::LaunchError;

/// Bits to shift a megabyte count into bytes
pub const MB_SHIFT: u32 = 20;

/// Parse a heap amount into bytes.
///
/// The number takes C integer syntax (`0x` hex, leading-zero octal,
/// decimal) and an optional `k`, `m`, `g` or `t` suffix in either case.
/// A bare number below 1024 is read as megabytes. Negative or unparsable
/// amounts yield 0, meaning "unset"; amounts beyond 64 bits are an error.
pub fn parse_memory(amount: &str) -> Result<u64, LaunchError> {
    let (value, rest) = parse_c_integer(amount);
    let shift = match rest.bytes().next() {
        Some(b't' | b'T') => 40,
        Some(b'g' | b'G') => 30,
        Some(b'm' | b'M') => 20,
        Some(b'k' | b'K') => 10,
        None if value < 1024 => MB_SHIFT,
        _ => 0,
    };
    if value <= 0 {
        return Ok(0);
    }
    u64::try_from(value)
        .ok()
        .and_then(|value| value.checked_mul(1 << shift))
        .ok_or_else(|| LaunchError::HeapTooLarge(amount.to_string()))
}

/// Parse a leading integer the way `strtoll(s, &end, 0)` does, returning
/// the value and the unparsed remainder. Values saturate just past
/// `u64::MAX` in either direction.
fn parse_c_integer(s: &str) -> (i128, &str) {
    let trimmed = s.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let hex_digits = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
        .filter(|rest| rest.bytes().next().is_some_and(|c| c.is_ascii_hexdigit()));
    let (radix, digits) = match hex_digits {
        Some(rest) => (16, rest),
        None if unsigned.starts_with('0') => (8, unsigned),
        None => (10, unsigned),
    };

    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if end == 0 {
        return (0, s);
    }

    let limit = i128::from(u64::MAX) + 1;
    let mut value: i128 = 0;
    for c in digits[..end].chars() {
        let digit = c.to_digit(radix).map(i128::from).unwrap_or(0);
        value = (value * i128::from(radix) + digit).min(limit);
    }
    if negative {
        value = -value;
    }
    (value, &digits[end..])
}

/// Default heap: three quarters of the available memory, in bytes
pub fn default_heap(available: u64) -> u64 {
    available - (available >> 2)
}

/// Cap a heap for a 32-bit address space
pub fn clamp_to_address_space(heap: u64, address_bits: u32, cap_mb: u64) -> u64 {
    if address_bits == 32 && (heap >> MB_SHIFT) > cap_mb {
        cap_mb << MB_SHIFT
    } else {
        heap
    }
}

/// Engine option selecting a maximum heap of `heap` bytes
pub fn heap_option(heap: u64) -> String {
    format!("-Xmx{}m", heap >> MB_SHIFT)
}
