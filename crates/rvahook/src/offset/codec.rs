//! Offset text parsing and formatting.
//!
//! Offsets are accepted as `0x`-prefixed hexadecimal (prefix case-insensitive)
//! or plain decimal, and are always written back as lowercase `0x` hex.
//! Parsing is a filter: anything that is not a clean numeral yields `None`.

/// Parse an offset from user or stored text.
///
/// # Examples
///
/// ```
/// use rvahook::offset::parse_offset;
///
/// assert_eq!(parse_offset("0x1000"), Some(0x1000));
/// assert_eq!(parse_offset(" 0X1a "), Some(0x1a));
/// assert_eq!(parse_offset("4096"), Some(4096));
/// assert_eq!(parse_offset("0xZZ"), None);
/// ```
pub fn parse_offset(text: &str) -> Option<u64> {
    let value = text.trim();
    if value.is_empty() {
        return None;
    }

    match strip_hex_prefix(value) {
        Some(digits) => parse_digits(digits, 16),
        None => parse_digits(value, 10),
    }
}

/// Format an offset in canonical form (`0x` + lowercase hex).
///
/// # Examples
///
/// ```
/// use rvahook::offset::format_offset;
///
/// assert_eq!(format_offset(0x1D236E8), "0x1d236e8");
/// assert_eq!(format_offset(0), "0x0");
/// ```
pub fn format_offset(offset: u64) -> String {
    format!("{:#x}", offset)
}

/// Parse every input, dropping the ones that are not valid offsets.
///
/// Order is preserved and duplicates are kept.
pub fn normalize_offsets<I, S>(inputs: I) -> Vec<u64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    inputs
        .into_iter()
        .filter_map(|s| parse_offset(s.as_ref()))
        .collect()
}

/// Format a list of offsets for display or storage.
pub fn format_offsets(offsets: &[u64]) -> Vec<String> {
    offsets.iter().map(|&o| format_offset(o)).collect()
}

pub(crate) fn strip_hex_prefix(value: &str) -> Option<&str> {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X') {
        Some(&value[2..])
    } else {
        None
    }
}

// from_str_radix tolerates a leading '+', which is not a numeral here
fn parse_digits(digits: &str, radix: u32) -> Option<u64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}
