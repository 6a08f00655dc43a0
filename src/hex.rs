//! Byte formatting and parsing helpers shared by the buffer, the search
//! engine and the hex grid renderer.

/// Parse a hex string such as `"FF 00 a5"` into bytes.
///
/// Whitespace anywhere is ignored. Returns `None` for non-hex digits or an
/// odd number of digits.
pub fn parse_hex_string(hex: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = hex.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return None;
    }

    digits
        .chunks_exact(2)
        .map(|pair| Some(nibble(pair[0])? << 4 | nibble(pair[1])?))
        .collect()
}

fn nibble(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|d| d as u8)
}

/// Upper-case, zero-padded offset column
pub fn format_offset(offset: usize, width: usize) -> String {
    format!("{:0width$X}", offset, width = width)
}

/// Clamped slice: returns at most `len` bytes starting at `start`.
pub fn byte_range(data: &[u8], start: usize, len: usize) -> &[u8] {
    let start = start.min(data.len());
    let end = start.saturating_add(len).min(data.len());
    &data[start..end]
}

/// Map a byte to its ASCII-column glyph; non-printables become `.`
#[inline]
pub fn ascii_glyph(byte: u8) -> u8 {
    if (32..=126).contains(&byte) {
        byte
    } else {
        b'.'
    }
}

/// ASCII projection used by the text, regex and wildcard disciplines.
///
/// Every byte maps to exactly one output byte, so offsets are shared with
/// the raw content. A literal `.` and an unprintable byte project to the
/// same glyph and are indistinguishable to the matcher.
pub fn ascii_projection(data: &[u8]) -> Vec<u8> {
    data.iter().map(|&b| ascii_glyph(b)).collect()
}

pub fn ascii_string(data: &[u8]) -> String {
    data.iter().map(|&b| ascii_glyph(b) as char).collect()
}
