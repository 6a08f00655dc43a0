//! Conversions between `(line, column)` positions and byte offsets into the
//! text joined with `\n`.

/// Byte length of the lines joined with `\n`
pub fn joined_len(lines: &[String]) -> usize {
    let bytes: usize = lines.iter().map(String::len).sum();
    bytes + lines.len().saturating_sub(1)
}

pub fn join(lines: &[String]) -> Vec<u8> {
    lines.join("\n").into_bytes()
}

/// Offset of the first byte of `line`; past-the-end lines map to the end
pub fn line_start(lines: &[String], line: usize) -> usize {
    if line >= lines.len() {
        return joined_len(lines);
    }
    lines[..line].iter().map(|l| l.len() + 1).sum()
}

/// Line containing `offset` and the byte position within it.
///
/// An offset on a line terminator belongs to the line it terminates.
/// Offsets past the end clamp to the end of the last line.
pub fn locate(lines: &[String], offset: usize) -> (usize, usize) {
    let mut start = 0;
    for (index, line) in lines.iter().enumerate() {
        let end = start + line.len();
        if offset <= end {
            return (index, offset - start);
        }
        start = end + 1;
    }

    let last = lines.len().saturating_sub(1);
    (last, lines.get(last).map_or(0, String::len))
}

/// Whether `offset` falls between characters. Line terminators are
/// boundaries on both sides and offsets past the end clamp.
pub fn is_char_boundary(lines: &[String], offset: usize) -> bool {
    let (line, byte) = locate(lines, offset);
    lines.get(line).map_or(true, |text| text.is_char_boundary(byte))
}

/// Byte index of character column `col`, clamped to the line length
pub fn char_to_byte(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

/// Character column of byte index `byte`
pub fn byte_to_char(line: &str, byte: usize) -> usize {
    line.char_indices().take_while(|&(i, _)| i < byte).count()
}

pub fn char_len(line: &str) -> usize {
    line.chars().count()
}
