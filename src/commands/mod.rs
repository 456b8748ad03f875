//! CLI command implementations
//!
//! Each command receives a [`Device`](crate::device::Device) with the image
//! already loaded, so the same implementation serves both access paths.

pub mod blocks;
pub mod checksum;
pub mod dump;
pub mod info;
pub mod words;

/// Format words as `offset: w w w ...` lines, eight per line
pub fn format_words(offset: u16, words: &[u16]) -> Vec<String> {
    words
        .chunks(8)
        .enumerate()
        .map(|(line, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|w| format!("{:04x}", w)).collect();
            format!("{:#06x}: {}", usize::from(offset) + line * 8, hex.join(" "))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_words() {
        let words: Vec<u16> = (0..10).collect();
        let lines = format_words(0x10, &words);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0x0010: 0000 0001 0002 0003 0004 0005 0006 0007");
        assert_eq!(lines[1], "0x0018: 0008 0009");
    }
}
