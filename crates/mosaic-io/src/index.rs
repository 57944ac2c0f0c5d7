//! Source Index Reader (C1): `spec.md` §4.1.
//!
//! Produces the ordered list of segment descriptor strings for an exposure
//! from an index stream: UTF-8 text, one descriptor per non-comment,
//! non-blank line. Stateless and idempotent; order is preserved since it is
//! semantically significant for Global-histogram aggregation
//! reproducibility (`spec.md` §5).

use std::io::BufRead;

use mosaic_core::Result;

/// Reads an index stream into its ordered list of descriptor strings,
/// skipping blank lines and `#`-prefixed comments.
pub fn read_index<R: BufRead>(stream: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in stream.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push(trimmed.to_string());
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn skips_blank_and_comment_lines() {
        let input = "# a comment\n\n/data/a.fits\n  \nDAQ:p:f/i:r/b\n# trailing\n";
        let lines = read_index(Cursor::new(input)).unwrap();
        assert_eq!(lines, vec!["/data/a.fits".to_string(), "DAQ:p:f/i:r/b".to_string()]);
    }

    #[test]
    fn preserves_order() {
        let input = "/c.fits\n/a.fits\n/b.fits\n";
        let lines = read_index(Cursor::new(input)).unwrap();
        assert_eq!(lines, vec!["/c.fits", "/a.fits", "/b.fits"]);
    }

    #[test]
    fn empty_stream_yields_empty_list() {
        let lines = read_index(Cursor::new("")).unwrap();
        assert!(lines.is_empty());
    }
}
