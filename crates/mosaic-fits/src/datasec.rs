//! `DATASEC`-style `[x1:x2,y1:y2]` rectangle parsing.

use mosaic_core::{Error, Rect};

/// Parses a FITS section string `[x1:x2,y1:y2]` (1-based inclusive) into a
/// zero-based half-open [`Rect`].
///
/// The round-trip invariant from `spec.md` §8: for every input with
/// `1 <= x1 <= x2` and `1 <= y1 <= y2`, the result is
/// `(x1-1, y1-1, x2-x1+1, y2-y1+1)`.
pub fn parse_datasec(raw: &str) -> Result<Rect, Error> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let (xs, ys) = trimmed
        .split_once(',')
        .ok_or_else(|| Error::MalformedDatasec(raw.to_string()))?;

    let (x1, x2) = parse_range(xs).ok_or_else(|| Error::MalformedDatasec(raw.to_string()))?;
    let (y1, y2) = parse_range(ys).ok_or_else(|| Error::MalformedDatasec(raw.to_string()))?;

    if x1 < 1 || x1 > x2 || y1 < 1 || y1 > y2 {
        return Err(Error::MalformedDatasec(raw.to_string()));
    }

    Ok(Rect::new(
        (x1 - 1) as u32,
        (y1 - 1) as u32,
        (x2 - x1 + 1) as u32,
        (y2 - y1 + 1) as u32,
    ))
}

fn parse_range(s: &str) -> Option<(i64, i64)> {
    let (a, b) = s.split_once(':')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bracketed_datasec() {
        let r = parse_datasec("[11:2048,1:2000]").unwrap();
        assert_eq!(r, Rect::new(10, 0, 2038, 2000));
    }

    #[test]
    fn parses_unbracketed_datasec() {
        let r = parse_datasec("1:10,1:10").unwrap();
        assert_eq!(r, Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(parse_datasec("[10:5,1:10]").is_err());
    }

    #[test]
    fn rejects_malformed_string() {
        assert!(parse_datasec("not a datasec").is_err());
    }
}
