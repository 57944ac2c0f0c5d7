//! FITS header-card parsing.
//!
//! A FITS header is a sequence of 2880-byte blocks, each holding 36 fixed-
//! width 80-character cards. A card is `KEYWORD = value / comment` (or a
//! commentary/blank/`END` card). This module turns the raw bytes of one
//! header into a lookup table of keyword to parsed value, and reports where
//! the header ends so the caller can locate the following data block.

use std::collections::HashMap;

use mosaic_core::{Error, Result};

/// Size in bytes of one FITS header or data block.
pub const BLOCK_SIZE: usize = 2880;
/// Width in bytes of one header card.
const CARD_SIZE: usize = 80;

/// A parsed FITS header: keyword to raw value-string lookup, plus the byte
/// length of the header (including the padding block(s) after `END`).
#[derive(Debug, Clone, Default)]
pub struct Header {
    values: HashMap<String, String>,
    /// Total header length in bytes, block-aligned, including `END`'s block.
    pub byte_length: usize,
}

impl Header {
    /// Parses a header starting at `bytes[0]`. `bytes` must contain at
    /// least one full block; more header blocks are consumed until an
    /// `END` card is found.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut values = HashMap::new();
        let mut offset = 0usize;
        loop {
            if offset + BLOCK_SIZE > bytes.len() {
                return Err(Error::Internal("truncated FITS header".into()));
            }
            let block = &bytes[offset..offset + BLOCK_SIZE];
            offset += BLOCK_SIZE;

            let mut found_end = false;
            for card in block.chunks(CARD_SIZE) {
                let card = String::from_utf8_lossy(card);
                let keyword = card[..8.min(card.len())].trim().to_string();
                if keyword == "END" {
                    found_end = true;
                    break;
                }
                if keyword.is_empty() || keyword == "COMMENT" || keyword == "HISTORY" {
                    continue;
                }
                if let Some(eq) = card.get(8..10) {
                    if eq.trim_start().starts_with('=') {
                        let rest = &card[10..];
                        let value = extract_value(rest);
                        values.insert(keyword, value);
                    }
                }
            }
            if found_end {
                return Ok(Header { values, byte_length: offset });
            }
        }
    }

    /// Raw string value for `keyword`, if present (quotes stripped).
    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.values.get(keyword).map(|s| s.as_str())
    }

    /// Required string value; `Error::MissingHeader` if absent.
    pub fn require_str(&self, keyword: &str) -> Result<&str> {
        self.get_str(keyword)
            .ok_or_else(|| Error::MissingHeader(keyword.to_string()))
    }

    /// Parses the value for `keyword` as `i64`.
    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get_str(keyword)?.trim().parse().ok()
    }

    /// Required `i64` value; `Error::MissingHeader` if absent or unparseable.
    pub fn require_i64(&self, keyword: &str) -> Result<i64> {
        self.get_i64(keyword)
            .ok_or_else(|| Error::MissingHeader(keyword.to_string()))
    }

    /// Parses the value for `keyword` as `f64`.
    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get_str(keyword)?.trim().parse().ok()
    }

    /// Required `f64` value; `Error::MissingHeader` if absent or unparseable.
    pub fn require_f64(&self, keyword: &str) -> Result<f64> {
        self.get_f64(keyword)
            .ok_or_else(|| Error::MissingHeader(keyword.to_string()))
    }

    /// Parses the value for `keyword` as a FITS boolean (`T`/`F`).
    pub fn get_bool(&self, keyword: &str) -> Option<bool> {
        match self.get_str(keyword)?.trim() {
            "T" => Some(true),
            "F" => Some(false),
            _ => None,
        }
    }
}

/// Splits a card's post-keyword remainder (`<value> / <comment>`) into just
/// the value, handling quoted strings (where `/` may appear inside quotes).
fn extract_value(rest: &str) -> String {
    let rest = rest.trim_start();
    if let Some(stripped) = rest.strip_prefix('\'') {
        if let Some(end) = stripped.find('\'') {
            return stripped[..end].trim_end().to_string();
        }
        return stripped.trim_end().to_string();
    }
    let value_part = rest.split('/').next().unwrap_or(rest);
    value_part.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad_to_block(mut s: Vec<u8>) -> Vec<u8> {
        s.resize(s.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, b' ');
        s
    }

    fn make_card(keyword: &str, value: &str) -> String {
        format!("{:<8}= {:<70}", keyword, value)
    }

    #[test]
    fn parses_simple_header() {
        let mut raw = String::new();
        raw.push_str(&make_card("BITPIX", "32"));
        raw.push_str(&make_card("NAXIS1", "4096"));
        raw.push_str(&make_card("RAFTBAY", "'R22     '"));
        raw.push_str(&format!("{:<80}", "END"));
        let bytes = pad_to_block(raw.into_bytes());

        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.require_i64("BITPIX").unwrap(), 32);
        assert_eq!(header.require_i64("NAXIS1").unwrap(), 4096);
        assert_eq!(header.require_str("RAFTBAY").unwrap(), "R22");
        assert_eq!(header.byte_length, BLOCK_SIZE);
    }

    #[test]
    fn missing_header_is_an_error() {
        let mut raw = String::new();
        raw.push_str(&make_card("BITPIX", "32"));
        raw.push_str(&format!("{:<80}", "END"));
        let bytes = pad_to_block(raw.into_bytes());
        let header = Header::parse(&bytes).unwrap();
        assert!(header.require_str("CCDSLOT").is_err());
    }

    #[test]
    fn truncated_header_without_end_is_an_error() {
        let raw = make_card("BITPIX", "32").into_bytes();
        let bytes = pad_to_block(raw);
        // No END card anywhere, and nothing past the one block: expect Err
        // because we'd need another full block to keep scanning.
        let header = Header::parse(&bytes);
        assert!(header.is_err());
    }
}
