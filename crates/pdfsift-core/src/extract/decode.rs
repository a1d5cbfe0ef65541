//! Text decoding for PDF string operands

use std::collections::HashMap;

/// Character codes to Unicode, parsed from a font's ToUnicode CMap
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    map: HashMap<u32, String>,
    code_width: usize,
}

impl ToUnicodeMap {
    /// Parse the `bfchar` and `bfrange` sections of a CMap stream.
    /// Returns `None` when no mapping was found.
    pub fn parse(cmap: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(cmap);
        let mut map = HashMap::new();
        let mut code_width = 1;
        let mut section: Option<&str> = None;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.ends_with("beginbfchar") {
                section = Some("char");
                continue;
            }
            if line.ends_with("beginbfrange") {
                section = Some("range");
                continue;
            }
            if line.starts_with("endbfchar") || line.starts_with("endbfrange") {
                section = None;
                continue;
            }

            let hexes = hex_tokens(line);
            match section {
                Some("char") if hexes.len() >= 2 => {
                    let (src, width) = hexes[0];
                    code_width = code_width.max(width);
                    map.insert(src, utf16_hex_to_string(hexes[1].0, hexes[1].1));
                }
                Some("range") if hexes.len() >= 3 && !line.contains('[') => {
                    let (lo, width) = hexes[0];
                    let (hi, _) = hexes[1];
                    let (dst, dst_width) = hexes[2];
                    code_width = code_width.max(width);
                    for (offset, code) in (lo..=hi.min(lo + 0xFFFF)).enumerate() {
                        map.insert(
                            code,
                            utf16_hex_to_string(dst + offset as u32, dst_width),
                        );
                    }
                }
                _ => {}
            }
        }

        if map.is_empty() {
            None
        } else {
            Some(Self { map, code_width })
        }
    }

    /// Decode a string operand using this map
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        for code_bytes in bytes.chunks(self.code_width) {
            let code = code_bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
            match self.map.get(&code) {
                Some(s) => out.push_str(s),
                None if self.code_width == 1 => out.push(win_ansi_char(code_bytes[0])),
                None => {}
            }
        }
        out
    }
}

/// `<hex>` tokens in a CMap line, with their byte width
fn hex_tokens(line: &str) -> Vec<(u32, usize)> {
    let mut tokens = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start + 1..].find('>') else {
            break;
        };
        let hex = &rest[start + 1..start + 1 + len];
        if let Ok(value) = u32::from_str_radix(hex, 16) {
            tokens.push((value, hex.len().div_ceil(2).max(1)));
        }
        rest = &rest[start + 1 + len + 1..];
    }
    tokens
}

fn utf16_hex_to_string(value: u32, width: usize) -> String {
    let units: Vec<u16> = if width >= 4 {
        vec![(value >> 16) as u16, (value & 0xFFFF) as u16]
    } else {
        vec![value as u16]
    };
    String::from_utf16_lossy(&units)
}

/// Decode a string operand of a simple (single-byte) font
pub fn decode_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|b| win_ansi_char(*b)).collect()
}

/// WinAnsiEncoding, falling back to Latin-1 outside the 0x80-0x9F block
fn win_ansi_char(byte: u8) -> char {
    match byte {
        0x80 => '€',
        0x85 => '…',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x99 => '™',
        b if b < 0x20 && b != b'\t' => ' ',
        b => b as char,
    }
}
