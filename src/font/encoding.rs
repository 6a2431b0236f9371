//! WinAnsiEncoding, the single-byte encoding the standard fonts are
//! written with.
//!
//! Characters outside it are drawn as ASCII stand-ins (arrows and
//! comparison signs are common in clinical notes) or as `?`. Measurement
//! and the PDF writer both go through [`encode_char`], so a line is
//! measured with the glyphs that are actually drawn.

/// How one character is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    /// A single WinAnsi byte.
    Byte(u8),
    /// Not encodable; drawn as this ASCII text instead.
    Substitute(&'static str),
}

pub fn encode_char(ch: char) -> Encoded {
    match unicode_to_winansi(ch) {
        Some(b) => Encoded::Byte(b),
        None => Encoded::Substitute(transliterate(ch).unwrap_or("?")),
    }
}

/// Map `text` to WinAnsiEncoding bytes. Returns the bytes and how many
/// characters had to be substituted.
pub fn encode_winansi(text: &str) -> (Vec<u8>, usize) {
    let mut bytes = Vec::with_capacity(text.len());
    let mut substituted = 0;
    for ch in text.chars() {
        match encode_char(ch) {
            Encoded::Byte(b) => bytes.push(b),
            Encoded::Substitute(s) => {
                substituted += 1;
                bytes.extend_from_slice(s.as_bytes());
            }
        }
    }
    (bytes, substituted)
}

fn transliterate(ch: char) -> Option<&'static str> {
    match ch {
        '\u{2191}' => Some("^"),
        '\u{2193}' => Some("v"),
        '\u{2192}' => Some("->"),
        '\u{2190}' => Some("<-"),
        '\u{2264}' => Some("<="),
        '\u{2265}' => Some(">="),
        '\u{2212}' => Some("-"),
        '\u{2248}' => Some("~"),
        '\t' => Some(" "),
        _ => None,
    }
}

fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    // Windows-1252 specials in 0x80-0x9F
    match cp {
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}
