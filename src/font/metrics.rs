//! Advance widths for the standard PDF fonts we draw with.
//!
//! Values come from the Adobe Core14 AFM files and are in 1/1000 em. The
//! tables cover printable ASCII (0x20..=0x7E). Other WinAnsi characters use
//! the font's default width; characters outside WinAnsi are measured as the
//! stand-in the PDF writer draws for them.

use super::encoding::{encode_char, Encoded};

/// Width table for one standard font.
pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    default_width: u16,
}

impl StandardFontMetrics {
    /// Advance width of `ch` in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let units = match encode_char(ch) {
            Encoded::Byte(b @ 0x20..=0x7E) => self.widths[(b - 0x20) as usize],
            Encoded::Byte(0xA0) => self.widths[0],
            Encoded::Byte(_) => self.default_width,
            Encoded::Substitute(text) => return self.measure_string(text, font_size),
        };
        units as f64 / 1000.0 * font_size
    }

    /// Width of `text` in points.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    333, 333, 584, 584, 584, 611, 975,
    // A-Z
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    333, 278, 333, 584, 556, 333,
    // a-z
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    // { | } ~
    389, 280, 389, 584,
];

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_WIDTHS,
    default_width: 556,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_BOLD_WIDTHS,
    default_width: 611,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_width_matches_afm() {
        assert!((HELVETICA.char_width(' ', 12.0) - 3.336).abs() < 1e-9);
    }

    fn units(metrics: &StandardFontMetrics, ch: char) -> f64 {
        (metrics.char_width(ch, 1000.0)).round()
    }

    #[test]
    fn tables_line_up_with_ascii() {
        assert_eq!(units(&HELVETICA, 'A'), 667.0);
        assert_eq!(units(&HELVETICA, 'i'), 222.0);
        assert_eq!(units(&HELVETICA, '~'), 584.0);
        assert_eq!(units(&HELVETICA_BOLD, 'm'), 889.0);
        assert_eq!(units(&HELVETICA_BOLD, 'z'), 500.0);
    }

    #[test]
    fn latin1_uses_default_width() {
        assert_eq!(units(&HELVETICA, '\u{e9}'), 556.0);
        assert_eq!(units(&HELVETICA_BOLD, '\u{fc}'), 611.0);
    }

    #[test]
    fn substituted_characters_measure_as_drawn() {
        let arrow = HELVETICA.measure_string("HDL \u{2192} 50", 10.0);
        let drawn = HELVETICA.measure_string("HDL -> 50", 10.0);
        assert!((arrow - drawn).abs() < 1e-9);
        assert_eq!(units(&HELVETICA_BOLD, '\u{2193}'), units(&HELVETICA_BOLD, 'v'));
        assert_eq!(units(&HELVETICA, '\u{4e2d}'), units(&HELVETICA, '?'));
    }
}
