//! # Text Layout
//!
//! Line breaking and text measurement.
//!
//! Break opportunities come from UAX#14, so for Latin text lines end at
//! spaces and after hyphens, and explicit newlines always start a new line.
//! Lines are filled greedily. A segment that is wider than the column on its
//! own gets a line to itself and overflows: wrapping is best effort and never
//! clips or splits a word.

use crate::font::{FontContext, StandardFont};
use crate::model::MM_PER_PT;
use unicode_linebreak::{linebreaks, BreakOpportunity};

fn is_line_terminator(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

#[derive(Debug, Clone, Copy)]
pub struct TextLayout;

impl Default for TextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break `text` into lines no wider than `max_width` millimetres.
    ///
    /// Empty text yields no lines. Non-empty text always yields at least one
    /// line. Trailing whitespace is trimmed from every line and never counts
    /// toward its width.
    pub fn wrap(
        &self,
        font_context: &FontContext,
        text: &str,
        max_width: f64,
        font_size: f64,
        font: StandardFont,
    ) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let measure = |s: &str| font_context.measure_string(s, font, font_size) * MM_PER_PT;

        let mut lines = Vec::new();
        let mut current = String::new();
        // Width of `current` including its trailing whitespace.
        let mut line_width = 0.0;
        let mut segment_start = 0;

        for (offset, opportunity) in linebreaks(text) {
            let raw = &text[segment_start..offset];
            segment_start = offset;

            let segment = raw.trim_end_matches(is_line_terminator);
            let hard_break =
                opportunity == BreakOpportunity::Mandatory && segment.len() != raw.len();

            let word = segment.trim_end();
            let has_content = !current.trim_end().is_empty();
            if has_content && !word.is_empty() && line_width + measure(word) > max_width {
                lines.push(current.trim_end().to_string());
                current.clear();
                line_width = 0.0;
            }

            current.push_str(segment);
            line_width += measure(segment);

            if hard_break {
                lines.push(current.trim_end().to_string());
                current.clear();
                line_width = 0.0;
            }
        }

        if !current.is_empty() || lines.is_empty() {
            lines.push(current.trim_end().to_string());
        }

        lines
    }

    /// Width of `text` in millimetres.
    pub fn measure_width(
        &self,
        font_context: &FontContext,
        text: &str,
        font_size: f64,
        font: StandardFont,
    ) -> f64 {
        font_context.measure_string(text, font, font_size) * MM_PER_PT
    }
}
