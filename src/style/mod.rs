//! # Style
//!
//! Colours and text styles used by the block renderer. Every semantic role in
//! an export (date separators, decisions, reasoning, metric statuses, ...)
//! maps to one fixed RGB triple so that exports stay visually comparable
//! with each other.

use crate::font::StandardFont;
use crate::model::MetricStatus;

macro_rules! rgb8 {
    ($r:expr, $g:expr, $b:expr) => {
        Color {
            r: $r as f64 / 255.0,
            g: $g as f64 / 255.0,
            b: $b as f64 / 255.0,
        }
    };
}

/// An RGB colour with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
}

/// Semantic colour roles.
pub struct Palette;

impl Palette {
    /// Document titles and section headings.
    pub const HEADER_GRAY: Color = rgb8!(40, 40, 40);
    /// Date separators and "Test Date" lines.
    pub const DATE_GRAY: Color = rgb8!(100, 100, 100);
    pub const FOOTER_GRAY: Color = rgb8!(150, 150, 150);
    pub const TOPIC_PURPLE: Color = rgb8!(128, 0, 128);
    pub const DECISION_NAVY: Color = rgb8!(0, 0, 128);
    pub const REASONING_OLIVE: Color = rgb8!(128, 128, 0);
    /// Panel titles and the metric table header fill.
    pub const PANEL_BLUE: Color = rgb8!(41, 128, 185);
    /// Alternating body-row fill in metric tables.
    pub const ROW_SHADE: Color = rgb8!(240, 240, 240);

    pub const STATUS_OPTIMAL: Color = rgb8!(22, 163, 74);
    pub const STATUS_IMPROVED: Color = rgb8!(37, 99, 235);
    pub const STATUS_MONITOR: Color = rgb8!(234, 88, 12);
    pub const STATUS_NEUTRAL: Color = rgb8!(107, 114, 128);

    /// Colour for a metric status. Statuses outside the known set render
    /// neutral gray.
    pub fn status(status: &MetricStatus) -> Color {
        match status {
            MetricStatus::Optimal => Self::STATUS_OPTIMAL,
            MetricStatus::Improved => Self::STATUS_IMPROVED,
            MetricStatus::Monitor => Self::STATUS_MONITOR,
            MetricStatus::Unrecognized(_) => Self::STATUS_NEUTRAL,
        }
    }
}

/// Font, size and colour for one run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    /// Font size in points.
    pub size: f64,
    pub color: Color,
}

impl TextStyle {
    pub const fn new(font: StandardFont, size: f64, color: Color) -> Self {
        Self { font, size, color }
    }

    pub const fn regular(size: f64, color: Color) -> Self {
        Self::new(StandardFont::Helvetica, size, color)
    }

    pub const fn bold(size: f64, color: Color) -> Self {
        Self::new(StandardFont::HelveticaBold, size, color)
    }
}
