//! # Page-Aware Layout
//!
//! Exports never lay content out on an endless canvas and slice it
//! afterwards. A cursor walks down a page of known size, and before every
//! block is drawn the cursor is asked whether the block fits:
//!
//! 1. Measure the block (wrapped line count times line height, or the row
//!    heights of a table).
//! 2. If it fits above the content limit, draw it and move down.
//! 3. If it doesn't, finish the page, open a new one, and draw it at the
//!    top margin.
//! 4. If it would not fit on an empty page either, continue it across pages
//!    one line (or table row) at a time.
//!
//! Blocks that fit on a page are atomic: every line of such a block lands on
//! the same page.
//!
//! Group headers use a tighter limit than ordinary content
//! (`group_headroom` above the bottom margin) so a date or panel heading is
//! never stranded at the foot of a page with nothing under it.
//!
//! All coordinates are millimetres from the top-left corner of the page.
//! Text is positioned by its baseline.

pub mod blocks;
pub mod page_break;
pub mod table;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::model::{Edges, PageConfig};
use crate::style::{Color, TextStyle};
use page_break::{decide_break, BreakDecision};

/// A finished page: its size and everything drawn on it.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    /// Every text run on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match &e.draw {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            DrawCommand::Rect { .. } => None,
        })
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Left edge. For text, the start of the baseline.
    pub x: f64,
    /// Top edge for rectangles, baseline for text.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

/// The primitive drawing operations a page is made of.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// A filled rectangle (table header and row shading).
    Rect { fill: Color },
    /// A single line of text.
    Text { text: String, style: TextStyle },
}

/// Horizontal placement of a single line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// Where a block was placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Zero-based page index.
    pub page: usize,
    /// Cursor position the block starts at.
    pub y: f64,
}

/// Layout settings for one export. Every field has a default, so a
/// configuration file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page: PageConfig,

    /// Extra space, above the bottom margin, that a group header must leave
    /// free to be placed on the current page.
    pub group_headroom: f64,

    /// Stamp page numbers and the generation date on every page.
    pub footer: bool,

    /// Distance of the footer baseline from the bottom edge of the page.
    pub footer_offset: f64,

    /// Start every panel after the first on a fresh page.
    pub force_panel_breaks: bool,

    /// Metric table column widths as fractions of the content width
    /// (Metric, Value, Status, Trend).
    pub table_columns: [f64; 4],
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::conversation()
    }
}

impl LayoutConfig {
    /// Geometry for conversation exports: 20mm margins all round.
    pub fn conversation() -> Self {
        Self {
            page: PageConfig::default(),
            group_headroom: 20.0,
            footer: true,
            footer_offset: 10.0,
            force_panel_breaks: true,
            table_columns: [11.0 / 36.0, 11.0 / 36.0, 1.0 / 6.0, 2.0 / 9.0],
        }
    }

    /// Geometry for panel reports: 15mm side margins.
    pub fn panel() -> Self {
        Self {
            page: PageConfig {
                margin: Edges {
                    top: 20.0,
                    right: 15.0,
                    bottom: 20.0,
                    left: 15.0,
                },
                ..PageConfig::default()
            },
            ..Self::conversation()
        }
    }

    /// Parse a JSON configuration. Missing fields take the conversation
    /// preset's values.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_over(json, &Self::default())
    }

    /// Parse a JSON configuration as overrides on top of `base`. Nested
    /// objects merge field by field, so `{ "page": { "margin": { "top": 30 } } }`
    /// only moves the top margin.
    pub fn from_json_over(json: &str, base: &LayoutConfig) -> Result<Self> {
        let overrides: serde_json::Value = serde_json::from_str(json).map_err(config_error)?;
        let mut merged = serde_json::to_value(base).map_err(config_error)?;
        merge_json(&mut merged, overrides);
        let config: LayoutConfig = serde_json::from_value(merged).map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject geometry that leaves no room to lay anything out.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.page.size.dimensions();
        let margin = &self.page.margin;
        if width - margin.horizontal() <= 0.0 {
            return Err(ExportError::Config(format!(
                "side margins ({}mm) leave no content width on a {}mm page",
                margin.horizontal(),
                width
            )));
        }
        if height - margin.vertical() <= 0.0 {
            return Err(ExportError::Config(format!(
                "top and bottom margins ({}mm) leave no content height on a {}mm page",
                margin.vertical(),
                height
            )));
        }
        if self.group_headroom < 0.0 {
            return Err(ExportError::Config("groupHeadroom must not be negative".into()));
        }
        if self.footer && (self.footer_offset <= 0.0 || self.footer_offset > margin.bottom) {
            return Err(ExportError::Config(format!(
                "footerOffset {}mm must lie inside the {}mm bottom margin",
                self.footer_offset, margin.bottom
            )));
        }
        if self.table_columns.iter().any(|f| *f <= 0.0) {
            return Err(ExportError::Config("tableColumns must all be positive".into()));
        }
        let total: f64 = self.table_columns.iter().sum();
        if total > 1.0 + 1e-6 {
            return Err(ExportError::Config(format!(
                "tableColumns add up to {:.3} of the content width",
                total
            )));
        }
        Ok(())
    }
}

fn config_error(e: serde_json::Error) -> ExportError {
    ExportError::Config(e.to_string())
}

fn merge_json(base: &mut serde_json::Value, overrides: serde_json::Value) {
    match (base, overrides) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Tracks the write position on the current page and owns the pages
/// finished so far.
#[derive(Debug)]
pub struct LayoutCursor {
    group_headroom: f64,
    page_width: f64,
    page_height: f64,
    content_x: f64,
    content_width: f64,
    content_top: f64,
    content_bottom: f64,
    y: f64,
    elements: Vec<LayoutElement>,
    pages: Vec<LayoutPage>,
}

impl LayoutCursor {
    pub fn new(config: &LayoutConfig) -> Self {
        let page = &config.page;
        let (page_width, page_height) = page.size.dimensions();
        Self {
            group_headroom: config.group_headroom,
            page_width,
            page_height,
            content_x: page.margin.left,
            content_width: page_width - page.margin.horizontal(),
            content_top: page.margin.top,
            content_bottom: page_height - page.margin.bottom,
            y: page.margin.top,
            elements: Vec::new(),
            pages: Vec::new(),
        }
    }

    /// Left edge of the content column.
    pub fn content_x(&self) -> f64 {
        self.content_x
    }

    pub fn content_width(&self) -> f64 {
        self.content_width
    }

    /// Height available to blocks on an empty page.
    pub fn content_height(&self) -> f64 {
        self.content_bottom - self.content_top
    }

    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Index of the page being written.
    pub fn page_index(&self) -> usize {
        self.pages.len()
    }

    /// True while nothing has been placed on the current page.
    pub fn at_page_top(&self) -> bool {
        self.y <= self.content_top && self.elements.is_empty()
    }

    /// Would a block of `height` cross the content limit?
    pub fn will_overflow(&self, height: f64) -> bool {
        self.y + height > self.content_bottom
    }

    /// Like `will_overflow`, against the tighter limit for group headers.
    pub fn will_overflow_group(&self, height: f64) -> bool {
        self.y + height > self.group_limit()
    }

    fn group_limit(&self) -> f64 {
        self.content_bottom - self.group_headroom
    }

    /// Return where a block of `height` begins and move below it.
    pub fn advance(&mut self, height: f64) -> Placement {
        let placement = Placement {
            page: self.page_index(),
            y: self.y,
        };
        self.y += height;
        placement
    }

    /// Finish the current page and start writing at the top of a new one.
    pub fn break_page(&mut self) {
        let finished = self.finalize();
        debug!(
            page = self.pages.len() + 1,
            elements = finished.elements.len(),
            "page break"
        );
        self.pages.push(finished);
        self.y = self.content_top;
    }

    /// Make sure a block of `height` can be drawn at the cursor, breaking
    /// to a new page first if it can't.
    pub fn ensure_fits(&mut self, block: &'static str, height: f64) -> Result<()> {
        let overflows = self.will_overflow(height);
        self.apply(block, height, overflows)
    }

    /// `ensure_fits` for group headers, which need `group_headroom` of
    /// extra space below them.
    pub fn ensure_group_fits(&mut self, block: &'static str, height: f64) -> Result<()> {
        let overflows = self.will_overflow_group(height);
        self.apply(block, height, overflows)
    }

    fn apply(&mut self, block: &'static str, height: f64, overflows: bool) -> Result<()> {
        let capacity = self.content_height();
        match decide_break(overflows, capacity, height, self.at_page_top()) {
            BreakDecision::Place => Ok(()),
            BreakDecision::MoveToNextPage => {
                debug!(block, height, y = self.y, "block moved to next page");
                self.break_page();
                Ok(())
            }
            BreakDecision::TooTall => Err(ExportError::BlockTooTall {
                block,
                height,
                available: capacity,
            }),
        }
    }

    /// Draw one line of text with its baseline at `y`.
    pub fn draw_text(&mut self, x: f64, y: f64, width: f64, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        self.elements.push(LayoutElement {
            x,
            y,
            width,
            height: style.size * crate::model::MM_PER_PT,
            draw: DrawCommand::Text {
                text: text.to_string(),
                style,
            },
        });
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Color) {
        self.elements.push(LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Rect { fill },
        });
    }

    fn finalize(&mut self) -> LayoutPage {
        LayoutPage {
            width: self.page_width,
            height: self.page_height,
            elements: std::mem::take(&mut self.elements),
        }
    }

    /// Close the last page and hand back every page in order.
    pub fn finish(mut self) -> Vec<LayoutPage> {
        let last = self.finalize();
        self.pages.push(last);
        self.pages
    }
}
