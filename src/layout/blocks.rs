//! # Blocks
//!
//! A block is one semantic unit of an export: a title, a sender line, a
//! wrapped message body, a metric table. Blocks are measured before they
//! are drawn so the cursor can decide where they go, and a block that fits
//! on a page is never split across two. Only a block taller than a whole
//! page continues onto the next one, a line (or table row) at a time.
//!
//! The constructors below fix the font, colour, indent and vertical advance
//! of each kind of block, so both exports share one visual vocabulary.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::error::Result;
use crate::font::FontContext;
use crate::model::{ConversationRecord, TestPanel};
use crate::style::{Color, Palette, TextStyle};
use crate::text::TextLayout;

use super::table::{MeasuredTable, MetricTable};
use super::{Align, LayoutCursor, Placement};

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A single line that is never wrapped. Advances by `advance` whatever
    /// the font size.
    Line {
        name: &'static str,
        text: String,
        style: TextStyle,
        indent: f64,
        align: Align,
        advance: f64,
    },
    /// Text wrapped to the content width less `inset`, one `line_height`
    /// per line, plus `trailing` space under the last line.
    Paragraph {
        name: &'static str,
        text: String,
        style: TextStyle,
        indent: f64,
        inset: f64,
        line_height: f64,
        trailing: f64,
    },
    Table(MetricTable),
}

const HEADER: Color = Palette::HEADER_GRAY;

impl Block {
    fn line(name: &'static str, text: String, style: TextStyle, advance: f64) -> Self {
        Block::Line {
            name,
            text,
            style,
            indent: 0.0,
            align: Align::Left,
            advance,
        }
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::line("title", text.into(), TextStyle::regular(20.0, HEADER), 10.0)
    }

    /// A title centred on the page rather than the content column.
    pub fn centered_title(text: impl Into<String>) -> Self {
        Block::Line {
            name: "title",
            text: text.into(),
            style: TextStyle::regular(20.0, HEADER),
            indent: 0.0,
            align: Align::Center,
            advance: 10.0,
        }
    }

    pub fn subtitle(text: impl Into<String>, advance: f64) -> Self {
        Self::line("subtitle", text.into(), TextStyle::regular(12.0, HEADER), advance)
    }

    /// "Generated on {date} at {time}" under a conversation title.
    pub fn generated_line(at: NaiveDateTime) -> Self {
        let text = format!(
            "Generated on {} at {}",
            at.format("%-m/%-d/%Y"),
            at.format("%-I:%M:%S %p")
        );
        Self::line("generated line", text, TextStyle::regular(10.0, HEADER), 15.0)
    }

    /// Separator opening a day of conversation, e.g. "Wednesday, January 15, 2025".
    pub fn date_header(day: NaiveDate) -> Self {
        Self::line(
            "date header",
            day.format("%A, %B %-d, %Y").to_string(),
            TextStyle::regular(12.0, Palette::DATE_GRAY),
            10.0,
        )
    }

    pub fn sender_line(record: &ConversationRecord) -> Self {
        let text = format!(
            "{} ({}) - {}",
            record.sender_label(),
            record.role_label(),
            record.timestamp.format("%H:%M")
        );
        Self::line("sender line", text, TextStyle::regular(10.0, Color::BLACK), 7.0)
    }

    pub fn message_body(text: impl Into<String>) -> Self {
        Block::Paragraph {
            name: "message body",
            text: text.into(),
            style: TextStyle::regular(9.0, Color::BLACK),
            indent: 5.0,
            inset: 5.0,
            line_height: 4.0,
            trailing: 0.0,
        }
    }

    fn tag(name: &'static str, label: &str, value: &str, color: Color) -> Self {
        Block::Paragraph {
            name,
            text: format!("{}: {}", label, value),
            style: TextStyle::regular(9.0, color),
            indent: 5.0,
            inset: 5.0,
            line_height: 5.0,
            trailing: 0.0,
        }
    }

    pub fn topic(topic: &str) -> Self {
        Self::tag("topic", "Topic", topic, Palette::TOPIC_PURPLE)
    }

    pub fn decision(decision: &str) -> Self {
        Self::tag("decision", "Decision", decision, Palette::DECISION_NAVY)
    }

    pub fn reason(reason: &str) -> Self {
        Block::Paragraph {
            name: "reason",
            text: format!("Reason: {}", reason),
            style: TextStyle::regular(9.0, Palette::REASONING_OLIVE),
            indent: 5.0,
            inset: 10.0,
            line_height: 4.0,
            trailing: 0.0,
        }
    }

    /// "{test type} ({category})" opening a panel.
    pub fn panel_header(panel: &TestPanel) -> Self {
        Self::line(
            "panel header",
            format!("{} ({})", panel.test_type, panel.category),
            TextStyle::regular(16.0, Palette::PANEL_BLUE),
            10.0,
        )
    }

    pub fn panel_date(panel: &TestPanel) -> Self {
        Self::line(
            "panel date",
            format!("Test Date: {}", panel.date.format("%b %-d, %Y")),
            TextStyle::regular(12.0, Palette::DATE_GRAY),
            10.0,
        )
    }

    pub fn section_heading(text: impl Into<String>) -> Self {
        Self::line("section heading", text.into(), TextStyle::regular(14.0, HEADER), 7.0)
    }

    /// Interpretation and physician-notes text.
    pub fn clinical_paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            name: "clinical paragraph",
            text: text.into(),
            style: TextStyle::regular(11.0, Color::BLACK),
            indent: 0.0,
            inset: 0.0,
            line_height: 7.0,
            trailing: 10.0,
        }
    }

    /// Numbered recommendation; `number` starts at 1.
    pub fn recommendation(number: usize, text: &str) -> Self {
        Block::Paragraph {
            name: "recommendation",
            text: format!("{}. {}", number, text),
            style: TextStyle::regular(11.0, Color::BLACK),
            indent: 5.0,
            inset: 5.0,
            line_height: 7.0,
            trailing: 5.0,
        }
    }

    pub fn metric_table(panel: &TestPanel, columns: [f64; 4]) -> Self {
        Block::Table(MetricTable::from_panel(panel, columns))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Block::Line { name, .. } | Block::Paragraph { name, .. } => *name,
            Block::Table(_) => "metric table",
        }
    }
}

/// A block with its text wrapped and its height known.
#[derive(Debug, Clone)]
pub struct MeasuredBlock {
    pub name: &'static str,
    pub height: f64,
    content: Content,
}

#[derive(Debug, Clone)]
enum Content {
    Lines {
        /// (x, text, width) per line; line `i` sits `i * line_height` below
        /// the first.
        lines: Vec<(f64, String, f64)>,
        style: TextStyle,
        line_height: f64,
        /// Space under the last line.
        trailing: f64,
    },
    Table { x: f64, table: MeasuredTable },
}

impl MeasuredBlock {
    /// The part of the block a heading above it must share a page with:
    /// all of it, or for a block taller than a page its first line (or
    /// header and first row).
    fn lead_height(&self, page_capacity: f64) -> f64 {
        if self.height <= page_capacity {
            return self.height;
        }
        match &self.content {
            Content::Lines { line_height, .. } => *line_height,
            Content::Table { table, .. } => table.lead_height(),
        }
    }
}

/// Measures blocks and draws them at the cursor.
#[derive(Debug, Default)]
pub struct BlockRenderer {
    fonts: FontContext,
    text: TextLayout,
}

impl BlockRenderer {
    pub fn new() -> Self {
        Self {
            fonts: FontContext::new(),
            text: TextLayout::new(),
        }
    }

    /// Wrap and measure `block` for the cursor's page geometry.
    pub fn measure(&self, block: &Block, cursor: &LayoutCursor) -> MeasuredBlock {
        let x = cursor.content_x();
        let column = cursor.content_width();
        match block {
            Block::Line {
                name,
                text,
                style,
                indent,
                align,
                advance,
            } => {
                if text.is_empty() {
                    return empty(*name, *style);
                }
                let width = self.width_of(text, style);
                let line_x = match align {
                    Align::Left => x + indent,
                    Align::Center => (cursor.page_width() - width) / 2.0,
                };
                MeasuredBlock {
                    name: *name,
                    height: *advance,
                    content: Content::Lines {
                        lines: vec![(line_x, text.clone(), width)],
                        style: *style,
                        line_height: *advance,
                        trailing: 0.0,
                    },
                }
            }
            Block::Paragraph {
                name,
                text,
                style,
                indent,
                inset,
                line_height,
                trailing,
            } => {
                let wrapped = self
                    .text
                    .wrap(&self.fonts, text, column - inset, style.size, style.font);
                if wrapped.is_empty() {
                    return empty(*name, *style);
                }
                let height = wrapped.len() as f64 * line_height + trailing;
                let lines = wrapped
                    .into_iter()
                    .map(|line| {
                        let width = self.width_of(&line, style);
                        (x + indent, line, width)
                    })
                    .collect();
                MeasuredBlock {
                    name: *name,
                    height,
                    content: Content::Lines {
                        lines,
                        style: *style,
                        line_height: *line_height,
                        trailing: *trailing,
                    },
                }
            }
            Block::Table(table) => {
                let table = table.measure(&self.fonts, &self.text, column);
                MeasuredBlock {
                    name: block.name(),
                    height: table.height(),
                    content: Content::Table { x, table },
                }
            }
        }
    }

    /// Draw an already measured block at the cursor and move below it. The
    /// caller is responsible for having made room.
    pub fn draw(&self, block: &MeasuredBlock, cursor: &mut LayoutCursor) -> Placement {
        let at = cursor.advance(block.height);
        match &block.content {
            Content::Lines {
                lines,
                style,
                line_height,
                ..
            } => {
                for (i, (x, text, width)) in lines.iter().enumerate() {
                    cursor.draw_text(*x, at.y + i as f64 * line_height, *width, text, *style);
                }
            }
            Content::Table { x, table } => table.draw(cursor, &self.fonts, *x, at.y),
        }
        at
    }

    /// Measure `block`, break the page if it doesn't fit, then draw it.
    pub fn render(&self, block: &Block, cursor: &mut LayoutCursor) -> Result<Placement> {
        let measured = self.measure(block, cursor);
        self.place(&measured, cursor)
    }

    /// Draw a measured block, breaking the page first if it doesn't fit.
    /// A block taller than a whole page starts at the cursor and continues
    /// across pages.
    pub fn place(&self, block: &MeasuredBlock, cursor: &mut LayoutCursor) -> Result<Placement> {
        if block.height <= cursor.content_height() {
            cursor.ensure_fits(block.name, block.height)?;
            return Ok(self.draw(block, cursor));
        }

        warn!(
            block = block.name,
            height = block.height,
            available = cursor.content_height(),
            "block taller than a page continues across pages"
        );
        match &block.content {
            Content::Lines {
                lines,
                style,
                line_height,
                trailing,
            } => {
                let mut start = None;
                for (x, text, width) in lines {
                    cursor.ensure_fits(block.name, *line_height)?;
                    let at = cursor.advance(*line_height);
                    cursor.draw_text(*x, at.y, *width, text, *style);
                    start.get_or_insert(at);
                }
                let end = cursor.advance(*trailing);
                Ok(start.unwrap_or(end))
            }
            Content::Table { x, table } => {
                table.draw_across_pages(cursor, &self.fonts, *x, block.name)
            }
        }
    }

    /// Render `heading` only where the first block under it fits as well,
    /// so a heading never ends a page on its own.
    pub fn render_heading(
        &self,
        heading: &Block,
        next: &MeasuredBlock,
        cursor: &mut LayoutCursor,
    ) -> Result<Placement> {
        let measured = self.measure(heading, cursor);
        let together = measured.height + next.lead_height(cursor.content_height());
        if together <= cursor.content_height() {
            cursor.ensure_fits(measured.name, together)?;
        } else {
            cursor.ensure_fits(measured.name, measured.height)?;
        }
        Ok(self.draw(&measured, cursor))
    }

    fn width_of(&self, text: &str, style: &TextStyle) -> f64 {
        self.text
            .measure_width(&self.fonts, text, style.size, style.font)
    }
}

fn empty(name: &'static str, style: TextStyle) -> MeasuredBlock {
    MeasuredBlock {
        name,
        height: 0.0,
        content: Content::Lines {
            lines: Vec::new(),
            style,
            line_height: 0.0,
            trailing: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DrawCommand, LayoutConfig};

    fn cursor() -> LayoutCursor {
        LayoutCursor::new(&LayoutConfig::conversation())
    }

    fn line_count(block: &MeasuredBlock) -> usize {
        match &block.content {
            Content::Lines { lines, .. } => lines.len(),
            Content::Table { .. } => 0,
        }
    }

    fn record(sender: Option<&str>, role: Option<&str>) -> ConversationRecord {
        ConversationRecord {
            id: "m1".into(),
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 15)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
            sender: sender.map(String::from),
            role: role.map(String::from),
            message: "hello".into(),
            topic: None,
            decision: None,
            reason: None,
            linked_to: vec![],
            month: 1,
        }
    }

    #[test]
    fn test_sender_line_defaults() {
        let block = Block::sender_line(&record(None, None));
        match block {
            Block::Line { text, .. } => assert_eq!(text, "Unknown (User) - 09:05"),
            other => panic!("unexpected block {:?}", other),
        }
        match Block::sender_line(&record(Some("Ruby"), Some("Staff"))) {
            Block::Line { text, .. } => assert_eq!(text, "Ruby (Staff) - 09:05"),
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_date_header_is_long_form() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        match Block::date_header(day) {
            Block::Line { text, .. } => assert_eq!(text, "Wednesday, January 15, 2025"),
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_paragraph_height_is_lines_times_line_height() {
        let renderer = BlockRenderer::new();
        let c = cursor();
        let text = "word ".repeat(200);
        let measured = renderer.measure(&Block::message_body(text), &c);
        assert!(line_count(&measured) > 1);
        assert_eq!(measured.height, line_count(&measured) as f64 * 4.0);
    }

    #[test]
    fn test_clinical_paragraph_adds_trailing_space() {
        let renderer = BlockRenderer::new();
        let measured = renderer.measure(&Block::clinical_paragraph("Stable."), &cursor());
        assert_eq!(line_count(&measured), 1);
        assert_eq!(measured.height, 17.0);
    }

    #[test]
    fn test_empty_text_is_zero_height() {
        let renderer = BlockRenderer::new();
        let mut c = cursor();
        let placed = renderer.render(&Block::clinical_paragraph(""), &mut c).unwrap();
        assert_eq!(placed.y, 20.0);
        assert_eq!(c.y(), 20.0);
        assert!(c.finish()[0].elements.is_empty());
    }

    #[test]
    fn test_render_draws_all_lines_on_one_page() {
        let renderer = BlockRenderer::new();
        let mut c = cursor();
        c.draw_text(20.0, 20.0, 1.0, "filler", TextStyle::regular(9.0, Color::BLACK));
        c.advance(240.0);
        let text = "lorem ipsum dolor ".repeat(60);
        let placed = renderer.render(&Block::message_body(text), &mut c).unwrap();
        assert_eq!(placed.page, 1);
        let pages = c.finish();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].texts().count(), 1);
        assert!(pages[1].texts().count() > 1);
    }

    #[test]
    fn test_centered_title_is_centred_on_page() {
        let renderer = BlockRenderer::new();
        let mut c = LayoutCursor::new(&LayoutConfig::panel());
        renderer
            .render(&Block::centered_title("Health Report"), &mut c)
            .unwrap();
        let pages = c.finish();
        let title = &pages[0].elements[0];
        let centre = title.x + title.width / 2.0;
        assert!((centre - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_tags_use_semantic_colours() {
        let renderer = BlockRenderer::new();
        let mut c = cursor();
        renderer.render(&Block::topic("Sleep"), &mut c).unwrap();
        renderer.render(&Block::decision("Start CBT-I"), &mut c).unwrap();
        renderer.render(&Block::reason("Poor sleep"), &mut c).unwrap();
        let pages = c.finish();
        let colours: Vec<(String, Color)> = pages[0]
            .elements
            .iter()
            .filter_map(|e| match &e.draw {
                DrawCommand::Text { text, style } => Some((text.clone(), style.color)),
                _ => None,
            })
            .collect();
        assert_eq!(
            colours,
            vec![
                ("Topic: Sleep".to_string(), Palette::TOPIC_PURPLE),
                ("Decision: Start CBT-I".to_string(), Palette::DECISION_NAVY),
                ("Reason: Poor sleep".to_string(), Palette::REASONING_OLIVE),
            ]
        );
    }

    #[test]
    fn test_heading_moves_with_its_block() {
        let renderer = BlockRenderer::new();
        let mut c = cursor();
        c.draw_text(20.0, 20.0, 1.0, "filler", TextStyle::regular(9.0, Color::BLACK));
        // Room for the 7mm heading but not for the paragraph under it.
        c.advance(247.0);
        let body = renderer.measure(&Block::clinical_paragraph("Stable."), &c);
        let placed = renderer
            .render_heading(&Block::section_heading("Clinical Interpretation"), &body, &mut c)
            .unwrap();
        assert_eq!(placed.page, 1);
        assert_eq!(placed.y, 20.0);
    }

    #[test]
    fn test_paragraph_taller_than_page_continues() {
        let renderer = BlockRenderer::new();
        let mut c = cursor();
        c.draw_text(20.0, 20.0, 1.0, "filler", TextStyle::regular(9.0, Color::BLACK));
        c.advance(100.0);
        let words: Vec<String> = (0..2000).map(|i| format!("w{}", i)).collect();
        let block = renderer.measure(&Block::message_body(words.join(" ")), &c);
        assert!(block.height > c.content_height());

        let placed = renderer.place(&block, &mut c).unwrap();
        assert_eq!(placed, Placement { page: 0, y: 120.0 });
        let pages = c.finish();
        assert!(pages.len() >= 2);

        let drawn: Vec<&str> = pages
            .iter()
            .flat_map(|p| p.texts())
            .filter(|t| *t != "filler")
            .flat_map(|t| t.split(' '))
            .collect();
        assert_eq!(drawn.len(), 2000);
        assert_eq!(drawn[1999], "w1999");
        for page in &pages {
            assert!(page.elements.iter().all(|e| e.y + 4.0 <= 277.0 + 1e-9));
        }
    }

    #[test]
    fn test_heading_stays_with_first_line_of_long_block() {
        let renderer = BlockRenderer::new();
        let mut c = cursor();
        c.draw_text(20.0, 20.0, 1.0, "filler", TextStyle::regular(9.0, Color::BLACK));
        c.advance(200.0); // y = 220
        let body = renderer.measure(&Block::clinical_paragraph("long ".repeat(3000)), &c);
        assert!(body.height > c.content_height());

        let heading = renderer
            .render_heading(&Block::section_heading("Clinical Interpretation"), &body, &mut c)
            .unwrap();
        assert_eq!(heading, Placement { page: 0, y: 220.0 });
        let first = renderer.place(&body, &mut c).unwrap();
        assert_eq!(first, Placement { page: 0, y: 227.0 });
    }
}
