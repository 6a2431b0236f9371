//! # Metric Tables
//!
//! The four-column (Metric, Value, Status, Trend) grid printed for every test
//! panel. Column widths are fixed fractions of the content width, so a
//! table's shape never depends on what is in it. Cells wrap to their column;
//! a row is as tall as its tallest cell.
//!
//! A table is laid out as a single block. Its rows are measured up front and
//! the whole height is checked against the page before any row is drawn. A
//! table taller than a page continues row by row instead, with the header
//! row repeated at the top of every page it runs onto.

use crate::error::Result;
use crate::font::FontContext;
use crate::model::{TestPanel, MM_PER_PT};
use crate::style::{Color, Palette, TextStyle};
use crate::text::TextLayout;

use super::{LayoutCursor, Placement};

pub const HEADERS: [&str; 4] = ["Metric", "Value", "Status", "Trend"];

const FONT_SIZE: f64 = 10.0;
const LINE_HEIGHT_FACTOR: f64 = 1.15;
/// Inner padding on every side of a cell, in millimetres.
const CELL_PADDING: f64 = 2.0;
/// Helvetica's ascender, as a fraction of the font size.
const ASCENT: f64 = 0.718;

/// One body row before measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub name: String,
    pub value: String,
    /// Capitalised status label.
    pub status: String,
    pub status_color: Color,
    pub trend: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    pub columns: [f64; 4],
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    /// Build the table for a panel, one row per metric in recorded order.
    pub fn from_panel(panel: &TestPanel, columns: [f64; 4]) -> Self {
        let rows = panel
            .results
            .iter()
            .map(|m| MetricRow {
                name: m.name.clone(),
                value: m.metric.value.clone(),
                status: m.metric.status.display_label(),
                status_color: Palette::status(&m.metric.status),
                trend: m.metric.trend.clone(),
            })
            .collect();
        Self { columns, rows }
    }

    pub fn line_height() -> f64 {
        FONT_SIZE * LINE_HEIGHT_FACTOR * MM_PER_PT
    }

    /// Wrap every cell for a table `width` millimetres wide.
    pub fn measure(&self, fonts: &FontContext, text: &TextLayout, width: f64) -> MeasuredTable {
        let col_widths = self.columns.map(|fraction| fraction * width);

        let header_style = TextStyle::bold(FONT_SIZE, Color::WHITE);
        let header = measure_row(
            fonts,
            text,
            &col_widths,
            HEADERS.map(|h| (h.to_string(), header_style)),
            Some(Palette::PANEL_BLUE),
        );

        let mut rows = vec![header];
        for (i, row) in self.rows.iter().enumerate() {
            let cells = [
                (row.name.clone(), TextStyle::bold(FONT_SIZE, Color::BLACK)),
                (row.value.clone(), TextStyle::regular(FONT_SIZE, Color::BLACK)),
                (row.status.clone(), TextStyle::regular(FONT_SIZE, row.status_color)),
                (row.trend.clone(), TextStyle::regular(FONT_SIZE, Color::BLACK)),
            ];
            let fill = (i % 2 == 0).then_some(Palette::ROW_SHADE);
            rows.push(measure_row(fonts, text, &col_widths, cells, fill));
        }

        MeasuredTable {
            width,
            col_widths,
            rows,
        }
    }
}

fn measure_row(
    fonts: &FontContext,
    text: &TextLayout,
    col_widths: &[f64; 4],
    cells: [(String, TextStyle); 4],
    fill: Option<Color>,
) -> MeasuredRow {
    let wrapped: [(Vec<String>, TextStyle); 4] = std::array::from_fn(|i| {
        let (content, style) = &cells[i];
        let inner = (col_widths[i] - 2.0 * CELL_PADDING).max(0.0);
        (text.wrap(fonts, content, inner, style.size, style.font), *style)
    });

    let max_lines = wrapped.iter().map(|(l, _)| l.len()).max().unwrap_or(0).max(1);
    let height = max_lines as f64 * MetricTable::line_height() + 2.0 * CELL_PADDING;

    MeasuredRow {
        cells: wrapped,
        height,
        fill,
    }
}

/// A table with every cell wrapped, ready to draw.
#[derive(Debug, Clone)]
pub struct MeasuredTable {
    width: f64,
    col_widths: [f64; 4],
    /// Header first, then body rows.
    rows: Vec<MeasuredRow>,
}

#[derive(Debug, Clone)]
struct MeasuredRow {
    cells: [(Vec<String>, TextStyle); 4],
    height: f64,
    fill: Option<Color>,
}

impl MeasuredTable {
    pub fn height(&self) -> f64 {
        self.rows.iter().map(|r| r.height).sum()
    }

    /// Height of the header row and the first body row, the least that has
    /// to stay together on a page.
    pub fn lead_height(&self) -> f64 {
        self.rows.iter().take(2).map(|r| r.height).sum()
    }

    /// Draw with the top-left corner at (`x`, `top`).
    pub fn draw(&self, cursor: &mut LayoutCursor, fonts: &FontContext, x: f64, top: f64) {
        let mut row_top = top;
        for row in &self.rows {
            self.draw_row(cursor, fonts, x, row_top, row);
            row_top += row.height;
        }
    }

    /// Draw row by row from the cursor, breaking pages between rows and
    /// repeating the header row after every break. Fails only if the header
    /// and a single row don't fit on an empty page together.
    pub fn draw_across_pages(
        &self,
        cursor: &mut LayoutCursor,
        fonts: &FontContext,
        x: f64,
        block: &'static str,
    ) -> Result<Placement> {
        cursor.ensure_fits(block, self.lead_height())?;
        let start = Placement {
            page: cursor.page_index(),
            y: cursor.y(),
        };
        let Some((header, body)) = self.rows.split_first() else {
            return Ok(start);
        };

        self.place_row(cursor, fonts, x, header);
        for row in body {
            if cursor.will_overflow(row.height) {
                cursor.ensure_fits(block, header.height + row.height)?;
                self.place_row(cursor, fonts, x, header);
            }
            self.place_row(cursor, fonts, x, row);
        }
        Ok(start)
    }

    fn place_row(&self, cursor: &mut LayoutCursor, fonts: &FontContext, x: f64, row: &MeasuredRow) {
        let at = cursor.advance(row.height);
        self.draw_row(cursor, fonts, x, at.y, row);
    }

    fn draw_row(
        &self,
        cursor: &mut LayoutCursor,
        fonts: &FontContext,
        x: f64,
        row_top: f64,
        row: &MeasuredRow,
    ) {
        let line_height = MetricTable::line_height();
        let baseline = CELL_PADDING + (line_height - FONT_SIZE * MM_PER_PT) / 2.0
            + ASCENT * FONT_SIZE * MM_PER_PT;

        if let Some(fill) = row.fill {
            cursor.fill_rect(x, row_top, self.width, row.height, fill);
        }

        let mut cell_x = x;
        for (col, (lines, style)) in row.cells.iter().enumerate() {
            for (i, line) in lines.iter().enumerate() {
                let width = fonts.measure_string(line, style.font, style.size) * MM_PER_PT;
                cursor.draw_text(
                    cell_x + CELL_PADDING,
                    row_top + baseline + i as f64 * line_height,
                    width,
                    line,
                    *style,
                );
            }
            cell_x += self.col_widths[col];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DrawCommand, LayoutConfig};
    use crate::model::{Metric, MetricStatus, NamedMetric};
    use chrono::NaiveDate;

    const COLUMNS: [f64; 4] = [11.0 / 36.0, 11.0 / 36.0, 1.0 / 6.0, 2.0 / 9.0];

    fn panel(metrics: &[(&str, &str, &str)]) -> TestPanel {
        TestPanel {
            id: "p".into(),
            test_type: "Lipid Panel".into(),
            category: "Cardiovascular".into(),
            date: NaiveDate::from_ymd_opt(2023, 8, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            results: metrics
                .iter()
                .map(|(name, value, status)| NamedMetric {
                    name: name.to_string(),
                    metric: Metric {
                        value: value.to_string(),
                        status: MetricStatus::from_label(status),
                        trend: "stable".into(),
                    },
                })
                .collect(),
            interpretation: String::new(),
            physician_notes: None,
            recommendations: vec![],
        }
    }

    #[test]
    fn test_column_widths_on_a4_panel_layout() {
        let table = MetricTable::from_panel(&panel(&[("LDL", "105", "improved")]), COLUMNS);
        let measured = table.measure(&FontContext::new(), &TextLayout::new(), 180.0);
        let expected = [55.0, 55.0, 30.0, 40.0];
        for (w, e) in measured.col_widths.iter().zip(expected) {
            assert!((w - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_status_is_capitalised_and_coloured() {
        let table = MetricTable::from_panel(
            &panel(&[("LDL", "105", "improved"), ("Apo B", "90", "borderline")]),
            COLUMNS,
        );
        assert_eq!(table.rows[0].status, "Improved");
        assert_eq!(table.rows[0].status_color, Palette::STATUS_IMPROVED);
        assert_eq!(table.rows[1].status, "Borderline");
        assert_eq!(table.rows[1].status_color, Palette::STATUS_NEUTRAL);
    }

    #[test]
    fn test_single_line_rows_share_a_height() {
        let table = MetricTable::from_panel(
            &panel(&[("LDL", "105", "improved"), ("HDL", "50", "optimal")]),
            COLUMNS,
        );
        let measured = table.measure(&FontContext::new(), &TextLayout::new(), 180.0);
        let heights: Vec<f64> = measured.rows.iter().map(|r| r.height).collect();
        assert_eq!(heights.len(), 3);
        let single = MetricTable::line_height() + 2.0 * CELL_PADDING;
        for h in heights {
            assert!((h - single).abs() < 1e-9);
        }
    }

    #[test]
    fn test_long_cell_grows_its_row() {
        let long_name = "Lipoprotein(a) particle concentration measured by immunoassay";
        let table = MetricTable::from_panel(&panel(&[(long_name, "12", "optimal")]), COLUMNS);
        let measured = table.measure(&FontContext::new(), &TextLayout::new(), 180.0);
        let heights: Vec<f64> = measured.rows.iter().map(|r| r.height).collect();
        assert!(heights[1] > heights[0]);
    }

    #[test]
    fn test_draw_shades_header_and_alternate_rows() {
        let table = MetricTable::from_panel(
            &panel(&[("A", "1", "optimal"), ("B", "2", "optimal"), ("C", "3", "optimal")]),
            COLUMNS,
        );
        let fonts = FontContext::new();
        let measured = table.measure(&fonts, &TextLayout::new(), 180.0);
        let mut cursor = LayoutCursor::new(&LayoutConfig::panel());
        measured.draw(&mut cursor, &fonts, 15.0, 50.0);
        let pages = cursor.finish();

        let fills: Vec<Color> = pages[0]
            .elements
            .iter()
            .filter_map(|e| match e.draw {
                DrawCommand::Rect { fill } => Some(fill),
                _ => None,
            })
            .collect();
        assert_eq!(
            fills,
            vec![Palette::PANEL_BLUE, Palette::ROW_SHADE, Palette::ROW_SHADE]
        );

        let texts: Vec<&str> = pages[0].texts().collect();
        assert_eq!(&texts[..4], &HEADERS);
        assert!(texts.contains(&"Optimal"));
    }

    #[test]
    fn test_long_table_repeats_header_on_each_page() {
        let metrics: Vec<(String, String)> = (0..60)
            .map(|i| (format!("Metric {}", i + 1), format!("{} mg/dL", 90 + i)))
            .collect();
        let rows: Vec<(&str, &str, &str)> = metrics
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str(), "optimal"))
            .collect();
        let table = MetricTable::from_panel(&panel(&rows), COLUMNS);
        let fonts = FontContext::new();
        let measured = table.measure(&fonts, &TextLayout::new(), 180.0);
        let mut cursor = LayoutCursor::new(&LayoutConfig::panel());
        assert!(measured.height() > cursor.content_height());

        let start = measured
            .draw_across_pages(&mut cursor, &fonts, 15.0, "metric table")
            .unwrap();
        assert_eq!(start, Placement { page: 0, y: 20.0 });
        let pages = cursor.finish();
        assert!(pages.len() >= 2);

        let mut names = 0;
        for page in &pages {
            let texts: Vec<&str> = page.texts().collect();
            assert_eq!(&texts[..4], &HEADERS);
            names += texts.iter().filter(|t| t.starts_with("Metric ")).count();
            assert!(page.elements.iter().all(|e| e.y <= 277.0));
        }
        assert_eq!(names, 60);
    }
}
