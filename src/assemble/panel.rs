//! Comprehensive health reports: a centred title block, then one section per
//! test panel, each after the first on a page of its own.

use tracing::debug;

use crate::error::Result;
use crate::layout::blocks::{Block, BlockRenderer, MeasuredBlock};
use crate::layout::{LayoutConfig, LayoutCursor, LayoutPage, Placement};
use crate::model::{ReportMeta, TestPanel};

/// Space between the title block and the first panel.
const TITLE_GAP: f64 = 3.0;
const TABLE_GAP: f64 = 10.0;
const PANEL_GAP: f64 = 10.0;

pub struct PanelAssembler {
    renderer: BlockRenderer,
    cursor: LayoutCursor,
    table_columns: [f64; 4],
    force_breaks: bool,
    panels: usize,
}

impl PanelAssembler {
    pub fn start(config: &LayoutConfig, meta: &ReportMeta) -> Result<Self> {
        let renderer = BlockRenderer::new();
        let mut cursor = LayoutCursor::new(config);

        renderer.render(
            &Block::centered_title(format!("{} - Comprehensive Health Report", meta.subject)),
            &mut cursor,
        )?;
        renderer.render(
            &Block::subtitle(
                format!("Date: {}", meta.generated_at.format("%-m/%-d/%Y")),
                6.0,
            ),
            &mut cursor,
        )?;
        if let Some(physician) = meta.physician.as_deref() {
            renderer.render(
                &Block::subtitle(format!("Physician: {}", physician), 6.0),
                &mut cursor,
            )?;
        }
        cursor.advance(TITLE_GAP);

        Ok(Self {
            renderer,
            cursor,
            table_columns: config.table_columns,
            force_breaks: config.force_panel_breaks,
            panels: 0,
        })
    }

    /// Write one panel section.
    pub fn push_group(&mut self, panel: &TestPanel) -> Result<()> {
        if self.panels > 0 && self.force_breaks {
            self.cursor.break_page();
        }
        debug!(panel = %panel.id, page = self.cursor.page_index() + 1, "panel section");

        let header = self.measure(&Block::panel_header(panel));
        let date = self.measure(&Block::panel_date(panel));
        self.cursor
            .ensure_group_fits(header.name, header.height + date.height)?;
        self.renderer.draw(&header, &mut self.cursor);
        self.renderer.draw(&date, &mut self.cursor);

        let table = self.measure(&Block::metric_table(panel, self.table_columns));
        self.heading("Key Metrics", &table)?;
        self.place(&table)?;
        self.cursor.advance(TABLE_GAP);

        let interpretation = self.measure(&Block::clinical_paragraph(panel.interpretation.as_str()));
        self.heading("Clinical Interpretation", &interpretation)?;
        self.place(&interpretation)?;

        if let Some(notes) = panel.physician_notes() {
            let notes = self.measure(&Block::clinical_paragraph(notes));
            self.heading("Physician Notes", &notes)?;
            self.place(&notes)?;
        }

        if !panel.recommendations.is_empty() {
            let items: Vec<MeasuredBlock> = panel
                .recommendations
                .iter()
                .enumerate()
                .map(|(i, rec)| self.measure(&Block::recommendation(i + 1, rec)))
                .collect();
            self.heading("Recommendations", &items[0])?;
            for item in &items {
                self.place(item)?;
            }
        }

        self.cursor.advance(PANEL_GAP);
        self.panels += 1;
        Ok(())
    }

    fn measure(&self, block: &Block) -> MeasuredBlock {
        self.renderer.measure(block, &self.cursor)
    }

    fn heading(&mut self, text: &str, next: &MeasuredBlock) -> Result<Placement> {
        self.renderer
            .render_heading(&Block::section_heading(text), next, &mut self.cursor)
    }

    fn place(&mut self, block: &MeasuredBlock) -> Result<Placement> {
        self.renderer.place(block, &mut self.cursor)
    }

    pub fn finish(self) -> Vec<LayoutPage> {
        self.cursor.finish()
    }
}
