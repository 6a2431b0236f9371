//! # Page Sink
//!
//! The last stage of an export. Once layout has produced every page the
//! total is known, so page numbers can be stamped; after that the pages are
//! serialised and the bytes written to disk under a predictable name.
//!
//! The footer pass only appends text inside the bottom margin, which layout
//! never writes into, so it can't push anything onto another page.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::font::FontContext;
use crate::layout::{DrawCommand, LayoutConfig, LayoutElement, LayoutPage};
use crate::model::{ReportMeta, MM_PER_PT};
use crate::pdf::{DocumentInfo, PdfWriter};
use crate::style::{Palette, TextStyle};

const FOOTER_STYLE: TextStyle = TextStyle::regular(10.0, Palette::FOOTER_GRAY);

/// Which export an artifact came from. Part of the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Conversations,
    HealthReport,
}

impl ArtifactKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Conversations => "Conversations",
            Self::HealthReport => "Health_Report",
        }
    }

    pub fn document_title(&self, subject: &str) -> String {
        match self {
            Self::Conversations => format!("Healthcare Conversation History: {}", subject),
            Self::HealthReport => format!("{} - Comprehensive Health Report", subject),
        }
    }
}

pub struct PageSink {
    footer: bool,
    footer_offset: f64,
    footer_x: f64,
    fonts: FontContext,
    writer: PdfWriter,
}

impl PageSink {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            footer: config.footer,
            footer_offset: config.footer_offset,
            footer_x: config.page.margin.left,
            fonts: FontContext::new(),
            writer: PdfWriter::new(),
        }
    }

    /// Write "Page i of n" and the generation date on every page.
    pub fn stamp_footers(&self, pages: &mut [LayoutPage], meta: &ReportMeta) {
        let total = pages.len();
        let generated = format!("Generated on {}", meta.generated_at.format("%-m/%-d/%Y"));
        let generated_width = self.width_of(&generated);

        for (i, page) in pages.iter_mut().enumerate() {
            let y = page.height - self.footer_offset;
            let number = format!("Page {} of {}", i + 1, total);
            let number_width = self.width_of(&number);

            let centred = (page.width - number_width) / 2.0;
            push_footer_text(page, centred, y, number_width, number);
            push_footer_text(page, self.footer_x, y, generated_width, generated.clone());
        }
        debug!(pages = total, "footers stamped");
    }

    /// Stamp footers (when enabled) and serialise to PDF bytes.
    pub fn finalize(
        &self,
        mut pages: Vec<LayoutPage>,
        meta: &ReportMeta,
        kind: ArtifactKind,
    ) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(ExportError::Render("layout produced no pages".into()));
        }
        if self.footer {
            self.stamp_footers(&mut pages, meta);
        }
        let info = DocumentInfo {
            title: kind.document_title(&meta.subject),
            author: meta.physician.clone(),
            subject: Some(meta.subject.clone()),
            created: meta.generated_at,
        };
        Ok(self.writer.write(&pages, &info))
    }

    fn width_of(&self, text: &str) -> f64 {
        self.fonts
            .measure_string(text, FOOTER_STYLE.font, FOOTER_STYLE.size)
            * MM_PER_PT
    }
}

fn push_footer_text(page: &mut LayoutPage, x: f64, y: f64, width: f64, text: String) {
    page.elements.push(LayoutElement {
        x,
        y,
        width,
        height: FOOTER_STYLE.size * MM_PER_PT,
        draw: DrawCommand::Text {
            text,
            style: FOOTER_STYLE,
        },
    });
}

/// `{Subject}_{Kind}_{YYYY-MM-DD}.pdf`, with whitespace runs in the subject
/// turned into single underscores and anything unsafe in a file name
/// replaced.
pub fn artifact_file_name(subject: &str, kind: ArtifactKind, date: NaiveDate) -> String {
    let subject: String = subject
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}_{}.pdf", subject, kind.label(), date.format("%Y-%m-%d"))
}

/// Write `bytes` to `dir/name` atomically: the data goes to a temporary file
/// in the same directory, which is then renamed over the target. A failed
/// export never leaves a partial file behind.
pub fn save_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| ExportError::Persist {
        path: path.clone(),
        source: e.error,
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "artifact saved");
    Ok(path)
}
