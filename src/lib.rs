//! # careprint
//!
//! A paginated clinical-document engine.
//!
//! careprint turns structured health records (care-team conversations and
//! diagnostic test panels) into fixed-size printable pages. The page is the
//! unit of layout: every block is measured before it is placed, and a block
//! that doesn't fit moves to the next page whole. Nothing is laid out on an
//! endless canvas and cut up afterwards.
//!
//! ## Architecture
//!
//! ```text
//! Records (JSON/API)
//!       ↓
//!   [model]  Conversation records, test panels, page geometry
//!       ↓
//!   [assemble]  Group by day / panel, emit blocks in order
//!       ↓
//!   [layout]  Cursor, page breaks, blocks, metric tables
//!       ↓            (measured with [text] and [font])
//!   [sink]  Footers, naming, atomic save
//!       ↓
//!   [pdf]  Serialize to PDF bytes
//! ```

pub mod assemble;
pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod sink;
pub mod style;
pub mod text;

use tracing::info;

pub use error::{ExportError, Result};
pub use layout::LayoutConfig;
pub use model::{ConversationRecord, ReportMeta, TestPanel};
pub use sink::{artifact_file_name, save_artifact, ArtifactKind};

use sink::PageSink;

/// Render a conversation history to PDF bytes.
///
/// Records are grouped by calendar day. Days appear in the order they are
/// first seen and records within a day keep the order given, so callers
/// pass records sorted by time.
pub fn export_conversations(
    records: &[ConversationRecord],
    meta: &ReportMeta,
    config: &LayoutConfig,
) -> Result<Vec<u8>> {
    config.validate()?;
    let pages = assemble::assemble_conversations(records, meta, config)?;
    let page_count = pages.len();
    let bytes = PageSink::new(config).finalize(pages, meta, ArtifactKind::Conversations)?;
    info!(
        records = records.len(),
        pages = page_count,
        bytes = bytes.len(),
        "conversation export complete"
    );
    Ok(bytes)
}

/// Render a comprehensive health report, one section per test panel, to
/// PDF bytes.
pub fn export_panels(panels: &[TestPanel], meta: &ReportMeta, config: &LayoutConfig) -> Result<Vec<u8>> {
    config.validate()?;
    let pages = assemble::assemble_panels(panels, meta, config)?;
    let page_count = pages.len();
    let bytes = PageSink::new(config).finalize(pages, meta, ArtifactKind::HealthReport)?;
    info!(
        panels = panels.len(),
        pages = page_count,
        bytes = bytes.len(),
        "panel export complete"
    );
    Ok(bytes)
}

/// Parse a JSON array of conversation records.
pub fn parse_conversations_json(json: &str) -> Result<Vec<ConversationRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a JSON array of test panels.
pub fn parse_panels_json(json: &str) -> Result<Vec<TestPanel>> {
    Ok(serde_json::from_str(json)?)
}
