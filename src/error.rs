//! Structured error types for careprint exports.
//!
//! An export either produces a complete document or fails as a whole.
//! Nothing in here is recovered from internally; errors travel up to the
//! export entry point, which is the only place they are reported.

use std::path::PathBuf;

/// The unified error type returned by all public careprint functions.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON input failed to parse as conversation records or test panels.
    #[error("failed to parse records: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A layout configuration file was malformed.
    #[error("invalid layout configuration: {0}")]
    Config(String),

    /// A single line, or a table header with one row, is taller than an
    /// empty page.
    #[error("{block} needs {height:.1}mm but a page only holds {available:.1}mm")]
    BlockTooTall {
        block: &'static str,
        height: f64,
        available: f64,
    },

    /// Layout or PDF generation failed.
    #[error("render error: {0}")]
    Render(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The finished artifact could not be moved into place.
    #[error("could not save {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the record schema. Check field names, types and timestamps.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input; is the JSON truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        ExportError::Parse { source: e, hint }
    }
}
