//! # PDF Serializer
//!
//! Takes the laid-out pages and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. Exports only ever need filled
//! rectangles and single lines of text in the two standard Helvetica faces,
//! so the subset of the format we produce is small: no embedded fonts, no
//! images, one compressed content stream per page.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Layout coordinates are millimetres from the top-left corner; PDF user
//! space is points from the bottom-left. The conversion happens here and
//! nowhere else.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use chrono::NaiveDateTime;
use miniz_oxide::deflate::compress_to_vec_zlib;
use tracing::warn;

use crate::font::encoding::encode_winansi;
use crate::font::StandardFont;
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};
use crate::model::PT_PER_MM;
use crate::style::Color;

/// Document information dictionary entries.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub created: NaiveDateTime,
}

pub struct PdfWriter;

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    /// Object id of each standard font, in `StandardFont::ALL` order.
    font_objects: Vec<(StandardFont, usize)>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], info: &DocumentInfo) -> Vec<u8> {
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = fonts, then content streams and page objects
        let mut builder = PdfBuilder {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            font_objects: Vec::new(),
        };

        for font in StandardFont::ALL {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let id = builder.push(dict.into_bytes());
            builder.font_objects.push((font, id));
        }
        let font_resources = builder
            .font_objects
            .iter()
            .map(|(font, id)| format!("/{} {} 0 R", font.resource_name(), id))
            .collect::<Vec<_>>()
            .join(" ");

        let mut page_obj_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let content = self.build_content_stream(page);
            let compressed = compress_to_vec_zlib(&content, 6);

            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = builder.push(content_data);

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                page.width * PT_PER_MM,
                page.height * PT_PER_MM,
                content_obj_id,
                font_resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.push(Self::info_dict(info));
        Self::serialize(&builder, info_obj_id)
    }

    fn info_dict(info: &DocumentInfo) -> Vec<u8> {
        let mut dict: Vec<u8> = b"<< /Title ".to_vec();
        dict.extend_from_slice(&pdf_string(&info.title));
        if let Some(author) = &info.author {
            dict.extend_from_slice(b" /Author ");
            dict.extend_from_slice(&pdf_string(author));
        }
        if let Some(subject) = &info.subject {
            dict.extend_from_slice(b" /Subject ");
            dict.extend_from_slice(&pdf_string(subject));
        }
        let _ = write!(
            dict,
            " /Producer (careprint {}) /CreationDate (D:{}) >>",
            env!("CARGO_PKG_VERSION"),
            info.created.format("%Y%m%d%H%M%S")
        );
        dict
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &LayoutPage) -> Vec<u8> {
        let mut stream = Vec::new();
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height);
        }
        stream
    }

    /// Write a single layout element as PDF operators.
    fn write_element(&self, stream: &mut Vec<u8>, element: &LayoutElement, page_height: f64) {
        match &element.draw {
            DrawCommand::Rect { fill } => {
                let mut ops = String::new();
                let _ = writeln!(
                    ops,
                    "{} rg\n{:.2} {:.2} {:.2} {:.2} re f",
                    color_operands(fill),
                    element.x * PT_PER_MM,
                    (page_height - element.y - element.height) * PT_PER_MM,
                    element.width * PT_PER_MM,
                    element.height * PT_PER_MM,
                );
                stream.extend_from_slice(ops.as_bytes());
            }
            DrawCommand::Text { text, style } => {
                let mut ops = String::new();
                let _ = write!(
                    ops,
                    "BT\n/{} {:.1} Tf\n{} rg\n{:.2} {:.2} Td\n",
                    style.font.resource_name(),
                    style.size,
                    color_operands(&style.color),
                    element.x * PT_PER_MM,
                    (page_height - element.y) * PT_PER_MM,
                );
                stream.extend_from_slice(ops.as_bytes());
                stream.extend_from_slice(&pdf_string(text));
                stream.extend_from_slice(b" Tj\nET\n");
            }
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(obj);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

fn color_operands(c: &Color) -> String {
    format!("{:.3} {:.3} {:.3}", c.r, c.g, c.b)
}

/// Encode `text` as a literal PDF string in WinAnsiEncoding, parentheses
/// included. Bytes outside printable ASCII are written as octal escapes so
/// content streams stay 7-bit clean.
fn pdf_string(text: &str) -> Vec<u8> {
    let (bytes, substituted) = encode_winansi(text);
    if substituted > 0 {
        warn!(substituted, text, "characters outside WinAnsiEncoding were replaced");
    }

    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            0x20..=0x7E => out.push(b),
            _ => {
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out.push(b')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextStyle;
    use chrono::NaiveDate;

    fn info() -> DocumentInfo {
        DocumentInfo {
            title: "Health Report".into(),
            author: Some("Dr. Warren".into()),
            subject: Some("Joseph Martinez".into()),
            created: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(9, 30, 5)
                .unwrap(),
        }
    }

    fn blank_page() -> LayoutPage {
        LayoutPage {
            width: 210.0,
            height: 297.0,
            elements: vec![],
        }
    }

    #[test]
    fn test_pdf_string_escapes() {
        assert_eq!(pdf_string("Hello (World)"), b"(Hello \\(World\\))".to_vec());
        assert_eq!(pdf_string("back\\slash"), b"(back\\\\slash)".to_vec());
        assert_eq!(pdf_string("caf\u{e9}"), b"(caf\\351)".to_vec());
        assert_eq!(pdf_string("HDL \u{2192} 50"), b"(HDL -> 50)".to_vec());
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let bytes = PdfWriter::new().write(&[blank_page()], &info());
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(4).any(|w| w == b"xref"));
        assert!(bytes.windows(7).any(|w| w == b"trailer"));
    }

    #[test]
    fn test_info_dictionary() {
        let bytes = PdfWriter::new().write(&[blank_page()], &info());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title (Health Report)"));
        assert!(text.contains("/Author (Dr. Warren)"));
        assert!(text.contains("/Subject (Joseph Martinez)"));
        assert!(text.contains("/CreationDate (D:20250301093005)"));
    }

    #[test]
    fn test_mediabox_in_points() {
        let bytes = PdfWriter::new().write(&[blank_page()], &info());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/MediaBox [0 0 595.28 841.89]"));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn test_both_fonts_registered() {
        let bytes = PdfWriter::new().write(&[blank_page()], &info());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/BaseFont /Helvetica-Bold "));
    }

    #[test]
    fn test_text_position_flips_y_axis() {
        let writer = PdfWriter::new();
        let mut page = blank_page();
        page.elements.push(LayoutElement {
            x: 20.0,
            y: 20.0,
            width: 30.0,
            height: 4.0,
            draw: DrawCommand::Text {
                text: "Hi".into(),
                style: TextStyle::bold(12.0, Color::BLACK),
            },
        });
        let stream = String::from_utf8(writer.build_content_stream(&page)).unwrap();
        assert!(stream.contains("/F2 12.0 Tf"));
        assert!(stream.contains("56.69 785.20 Td"));
        assert!(stream.contains("(Hi) Tj"));
    }
}
