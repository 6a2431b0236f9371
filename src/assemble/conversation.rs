//! Conversation history exports: a title block, then one section per day.

use tracing::debug;

use crate::error::Result;
use crate::layout::blocks::{Block, BlockRenderer};
use crate::layout::{LayoutConfig, LayoutCursor, LayoutPage};
use crate::model::{ConversationRecord, ReportMeta};

use super::DateGroup;

const MESSAGE_GAP: f64 = 5.0;
const GROUP_GAP: f64 = 5.0;

pub struct ConversationAssembler {
    renderer: BlockRenderer,
    cursor: LayoutCursor,
}

impl ConversationAssembler {
    /// Open the first page and write the title block.
    pub fn start(config: &LayoutConfig, meta: &ReportMeta) -> Result<Self> {
        let renderer = BlockRenderer::new();
        let mut cursor = LayoutCursor::new(config);

        renderer.render(&Block::title("Healthcare Conversation History"), &mut cursor)?;
        renderer.render(
            &Block::subtitle(format!("Complete journey with {}", meta.subject), 10.0),
            &mut cursor,
        )?;
        renderer.render(&Block::generated_line(meta.generated_at), &mut cursor)?;

        Ok(Self { renderer, cursor })
    }

    /// Write one day: its header, then every record under it.
    pub fn push_group(&mut self, group: &DateGroup<'_>) -> Result<()> {
        debug!(day = %group.day, records = group.records.len(), "conversation group");

        let header = self
            .renderer
            .measure(&Block::date_header(group.day), &self.cursor);
        self.cursor.ensure_group_fits(header.name, header.height)?;
        self.renderer.draw(&header, &mut self.cursor);

        for record in &group.records {
            self.push_record(record)?;
            self.cursor.advance(MESSAGE_GAP);
        }

        self.cursor.advance(GROUP_GAP);
        Ok(())
    }

    fn push_record(&mut self, record: &ConversationRecord) -> Result<()> {
        let r = &self.renderer;
        let cursor = &mut self.cursor;

        r.render(&Block::sender_line(record), cursor)?;
        r.render(&Block::message_body(record.message.as_str()), cursor)?;
        if let Some(topic) = record.topic() {
            r.render(&Block::topic(topic), cursor)?;
        }
        if let Some(decision) = record.decision() {
            r.render(&Block::decision(decision), cursor)?;
        }
        if let Some(reason) = record.reason() {
            r.render(&Block::reason(reason), cursor)?;
        }
        Ok(())
    }

    pub fn finish(self) -> Vec<LayoutPage> {
        self.cursor.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::record;
    use super::super::group_by_date;
    use super::*;
    use crate::layout::DrawCommand;
    use chrono::NaiveDate;

    fn meta() -> ReportMeta {
        ReportMeta::new(
            "Joseph Martinez",
            NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(14, 5, 9)
                .unwrap(),
        )
    }

    fn assemble(records: &[ConversationRecord]) -> Vec<LayoutPage> {
        let mut a = ConversationAssembler::start(&LayoutConfig::conversation(), &meta()).unwrap();
        for g in group_by_date(records) {
            a.push_group(&g).unwrap();
        }
        a.finish()
    }

    #[test]
    fn test_title_block() {
        let pages = assemble(&[]);
        assert_eq!(pages.len(), 1);
        let texts: Vec<&str> = pages[0].texts().collect();
        assert_eq!(
            texts,
            vec![
                "Healthcare Conversation History",
                "Complete journey with Joseph Martinez",
                "Generated on 3/1/2025 at 2:05:09 PM",
            ]
        );
    }

    #[test]
    fn test_optional_parts_are_skipped() {
        let mut full = record("a", "2025-01-15T09:30:00", "Let's talk sleep.");
        full.topic = Some("Sleep".into());
        full.decision = Some("".into());
        full.reason = Some("Poor sleep scores".into());
        let pages = assemble(&[full]);
        let texts: Vec<&str> = pages[0].texts().collect();
        assert!(texts.contains(&"Topic: Sleep"));
        assert!(texts.contains(&"Reason: Poor sleep scores"));
        assert!(!texts.iter().any(|t| t.starts_with("Decision")));
    }

    #[test]
    fn test_record_order_under_header() {
        let records = vec![
            record("a", "2025-01-15T09:30:00", "first"),
            record("b", "2025-01-15T11:00:00", "second"),
        ];
        let pages = assemble(&records);
        let texts: Vec<&str> = pages[0].texts().collect();
        let header = texts.iter().position(|t| *t == "Wednesday, January 15, 2025");
        let first = texts.iter().position(|t| *t == "first");
        let second = texts.iter().position(|t| *t == "second");
        assert!(header < first && first < second);
    }

    #[test]
    fn test_many_records_flow_onto_more_pages() {
        let records: Vec<_> = (0..60)
            .map(|i| record(&format!("m{}", i), "2025-01-15T09:30:00", "A short note."))
            .collect();
        let pages = assemble(&records);
        assert!(pages.len() > 1);
        let notes: usize = pages
            .iter()
            .map(|p| p.texts().filter(|t| *t == "A short note.").count())
            .sum();
        assert_eq!(notes, 60);
    }

    #[test]
    fn test_long_message_continues_onto_next_pages() {
        let long = "word ".repeat(1464);
        let records = vec![
            record("a", "2025-01-15T09:30:00", &long),
            record("b", "2025-01-15T10:00:00", "Follow-up."),
        ];
        let pages = assemble(&records);
        assert!(pages.len() >= 2);
        let words: usize = pages
            .iter()
            .flat_map(|p| p.texts())
            .filter(|t| t.starts_with("word"))
            .map(|t| t.split(' ').count())
            .sum();
        assert_eq!(words, 1464);
        assert!(pages.last().unwrap().texts().any(|t| t == "Follow-up."));
    }

    fn assembler_at(y: f64) -> ConversationAssembler {
        let mut a = ConversationAssembler::start(&LayoutConfig::conversation(), &meta()).unwrap();
        let to_go = y - a.cursor.y();
        a.cursor.advance(to_go);
        a
    }

    #[test]
    fn test_date_header_needs_more_room_than_a_continuation() {
        // Between the group limit (257) and the content limit (277).
        let y = 262.0;

        let mut a = assembler_at(y);
        assert!(a.cursor.will_overflow_group(10.0));
        let records = vec![record("a", "2025-01-16T08:00:00", "Next day.")];
        a.push_group(&group_by_date(&records)[0]).unwrap();
        let pages = a.finish();
        assert_eq!(pages.len(), 2);
        assert!(!pages[0].texts().any(|t| t == "Thursday, January 16, 2025"));
        assert_eq!(pages[1].elements[0].y, 20.0);
        assert!(pages[1].texts().next() == Some("Thursday, January 16, 2025"));

        let mut a = assembler_at(y);
        assert!(!a.cursor.will_overflow(7.0));
        a.push_record(&record("b", "2025-01-15T10:00:00", "Same day.")).unwrap();
        let pages = a.finish();
        assert_eq!(pages.len(), 1);
        let sender = pages[0]
            .elements
            .iter()
            .find(|e| matches!(&e.draw, DrawCommand::Text { text, .. } if text.starts_with("Ruby")))
            .unwrap();
        assert_eq!(sender.y, y);
    }
}
