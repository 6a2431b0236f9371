//! # Document Assembly
//!
//! Turns record collections into pages. Records are first grouped (by
//! calendar day for conversations, one group per panel for reports), then an
//! assembler walks the groups in order and emits blocks through a
//! [`BlockRenderer`](crate::layout::blocks::BlockRenderer), consulting the
//! cursor before each one.
//!
//! Assemblers are stepped one group at a time with `push_group`, so an
//! embedding can yield between groups of a long export; `finish` closes the
//! last page and returns them all.

pub mod conversation;
pub mod panel;

pub use conversation::ConversationAssembler;
pub use panel::PanelAssembler;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::Result;
use crate::layout::{LayoutConfig, LayoutPage};
use crate::model::{ConversationRecord, ReportMeta, TestPanel};

/// The records of one calendar day, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup<'a> {
    pub day: NaiveDate,
    pub records: Vec<&'a ConversationRecord>,
}

/// Group records by calendar day. Days appear in the order they are first
/// seen in the input; records within a day keep the order they were given
/// in. Input sorted by time therefore yields ascending days.
pub fn group_by_date(records: &[ConversationRecord]) -> Vec<DateGroup<'_>> {
    let mut groups: Vec<DateGroup<'_>> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();
    for record in records {
        let day = record.day();
        let slot = *index.entry(day).or_insert_with(|| {
            groups.push(DateGroup {
                day,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }
    groups
}

/// Records from a single period bucket.
pub fn records_in_period(records: &[ConversationRecord], month: u32) -> Vec<ConversationRecord> {
    records.iter().filter(|r| r.month == month).cloned().collect()
}

/// Lay out a full conversation export.
pub fn assemble_conversations(
    records: &[ConversationRecord],
    meta: &ReportMeta,
    config: &LayoutConfig,
) -> Result<Vec<LayoutPage>> {
    let mut assembler = ConversationAssembler::start(config, meta)?;
    for group in group_by_date(records) {
        assembler.push_group(&group)?;
    }
    Ok(assembler.finish())
}

/// Lay out a full panel report.
pub fn assemble_panels(
    panels: &[TestPanel],
    meta: &ReportMeta,
    config: &LayoutConfig,
) -> Result<Vec<LayoutPage>> {
    let mut assembler = PanelAssembler::start(config, meta)?;
    for panel in panels {
        assembler.push_group(panel)?;
    }
    Ok(assembler.finish())
}
