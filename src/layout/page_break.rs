//! # Page Break Decisions
//!
//! Logic for deciding whether a block is placed on the current page or
//! pushed to the next one. Blocks are split only when no single page can
//! hold them, so there are three outcomes.

/// What to do with a block of a known height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakDecision {
    /// The block fits in the remaining space.
    Place,
    /// Start a new page and place the block at its top.
    MoveToNextPage,
    /// The block is taller than an empty page. It has to continue across
    /// pages piece by piece.
    TooTall,
}

/// Decide where a block goes.
///
/// `overflows` says whether the block would cross the applicable limit on
/// the current page, `page_capacity` is the space an empty page offers. A
/// page that has nothing on it yet is never abandoned: moving on would leave
/// it blank and the next page would look the same.
pub fn decide_break(
    overflows: bool,
    page_capacity: f64,
    height: f64,
    at_page_top: bool,
) -> BreakDecision {
    if height > page_capacity {
        return BreakDecision::TooTall;
    }

    if !overflows || at_page_top {
        return BreakDecision::Place;
    }

    BreakDecision::MoveToNextPage
}
