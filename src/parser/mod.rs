pub mod blocks;
pub mod household;
pub mod reconcile;

pub use blocks::RawBlock;
pub use household::{parse_household_line, ParsedLine};
pub use reconcile::{clean_category_name, ImportPreview, ParsedHousehold};

/// Two-stage pipeline: pasted text -> category blocks -> interpreted rows
/// reconciled against the known categories.
///
/// Pure and deterministic; safe to re-run on every edit of the input.
pub fn parse_import(text: &str, existing_categories: &[String]) -> ImportPreview {
    let raw_blocks = blocks::split_into_blocks(text);
    reconcile::reconcile(&raw_blocks, existing_categories)
}

// ── Tests ──
