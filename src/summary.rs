use crate::db::{Category, Household, Selection, Tier};

/// Households with no stated RSVP likelihood are assumed at 75%.
const DEFAULT_RSVP_PROBABILITY: u32 = 75;

/// One cell of the category×tier grid.
pub struct SummaryCell {
    pub guest_count: u32,
    /// False when an event filter is active and this cell is not selected.
    pub included: bool,
}

pub struct SummaryRow {
    pub category_name: String,
    pub cells: Vec<SummaryCell>,
    pub total: u32,
}

pub struct SummaryGrid {
    pub tier_names: Vec<String>,
    pub rows: Vec<SummaryRow>,
    pub tier_totals: Vec<u32>,
    pub grand_total: u32,
}

fn cell_guest_count(households: &[Household], category_id: i64, tier_id: i64) -> u32 {
    households
        .iter()
        .filter(|h| h.category_id == category_id && h.tier_id == tier_id)
        .map(|h| h.guest_count)
        .sum()
}

fn is_selected(selections: Option<&[Selection]>, category_id: i64, tier_id: i64) -> bool {
    match selections {
        // No event filter: everything counts.
        None => true,
        Some(sel) => sel
            .iter()
            .any(|s| s.category_id == category_id && s.tier_id == tier_id),
    }
}

/// Build the category×tier guest-count grid. With `selections` set, cells
/// outside the event are shown but excluded from every total.
pub fn build_summary(
    categories: &[Category],
    tiers: &[Tier],
    households: &[Household],
    selections: Option<&[Selection]>,
) -> SummaryGrid {
    let mut rows = Vec::with_capacity(categories.len());
    let mut tier_totals = vec![0u32; tiers.len()];
    let mut grand_total = 0u32;

    for category in categories {
        let mut cells = Vec::with_capacity(tiers.len());
        let mut row_total = 0u32;
        for (ti, tier) in tiers.iter().enumerate() {
            let guest_count = cell_guest_count(households, category.id, tier.id);
            let included = is_selected(selections, category.id, tier.id);
            if included {
                row_total += guest_count;
                tier_totals[ti] += guest_count;
                grand_total += guest_count;
            }
            cells.push(SummaryCell {
                guest_count,
                included,
            });
        }
        rows.push(SummaryRow {
            category_name: category.name.clone(),
            cells,
            total: row_total,
        });
    }

    SummaryGrid {
        tier_names: tiers.iter().map(|t| t.name.clone()).collect(),
        rows,
        tier_totals,
        grand_total,
    }
}

fn is_invited(household: &Household, selections: &[Selection]) -> bool {
    selections
        .iter()
        .any(|s| s.category_id == household.category_id && s.tier_id == household.tier_id)
}

/// Total guests across households in the event's selected cells.
pub fn invited_count(households: &[Household], selections: &[Selection]) -> u32 {
    households
        .iter()
        .filter(|h| is_invited(h, selections))
        .map(|h| h.guest_count)
        .sum()
}

/// Probability-weighted headcount for an event: sum of guest_count ×
/// rsvp/100 over invited households, rounded to the nearest whole guest.
pub fn expected_attendance(households: &[Household], selections: &[Selection]) -> u32 {
    let expected: f64 = households
        .iter()
        .filter(|h| is_invited(h, selections))
        .map(|h| {
            let p = h.rsvp_probability.unwrap_or(DEFAULT_RSVP_PROBABILITY);
            f64::from(h.guest_count) * f64::from(p) / 100.0
        })
        .sum();
    expected.round() as u32
}

// ── Tests ──
