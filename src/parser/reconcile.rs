use std::sync::LazyLock;

use regex::Regex;

use super::blocks::RawBlock;
use super::household::parse_household_line;

static PAREN_DECOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(\d+\)$").unwrap());
static PLUS_DECOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\+\s*\d+$").unwrap());
static KIDS_DECOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+\d+\s*kids?$").unwrap());

/// One import row: interpreted household plus the category it belongs to.
/// `category_name` is either an existing category's canonical name or a
/// new-category candidate's first-seen casing. Tiers are never inferred from
/// text; the caller assigns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHousehold {
    pub name: String,
    pub guest_count: u32,
    pub category_name: String,
}

/// Result of reconciling parsed blocks against the known categories.
#[derive(Debug, Clone, Default)]
pub struct ImportPreview {
    pub households: Vec<ParsedHousehold>,
    /// Category names found in the text that match nothing known,
    /// deduplicated case-insensitively, first-seen casing kept.
    pub new_categories: Vec<String>,
}

/// Strip guest-count decorations a user might mistakenly leave on a category
/// line, e.g. "Friends (4)", "Family +1", "Cousins 2 kids".
///
/// Unconditional: a category legitimately named "Team (4)" loses its
/// parenthetical too. Kept that way for compatibility with how pasted lists
/// are actually written.
pub fn clean_category_name(name: &str) -> String {
    let cleaned = PAREN_DECOR_RE.replace(name.trim(), "");
    let cleaned = PLUS_DECOR_RE.replace(&cleaned, "");
    let cleaned = KIDS_DECOR_RE.replace(&cleaned, "");
    cleaned.trim().to_string()
}

/// Match each block's category against the known names (case-insensitive,
/// trimmed), interpret its household lines, and collect the category names
/// that would have to be created.
///
/// Blocks whose lines all parse to empty names register nothing: a category
/// mentioned but populated with no guests is not created.
pub fn reconcile(blocks: &[RawBlock], existing_categories: &[String]) -> ImportPreview {
    let mut preview = ImportPreview::default();

    for block in blocks {
        let mut cleaned = clean_category_name(&block.category_name);
        if cleaned.is_empty() {
            // The whole line was a decoration; keep the raw text rather
            // than silently losing the block.
            cleaned = block.category_name.trim().to_string();
        }
        let lower = cleaned.to_lowercase();

        let canonical = existing_categories
            .iter()
            .find(|e| e.trim().to_lowercase() == lower)
            .map(|e| e.trim().to_string())
            .or_else(|| {
                preview
                    .new_categories
                    .iter()
                    .find(|c| c.to_lowercase() == lower)
                    .cloned()
            });

        let parsed: Vec<_> = block
            .household_lines
            .iter()
            .map(|line| parse_household_line(line))
            .filter(|p| !p.name.is_empty())
            .collect();
        if parsed.is_empty() {
            continue;
        }

        let category_name = match canonical {
            Some(name) => name,
            None => {
                preview.new_categories.push(cleaned.clone());
                cleaned
            }
        };

        for p in parsed {
            preview.households.push(ParsedHousehold {
                name: p.name,
                guest_count: p.guest_count,
                category_name: category_name.clone(),
            });
        }
    }

    preview
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::blocks::split_into_blocks;

    fn run(text: &str, existing: &[&str]) -> ImportPreview {
        let existing: Vec<String> = existing.iter().map(|s| s.to_string()).collect();
        reconcile(&split_into_blocks(text), &existing)
    }

    #[test]
    fn strips_count_decorations() {
        assert_eq!(clean_category_name("Friends (4)"), "Friends");
        assert_eq!(clean_category_name("Family +1"), "Family");
        assert_eq!(clean_category_name("Family + 2"), "Family");
        assert_eq!(clean_category_name("Cousins 2 kids"), "Cousins");
        assert_eq!(clean_category_name("  Friends  "), "Friends");
    }

    #[test]
    fn plain_names_untouched() {
        assert_eq!(clean_category_name("Bride's Family"), "Bride's Family");
    }

    #[test]
    fn new_category_collected() {
        let preview = run("Friends\nBob", &[]);
        assert_eq!(preview.new_categories, vec!["Friends"]);
        assert_eq!(preview.households.len(), 1);
        assert_eq!(preview.households[0].category_name, "Friends");
    }

    #[test]
    fn existing_category_keeps_canonical_casing() {
        let preview = run("FRIENDS\nBob", &["Friends"]);
        assert!(preview.new_categories.is_empty());
        assert_eq!(preview.households[0].category_name, "Friends");
    }

    #[test]
    fn case_variants_merge_into_one_candidate() {
        let preview = run("Family\nA\n\nFAMILY\nB\n\nfamily\nC", &[]);
        assert_eq!(preview.new_categories, vec!["Family"]);
        for h in &preview.households {
            assert_eq!(h.category_name, "Family");
        }
        assert_eq!(preview.households.len(), 3);
    }

    #[test]
    fn empty_block_registers_nothing() {
        let preview = run("Family\n\nFriends\nBob", &[]);
        assert_eq!(preview.new_categories, vec!["Friends"]);
        assert_eq!(preview.households.len(), 1);
        assert_eq!(preview.households[0].name, "Bob");
    }

    #[test]
    fn decorated_category_matches_existing() {
        let preview = run("Friends (4)\nBob", &["Friends"]);
        assert!(preview.new_categories.is_empty());
        assert_eq!(preview.households[0].category_name, "Friends");
    }

    #[test]
    fn guest_counts_flow_through() {
        let preview = run("Family\nHarry, Ginny\n\nFriends\nAlice & Bob", &[]);
        let counts: Vec<u32> = preview.households.iter().map(|h| h.guest_count).collect();
        assert_eq!(counts, vec![2, 2]);
    }
}
