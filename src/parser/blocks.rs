/// One category block as pasted: a category name line followed by the
/// household lines under it. Transient, consumed by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub category_name: String,
    pub household_lines: Vec<String>,
}

/// Segment pasted text into category blocks.
///
/// Line-oriented: the first non-blank line opens a block as the category
/// name, following non-blank lines are its households, a blank line closes
/// the block. Blocks with zero household lines are kept here; reconciliation
/// drops them before any category is created.
pub fn split_into_blocks(text: &str) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<RawBlock> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        match current.as_mut() {
            None => {
                current = Some(RawBlock {
                    category_name: line.to_string(),
                    household_lines: Vec::new(),
                });
            }
            Some(block) => block.household_lines.push(line.to_string()),
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }
    blocks
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_blocks() {
        let blocks = split_into_blocks("Family\nHarry, Ginny\n\nFriends\nAlice & Bob");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].category_name, "Family");
        assert_eq!(blocks[0].household_lines, vec!["Harry, Ginny"]);
        assert_eq!(blocks[1].category_name, "Friends");
        assert_eq!(blocks[1].household_lines, vec!["Alice & Bob"]);
    }

    #[test]
    fn consecutive_blanks_same_as_one() {
        let single = split_into_blocks("A\nX\n\nB\nY");
        let multi = split_into_blocks("A\nX\n\n\nB\nY");
        assert_eq!(single, multi);
    }

    #[test]
    fn whitespace_only_line_is_blank() {
        let blocks = split_into_blocks("A\nX\n   \nB\nY");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn leading_and_trailing_blanks_ignored() {
        let blocks = split_into_blocks("\n\nFamily\nHarry\n\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].category_name, "Family");
        assert_eq!(blocks[0].household_lines, vec!["Harry"]);
    }

    #[test]
    fn crlf_newlines() {
        let blocks = split_into_blocks("Family\r\nHarry\r\n\r\nFriends\r\nBob");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].household_lines, vec!["Bob"]);
    }

    #[test]
    fn indented_household_lines_trimmed() {
        let blocks = split_into_blocks("Family\n    Harry\n\tGinny");
        assert_eq!(blocks[0].household_lines, vec!["Harry", "Ginny"]);
    }

    #[test]
    fn empty_block_retained_by_splitter() {
        // A category with no households survives splitting; the caller
        // drops it before category creation.
        let blocks = split_into_blocks("Family\n\nFriends\nBob");
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].household_lines.is_empty());
        assert_eq!(blocks[1].household_lines, vec!["Bob"]);
    }

    #[test]
    fn open_block_closed_at_eof() {
        let blocks = split_into_blocks("Family\nHarry");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].household_lines, vec!["Harry"]);
    }

    #[test]
    fn empty_input() {
        assert!(split_into_blocks("").is_empty());
        assert!(split_into_blocks("\n \n").is_empty());
    }
}
