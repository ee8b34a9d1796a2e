use std::sync::LazyLock;

use regex::Regex;

static PLUS_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\s*\+\s*(\d+)$").unwrap());
static PLUS_PERSON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\s*\+\s*(.+)$").unwrap());
static RELATIONSHIP_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(?:wife|husband|spouse|partner)$").unwrap());
static NAMED_KIDS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(.+?),\s*(?:and\s+)?(\w+)\s*(?:kids?|child(?:ren)?)$").unwrap());
static DESCRIPTIVE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([^,]+),\s*(.+)$").unwrap());
static HAS_RELATIONSHIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:wife|husband|partner|spouse)\b").unwrap());
static CHILD_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:and\s+)?(\w+)\s+(?:child(?:ren)?|kids?)").unwrap());
static NUMBERED_KIDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:\d+|one|two|three|four|five|six|seven|eight|nine|ten)\s+(?:child(?:ren)?|kids?)\b").unwrap()
});
static PAREN_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\s*\((\d+)\)$").unwrap());
static TRAILING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\s+(\d+)$").unwrap());
static AND_LIST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.+\s+and\s+.+$").unwrap());
static AND_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+and\s+").unwrap());
static PAIR_LIST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.+\s+(?:and|&)\s+.+$").unwrap());
static PAIR_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+(?:and|&)\s+").unwrap());
static NAME_LIST_STOPWORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:kids?|child(?:ren)?|and)\b").unwrap());

/// English counting words accepted wherever a child count may be spelled out.
const NUMBER_WORDS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

/// One interpreted household line. `needs_review` is set only when the line
/// was empty and nothing could be extracted at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub name: String,
    pub guest_count: u32,
    pub needs_review: bool,
}

impl ParsedLine {
    fn new(name: impl Into<String>, guest_count: u32) -> Self {
        ParsedLine {
            name: name.into(),
            guest_count: guest_count.max(1),
            needs_review: false,
        }
    }
}

type Rule = fn(&str) -> Option<ParsedLine>;

/// Ordered rule cascade; the first rule producing a result wins. Many lines
/// match several patterns at once ("Alice & Bob +1" is both a plus-count and
/// an "&" pair), so this ordering IS the precedence contract.
const RULES: &[Rule] = &[
    plus_count,
    plus_person,
    named_kids,
    descriptive,
    parenthetical_count,
    trailing_number,
    bare_and_list,
    comma_name_list,
];

/// Interpret a single household line into a display name and guest count.
///
/// Total and pure: every input produces a result, unparseable lines fall
/// through to a one-guest fallback rather than erroring.
pub fn parse_household_line(line: &str) -> ParsedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ParsedLine {
            name: String::new(),
            guest_count: 1,
            needs_review: true,
        };
    }

    for rule in RULES {
        if let Some(parsed) = rule(trimmed) {
            return parsed;
        }
    }

    ParsedLine::new(trimmed, 1)
}

/// "John Smith + 1" -> base guest plus N extras. The lazy left side means
/// only the final "+ N" suffix is consumed, so "Smith + Jones Family + 2"
/// keeps its full name.
fn plus_count(line: &str) -> Option<ParsedLine> {
    let caps = PLUS_COUNT_RE.captures(line)?;
    let extras: u32 = caps[2].parse().ok()?;
    Some(ParsedLine::new(caps[1].trim(), 1 + extras))
}

/// "Neville + wife" -> 2 guests under the first name; "Percy + Audrey" ->
/// 2 guests under a comma-joined name.
fn plus_person(line: &str) -> Option<ParsedLine> {
    let caps = PLUS_PERSON_RE.captures(line)?;
    let first = caps[1].trim();
    let second = caps[2].trim();

    if RELATIONSHIP_WORD_RE.is_match(second) {
        return Some(ParsedLine::new(first, 2));
    }
    Some(ParsedLine::new(format!("{}, {}", first, second), 2))
}

/// "Jane Doe, John Doe, 2 kids" / "P, N, and two kids" -> named adults plus
/// a digit-or-word child count. An unrecognized count word skips this rule
/// so later rules get a chance.
fn named_kids(line: &str) -> Option<ParsedLine> {
    let caps = NAMED_KIDS_RE.captures(line)?;
    let names = caps[1].trim();
    let kid_count = count_token(&caps[2])?;
    let name_count = names.split(',').count() as u32;
    Some(ParsedLine::new(names, name_count + kid_count))
}

/// Free-text descriptions after a single leading name: "Draco, wife and two
/// kids", "Abby, mom and dad". Falls through when the description carries no
/// countable signal.
fn descriptive(line: &str) -> Option<ParsedLine> {
    let caps = DESCRIPTIVE_RE.captures(line)?;
    let name = caps[1].trim();
    let description = caps[2].trim().to_lowercase();

    // Plain "X and Y" list with no numbered children: each segment is one
    // person on top of the leading name.
    if AND_LIST_RE.is_match(&description) && !NUMBERED_KIDS_RE.is_match(&description) {
        let parts = AND_SPLIT_RE
            .split(&description)
            .filter(|p| !p.trim().is_empty())
            .count() as u32;
        return Some(ParsedLine::new(name, 1 + parts));
    }

    let mut count = 1;
    if HAS_RELATIONSHIP_RE.is_match(&description) {
        count += 1;
    }
    if let Some(child_caps) = CHILD_PHRASE_RE.captures(&description) {
        if let Some(kids) = count_token(&child_caps[1]) {
            count += kids;
        }
    }

    if count > 1 {
        Some(ParsedLine::new(name, count))
    } else {
        None
    }
}

/// "Smith Family (4)" -> the parenthesized total.
fn parenthetical_count(line: &str) -> Option<ParsedLine> {
    let caps = PAREN_COUNT_RE.captures(line)?;
    let count: u32 = caps[2].parse().ok()?;
    Some(ParsedLine::new(caps[1].trim(), count))
}

/// "Just a name 3" -> the trailing bare integer is the total.
fn trailing_number(line: &str) -> Option<ParsedLine> {
    let caps = TRAILING_NUMBER_RE.captures(line)?;
    let count: u32 = caps[2].parse().ok()?;
    Some(ParsedLine::new(caps[1].trim(), count))
}

/// "mom and dad" / "Alice & Bob" with no leading comma-name: each segment
/// is a guest.
fn bare_and_list(line: &str) -> Option<ParsedLine> {
    if line.contains(',') || !PAIR_LIST_RE.is_match(line) {
        return None;
    }
    if line.chars().any(|c| c.is_ascii_digit()) || NUMBERED_KIDS_RE.is_match(line) {
        return None;
    }
    let parts = PAIR_SPLIT_RE
        .split(line)
        .filter(|p| !p.trim().is_empty())
        .count() as u32;
    if parts < 2 {
        return None;
    }
    Some(ParsedLine::new(line, parts))
}

/// "Harry, Ginny" -> one guest per comma segment, keeping the whole line as
/// the household name. Deliberately conservative: any digit or kid/and word
/// in a segment disqualifies the line.
fn comma_name_list(line: &str) -> Option<ParsedLine> {
    if !line.contains(',') {
        return None;
    }
    let segments: Vec<&str> = line
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.len() < 2 {
        return None;
    }
    let all_names = segments.iter().all(|s| {
        !s.chars().any(|c| c.is_ascii_digit()) && !NAME_LIST_STOPWORD_RE.is_match(s)
    });
    if !all_names {
        return None;
    }
    Some(ParsedLine::new(line, segments.len() as u32))
}

/// Parse a count token that may be digits or a counting word one..ten.
fn count_token(token: &str) -> Option<u32> {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }
    let lower = token.to_lowercase();
    NUMBER_WORDS
        .iter()
        .find(|(word, _)| *word == lower)
        .map(|(_, n)| *n)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> (String, u32) {
        let p = parse_household_line(line);
        (p.name, p.guest_count)
    }

    #[test]
    fn plus_number() {
        assert_eq!(parse("John Smith + 1"), ("John Smith".into(), 2));
        assert_eq!(parse("Bob Wilson +1"), ("Bob Wilson".into(), 2));
        assert_eq!(parse("Alice Johnson + 3"), ("Alice Johnson".into(), 4));
    }

    #[test]
    fn plus_number_keeps_full_name() {
        // Only the final "+ N" suffix is consumed.
        assert_eq!(parse("Smith + Jones Family + 2"), ("Smith + Jones Family".into(), 3));
    }

    #[test]
    fn plus_zero_extras_still_one_guest() {
        assert_eq!(parse("Single Person + 0"), ("Single Person".into(), 1));
    }

    #[test]
    fn plus_relationship_word() {
        assert_eq!(parse("Neville + wife"), ("Neville".into(), 2));
        assert_eq!(parse("Mary + husband"), ("Mary".into(), 2));
        assert_eq!(parse("Alex + spouse"), ("Alex".into(), 2));
        assert_eq!(parse("Sam + partner"), ("Sam".into(), 2));
    }

    #[test]
    fn plus_relationship_word_case_insensitive() {
        assert_eq!(parse("David + WIFE"), ("David".into(), 2));
    }

    #[test]
    fn plus_second_name_combines() {
        assert_eq!(parse("Percy + Audrey"), ("Percy, Audrey".into(), 2));
    }

    #[test]
    fn plus_count_wins_over_ampersand_pair() {
        // Precedence: plus-count beats any name-pair interpretation.
        assert_eq!(parse("Alice & Bob +1"), ("Alice & Bob".into(), 2));
    }

    #[test]
    fn kids_with_digits() {
        assert_eq!(parse("Jane Doe, John Doe, 2 kids"), ("Jane Doe, John Doe".into(), 4));
        assert_eq!(parse("Single Parent, 3 kids"), ("Single Parent".into(), 4));
        assert_eq!(parse("Parent A, Parent B, Parent C, 2 kids"), ("Parent A, Parent B, Parent C".into(), 5));
    }

    #[test]
    fn kids_singular_and_children() {
        assert_eq!(parse("Parent One, Parent Two, 1 kid"), ("Parent One, Parent Two".into(), 3));
        assert_eq!(parse("A, B, 2 children"), ("A, B".into(), 4));
        assert_eq!(parse("A, B, 1 child"), ("A, B".into(), 3));
    }

    #[test]
    fn kids_case_insensitive() {
        assert_eq!(parse("Mary Smith, Bob Smith, 1 Kids"), ("Mary Smith, Bob Smith".into(), 3));
    }

    #[test]
    fn kids_word_numbers() {
        assert_eq!(parse("P, N, and two kids"), ("P, N".into(), 4));
        assert_eq!(parse("Molly, Arthur, and three kids"), ("Molly, Arthur".into(), 5));
    }

    #[test]
    fn kids_unknown_word_falls_through() {
        // "several" is not in the counting table, so the kids rule is
        // skipped and the line lands in the fallback.
        let p = parse_household_line("A, B, several kids");
        assert_eq!(p.guest_count, 1);
    }

    #[test]
    fn descriptive_relationship_and_kids() {
        assert_eq!(parse("Draco, wife and two kids"), ("Draco".into(), 4));
        assert_eq!(parse("Bill, wife and 1 kid"), ("Bill".into(), 3));
    }

    #[test]
    fn descriptive_simple_and_list() {
        // Leading name plus each "and"-listed person.
        assert_eq!(parse("Abby, mom and dad"), ("Abby".into(), 3));
        assert_eq!(parse("Dina, husband and son"), ("Dina".into(), 3));
    }

    #[test]
    fn parenthetical() {
        assert_eq!(parse("Smith Family (4)"), ("Smith Family".into(), 4));
    }

    #[test]
    fn parenthetical_zero_clamped_to_one() {
        assert_eq!(parse("Smith Family (0)"), ("Smith Family".into(), 1));
    }

    #[test]
    fn trailing_bare_number() {
        assert_eq!(parse("Just a name 3"), ("Just a name".into(), 3));
    }

    #[test]
    fn bare_and_pair() {
        assert_eq!(parse("mom and dad"), ("mom and dad".into(), 2));
        assert_eq!(parse("Tom and Jerry and Spike"), ("Tom and Jerry and Spike".into(), 3));
    }

    #[test]
    fn bare_ampersand_pair() {
        assert_eq!(parse("Alice & Bob"), ("Alice & Bob".into(), 2));
    }

    #[test]
    fn comma_separated_names() {
        assert_eq!(parse("Harry, Ginny"), ("Harry, Ginny".into(), 2));
        assert_eq!(parse("Fred, George, Ron"), ("Fred, George, Ron".into(), 3));
    }

    #[test]
    fn comma_list_count_matches_segments() {
        for line in ["A, B", "A, B, C", "A, B, C, D"] {
            let segments = line.split(',').count() as u32;
            assert_eq!(parse_household_line(line).guest_count, segments);
        }
    }

    #[test]
    fn plain_name_is_one_guest() {
        assert_eq!(parse("Luna Lovegood"), ("Luna Lovegood".into(), 1));
    }

    #[test]
    fn leading_trailing_whitespace_trimmed() {
        assert_eq!(parse("  Luna Lovegood  "), ("Luna Lovegood".into(), 1));
    }

    #[test]
    fn empty_line_needs_review() {
        let p = parse_household_line("   ");
        assert_eq!(p.name, "");
        assert_eq!(p.guest_count, 1);
        assert!(p.needs_review);
    }

    #[test]
    fn non_empty_lines_never_need_review() {
        for line in ["x", "A, B, several kids", "??!"] {
            assert!(!parse_household_line(line).needs_review);
        }
    }

    #[test]
    fn idempotent() {
        let line = "Jane Doe, John Doe, 2 kids";
        assert_eq!(parse_household_line(line), parse_household_line(line));
    }

    #[test]
    fn guest_count_at_least_one() {
        for line in ["", "X", "X + 0", "X (0)", "Y 0", "a, b, 0 kids"] {
            assert!(parse_household_line(line).guest_count >= 1, "line: {:?}", line);
        }
    }
}
