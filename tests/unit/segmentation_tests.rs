/*!
 * Tests for clause and dialogue segmentation
 */

use subkit::segmentation::{available_scripts, capitalize_positions, rules};
use subkit::{apply_breaks, get_capitalize_after, split_clauses, split_dialogue, SubtitleError};

/// Title abbreviations do not end an English clause
#[test]
fn test_splitClauses_english_withTitleAbbreviation_shouldNotBreakAfterIt() {
    let text = "Dr. Smith left. She returned.";
    let breaks = split_clauses(text, "Latin (English)").unwrap();

    let break_after = |end: usize| breaks.iter().any(|b| b.before.end == end);
    assert!(!break_after("Dr.".len()));
    assert!(break_after("Dr. Smith left.".len()));
}

/// Every listed abbreviation is suppressed, with the first letter in either case
#[test]
fn test_splitClauses_english_withEachAbbreviation_shouldNotBreak() {
    for abbreviation in ["Dr", "Jr", "Mr", "Ms", "Sr", "St", "Mrs", "mrs", "st"] {
        let text = format!("Ask {}. Jones now", abbreviation);
        let breaks = split_clauses(&text, "latin-english").unwrap();
        assert!(breaks.is_empty(), "{}", abbreviation);
    }
    // Only whole words count
    let breaks = split_clauses("I saw Hamstr. Then left", "latin-english").unwrap();
    assert_eq!(breaks.len(), 1);
}

/// Latin has no abbreviation exceptions
#[test]
fn test_splitClauses_latin_withTitleAbbreviation_shouldBreak() {
    let breaks = split_clauses("Mr. Smith", "latin").unwrap();
    assert_eq!(breaks.len(), 1);
}

/// A trailing terminator yields an empty after zone at the end of the text
#[test]
fn test_splitClauses_atEndOfText_shouldHaveEmptyAfterZone() {
    let text = "Stop!";
    let breaks = split_clauses(text, "latin").unwrap();
    assert_eq!(breaks.len(), 1);
    assert_eq!(breaks[0].before, 4..5);
    assert_eq!(breaks[0].after, 5..5);
}

/// Quotes after the terminator stay in the before zone
#[test]
fn test_splitClauses_withClosingQuote_shouldKeepQuoteBefore() {
    let text = "He said \"go.\" Then ran";
    let breaks = split_clauses(text, "latin").unwrap();
    assert_eq!(apply_breaks(text, &breaks), vec!["He said \"go.\"", "Then ran"]);
}

/// Speaker turns split before the hyphen marker
#[test]
fn test_splitDialogue_withTwoTurns_shouldSplitBeforeMarker() {
    let text = "Hello there - Goodbye now";
    let breaks = split_dialogue(text, "latin").unwrap();
    assert_eq!(breaks.len(), 1);
    assert_eq!(breaks[0].before.len(), 0);
    assert_eq!(&text[breaks[0].after.clone()], "- ");
    assert_eq!(breaks[0].separator(), 11..12);
    assert_eq!(apply_breaks(text, &breaks), vec!["Hello there", "- Goodbye now"]);
}

/// Hyphens inside words are not turn markers
#[test]
fn test_splitDialogue_withHyphenatedWord_shouldNotSplit() {
    assert!(split_dialogue("A well-known fact", "latin-english").unwrap().is_empty());
}

/// Unknown scripts fail every lookup
#[test]
fn test_lookups_withUnknownScript_shouldFail() {
    let expected = SubtitleError::UnknownScript("klingon".to_string());
    assert_eq!(split_clauses("Qapla'. Batlh", "klingon").unwrap_err(), expected);
    assert_eq!(split_dialogue("- nuqneH", "klingon").unwrap_err(), expected);
    assert_eq!(get_capitalize_after("klingon").unwrap_err(), expected);
    assert!(rules("").is_err());
}

/// Capitalization positions skip dotted abbreviations
#[test]
fn test_capitalizePositions_withDottedAbbreviation_shouldSkipIt() {
    let text = "see e.g. this. and that";
    assert_eq!(capitalize_positions(text, "latin").unwrap(), vec![15]);
    assert!(get_capitalize_after("Latin").unwrap().regex().is_match(text));
}

/// Rule sets are reachable by identifier and by display name
#[test]
fn test_rules_byIdOrName_shouldReturnSameRuleSet() {
    for (id, name) in available_scripts() {
        assert!(std::ptr::eq(rules(id).unwrap(), rules(name).unwrap()));
    }
}

/// English reuses the Latin capitalization and dialogue patterns
#[test]
fn test_rules_english_shouldShareLatinNonClausePatterns() {
    let latin = rules("latin").unwrap();
    let english = rules("latin-english").unwrap();
    assert_eq!(english.capitalize_after.as_str(), latin.capitalize_after.as_str());
    assert_eq!(english.dialogue_separator.as_str(), latin.dialogue_separator.as_str());
    assert_eq!(english.clause_separator.as_str(), latin.clause_separator.as_str());
    // Only the clause exclusions differ
    assert_ne!(split_clauses("Mr. Smith", "latin").unwrap(), split_clauses("Mr. Smith", "latin-english").unwrap());
}
