/*!
 * Script-aware text segmentation.
 *
 * Each supported writing system has one immutable rule set holding three
 * patterns: where to capitalize after, where a clause may be broken and where
 * a new speaker turn begins. Every pattern matches a `before` zone and an
 * `after` zone; the text between the two zones is the separator that is
 * dropped when the text is cut at the break.
 *
 * Candidate matches come from a regular expression and are then checked
 * against the rule set's exclusions, which cover the context a match must not
 * be preceded by (the dot of an abbreviation or an elided word).
 *
 * English only refines where clauses break. Its capitalize-after and dialogue
 * patterns are built from the Latin ones.
 */

use std::ops::Range;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{Result, SubtitleError};

/// Title abbreviations that do not end an English sentence
const TITLE_ABBREVIATIONS: &[&str] = &["Dr", "Jr", "Mr", "Ms", "Sr", "St", "Mrs"];

/// A break point: the zone kept at the end of the first piece and the zone
/// starting the second one, as byte ranges into the segmented text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Break {
    pub before: Range<usize>,
    pub after: Range<usize>,
}

impl Break {
    /// Byte range of the dropped separator between the two zones
    pub fn separator(&self) -> Range<usize> {
        self.before.end..self.after.start
    }
}

/// Context a candidate match must not be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exclusion {
    /// A single dot with another dot among the two preceding characters
    /// (`e.g.`, `a.m.`)
    DottedDot,
    /// A single dot right after an English title abbreviation
    TitleAbbreviation,
    /// Comma-class punctuation not attached to a preceding word
    DetachedPunctuation,
}

/// One compiled segmentation pattern with its exclusions
#[derive(Debug)]
pub struct ScriptPattern {
    regex: Regex,
    exclusions: &'static [Exclusion],
}

impl ScriptPattern {
    fn new(pattern: &str, exclusions: &'static [Exclusion]) -> Self {
        Self {
            regex: Regex::new(pattern).expect("Invalid segmentation regex"),
            exclusions,
        }
    }

    /// Source of the underlying regular expression
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// All non-overlapping break points in `text`, left to right
    pub fn breaks(&self, text: &str) -> Vec<Break> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let before = caps.name("before")?.range();
                let after = caps.name("after")?.range();
                (!self.is_excluded(text, &before)).then_some(Break { before, after })
            })
            .collect()
    }

    fn is_excluded(&self, text: &str, before: &Range<usize>) -> bool {
        let core = text[before.clone()].trim_end_matches(['\'', '"']);
        let preceding = &text[..before.start];
        self.exclusions.iter().any(|exclusion| match exclusion {
            Exclusion::DottedDot => core == "." && preceding.chars().rev().take(2).any(|c| c == '.'),
            Exclusion::TitleAbbreviation => core == "." && is_title_abbreviation(trailing_word(preceding)),
            Exclusion::DetachedPunctuation => {
                matches!(core, "," | ";" | ":") && preceding.chars().next_back().is_none_or(char::is_whitespace)
            }
        })
    }
}

/// The run of word characters `text` ends with
fn trailing_word(text: &str) -> &str {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map_or(text.len(), |(index, _)| index);
    &text[start..]
}

/// Abbreviations match with the first letter in either case
fn is_title_abbreviation(word: &str) -> bool {
    word.is_ascii()
        && TITLE_ABBREVIATIONS.iter().any(|abbreviation| {
            word.len() == abbreviation.len()
                && word[..1].eq_ignore_ascii_case(&abbreviation[..1])
                && word[1..] == abbreviation[1..]
        })
}

/// Segmentation rules of one writing system
#[derive(Debug)]
pub struct ScriptRules {
    /// Identifier, e.g. `latin-english`
    pub id: &'static str,
    /// Display name, e.g. `Latin (English)`
    pub name: &'static str,
    pub capitalize_after: ScriptPattern,
    pub clause_separator: ScriptPattern,
    pub dialogue_separator: ScriptPattern,
}

const CAPITALIZE_AFTER: &str = r#"(?P<before>[.?!]['"]?)(?: |$)(?P<after>)"#;
const CLAUSE_SEPARATOR: &str = r#"(?P<before>(?:\.{2,}|[.?!,;:])['"]?)(?: |$)(?P<after>)"#;
const DIALOGUE_SEPARATOR: &str = r"(?P<before>) (?P<after>- )";

const LATIN_CLAUSE: &[Exclusion] = &[Exclusion::DottedDot, Exclusion::DetachedPunctuation];
const ENGLISH_CLAUSE: &[Exclusion] = &[
    Exclusion::DottedDot,
    Exclusion::TitleAbbreviation,
    Exclusion::DetachedPunctuation,
];

fn latin_rules(id: &'static str, name: &'static str, clause_exclusions: &'static [Exclusion]) -> ScriptRules {
    ScriptRules {
        id,
        name,
        capitalize_after: ScriptPattern::new(CAPITALIZE_AFTER, &[Exclusion::DottedDot]),
        clause_separator: ScriptPattern::new(CLAUSE_SEPARATOR, clause_exclusions),
        dialogue_separator: ScriptPattern::new(DIALOGUE_SEPARATOR, &[]),
    }
}

static RULES: Lazy<Vec<ScriptRules>> = Lazy::new(|| {
    vec![
        latin_rules("latin", "Latin", LATIN_CLAUSE),
        latin_rules("latin-english", "Latin (English)", ENGLISH_CLAUSE),
    ]
});

/// Look up a rule set by identifier or display name
pub fn rules(script: &str) -> Result<&'static ScriptRules> {
    RULES
        .iter()
        .find(|rules| rules.id == script || rules.name == script)
        .ok_or_else(|| SubtitleError::UnknownScript(script.to_string()))
}

/// Identifiers and display names of every supported script
pub fn available_scripts() -> Vec<(&'static str, &'static str)> {
    RULES.iter().map(|rules| (rules.id, rules.name)).collect()
}

/// Break points between the clauses of `text`
pub fn split_clauses(text: &str, script: &str) -> Result<Vec<Break>> {
    let breaks = rules(script)?.clause_separator.breaks(text);
    debug!("Found {} clause breaks for script {}", breaks.len(), script);
    Ok(breaks)
}

/// Break points between the speaker turns of `text`
pub fn split_dialogue(text: &str, script: &str) -> Result<Vec<Break>> {
    Ok(rules(script)?.dialogue_separator.breaks(text))
}

/// Pattern marking positions after which the next letter is capitalized
pub fn get_capitalize_after(script: &str) -> Result<&'static ScriptPattern> {
    Ok(&rules(script)?.capitalize_after)
}

/// Byte offsets in `text` where capitalization should start
pub fn capitalize_positions(text: &str, script: &str) -> Result<Vec<usize>> {
    Ok(get_capitalize_after(script)?
        .breaks(text)
        .into_iter()
        .map(|b| b.after.start)
        .filter(|&position| position < text.len())
        .collect())
}

/// Cut `text` at `breaks`, dropping separators and empty pieces
pub fn apply_breaks<'a>(text: &'a str, breaks: &[Break]) -> Vec<&'a str> {
    let mut pieces = Vec::with_capacity(breaks.len() + 1);
    let mut start = 0;
    for b in breaks {
        pieces.push(&text[start..b.before.end]);
        start = b.after.start;
    }
    pieces.push(&text[start..]);
    pieces.retain(|piece| !piece.is_empty());
    pieces
}
