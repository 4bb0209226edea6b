//! Termination verbs: verb tagging, lemma normalization and action-text matching

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word pattern"));

static IRREGULAR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("was", "be"),
        ("were", "be"),
        ("is", "be"),
        ("are", "be"),
        ("been", "be"),
        ("being", "be"),
        ("has", "have"),
        ("had", "have"),
        ("having", "have"),
        ("does", "do"),
        ("did", "do"),
        ("done", "do"),
        ("doing", "do"),
        ("goes", "go"),
        ("went", "go"),
        ("gone", "go"),
        ("going", "go"),
        ("took", "take"),
        ("taken", "take"),
        ("made", "make"),
        ("left", "leave"),
        ("sent", "send"),
        ("gave", "give"),
        ("given", "give"),
        ("got", "get"),
        ("gotten", "get"),
        ("came", "come"),
        ("ran", "run"),
        ("brought", "bring"),
        ("bought", "buy"),
        ("paid", "pay"),
        ("held", "hold"),
        ("kept", "keep"),
        ("told", "tell"),
        ("said", "say"),
        ("found", "find"),
        ("began", "begin"),
        ("begun", "begin"),
        ("wrote", "write"),
        ("written", "write"),
        ("saw", "see"),
        ("seen", "see"),
    ]
    .into_iter()
    .collect()
});

/// Maps a word to a normal form shared by its inflections.
///
/// Both the configured indicators and the words of an action pass through the same
/// lemmatizer, so only consistency between the two sides matters.
pub trait Lemmatizer: fmt::Debug + Send + Sync {
    /// Normal form of `word`
    fn lemma(&self, word: &str) -> String;
}

/// Suffix-stripping lemmatizer with a table of irregular verbs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleLemmatizer;

impl RuleLemmatizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn strip_inflection(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies").or_else(|| word.strip_suffix("ied")) {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if stem.len() >= 3 {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if stem.len() >= 2 {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if ["s", "x", "z", "ch", "sh"].iter().any(|s| stem.ends_with(s)) {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if stem.len() >= 2 && !["s", "u", "i"].iter().any(|s| stem.ends_with(s)) {
            return stem.to_string();
        }
    }
    word.to_string()
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

impl Lemmatizer for RuleLemmatizer {
    fn lemma(&self, word: &str) -> String {
        let word = word.to_lowercase();
        let mut stem = match IRREGULAR.get(word.as_str()) {
            Some(base) => (*base).to_string(),
            None => strip_inflection(&word),
        };
        if stem.len() > 3 && stem.ends_with('e') {
            stem.pop();
        }
        let mut tail = stem.chars().rev();
        if let (Some(last), Some(prev)) = (tail.next(), tail.next()) {
            if stem.len() > 3 && last == prev && !is_vowel(last) {
                stem.pop();
            }
        }
        stem
    }
}

/// Marks the verbs of a word sequence.
pub trait VerbTagger: fmt::Debug + Send + Sync {
    /// One flag per entry of `words`, `true` for verbs
    fn verb_flags(&self, words: &[&str]) -> Vec<bool>;
}

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "his", "her", "its", "our", "their", "each",
    "every", "some", "any", "no", "another", "whose",
];

const AUXILIARIES: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "do", "does", "did",
];

const PHRASE_BREAKS: &[&str] = &[
    "of", "in", "on", "at", "by", "for", "with", "from", "into", "onto", "over", "under", "about", "after", "before",
    "between", "through", "during", "without", "within", "until", "upon", "and", "or", "but", "if", "when", "while",
    "than", "as", "so", "because", "to", "not", "will", "would", "shall", "should", "can", "could", "may", "might",
    "must", "i", "you", "he", "she", "it", "we", "they", "who", "someone", "somebody", "everyone", "nobody",
];

/// Closed-class context tagger.
///
/// A determiner opens a noun phrase. Its first word is nominal, and so is every
/// following word until a break word, an inflected verb form (`-s`, `-ed`) or a bare
/// word after a plural noun. Auxiliaries are verbs. Words outside a noun phrase are
/// verb candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTagger;

impl RuleTagger {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn is_plural_noun(word: &str) -> bool {
    word.len() > 3 && word.ends_with('s') && !["ss", "us", "is"].iter().any(|s| word.ends_with(s))
}

fn is_inflected_verb(word: &str) -> bool {
    is_plural_noun(word) || (word.len() > 3 && word.ends_with("ed"))
}

impl VerbTagger for RuleTagger {
    fn verb_flags(&self, words: &[&str]) -> Vec<bool> {
        let mut flags = Vec::with_capacity(words.len());
        let mut phrase: Option<String> = None;
        for word in words {
            let word = word.to_lowercase();
            let w = word.as_str();
            if DETERMINERS.contains(&w) {
                phrase = Some(String::new());
                flags.push(false);
                continue;
            }
            if AUXILIARIES.contains(&w) || PHRASE_BREAKS.contains(&w) {
                phrase = None;
                flags.push(AUXILIARIES.contains(&w));
                continue;
            }
            let verb = match phrase.as_deref() {
                None => true,
                Some("") => false,
                Some(prev) => is_plural_noun(prev) || is_inflected_verb(w),
            };
            phrase = if verb { None } else { Some(word) };
            flags.push(verb);
        }
        flags
    }
}

/// Detects action texts that end the activity.
///
/// Only words tagged as verbs are lemmatized and compared with the indicators.
#[derive(Debug)]
pub struct TerminationDetector {
    indicators: Vec<String>,
    lemmas: HashSet<String>,
    lemmatizer: Box<dyn Lemmatizer>,
    tagger: Box<dyn VerbTagger>,
}

impl TerminationDetector {
    /// Detector for `indicators` using [`RuleLemmatizer`] and [`RuleTagger`]
    #[must_use]
    pub fn new<S: AsRef<str>>(indicators: &[S]) -> Self {
        let indicators: Vec<String> = indicators.iter().map(|i| i.as_ref().trim().to_string()).collect();
        let lemmas = lemmas_of(&indicators, &RuleLemmatizer);
        Self {
            indicators,
            lemmas,
            lemmatizer: Box::new(RuleLemmatizer),
            tagger: Box::new(RuleTagger),
        }
    }

    /// With `lemmatizer` for both the indicators and the matched words
    #[must_use]
    pub fn with_lemmatizer(mut self, lemmatizer: impl Lemmatizer + 'static) -> Self {
        self.lemmas = lemmas_of(&self.indicators, &lemmatizer);
        self.lemmatizer = Box::new(lemmatizer);
        self
    }

    /// With `tagger` deciding which words are verbs
    #[must_use]
    pub fn with_tagger(mut self, tagger: impl VerbTagger + 'static) -> Self {
        self.tagger = Box::new(tagger);
        self
    }

    /// First verb of `text` whose lemma is a termination lemma.
    ///
    /// A leading `[swimlane]` prefix is not searched.
    #[must_use]
    pub fn matching_word<'t>(&self, text: &'t str) -> Option<&'t str> {
        let body = match text.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
            Some((_, rest)) => rest,
            None => text,
        };
        let words: Vec<&str> = WORD.find_iter(body).map(|m| m.as_str()).collect();
        let flags = self.tagger.verb_flags(&words);
        words
            .into_iter()
            .zip(flags)
            .filter_map(|(word, verb)| verb.then_some(word))
            .find(|w| self.lemmas.contains(&self.lemmatizer.lemma(w)))
    }

    /// `text` holds a termination verb
    #[must_use]
    pub fn is_terminating(&self, text: &str) -> bool {
        self.matching_word(text).is_some()
    }
}

fn lemmas_of(indicators: &[String], lemmatizer: &dyn Lemmatizer) -> HashSet<String> {
    indicators
        .iter()
        .map(|i| lemmatizer.lemma(i))
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflections_share_a_lemma() {
        let l = RuleLemmatizer::new();
        for (a, b) in [
            ("closes", "close"),
            ("closing", "close"),
            ("closed", "close"),
            ("cancelled", "cancel"),
            ("canceling", "cancel"),
            ("stopped", "stop"),
            ("terminating", "terminate"),
            ("finishes", "finish"),
            ("ended", "end"),
            ("exits", "exit"),
            ("took", "take"),
        ] {
            assert_eq!(l.lemma(a), l.lemma(b), "{a} vs {b}");
        }
        assert_ne!(l.lemma("reserved"), l.lemma("reject"));
    }

    #[test]
    fn short_words_are_left_alone() {
        let l = RuleLemmatizer::new();
        assert_eq!(l.lemma("bed"), "bed");
        assert_eq!(l.lemma("sing"), "sing");
        assert_eq!(l.lemma("process"), "proces");
        assert_eq!(l.lemma("processes"), "proces");
    }

    #[test]
    fn detector_matches_inflected_verbs() {
        let detector = TerminationDetector::new(&["cancel", "close"]);
        assert_eq!(detector.matching_word("the clerk cancels the order"), Some("cancels"));
        assert!(detector.is_terminating("Ticket is closed."));
        assert!(!detector.is_terminating("the part is reserved"));
    }

    #[test]
    fn indicator_used_as_noun_does_not_match() {
        let detector = TerminationDetector::new(&["end", "close", "stop"]);
        assert_eq!(detector.matching_word("the clerk reads the end user agreement"), None);
        assert_eq!(detector.matching_word("the clerk locks the door of the close office"), None);
        assert_eq!(detector.matching_word("the driver waits at the bus stop"), None);
        assert_eq!(detector.matching_word("the driver stops at the bus stop"), Some("stops"));
        assert_eq!(detector.matching_word("the clerks close the office"), Some("close"));
        assert_eq!(detector.matching_word("Stop the machine"), Some("Stop"));
    }

    #[test]
    fn tagger_flags_verbs_in_context() {
        let words = ["the", "clerk", "cancels", "the", "end", "user", "agreement"];
        assert_eq!(
            RuleTagger::new().verb_flags(&words),
            vec![false, false, true, false, false, false, false]
        );
        let words = ["the", "order", "is", "closed"];
        assert_eq!(RuleTagger::new().verb_flags(&words), vec![false, false, true, true]);
    }

    #[derive(Debug)]
    struct NoVerbs;

    impl VerbTagger for NoVerbs {
        fn verb_flags(&self, words: &[&str]) -> Vec<bool> {
            vec![false; words.len()]
        }
    }

    #[test]
    fn custom_tagger_decides_the_candidates() {
        let detector = TerminationDetector::new(&["cancel"]).with_tagger(NoVerbs);
        assert!(!detector.is_terminating("cancel the order"));
    }

    #[test]
    fn swimlane_prefix_is_skipped() {
        let detector = TerminationDetector::new(&["close"]);
        assert!(!detector.is_terminating("[closing team] the team ships it"));
        assert!(detector.is_terminating("[team] the team closes it"));
    }
}
