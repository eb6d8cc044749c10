//! Term matchers used by the search pass.
//!
//! A [`CombinedMatcher`] runs every applicable matcher for one search term and
//! reports how many fired and the earliest position any of them matched at.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use regex::{Regex, RegexBuilder};

const REGEX_SIZE_LIMIT: usize = 1 << 20;
const REGEX_META: &[char] = &[
    '.', '^', '$', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '\\',
];

/// Result of a successful [`CombinedMatcher::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchHit {
    /// Character offset of the earliest match
    pub position: usize,
    /// Number of matchers that found the term
    pub matchers_fired: u32,
}

pub struct CombinedMatcher {
    pattern: String,
    wildcard: Option<Regex>,
    regex: Option<Regex>,
    fuzzy: SkimMatcherV2,
}

impl CombinedMatcher {
    /// `term` is expected to be lowercase already.
    pub fn new(term: &str) -> Self {
        let wildcard = term
            .contains(['*', '?'])
            .then(|| compile(&wildcard_to_regex(term)))
            .flatten();
        let regex = term.contains(REGEX_META).then(|| compile(term)).flatten();
        Self {
            pattern: term.to_string(),
            wildcard,
            regex,
            fuzzy: SkimMatcherV2::default(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Character length of the pattern.
    pub fn pattern_len(&self) -> usize {
        self.pattern.chars().count()
    }

    pub fn find(&self, haystack: &str) -> Option<MatchHit> {
        if self.pattern.is_empty() {
            return None;
        }

        let found = [
            haystack.find(self.pattern.as_str()),
            self.wildcard.as_ref().and_then(|re| first_non_empty(re, haystack)),
            self.regex.as_ref().and_then(|re| first_non_empty(re, haystack)),
        ];

        let mut hit: Option<MatchHit> = None;
        for byte_pos in found.into_iter().flatten() {
            let position = haystack[..byte_pos].chars().count();
            hit = Some(match hit {
                Some(prev) => MatchHit {
                    position: prev.position.min(position),
                    matchers_fired: prev.matchers_fired + 1,
                },
                None => MatchHit {
                    position,
                    matchers_fired: 1,
                },
            });
        }
        hit
    }

    /// Skim-style subsequence score of the pattern against `haystack`.
    pub fn fuzzy(&self, haystack: &str) -> Option<i64> {
        if self.pattern.is_empty() {
            return None;
        }
        self.fuzzy.fuzzy_match(haystack, &self.pattern)
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).size_limit(REGEX_SIZE_LIMIT).build() {
        Ok(re) => Some(re),
        Err(e) => {
            log::trace!("ignoring search term as regex: {e}");
            None
        }
    }
}

/// Empty matches (e.g. `r*` against anything) say nothing about relevance.
fn first_non_empty(re: &Regex, haystack: &str) -> Option<usize> {
    re.find_iter(haystack)
        .find(|m| !m.as_str().is_empty())
        .map(|m| m.start())
}

fn wildcard_to_regex(term: &str) -> String {
    let mut out = String::with_capacity(term.len() * 2);
    for ch in term.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out
}

/// Lowercase, whitespace-separated search terms.
pub fn tokenize(search: &str) -> Vec<String> {
    search.split_whitespace().map(str::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_position_in_chars() {
        let m = CombinedMatcher::new("sistor");
        let hit = m.find("résistor").unwrap();
        assert_eq!(hit.position, 2);
        assert_eq!(hit.matchers_fired, 1);
        assert!(m.find("capacitor").is_none());
    }

    #[test]
    fn test_wildcard_and_regex_fire_together() {
        let m = CombinedMatcher::new("lm3?8");
        // wildcard `lm3.8` and regex `lm3?8` (optional 3) both apply
        let hit = m.find("opamp lm358").unwrap();
        assert_eq!(hit.position, 6);
        assert_eq!(hit.matchers_fired, 1);

        let hit = m.find("lm8 and lm358").unwrap();
        assert_eq!(hit.position, 0);
        assert_eq!(hit.matchers_fired, 2);
    }

    #[test]
    fn test_empty_regex_matches_ignored() {
        let m = CombinedMatcher::new("q*");
        assert!(m.find("abc").is_none());
        assert_eq!(m.find("abq").unwrap().position, 2);
    }

    #[test]
    fn test_invalid_regex_falls_back_to_substring() {
        let m = CombinedMatcher::new("r(");
        assert!(m.regex.is_none());
        assert_eq!(m.find("xr(").unwrap().position, 1);
    }

    #[test]
    fn test_fuzzy_subsequence() {
        let m = CombinedMatcher::new("lm58");
        assert!(m.fuzzy("lm358").is_some());
        assert!(m.fuzzy("opa333").is_none());
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("  Op  AMP\tdual "), vec!["op", "amp", "dual"]);
        assert!(tokenize("   ").is_empty());
    }
}
