//! Relevance scoring over the chooser tree.
//!
//! Every alias starts a pass at score 1. Each search term then either adds
//! to the score or knocks the alias out (score 0) for the rest of the pass.

use serde::Serialize;

use crate::LibId;
use crate::matcher::{CombinedMatcher, tokenize};
use crate::tree::{NodeData, NodeId, NodeKind, SymbolTree};

pub const EXACT_NAME_SCORE: u32 = 1000;
pub const NAME_MATCH_SCORE: u32 = 20;
pub const LIBRARY_MATCH_SCORE: u32 = 19;
pub const SEARCH_TEXT_MATCH_SCORE: u32 = 17;
pub const MAX_FUZZY_SCORE: u32 = 10;
pub const MATCHER_BONUS: u32 = 2;

/// Terms shorter than this never match on description or fuzzily.
const MIN_LOOSE_TERM_LEN: usize = 2;
/// Skim points per fuzzy score step.
const FUZZY_SCALE: i64 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub node: NodeId,
    pub lib_id: LibId,
    pub score: u32,
}

/// Bonus for matching early: `maximum - position`, floored at zero.
fn position_score(position: usize, maximum: u32) -> u32 {
    maximum.saturating_sub(u32::try_from(position).unwrap_or(u32::MAX))
}

fn fuzzy_score(skim: i64) -> u32 {
    u32::try_from((skim / FUZZY_SCALE).clamp(0, i64::from(MAX_FUZZY_SCORE) - 1)).unwrap_or(0) + 1
}

/// Score one alias against one term; `None` means the alias is out.
pub fn score_term(
    matcher: &CombinedMatcher,
    match_name: &str,
    library_name: &str,
    search_text: &str,
) -> Option<u32> {
    let loose = matcher.pattern_len() >= MIN_LOOSE_TERM_LEN;

    if matcher.pattern() == match_name {
        // The exact pattern is also a substring of the name.
        let fired = matcher.find(match_name).map_or(1, |hit| hit.matchers_fired);
        return Some(EXACT_NAME_SCORE + MATCHER_BONUS * fired);
    }
    if let Some(hit) = matcher.find(match_name) {
        return Some(
            NAME_MATCH_SCORE
                + position_score(hit.position, NAME_MATCH_SCORE)
                + MATCHER_BONUS * hit.matchers_fired,
        );
    }
    if let Some(hit) = matcher.find(library_name) {
        return Some(LIBRARY_MATCH_SCORE + MATCHER_BONUS * hit.matchers_fired);
    }
    if let Some(hit) = matcher.find(search_text) {
        // One or two letters show up in nearly every description.
        return loose.then(|| {
            SEARCH_TEXT_MATCH_SCORE
                + position_score(hit.position, SEARCH_TEXT_MATCH_SCORE)
                + MATCHER_BONUS * hit.matchers_fired
        });
    }
    if loose {
        return matcher.fuzzy(match_name).map(fuzzy_score);
    }
    None
}

impl SymbolTree {
    /// Put every alias back to the unfiltered baseline.
    pub fn reset_score(&mut self) {
        for id in self.ids().collect::<Vec<_>>() {
            let node = self.node_mut(id);
            match node.kind() {
                NodeKind::Alias | NodeKind::Unit | NodeKind::Root => node.score = 1,
                NodeKind::Library => {}
            }
        }
        self.propagate_scores();
    }

    /// Apply one term to all aliases still in the running.
    pub fn update_score(&mut self, matcher: &CombinedMatcher) {
        for lib in self.libraries().to_vec() {
            let library_name = self.node(lib).match_name.clone();
            for alias in self.node(lib).children.clone() {
                let node = self.node(alias);
                if node.score == 0 {
                    continue;
                }
                let NodeData::Alias { search_text, .. } = &node.data else {
                    continue;
                };
                let delta = score_term(matcher, &node.match_name, &library_name, search_text);
                let node = self.node_mut(alias);
                node.score = match delta {
                    Some(delta) => node.score.saturating_add(delta),
                    None => 0,
                };
            }
        }
        self.propagate_scores();
    }

    /// Libraries take their best child's score; units mirror their alias.
    fn propagate_scores(&mut self) {
        for lib in self.libraries().to_vec() {
            let mut best = 0;
            for alias in self.node(lib).children.clone() {
                let score = self.node(alias).score;
                best = best.max(score);
                for unit in self.node(alias).children.clone() {
                    self.node_mut(unit).score = score;
                }
            }
            self.node_mut(lib).score = best;
        }
    }

    /// Score, filter and order the tree for `search`.
    pub fn apply_search(&mut self, search: &str) {
        self.reset_score();
        for term in tokenize(search) {
            self.update_score(&CombinedMatcher::new(&term));
        }
        self.sort_nodes();
    }

    /// Visible aliases, best first, ties in insertion order.
    pub fn hits(&self) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = Vec::new();
        for lib in self.visible_children(NodeId::ROOT) {
            for alias in self.visible_children(lib) {
                let node = self.node(alias);
                if let Some(lib_id) = node.lib_id() {
                    hits.push(SearchHit {
                        node: alias,
                        lib_id: lib_id.clone(),
                        score: node.score,
                    });
                }
            }
        }
        // NodeIds are allocated in insertion order.
        hits.sort_by(|a, b| b.score.cmp(&a.score).then(a.node.cmp(&b.node)));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(term: &str, name: &str, library: &str, text: &str) -> Option<u32> {
        score_term(&CombinedMatcher::new(term), name, library, text)
    }

    #[test]
    fn test_tiers() {
        assert_eq!(score("lm358", "lm358", "amplifier", ""), Some(1002));
        // prefix: 20 + 20 + 2
        assert_eq!(score("lm3", "lm358", "amplifier", ""), Some(42));
        // position 2: 20 + 18 + 2
        assert_eq!(score("358", "lm358", "amplifier", ""), Some(40));
        assert_eq!(score("ampl", "lm358", "amplifier", ""), Some(21));
        // "dual" at char 0 of the search text: 17 + 17 + 2
        assert_eq!(score("dual", "lm358", "amplifier", "dual opamp"), Some(36));
        assert_eq!(score("xyz", "lm358", "amplifier", "dual opamp"), None);
    }

    #[test]
    fn test_short_terms_skip_search_text() {
        assert_eq!(score("d", "lm358", "amplifier", "dual opamp"), None);
        assert_eq!(score("l", "lm358", "amplifier", ""), Some(42));
    }

    #[test]
    fn test_fuzzy_is_lowest_tier() {
        let fuzzy = score("lm58", "lm358", "amplifier", "").unwrap();
        assert!((1..=MAX_FUZZY_SCORE).contains(&fuzzy));
        let late_substring = score("58", "xxxxxxxxxxxxxxxxxxxxxxxxxlm358", "lib", "").unwrap();
        assert!(late_substring > fuzzy);
    }

    #[test]
    fn test_score_saturates() {
        use crate::kicad::symbol_lib::SymbolEntry;
        use crate::tree::LoadStatus;

        let mut tree = SymbolTree::new();
        let lib = tree.add_library("Device", "", LoadStatus::Loaded);
        let alias = tree.add_alias(lib, LibId::new("Device", "R"), &SymbolEntry::new("R"), false);
        tree.node_mut(alias).score = u32::MAX - 1;

        tree.update_score(&CombinedMatcher::new("r"));
        assert_eq!(tree.node(alias).score, u32::MAX);
        assert_eq!(tree.node(lib).score, u32::MAX);
    }

    #[test]
    fn test_position_score() {
        assert_eq!(position_score(0, 20), 20);
        assert_eq!(position_score(19, 20), 1);
        assert_eq!(position_score(25, 20), 0);
    }
}
