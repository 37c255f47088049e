//! Pattern matching over words.
//!
//! Matching is linear with two backtracking constructs: a wildcard tries the
//! remainder of the pattern at every later position until one succeeds, and
//! an optional is tried first expanded in place, then absent. Every other
//! atom consumes exactly one token.
//!
//! Target references never reach this module: the field parsers reject them
//! in targets, and environments are expanded with the matched span before
//! evaluation.

use log::{debug, trace};
use smol_str::SmolStr;

use itertools::Itertools;

use crate::pattern::{Atom, Environment, Pattern, Target};
use crate::word::Word;

/// Match `atoms` at `pos`, staying within `[pos, end)`. Returns the number
/// of tokens consumed.
pub fn match_at(word: &Word, atoms: &[Atom], pos: usize, end: usize) -> Option<usize> {
    let Some((first, rest)) = atoms.split_first() else {
        return Some(0);
    };
    match first {
        Atom::Optional(sub) => {
            let mut expanded = sub.atoms.clone();
            expanded.extend_from_slice(rest);
            match match_at(word, &expanded, pos, end) {
                Some(run) => Some(run),
                None => match_at(word, rest, pos, end),
            }
        }
        Atom::Wildcard => {
            for resume in pos..=end {
                if let Some(run) = match_at(word, rest, resume, end) {
                    return Some(resume - pos + run);
                }
            }
            None
        }
        Atom::TargetRef(_) => {
            debug!("stray target reference reached the matcher; no match");
            None
        }
        atom => {
            if pos < end && atom.accepts(word.tokens()[pos].as_str()) {
                match_at(word, rest, pos + 1, end).map(|run| run + 1)
            } else {
                None
            }
        }
    }
}

/// Smallest `i` in `[start, end)` where `pattern` matches, with the matched
/// run length. `None` if it matches nowhere in the range.
pub fn find(word: &Word, pattern: &Pattern, start: usize, end: usize) -> Option<(usize, usize)> {
    for i in start..end {
        if let Some(run) = match_at(word, &pattern.atoms, i, end) {
            return Some((i, run));
        }
    }
    None
}

/// Does `pattern` occur anywhere in `word`? The empty pattern always does.
pub fn contains(word: &Word, pattern: &Pattern) -> bool {
    pattern.is_empty() || find(word, pattern, 0, word.len()).is_some()
}

/// Evaluate one environment against a match of length `run` at `pos`.
/// `matched` is the matched target span, used to expand `%` and `<`.
pub fn match_env(
    env: &Environment,
    word: &Word,
    pos: usize,
    run: usize,
    matched: &[SmolStr],
) -> bool {
    match env {
        Environment::Anywhere(pat) => contains(word, &pat.expand_target(matched)),
        Environment::Local { before, after } => {
            let left_ok = if pos == 0 {
                // the word edge can only satisfy a null left context
                before.is_empty()
            } else {
                let reversed = word.reversed();
                let start = word.len() - pos;
                let before = before.expand_target(matched);
                match_at(&reversed, &before.atoms, start, reversed.len()).is_some()
            };
            let after = after.expand_target(matched);
            left_ok && match_at(word, &after.atoms, pos + run, word.len()).is_some()
        }
    }
}

/// Every position where `target` matches, in decreasing order, after count
/// selection. Environment and exception gating happens later, at application
/// time, because earlier (higher-position) edits are visible to the gates of
/// later candidates.
///
/// An empty target pattern matches at every inter-token slot strictly inside
/// the flanking boundaries, which is the epenthesis candidate set.
pub fn target_candidates(word: &Word, target: &Target) -> Vec<(usize, usize)> {
    let mut found: Vec<(usize, usize)> = Vec::new();
    if target.pattern.is_empty() {
        for slot in 1..word.len() {
            found.push((slot, 0));
        }
    } else {
        let mut from = 0;
        while let Some((pos, run)) = find(word, &target.pattern, from, word.len()) {
            found.push((pos, run));
            from = pos + 1;
        }
    }
    trace!("target '{}' matches at {:?}", target, found);
    let selected: Vec<(usize, usize)> = if target.count.is_empty() {
        found
    } else {
        target
            .count
            .iter()
            .filter_map(|&ordinal| {
                let hit = found.get(ordinal).copied();
                if hit.is_none() {
                    debug!("count selector {} exceeds {} matches; skipped", ordinal, found.len());
                }
                hit
            })
            .collect()
    };
    selected
        .into_iter()
        .sorted_by(|a, b| b.0.cmp(&a.0))
        .dedup()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::pattern::TargetKind;
    use crate::tokenizer::Graphemes;

    fn word(text: &str) -> Word {
        Word::parse(text, &Graphemes::default())
    }

    fn lit(s: &str) -> Atom {
        Atom::Literal(SmolStr::new(s))
    }

    fn pat(atoms: Vec<Atom>) -> Pattern {
        Pattern::new(atoms)
    }

    #[test]
    fn literal_run() {
        let w = word("katana");
        let p = pat(vec![lit("a"), lit("t")]);
        assert_eq!(find(&w, &p, 0, w.len()), Some((2, 2)));
        assert_eq!(find(&w, &p, 3, w.len()), None);
    }

    #[test]
    fn boundary_anchors() {
        let w = word("ka");
        let p = pat(vec![lit("a"), Atom::Boundary]);
        assert_eq!(find(&w, &p, 0, w.len()), Some((2, 2)));
    }

    #[test]
    fn category_matches_members() {
        let w = word("pik");
        let v = Category::new(vec![SmolStr::new("a"), SmolStr::new("i")]);
        let p = pat(vec![Atom::Category(v)]);
        assert_eq!(find(&w, &p, 0, w.len()), Some((2, 1)));
    }

    #[test]
    fn wildcard_spans_variable_runs() {
        let w = word("kataka");
        let p = pat(vec![lit("k"), Atom::Wildcard, lit("a"), Atom::Boundary]);
        // the wildcard absorbs "atak", the final "a#" closes the match
        assert_eq!(find(&w, &p, 0, w.len()), Some((1, 7)));
    }

    #[test]
    fn optional_prefers_presence() {
        let w = word("kata");
        let p = pat(vec![Atom::Optional(pat(vec![lit("a")])), lit("t")]);
        assert_eq!(find(&w, &p, 0, w.len()), Some((2, 2)));
        // absent branch: match at the t itself
        assert_eq!(find(&w, &p, 3, w.len()), Some((3, 1)));
    }

    #[test]
    fn match_positions_are_ordered_and_in_range() {
        let w = word("banana");
        let t = Target::every(pat(vec![lit("a")]));
        let hits = target_candidates(&w, &t);
        assert_eq!(hits, vec![(6, 1), (4, 1), (2, 1)]);
        for (p, _) in hits {
            assert!(p < w.len());
        }
    }

    #[test]
    fn count_selection_is_zero_based() {
        let w = word("banana");
        let t = Target::new(pat(vec![lit("a")]), vec![0, 2]);
        assert_eq!(target_candidates(&w, &t), vec![(6, 1), (2, 1)]);
        let t = Target::new(pat(vec![lit("a")]), vec![7]);
        assert!(target_candidates(&w, &t).is_empty());
    }

    #[test]
    fn epenthesis_slots_stay_inside_boundaries() {
        let w = word("ab");
        let t = Target::every(Pattern::empty());
        assert_eq!(target_candidates(&w, &t), vec![(3, 0), (2, 0), (1, 0)]);
    }

    #[test]
    fn local_env_is_anchored() {
        let w = word("kata");
        // t _ #  around the final "a"
        let env = Environment::Local {
            before: pat(vec![lit("t")]).mirror(),
            after: pat(vec![Atom::Boundary]),
        };
        assert!(match_env(&env, &w, 4, 1, &[SmolStr::new("a")]));
        assert!(!match_env(&env, &w, 2, 1, &[SmolStr::new("a")]));
    }

    #[test]
    fn left_edge_needs_null_context() {
        let w = word("ab");
        let env = Environment::Local {
            before: pat(vec![lit("x")]),
            after: Pattern::empty(),
        };
        assert!(!match_env(&env, &w, 0, 1, &[]));
        let null = Environment::Local { before: Pattern::empty(), after: Pattern::empty() };
        assert!(match_env(&null, &w, 0, 1, &[]));
    }

    #[test]
    fn anywhere_env_scans_whole_word() {
        let w = word("kata");
        let env = Environment::Anywhere(pat(vec![lit("k")]));
        assert!(match_env(&env, &w, 3, 1, &[]));
        let env = Environment::Anywhere(pat(vec![lit("z")]));
        assert!(!match_env(&env, &w, 3, 1, &[]));
    }

    #[test]
    fn target_refs_expand_in_envs() {
        // env demands a copy of the matched span immediately after the slot
        let w = word("panna");
        let env = Environment::Local {
            before: Pattern::empty(),
            after: pat(vec![Atom::TargetRef(TargetKind::Matched)]),
        };
        let matched = [SmolStr::new("n"), SmolStr::new("a")];
        assert!(match_env(&env, &w, 4, 0, &matched));
        assert!(!match_env(&env, &w, 3, 0, &matched));
    }
}
