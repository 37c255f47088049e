//! The ruleset driver: parse a ruleset line by line, then march the rules
//! over a lexicon.
//!
//! A ruleset interleaves category edits (any line containing `=`) with sound
//! changes. Category edits take effect immediately and shape how *later*
//! lines parse; they produce no rule. Parse errors are isolated per line:
//! the bad line is reported and dropped, the rest of the ruleset survives.
//!
//! Application follows the diachronic intuition that a newly active change
//! applies on top of the existing chain: as each rule enters, every still
//! active rule runs over every word, newest first. A rule stays active for
//! `age` passes and may re-apply up to `repeat` times per word within one
//! pass, stopping early the moment it no longer changes the word.

use log::{debug, info, warn};
use rand::Rng;

use crate::category::CategoryStore;
use crate::error::{LineDiagnostic, RuleError};
use crate::rule::{Outcome, Rule};
use crate::tokenizer::Graphemes;
use crate::word::Word;

/// Parse a ruleset, reporting per-line failures instead of aborting.
/// Category lines mutate `cats` in place and produce no rule.
pub fn parse_ruleset_verbose(
    source: &str,
    cats: &mut CategoryStore,
    graphs: &Graphemes,
) -> (Vec<Rule>, Vec<LineDiagnostic>) {
    let mut rules = Vec::new();
    let mut diagnostics = Vec::new();
    for (i, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let outcome = if CategoryStore::is_category_line(line) {
            cats.apply_line(line).map(|()| None)
        } else {
            Rule::parse(line, cats, graphs).map(Some)
        };
        match outcome {
            Ok(Some(rule)) => rules.push(rule),
            Ok(None) => {}
            Err(error) => {
                let diag = LineDiagnostic { line_no: i + 1, line: line.to_string(), error };
                warn!("dropping ruleset line: {diag}");
                diagnostics.push(diag);
            }
        }
    }
    (rules, diagnostics)
}

/// Parse a ruleset; bad lines are logged and dropped.
pub fn parse_ruleset(source: &str, cats: &mut CategoryStore, graphs: &Graphemes) -> Vec<Rule> {
    parse_ruleset_verbose(source, cats, graphs).0
}

/// Apply a parsed ruleset to a lexicon. Words come back in input order.
pub fn apply_ruleset(words: Vec<Word>, ruleset: &[Rule]) -> Result<Vec<Word>, RuleError> {
    let mut words = words;
    // (rule, passes left); rules may outlive the pass that introduced them
    let mut active: Vec<(Rule, u32)> = Vec::new();
    for rule in ruleset {
        active.push((rule.clone(), rule.flags.age));
        debug!("⏩ pass opened by '{}', {} rules active", rule.source, active.len());
        for word in words.iter_mut() {
            for (r, _) in active.iter().rev() {
                if r.flags.chance < 100 && !chance_hit(r.flags.chance) {
                    debug!("'{}' skipped by chance on {}", r.source, word);
                    continue;
                }
                let mut applications = 0;
                loop {
                    let outcome = r.apply(word).map_err(|e| {
                        RuleError::runtime_err(&format!(
                            "{e} (rule '{}' on word '{}')",
                            r.source, word
                        ))
                    })?;
                    if outcome == Outcome::Unchanged {
                        break;
                    }
                    applications += 1;
                    if r.flags.repeat != 0 && applications >= r.flags.repeat {
                        break;
                    }
                }
            }
        }
        active.retain_mut(|(r, left)| {
            if r.flags.age == 0 {
                return true; // immortal
            }
            *left -= 1;
            if *left == 0 {
                debug!("rule '{}' expired", r.source);
            }
            *left > 0
        });
    }
    info!("applied {} rules to {} words", ruleset.len(), words.len());
    Ok(words)
}

fn chance_hit(percent: u32) -> bool {
    rand::thread_rng().gen_range(0..100) < percent
}

/// One-stop driver used by the CLI and the scenario suite: parse category
/// lines and a ruleset from text, run the lexicon through, render results.
pub fn apply_source(
    graphs: &Graphemes,
    category_lines: &str,
    ruleset: &str,
    inputs: &[&str],
) -> Result<(Vec<String>, Vec<LineDiagnostic>), RuleError> {
    let mut cats = CategoryStore::from_lines(category_lines)?;
    let (rules, diagnostics) = parse_ruleset_verbose(ruleset, &mut cats, graphs);
    let words: Vec<Word> = inputs.iter().map(|w| Word::parse(w, graphs)).collect();
    let words = apply_ruleset(words, &rules)?;
    let rendered = words.iter().map(|w| w.render(graphs)).collect();
    Ok((rendered, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn run(cats: &str, ruleset: &str, word: &str) -> String {
        let graphs = Graphemes::default();
        let (out, diags) = apply_source(&graphs, cats, ruleset, &[word]).unwrap();
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        out.into_iter().next().unwrap()
    }

    #[test]
    fn rules_chain_in_order() {
        let ruleset = indoc! {"
            a > e
            e > i
        "};
        assert_eq!(run("", ruleset, "kata"), "kiti");
    }

    #[test]
    fn category_edits_shape_later_lines() {
        let ruleset = indoc! {"
            V = a,e
            [V] > o
            V += o
            [V] > u / _ #
        "};
        assert_eq!(run("", ruleset, "kate"), "kotu");
    }

    #[test]
    fn age_limits_a_rules_lifetime() {
        // the first rule dies after one pass, so the 'a' produced by the
        // second rule survives
        let ruleset = indoc! {"
            a > b
            o > a
        "};
        assert_eq!(run("", ruleset, "oa"), "ab");
        let long_lived = indoc! {"
            a > b age:2
            o > a
        "};
        assert_eq!(run("", long_lived, "oa"), "bb");
    }

    #[test]
    fn repeat_reapplies_within_a_pass() {
        // one application only eats the rightmost site
        assert_eq!(run("", "ab > b", "aaab"), "aab");
        assert_eq!(run("", "ab > b repeat:3", "aaab"), "b");
        // repeat:0 runs to the fixpoint
        assert_eq!(run("", "ab > b repeat:0", "aaaaab"), "b");
    }

    #[test]
    fn bad_lines_are_isolated() {
        let graphs = Graphemes::default();
        let mut cats = CategoryStore::new();
        let ruleset = indoc! {"
            a > b
            [NoSuchCat] > x
            b > c
        "};
        let (rules, diags) = parse_ruleset_verbose(ruleset, &mut cats, &graphs);
        assert_eq!(rules.len(), 2);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line_no, 2);
    }

    #[test]
    fn words_keep_input_order() {
        let graphs = Graphemes::default();
        let (out, _) = apply_source(&graphs, "", "a > o", &["pat", "tap", "apa"]).unwrap();
        assert_eq!(out, vec!["pot", "top", "opo"]);
    }

    #[test]
    fn noop_rule_signals_unchanged() {
        let graphs = Graphemes::default();
        let mut cats = CategoryStore::new();
        let rules = parse_ruleset("a > a", &mut cats, &graphs);
        let mut w = Word::parse("kata", &graphs);
        assert_eq!(rules[0].apply(&mut w).unwrap(), Outcome::Unchanged);
    }
}
