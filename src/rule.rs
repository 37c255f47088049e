//! Sound-change rules: parsing, direction handling, application.
//!
//! A rule line has the shape `tars OP reps / envs ! excs flags`, where `OP`
//! is `>` (substitute), or the whole rule starts with `+` (epenthesis: no
//! targets) or `-` (deletion: no replacements). Environments default to `_`
//! (anywhere), exceptions to none. If the line continues past its first
//! `OP/envs/excs` with another `>`, `/` or `!`, the remainder becomes an
//! else-rule with the same targets, tried wherever the primary's gate fails.
//!
//! Rules are right-to-left by default; the `ltr` flag mirrors the rule once
//! at parse time and the word is reversed around application, so the matcher
//! itself never needs to know about direction.

use std::fmt;

use log::{debug, trace};
use smol_str::SmolStr;

use crate::category::CategoryStore;
use crate::error::RuleError;
use crate::matcher;
use crate::notation::{parse_environments, parse_replacements, parse_targets};
use crate::pattern::{Atom, Environment, Pattern, Target};
use crate::tokenizer::Graphemes;
use crate::word::Word;

/// Else-rules chain; runaway nesting is cut off here.
const MAX_ELSE_DEPTH: usize = 8;

/// Execution flags, with their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flags {
    /// apply left-to-right instead of the default right-to-left
    pub ltr: bool,
    /// apply up to N times per word per pass; 0 = until the word stops
    /// changing (guarded against growth at parse time)
    pub repeat: u32,
    /// number of passes this rule stays active; 0 = never expires
    pub age: u32,
    /// percent probability of applying at all, per word per pass
    pub chance: u32,
}

impl Default for Flags {
    fn default() -> Self {
        Self { ltr: false, repeat: 1, age: 1, chance: 100 }
    }
}

impl Flags {
    /// Parse a flag field: comma/space-separated `name` or `name:value`
    /// tokens. Unknown names are an error, not a shrug.
    pub fn parse(text: &str) -> Result<Flags, RuleError> {
        let mut flags = Flags::default();
        for tok in text.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
            match tok.split_once(':') {
                Some((name, value)) => {
                    let n: u32 = value.trim().parse().map_err(|_| {
                        RuleError::format_err(&format!("flag '{name}' needs a numeric value"))
                    })?;
                    match name.trim() {
                        "repeat" => flags.repeat = n,
                        "age" => flags.age = n,
                        "chance" => {
                            if n > 100 {
                                return Err(RuleError::format_err("chance is a percentage, 0..=100"));
                            }
                            flags.chance = n;
                        }
                        "ltr" => return Err(RuleError::format_err("flag 'ltr' takes no value")),
                        other => return Err(RuleError::unknown_flag(other)),
                    }
                }
                None => match tok {
                    "ltr" => flags.ltr = !flags.ltr,
                    "repeat" | "age" | "chance" => {
                        return Err(RuleError::format_err(&format!(
                            "flag '{tok}' needs a value, e.g. '{tok}:2'"
                        )))
                    }
                    other => return Err(RuleError::unknown_flag(other)),
                },
            }
        }
        Ok(flags)
    }
}

/// What a single application did to the word. `Unchanged` is a signal, not
/// an error: the driver uses it to stop repeating a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// the rule as written
    pub source: String,
    pub targets: Vec<Target>,
    /// empty for deletion rules
    pub replacements: Vec<Pattern>,
    pub environments: Vec<Environment>,
    pub exceptions: Vec<Environment>,
    pub else_rule: Option<Box<Rule>>,
    pub flags: Flags,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Trailing tokens that read as flags (`ltr` or anything `name:value`) are
/// peeled off the end of the line; everything else is rule body.
fn split_flags(line: &str) -> (&str, &str) {
    let mut body_end = line.len();
    loop {
        let head = line[..body_end].trim_end();
        if head.is_empty() {
            break;
        }
        let Some(ws) = head.rfind(char::is_whitespace) else { break };
        let tok_start = ws + head[ws..].chars().next().unwrap().len_utf8();
        if !is_flag_token(&head[tok_start..]) {
            break;
        }
        body_end = tok_start;
    }
    (&line[..body_end], &line[body_end..])
}

fn is_flag_token(tok: &str) -> bool {
    !tok.is_empty()
        && tok
            .split(',')
            .filter(|t| !t.is_empty())
            .all(|t| t == "ltr" || t.contains(':'))
}

impl Rule {
    pub fn parse(
        line: &str,
        cats: &CategoryStore,
        graphs: &Graphemes,
    ) -> Result<Rule, RuleError> {
        Self::parse_at_depth(line, cats, graphs, 0)
    }

    fn parse_at_depth(
        line: &str,
        cats: &CategoryStore,
        graphs: &Graphemes,
        depth: usize,
    ) -> Result<Rule, RuleError> {
        if depth > MAX_ELSE_DEPTH {
            return Err(RuleError::format_err("else-branches nest too deep"));
        }
        let (body, flag_text) = split_flags(line.trim());
        let flags = Flags::parse(flag_text)?;

        let body = body.trim();
        let mut deletion = false;
        let normalized: String;
        let body: &str = if let Some(rest) = body.strip_prefix('+') {
            normalized = format!(">{rest}");
            &normalized
        } else if let Some(rest) = body.strip_prefix('-') {
            deletion = true;
            rest
        } else {
            body
        };

        // top-level field markers; bracket balance proper is checked by the
        // field parsers, here the stack only tracks depth
        let mut markers: Vec<(usize, char)> = Vec::new();
        let mut depth_stack: Vec<char> = Vec::new();
        for (i, ch) in body.char_indices() {
            match ch {
                '(' | '[' | '{' => depth_stack.push(ch),
                ')' | ']' | '}' => {
                    depth_stack.pop();
                }
                '>' | '/' | '!' if depth_stack.is_empty() => markers.push((i, ch)),
                '+' | '-' if depth_stack.is_empty() => {
                    return Err(RuleError::format_err(
                        "'+' and '-' are only valid at the start of a rule",
                    ))
                }
                _ => {}
            }
        }

        let tars_end = markers.first().map(|&(p, _)| p).unwrap_or(body.len());
        let tars_text = &body[..tars_end];

        let mut reps_text: Option<&str> = None;
        let mut envs_text: Option<&str> = None;
        let mut excs_text: Option<&str> = None;
        let mut else_text: Option<String> = None;
        for (k, &(pos, ch)) in markers.iter().enumerate() {
            let end = markers.get(k + 1).map(|&(p, _)| p).unwrap_or(body.len());
            let text = &body[pos + ch.len_utf8()..end];
            let fresh = match ch {
                '>' => reps_text.is_none() && envs_text.is_none() && excs_text.is_none(),
                '/' => envs_text.is_none() && excs_text.is_none(),
                _ => excs_text.is_none(),
            };
            if !fresh {
                // the remainder is a second rule over the same targets
                else_text = Some(format!("{} {}", tars_text.trim(), &body[pos..]));
                break;
            }
            match ch {
                '>' => reps_text = Some(text),
                '/' => envs_text = Some(text),
                _ => excs_text = Some(text),
            }
        }

        let targets = parse_targets(tars_text.trim(), cats, graphs)?;
        let mut replacements: Vec<Pattern> = if deletion {
            if reps_text.is_some() {
                return Err(RuleError::format_err("a '-' rule cannot also use '>'"));
            }
            Vec::new()
        } else {
            match reps_text {
                Some(text) => parse_replacements(text.trim(), cats, graphs)?,
                None => {
                    return Err(RuleError::format_err(
                        "rule has no operator ('>', '+' or '-')",
                    ))
                }
            }
        };

        let no_targets = targets.iter().all(|t| t.pattern.is_empty());
        let no_replacements =
            replacements.is_empty() || replacements.iter().all(Pattern::is_empty);
        if no_targets && no_replacements {
            return Err(RuleError::format_err("both targets and replacements are empty"));
        }

        if !replacements.is_empty() {
            if replacements.len() == 1 && targets.len() > 1 {
                replacements = vec![replacements[0].clone(); targets.len()];
            }
            if replacements.len() != targets.len() {
                return Err(RuleError::format_err(
                    "replacement count does not match target count",
                ));
            }
            for (target, rep) in targets.iter().zip(&replacements) {
                Self::check_replacement(target, rep)?;
            }
        }

        let environments = parse_environments(envs_text.unwrap_or("_"), cats, graphs)?;
        let exceptions = parse_environments(excs_text.unwrap_or(""), cats, graphs)?;

        let else_rule = match else_text {
            Some(src) => Some(Box::new(Self::parse_at_depth(&src, cats, graphs, depth + 1)?)),
            None => None,
        };

        if flags.repeat == 0 && !replacements.is_empty() {
            for (target, rep) in targets.iter().zip(&replacements) {
                let copies_target = rep.any_atom(&|a| matches!(a, Atom::TargetRef(_)));
                if copies_target || target.pattern.is_subsequence_of(rep) {
                    return Err(RuleError::format_err(
                        "rule would grow the word forever under repeat:0",
                    ));
                }
            }
        }

        let mut rule = Rule {
            source: line.trim().to_string(),
            targets,
            replacements,
            environments,
            exceptions,
            else_rule,
            flags,
        };
        if rule.flags.ltr {
            rule = rule.mirror();
        }
        Ok(rule)
    }

    fn check_replacement(target: &Target, rep: &Pattern) -> Result<(), RuleError> {
        let rep_cat = match rep.atoms.as_slice() {
            [Atom::Category(c)] => Some(c),
            _ => None,
        };
        if let Some(rcat) = rep_cat {
            match target.pattern.atoms.as_slice() {
                [Atom::Category(tcat)] => {
                    if tcat.len() != rcat.len() {
                        return Err(RuleError::format_err(&format!(
                            "category substitution needs equal lengths ({} vs {})",
                            tcat.len(),
                            rcat.len()
                        )));
                    }
                }
                _ => {
                    return Err(RuleError::format_err(
                        "a category replacement needs a single-category target",
                    ))
                }
            }
            return Ok(());
        }
        if rep.any_atom(&|a| {
            matches!(a, Atom::Category(_) | Atom::Wildcard | Atom::Boundary)
        }) {
            return Err(RuleError::format_err(
                "replacements may contain only graphemes, '%' and '<'",
            ));
        }
        Ok(())
    }

    /// The direction-flipped image of this rule. Pure: the original is left
    /// alone, so rules stay shareable across passes.
    pub fn mirror(&self) -> Rule {
        Rule {
            source: self.source.clone(),
            targets: self.targets.iter().map(Target::mirror).collect(),
            replacements: self.replacements.iter().map(Pattern::mirror).collect(),
            environments: self.environments.iter().map(Environment::mirror).collect(),
            exceptions: self.exceptions.iter().map(Environment::mirror).collect(),
            else_rule: self.else_rule.as_ref().map(|r| Box::new(r.mirror())),
            flags: self.flags.clone(),
        }
    }

    /// Apply once. Reports [`Outcome::Unchanged`] when the word comes out
    /// token-for-token identical.
    pub fn apply(&self, word: &mut Word) -> Result<Outcome, RuleError> {
        let before = word.tokens().to_vec();
        if self.flags.ltr {
            word.reverse();
        }
        let result = self.apply_fields(word);
        if self.flags.ltr {
            word.reverse();
        }
        result?;
        if word.tokens() == before.as_slice() {
            trace!("'{}' left {} unchanged", self.source, word);
            Ok(Outcome::Unchanged)
        } else {
            debug!("'{}' applied: {}", self.source, word);
            Ok(Outcome::Changed)
        }
    }

    fn apply_fields(&self, word: &mut Word) -> Result<(), RuleError> {
        for idx in 0..self.targets.len() {
            let candidates = matcher::target_candidates(word, &self.targets[idx]);
            for (pos, run) in candidates {
                if pos + run > word.len() {
                    debug!("match at {pos} invalidated by an earlier replacement; skipped");
                    continue;
                }
                self.apply_at(word, idx, pos, run)?;
            }
        }
        Ok(())
    }

    /// Gate one candidate position; on success perform this rule's
    /// operation, on failure fall through to the else-rule.
    fn apply_at(&self, word: &mut Word, idx: usize, pos: usize, run: usize) -> Result<(), RuleError> {
        let matched: Vec<SmolStr> = word.tokens()[pos..pos + run].to_vec();
        let excluded = self
            .exceptions
            .iter()
            .any(|env| matcher::match_env(env, word, pos, run, &matched));
        let admitted = !excluded
            && self
                .environments
                .iter()
                .any(|env| matcher::match_env(env, word, pos, run, &matched));
        if admitted {
            self.operate(word, idx, pos, run, &matched)
        } else if let Some(else_rule) = &self.else_rule {
            trace!("gate failed at {pos}, trying else-rule '{}'", else_rule.source);
            else_rule.apply_at(word, idx, pos, run)
        } else {
            Ok(())
        }
    }

    fn operate(
        &self,
        word: &mut Word,
        idx: usize,
        pos: usize,
        run: usize,
        matched: &[SmolStr],
    ) -> Result<(), RuleError> {
        let Some(rep) = self.replacements.get(idx) else {
            word.replace(pos, run, &[]);
            return Ok(());
        };

        // positional category correspondence
        if let ([Atom::Category(tcat)], [Atom::Category(rcat)]) =
            (self.targets[idx].pattern.atoms.as_slice(), rep.atoms.as_slice())
        {
            let token = word.tokens()[pos].clone();
            let ordinal = tcat.index_of(&token).ok_or_else(|| {
                RuleError::runtime_err(&format!("'{token}' is not in the target category"))
            })?;
            let new = rcat.get(ordinal).ok_or_else(|| {
                RuleError::runtime_err(&format!("no counterpart at ordinal {ordinal}"))
            })?;
            word.replace(pos, run, &[new.clone()]);
            return Ok(());
        }

        // `?` as the sole replacement is metathesis
        if matches!(rep.atoms.as_slice(), [Atom::Literal(q)] if q.as_str() == "?") {
            let reversed: Vec<SmolStr> = matched.iter().rev().cloned().collect();
            word.replace(pos, run, &reversed);
            return Ok(());
        }

        let expanded = rep.expand_target(matched);
        let mut tokens = Vec::with_capacity(expanded.len());
        for atom in &expanded.atoms {
            match atom {
                Atom::Literal(g) => tokens.push(g.clone()),
                other => {
                    return Err(RuleError::runtime_err(&format!(
                        "cannot write '{other}' into a word"
                    )))
                }
            }
        }
        word.replace(pos, run, &tokens);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (CategoryStore, Graphemes) {
        let cats = CategoryStore::from_lines("V = a,i,u\nN = m,n\nP = p,t,k\nB = b,d,g").unwrap();
        (cats, Graphemes::default())
    }

    fn rule(src: &str) -> Rule {
        let (cats, graphs) = fixtures();
        Rule::parse(src, &cats, &graphs).unwrap()
    }

    fn applied(src: &str, word_text: &str) -> String {
        let graphs = Graphemes::default();
        let mut w = Word::parse(word_text, &graphs);
        rule(src).apply(&mut w).unwrap();
        w.render(&graphs)
    }

    #[test]
    fn plain_substitution() {
        assert_eq!(applied("a > b", "a"), "b");
        assert_eq!(applied("a > b", "katana"), "kbtbnb");
    }

    #[test]
    fn epenthesis_at_word_end() {
        assert_eq!(applied("+ b / _ #", "a"), "ab");
        assert_eq!(applied("+ b / # _", "a"), "ba");
    }

    #[test]
    fn deletion() {
        assert_eq!(applied("- b", "ab"), "a");
        assert_eq!(applied("[V] > / _ #", "kata"), "kat");
    }

    #[test]
    fn metathesis() {
        assert_eq!(applied("a n > ?", "pan"), "pna");
    }

    #[test]
    fn category_correspondence_is_positional() {
        assert_eq!(applied("[P] > [B]", "apata"), "abada");
    }

    #[test]
    fn unequal_category_lengths_rejected() {
        let (cats, graphs) = fixtures();
        assert!(Rule::parse("[P] > [N]", &cats, &graphs).is_err());
    }

    #[test]
    fn else_rule_fires_on_gate_failure() {
        assert_eq!(applied("a > e / _ i > o / _ u", "ai au aa"), "ei ou aa");
    }

    #[test]
    fn exceptions_veto_matches() {
        assert_eq!(applied("a > o ! _ n", "ana"), "ano");
    }

    #[test]
    fn target_reference_in_replacement() {
        assert_eq!(applied("an > % % ", "kan"), "kanan");
        assert_eq!(applied("an > <", "kan"), "kna");
    }

    #[test]
    fn wildcard_environment() {
        // umlaut at a distance: a > e when an i follows anywhere before the edge
        assert_eq!(applied("a > e / _ * i", "kati"), "keti");
        assert_eq!(applied("a > e / _ * i", "kata"), "kata");
    }

    #[test]
    fn count_selector_picks_matches() {
        assert_eq!(applied("a@0 > o", "banana"), "bonana");
        assert_eq!(applied("a@2 > o", "banana"), "banano");
    }

    #[test]
    fn ltr_mirror_agrees_on_single_site() {
        assert_eq!(applied("t > d", "kata"), applied("t > d ltr", "kata"));
    }

    #[test]
    fn flag_parsing() {
        let flags = Flags::parse("ltr repeat:3,age:2 chance:50").unwrap();
        assert!(flags.ltr);
        assert_eq!(flags.repeat, 3);
        assert_eq!(flags.age, 2);
        assert_eq!(flags.chance, 50);
        assert!(matches!(Flags::parse("bogus"), Err(RuleError::UnknownFlag(_))));
        assert!(matches!(Flags::parse("frob:7"), Err(RuleError::UnknownFlag(_))));
        assert!(Flags::parse("chance:200").is_err());
    }

    #[test]
    fn growth_under_unbounded_repeat_is_rejected() {
        let (cats, graphs) = fixtures();
        assert!(Rule::parse("a > aa repeat:0", &cats, &graphs).is_err());
        assert!(Rule::parse("a > % x repeat:0", &cats, &graphs).is_err());
        // shrinking to a fixpoint is fine
        assert!(Rule::parse("aa > a repeat:0", &cats, &graphs).is_ok());
    }

    #[test]
    fn malformed_rules_are_format_errors() {
        let (cats, graphs) = fixtures();
        for bad in [">", "a b", "+ ", "x - y > z", "a > b / c_d_e", "% > x"] {
            assert!(Rule::parse(bad, &cats, &graphs).is_err(), "accepted: {bad}");
        }
    }

    #[test]
    fn boundary_count_is_preserved() {
        let graphs = Graphemes::default();
        for (src, input) in [("a > b", "kata"), ("+ x / _ #", "ka ta"), ("- t", "kata")] {
            let mut w = Word::parse(input, &graphs);
            let n = w.boundary_count();
            rule(src).apply(&mut w).unwrap();
            assert_eq!(w.boundary_count(), n, "rule {src}");
        }
    }
}
