//! Structured patterns: what rule fields parse into.
//!
//! A pattern is a flat sequence of atoms. Atoms are a closed set — this is
//! deliberately not a regex engine: no alternation outside categories, no
//! bounded repetition, no anchors beyond the in-band `#` boundary token.
//!
//! Target references (`%` for the matched target, `<` for its reversal) are
//! placeholders that only make sense in replacements and environments; the
//! field parsers reject them in targets so the matcher never sees one.

use std::fmt;

use smol_str::SmolStr;

use crate::category::Category;
use crate::tokenizer::BOUNDARY;

/// Which way a target reference reads the matched span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// `%` — the matched target, as matched
    Matched,
    /// `<` — the matched target, reversed
    Reversed,
}

/// One step of a pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    /// a single grapheme
    Literal(SmolStr),
    /// the `#` word-edge token
    Boundary,
    /// `*` — any run of graphemes, including an empty one
    Wildcard,
    /// any member of a category
    Category(Category),
    /// `(...)` — a sub-pattern that may be present or absent
    Optional(Pattern),
    /// `%` or `<`
    TargetRef(TargetKind),
}

impl Atom {
    /// Single-token acceptance. Compound atoms (wildcard, optional, target
    /// references) are handled by the matcher, not here.
    pub fn accepts(&self, token: &str) -> bool {
        match self {
            Atom::Literal(g) => g.as_str() == token,
            Atom::Boundary => token == BOUNDARY,
            Atom::Category(cat) => cat.contains(token),
            _ => false,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Literal(g) => write!(f, "{g}"),
            Atom::Boundary => write!(f, "#"),
            Atom::Wildcard => write!(f, "*"),
            Atom::Category(cat) => write!(f, "[{cat}]"),
            Atom::Optional(sub) => write!(f, "({sub})"),
            Atom::TargetRef(TargetKind::Matched) => write!(f, "%"),
            Atom::TargetRef(TargetKind::Reversed) => write!(f, "<"),
        }
    }
}

/// An ordered sequence of atoms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pattern {
    pub atoms: Vec<Atom>,
}

impl Pattern {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// The mirror image of this pattern: atom order reversed, optionals
    /// mirrored inside, and the two target-reference kinds swapped. Matching
    /// the mirror against a reversed word is equivalent to matching the
    /// original against the word itself.
    pub fn mirror(&self) -> Pattern {
        let atoms = self
            .atoms
            .iter()
            .rev()
            .map(|atom| match atom {
                Atom::Optional(sub) => Atom::Optional(sub.mirror()),
                Atom::TargetRef(TargetKind::Matched) => Atom::TargetRef(TargetKind::Reversed),
                Atom::TargetRef(TargetKind::Reversed) => Atom::TargetRef(TargetKind::Matched),
                other => other.clone(),
            })
            .collect();
        Pattern::new(atoms)
    }

    /// Replace target references with the literal tokens of `matched`.
    pub fn expand_target(&self, matched: &[SmolStr]) -> Pattern {
        let mut atoms = Vec::with_capacity(self.atoms.len());
        for atom in &self.atoms {
            match atom {
                Atom::TargetRef(TargetKind::Matched) => {
                    atoms.extend(matched.iter().cloned().map(Atom::Literal));
                }
                Atom::TargetRef(TargetKind::Reversed) => {
                    atoms.extend(matched.iter().rev().cloned().map(Atom::Literal));
                }
                Atom::Optional(sub) => atoms.push(Atom::Optional(sub.expand_target(matched))),
                other => atoms.push(other.clone()),
            }
        }
        Pattern::new(atoms)
    }

    /// Does any atom (at any nesting depth) satisfy `pred`?
    pub fn any_atom(&self, pred: &dyn Fn(&Atom) -> bool) -> bool {
        self.atoms.iter().any(|atom| {
            pred(atom)
                || match atom {
                    Atom::Optional(sub) => sub.any_atom(pred),
                    _ => false,
                }
        })
    }

    /// Do this pattern's atoms appear, in order, within `other`? Used to
    /// reject rules that would grow a word forever under unbounded repeat.
    pub fn is_subsequence_of(&self, other: &Pattern) -> bool {
        let mut it = other.atoms.iter();
        self.atoms.iter().all(|atom| it.any(|o| o == atom))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.atoms.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// A target: a pattern plus an optional count selector choosing which of the
/// successive matches to act on. Counts are 0-based indices into the ordered
/// match list; an empty selector means every match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Target {
    pub pattern: Pattern,
    pub count: Vec<usize>,
}

impl Target {
    pub fn new(pattern: Pattern, count: Vec<usize>) -> Self {
        Self { pattern, count }
    }

    pub fn every(pattern: Pattern) -> Self {
        Self { pattern, count: Vec::new() }
    }

    pub fn mirror(&self) -> Target {
        Target { pattern: self.pattern.mirror(), count: self.count.clone() }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)?;
        if !self.count.is_empty() {
            let sel: Vec<String> = self.count.iter().map(|c| c.to_string()).collect();
            write!(f, "@{}", sel.join("|"))?;
        }
        Ok(())
    }
}

/// Where a rule applies.
///
/// The `before` half of a [`Local`](Environment::Local) environment is stored
/// mirrored: it is matched outward from the target against the reversed word,
/// which keeps the matcher itself direction-agnostic. The mirroring happens
/// once, at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// `[pattern]` — the pattern occurs anywhere in the word
    Anywhere(Pattern),
    /// `left _ right` — left immediately before the target, right after
    Local { before: Pattern, after: Pattern },
}

impl Environment {
    /// Mirror for direction-flipped rules. For a local environment the two
    /// stored halves simply swap: each is already in the orientation the
    /// other side needs.
    pub fn mirror(&self) -> Environment {
        match self {
            Environment::Anywhere(pat) => Environment::Anywhere(pat.mirror()),
            Environment::Local { before, after } => {
                Environment::Local { before: after.clone(), after: before.clone() }
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Anywhere(pat) => write!(f, "{pat}"),
            Environment::Local { before, after } => {
                write!(f, "{} _ {}", before.mirror(), after)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Atom {
        Atom::Literal(SmolStr::new(s))
    }

    #[test]
    fn mirror_reverses_and_swaps_refs() {
        let pat = Pattern::new(vec![
            lit("a"),
            Atom::Optional(Pattern::new(vec![lit("b"), lit("c")])),
            Atom::TargetRef(TargetKind::Matched),
        ]);
        let mirrored = pat.mirror();
        assert_eq!(
            mirrored,
            Pattern::new(vec![
                Atom::TargetRef(TargetKind::Reversed),
                Atom::Optional(Pattern::new(vec![lit("c"), lit("b")])),
                lit("a"),
            ])
        );
        assert_eq!(mirrored.mirror(), pat);
    }

    #[test]
    fn expand_target_substitutes_matched_tokens() {
        let pat = Pattern::new(vec![lit("x"), Atom::TargetRef(TargetKind::Reversed)]);
        let matched = [SmolStr::new("a"), SmolStr::new("n")];
        assert_eq!(
            pat.expand_target(&matched),
            Pattern::new(vec![lit("x"), lit("n"), lit("a")])
        );
    }

    #[test]
    fn subsequence_detects_growth() {
        let a = Pattern::new(vec![lit("a")]);
        let aa = Pattern::new(vec![lit("a"), lit("a")]);
        assert!(a.is_subsequence_of(&aa));
        assert!(!aa.is_subsequence_of(&a));
        assert!(Pattern::empty().is_subsequence_of(&a));
    }
}
