//! The word model: a run of grapheme tokens flanked by `#` boundaries.
//!
//! Boundaries are in-band tokens, so patterns can anchor on them with the
//! same machinery that matches any other grapheme. Consecutive boundaries
//! collapse to one, and every word starts and ends with exactly one.

use std::fmt;

use smol_str::SmolStr;

use crate::pattern::Pattern;
use crate::tokenizer::{Graphemes, BOUNDARY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    tokens: Vec<SmolStr>,
}

impl Word {
    /// Wrap a token sequence into a well-formed word: flanking boundaries
    /// added if missing, runs of boundaries collapsed.
    pub fn new(tokens: Vec<SmolStr>) -> Self {
        let mut out: Vec<SmolStr> = Vec::with_capacity(tokens.len() + 2);
        out.push(SmolStr::new(BOUNDARY));
        for tok in tokens {
            if tok.as_str() == BOUNDARY && out.last().map(SmolStr::as_str) == Some(BOUNDARY) {
                continue;
            }
            out.push(tok);
        }
        if out.last().map(SmolStr::as_str) != Some(BOUNDARY) {
            out.push(SmolStr::new(BOUNDARY));
        }
        Self { tokens: out }
    }

    /// Tokenize raw text under an orthography.
    pub fn parse(text: &str, graphs: &Graphemes) -> Self {
        Self::new(graphs.tokenize(text))
    }

    pub fn tokens(&self) -> &[SmolStr] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        // a bare boundary is an empty word
        self.tokens.iter().all(|t| t.as_str() == BOUNDARY)
    }

    pub fn get(&self, index: usize) -> Option<&SmolStr> {
        self.tokens.get(index)
    }

    pub fn set(&mut self, index: usize, token: SmolStr) {
        self.tokens[index] = token;
    }

    pub fn remove(&mut self, index: usize) {
        self.tokens.remove(index);
    }

    /// A new word over `tokens[start..end]`, re-wrapped in boundaries.
    pub fn slice(&self, start: usize, end: usize) -> Word {
        Word::new(self.tokens[start..end].to_vec())
    }

    pub fn reverse(&mut self) {
        self.tokens.reverse();
    }

    pub fn reversed(&self) -> Word {
        let mut w = self.clone();
        w.reverse();
        w
    }

    /// Join two words; the meeting boundaries collapse to one.
    pub fn concat(&self, other: &Word) -> Word {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        Word::new(tokens)
    }

    pub fn repeat(&self, times: usize) -> Word {
        let mut out = Word::new(Vec::new());
        for _ in 0..times {
            out = out.concat(self);
        }
        out
    }

    /// Does `pattern` match anywhere in this word?
    pub fn contains(&self, pattern: &Pattern) -> bool {
        crate::matcher::contains(self, pattern)
    }

    /// Smallest position in `[start, end)` where `pattern` matches, with the
    /// length of the matched run.
    pub fn find(&self, pattern: &Pattern, start: usize, end: usize) -> Option<(usize, usize)> {
        crate::matcher::find(self, pattern, start, end)
    }

    /// Replace the `run` tokens at `start` with `replacement`. A `run` of
    /// zero inserts.
    pub fn replace(&mut self, start: usize, run: usize, replacement: &[SmolStr]) {
        self.tokens.splice(start..start + run, replacement.iter().cloned());
    }

    pub fn boundary_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.as_str() == BOUNDARY).count()
    }

    /// Render with an orthography (separators re-inserted as needed).
    pub fn render(&self, graphs: &Graphemes) -> String {
        graphs.render(&self.tokens)
    }
}

/// Bare token dump, boundaries included. Diagnostic form; use
/// [`Word::render`] for user-facing output.
impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tok in &self.tokens {
            write!(f, "{tok}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Word {
        Word::parse(text, &Graphemes::default())
    }

    #[test]
    fn wrapped_and_collapsed() {
        let w = Word::new(vec![SmolStr::new("#"), SmolStr::new("#"), SmolStr::new("a")]);
        assert_eq!(w.to_string(), "#a#");
        assert_eq!(word("a b").to_string(), "#a#b#");
    }

    #[test]
    fn concat_collapses_meeting_boundaries() {
        let joined = word("ka").concat(&word("ta"));
        assert_eq!(joined.to_string(), "#ka#ta#");
        assert_eq!(joined.boundary_count(), 3);
    }

    #[test]
    fn replace_window() {
        let mut w = word("kata");
        w.replace(2, 1, &[SmolStr::new("o")]);
        assert_eq!(w.to_string(), "#kota#");
        w.replace(3, 0, &[SmolStr::new("r")]);
        assert_eq!(w.to_string(), "#korta#");
        w.replace(1, 2, &[]);
        assert_eq!(w.to_string(), "#rta#");
    }

    #[test]
    fn reversal_round_trips() {
        let w = word("kat");
        assert_eq!(w.reversed().reversed(), w);
        assert_eq!(w.reversed().to_string(), "#tak#");
    }

    #[test]
    fn slice_rewraps_in_boundaries() {
        let w = word("katana");
        assert_eq!(w.slice(2, 5).to_string(), "#ata#");
        assert_eq!(w.slice(0, 2).to_string(), "#k#");
    }
}
