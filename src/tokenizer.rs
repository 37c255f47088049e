//! Grapheme segmentation.
//!
//! Raw text is cut into graphemes — single characters plus whatever
//! polygraphs (multi-character graphemes) the orthography declares. The cut
//! is greedy: the longest prefix of the pending buffer that is a valid
//! grapheme wins. A separator character (default `'`) lets the user force a
//! cut where the greedy reading would be wrong: with `sh` declared, `sh`
//! is one token but `s'h` is two.
//!
//! Word boundaries are represented in-band as `#` tokens: the tokenizer
//! flanks its output with `#` and collapses internal whitespace to single
//! `#`s. Rendering is the inverse and re-inserts the separator exactly where
//! a greedy re-read of the output would merge across a token boundary, so
//! `tokenize(render(toks)) == toks`.

use log::trace;
use smol_str::SmolStr;

use crate::error::RuleError;

/// The word-boundary token.
pub const BOUNDARY: &str = "#";

/// Characters with a reserved meaning in the rule notation. None of them may
/// occur inside a user grapheme.
pub const RESERVED: [char; 5] = ['#', '_', '*', '%', '<'];

/// An orthography: the separator character and the polygraph set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graphemes {
    sep: char,
    polygraphs: Vec<SmolStr>,
}

impl Default for Graphemes {
    fn default() -> Self {
        Self { sep: '\'', polygraphs: Vec::new() }
    }
}

impl Graphemes {
    /// Build an orthography from a separator and a polygraph list. Entries of
    /// one character or less are dropped (single characters are always valid
    /// graphemes and need no declaration).
    pub fn new<I, S>(sep: char, polygraphs: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if RESERVED.contains(&sep) || sep.is_whitespace() {
            return Err(RuleError::format_err(&format!(
                "'{sep}' cannot be used as the separator character"
            )));
        }
        let mut polys = Vec::new();
        for p in polygraphs {
            let p = p.as_ref();
            if p.chars().count() < 2 {
                continue;
            }
            if p.chars().any(|c| RESERVED.contains(&c) || c == sep || c.is_whitespace()) {
                return Err(RuleError::format_err(&format!(
                    "polygraph '{p}' contains a reserved character"
                )));
            }
            polys.push(SmolStr::new(p));
        }
        Ok(Self { sep, polygraphs: polys })
    }

    pub fn sep(&self) -> char {
        self.sep
    }

    pub fn polygraphs(&self) -> &[SmolStr] {
        &self.polygraphs
    }

    /// Cut `text` into graphemes with the rolling buffer, exactly as given:
    /// no boundary wrapping, no whitespace handling. This is what the
    /// pattern parser uses on rule-field substrings.
    pub fn segment(&self, text: &str) -> Vec<SmolStr> {
        let mut tokens: Vec<SmolStr> = Vec::new();
        let mut buf = String::new();
        // the trailing separator is a sentinel that forces the final flush
        for ch in text.chars().chain(std::iter::once(self.sep)) {
            buf.push(ch);
            while buf.chars().count() > 1 && !self.any_polygraph_starts_with(&buf) {
                let g = self.peel(&mut buf);
                tokens.push(g);
            }
        }
        // input ending in a separator leaves the lone sentinel behind
        debug_assert!(
            buf.trim_start_matches(self.sep).is_empty(),
            "tokenizer left '{buf}' unflushed"
        );
        tokens
    }

    /// Segment `text` into graphemes, flanked by `#` boundary tokens, with
    /// internal whitespace collapsed to single `#`s. Never fails: ambiguity
    /// is resolved greedily.
    pub fn tokenize(&self, text: &str) -> Vec<SmolStr> {
        let mut normalized = String::from(BOUNDARY);
        for (i, chunk) in text.split_whitespace().enumerate() {
            if i > 0 {
                normalized.push('#');
            }
            normalized.push_str(chunk);
        }
        normalized.push('#');

        let mut tokens: Vec<SmolStr> = Vec::new();
        for g in self.segment(&normalized) {
            if g.as_str() == BOUNDARY && tokens.last().map(SmolStr::as_str) == Some(BOUNDARY) {
                continue;
            }
            tokens.push(g);
        }
        if tokens.is_empty() {
            tokens.push(SmolStr::new(BOUNDARY));
        }
        trace!("tokenized {:?} -> {:?}", text, tokens);
        tokens
    }

    /// Render tokens back to user text: boundaries become spaces (edge
    /// boundaries are dropped) and the separator is inserted wherever a
    /// greedy re-read would otherwise merge graphemes across a boundary.
    pub fn render(&self, tokens: &[SmolStr]) -> String {
        let first = tokens.iter().position(|t| t.as_str() != BOUNDARY);
        let Some(first) = first else { return String::new() };
        let last = tokens.iter().rposition(|t| t.as_str() != BOUNDARY).unwrap();
        let inner = &tokens[first..=last];

        let mut b = string_builder::Builder::default();
        for (i, tok) in inner.iter().enumerate() {
            if tok.as_str() == BOUNDARY {
                b.append(" ");
                continue;
            }
            b.append(tok.as_str());
            if self.needs_sep(tok, &inner[i + 1..]) {
                b.append(self.sep.to_string());
            }
        }
        b.string().unwrap()
    }

    fn any_polygraph_starts_with(&self, prefix: &str) -> bool {
        self.polygraphs.iter().any(|p| p.as_str().starts_with(prefix))
    }

    /// Remove and return the longest valid grapheme at the front of `buf`,
    /// then strip any separator hint that follows it.
    fn peel(&self, buf: &mut String) -> SmolStr {
        let mut cut = buf.chars().next().map(char::len_utf8).unwrap_or(0);
        for (i, _) in buf.char_indices().skip(1) {
            if self.polygraphs.iter().any(|p| p.as_str() == &buf[..i]) {
                cut = i;
            }
        }
        if self.polygraphs.iter().any(|p| p.as_str() == buf.as_str()) {
            cut = buf.len();
        }
        let g = SmolStr::new(&buf[..cut]);
        *buf = buf[cut..].trim_start_matches(self.sep).to_string();
        g
    }

    /// Would a greedy re-read of `left` glued to the following tokens read a
    /// polygraph across the join?
    fn needs_sep(&self, left: &SmolStr, following: &[SmolStr]) -> bool {
        if left.as_str() == BOUNDARY || following.is_empty() {
            return false;
        }
        let mut right = String::new();
        let limit = self.polygraphs.iter().map(|p| p.len()).max().unwrap_or(0);
        for tok in following {
            if tok.as_str() == BOUNDARY || right.len() >= limit {
                break;
            }
            right.push_str(tok.as_str());
        }
        self.polygraphs.iter().any(|p| {
            let p = p.as_str();
            p.char_indices().skip(1).any(|(k, _)| {
                let (head, tail) = p.split_at(k);
                left.as_str().ends_with(head) && right.starts_with(tail)
            })
        })
    }
}

/// Free-function entry point over [`Graphemes`].
pub fn tokenize(text: &str, sep: char, polygraphs: &[SmolStr]) -> Result<Vec<SmolStr>, RuleError> {
    Ok(Graphemes::new(sep, polygraphs)?.tokenize(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graphs(polys: &[&str]) -> Graphemes {
        Graphemes::new('\'', polys.iter().copied()).unwrap()
    }

    fn toks(g: &Graphemes, text: &str) -> Vec<String> {
        g.tokenize(text).iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn plain_characters() {
        let g = graphs(&[]);
        assert_eq!(toks(&g, "kata"), ["#", "k", "a", "t", "a", "#"]);
    }

    #[test]
    fn polygraph_wins_over_characters() {
        let g = graphs(&["sh", "ng"]);
        assert_eq!(toks(&g, "shing"), ["#", "sh", "i", "ng", "#"]);
    }

    #[test]
    fn separator_forces_a_cut() {
        let g = graphs(&["sh"]);
        assert_eq!(toks(&g, "s'h"), ["#", "s", "h", "#"]);
        // a separator after a polygraph is a hint, not a token
        assert_eq!(toks(&g, "sh'a"), ["#", "sh", "a", "#"]);
    }

    #[test]
    fn longest_prefix_wins() {
        let g = graphs(&["ts", "tsh"]);
        assert_eq!(toks(&g, "tsha"), ["#", "tsh", "a", "#"]);
        assert_eq!(toks(&g, "tsa"), ["#", "ts", "a", "#"]);
    }

    #[test]
    fn whitespace_becomes_single_boundary() {
        let g = graphs(&[]);
        assert_eq!(toks(&g, "a   b"), ["#", "a", "#", "b", "#"]);
        assert_eq!(toks(&g, "  a  "), ["#", "a", "#"]);
        assert_eq!(toks(&g, "   "), ["#"]);
    }

    #[test]
    fn render_round_trips() {
        let g = graphs(&["sh", "ng", "aa"]);
        for word in ["shang", "s'hang", "a'a", "aash", "ka ta"] {
            let tokens = g.tokenize(word);
            assert_eq!(g.tokenize(&g.render(&tokens)), tokens, "word {word}");
        }
    }

    #[test]
    fn render_inserts_separator_across_merging_boundary() {
        let g = graphs(&["sh"]);
        let tokens: Vec<SmolStr> = ["#", "s", "h", "#"].iter().map(|s| SmolStr::new(s)).collect();
        assert_eq!(g.render(&tokens), "s'h");
    }

    #[test]
    fn reserved_characters_rejected() {
        assert!(Graphemes::new('#', Vec::<&str>::new()).is_err());
        assert!(Graphemes::new('\'', ["a#"]).is_err());
        assert!(Graphemes::new('\'', ["a*"]).is_err());
    }
}
