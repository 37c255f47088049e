//! Language descriptions: a name, an orthography, and named categories,
//! serialized to a plain line-oriented text format.
//!
//! ```text
//! name Naswiyan
//! graphs ',ch,sh,ng
//! C = p,t,k,b,d,g
//! C.voiced = b,d,g
//! V = a,i,u
//! ```
//!
//! The `graphs` line lists the separator character first, then the
//! polygraphs — the same shape the CLI accepts as a graphs file. The core
//! engine itself persists nothing; this module is the thin shell around it.

use std::fmt;

use crate::category::CategoryStore;
use crate::error::RuleError;
use crate::tokenizer::Graphemes;

/// Parse a graphs list: separator first, then polygraphs, split on commas
/// and whitespace. An empty list means the default orthography.
pub fn parse_graphs_list(text: &str) -> Result<Graphemes, RuleError> {
    let mut entries = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|e| !e.is_empty());
    let Some(first) = entries.next() else {
        return Ok(Graphemes::default());
    };
    let mut sep_chars = first.chars();
    let sep = sep_chars.next().unwrap();
    if sep_chars.next().is_some() {
        return Err(RuleError::format_err(&format!(
            "separator must be a single character, got '{first}'"
        )));
    }
    Graphemes::new(sep, entries)
}

fn graphs_list(graphs: &Graphemes) -> String {
    let mut entries = vec![graphs.sep().to_string()];
    entries.extend(graphs.polygraphs().iter().map(|p| p.to_string()));
    entries.join(",")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub name: String,
    pub graphemes: Graphemes,
    pub categories: CategoryStore,
}

impl Language {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            graphemes: Graphemes::default(),
            categories: CategoryStore::new(),
        }
    }

    /// Parse a description file. `name` and `graphs` lines are optional;
    /// every other non-blank line must be a category line.
    pub fn from_text(text: &str) -> Result<Self, RuleError> {
        let mut lang = Language::new("");
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix("name ") {
                lang.name = name.trim().to_string();
            } else if let Some(list) = line.strip_prefix("graphs ") {
                lang.graphemes = parse_graphs_list(list)?;
            } else if CategoryStore::is_category_line(line) {
                lang.categories.apply_line(line)?;
            } else {
                return Err(RuleError::format_err(&format!(
                    "unrecognized language line '{line}'"
                )));
            }
        }
        Ok(lang)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut b = string_builder::Builder::default();
        if !self.name.is_empty() {
            b.append("name ");
            b.append(self.name.as_str());
            b.append("\n");
        }
        b.append("graphs ");
        b.append(graphs_list(&self.graphemes));
        b.append("\n");
        let mut names: Vec<&str> = self.categories.names().map(|n| n.as_str()).collect();
        names.sort_unstable();
        for name in names {
            let cat = self.categories.lookup(name).unwrap();
            b.append(name);
            b.append(" = ");
            b.append(cat.to_string());
            b.append("\n");
            let mut feats: Vec<(&str, &[_])> =
                cat.features().map(|(n, v)| (n.as_str(), v)).collect();
            feats.sort_unstable_by_key(|(n, _)| *n);
            for (feat, values) in feats {
                let values: Vec<&str> = values.iter().map(|v| v.as_str()).collect();
                b.append(name);
                b.append(".");
                b.append(feat);
                b.append(" = ");
                b.append(values.join(", "));
                b.append("\n");
            }
        }
        write!(f, "{}", b.string().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn round_trip() {
        let text = indoc! {"
            name Naswiyan
            graphs ',sh,ng
            C = p,t,k
            V = a,i,u
        "};
        let lang = Language::from_text(text).unwrap();
        assert_eq!(lang.name, "Naswiyan");
        assert_eq!(lang.graphemes.sep(), '\'');
        assert_eq!(lang.graphemes.polygraphs().len(), 2);
        assert_eq!(lang.categories.len(), 2);
        let again = Language::from_text(&lang.to_string()).unwrap();
        assert_eq!(again, lang);
    }

    #[test]
    fn graphs_list_shapes() {
        assert_eq!(parse_graphs_list("").unwrap(), Graphemes::default());
        let g = parse_graphs_list("' sh ng").unwrap();
        assert_eq!(g.polygraphs().len(), 2);
        assert!(parse_graphs_list("ab,sh").is_err());
    }

    #[test]
    fn junk_lines_are_rejected() {
        assert!(Language::from_text("what is this").is_err());
    }
}
