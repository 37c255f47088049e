//! Categories of graphemes and the store that names them.
//!
//! A category is an *ordered* list of graphemes: order matters because
//! category-to-category substitution is positional (index i in the target
//! category maps to index i in the replacement category). A category may
//! additionally carry named features, each a subset of its values, declared
//! with dotted lines (`C.voiced = b,d,g`) and consumed by `[C+voiced]` /
//! `[C-voiced]` references in patterns.
//!
//! The store maps names to categories and executes the category lines of a
//! ruleset (`=`, `+=`, `-=`). Values may reference other categories as
//! `[name]`, resolved against the store at definition time; unknown
//! references fail loudly. Categories that become empty are removed.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use smol_str::SmolStr;

use crate::error::RuleError;
use crate::tokenizer::RESERVED;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Category {
    values: Vec<SmolStr>,
    features: HashMap<SmolStr, Vec<SmolStr>>,
}

impl Category {
    pub fn new(values: Vec<SmolStr>) -> Self {
        Self { values, features: HashMap::new() }
    }

    pub fn values(&self) -> &[SmolStr] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.as_str() == value)
    }

    /// Ordinal of `value` within the category, for positional substitution.
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v.as_str() == value)
    }

    pub fn get(&self, index: usize) -> Option<&SmolStr> {
        self.values.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SmolStr> {
        self.values.iter()
    }

    /// A + B: append, keeping duplicates (order carries meaning).
    pub fn union(&self, other: &Category) -> Category {
        let mut values = self.values.clone();
        values.extend(other.values.iter().cloned());
        Category::new(values)
    }

    /// A & B: members of both, in the order of A.
    pub fn intersection(&self, other: &Category) -> Category {
        let values = self.values.iter().filter(|v| other.contains(v)).cloned().collect();
        Category::new(values)
    }

    /// A - B: members of A not in B, in the order of A.
    pub fn difference(&self, other: &Category) -> Category {
        let values = self.values.iter().filter(|v| !other.contains(v)).cloned().collect();
        Category::new(values)
    }

    pub fn feature(&self, name: &str) -> Option<&[SmolStr]> {
        self.features.get(name).map(Vec::as_slice)
    }

    pub fn features(&self) -> impl Iterator<Item = (&SmolStr, &[SmolStr])> {
        self.features.iter().map(|(name, values)| (name, values.as_slice()))
    }

    /// Declare a feature: a named subset of this category's values.
    pub fn set_feature(&mut self, name: &str, values: Vec<SmolStr>) -> Result<(), RuleError> {
        if let Some(stray) = values.iter().find(|v| !self.contains(v)) {
            return Err(RuleError::format_err(&format!(
                "feature '{name}' value '{stray}' is not in the base category"
            )));
        }
        self.features.insert(SmolStr::new(name), values);
        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vals: Vec<&str> = self.values.iter().map(SmolStr::as_str).collect();
        write!(f, "{}", vals.join(", "))
    }
}

/// Named categories. An explicit collaborator: created when a ruleset starts,
/// mutated only by category lines, dropped when the driver is done.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryStore {
    cats: HashMap<SmolStr, Category>,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&Category> {
        self.cats.get(name)
    }

    /// Like [`lookup`](Self::lookup) but an unknown name is an error.
    pub fn get(&self, name: &str) -> Result<&Category, RuleError> {
        self.cats.get(name).ok_or_else(|| RuleError::unknown_category(name))
    }

    pub fn delete(&mut self, name: &str) -> bool {
        self.cats.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.cats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cats.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.cats.keys()
    }

    /// Insert a category wholesale; an empty category deletes the name.
    pub fn insert(&mut self, name: &str, cat: Category) {
        if cat.is_empty() {
            self.cats.remove(name);
        } else {
            self.cats.insert(SmolStr::new(name), cat);
        }
    }

    /// `name = values`
    pub fn define(&mut self, name: &str, values: &str) -> Result<(), RuleError> {
        let cat = Category::new(self.resolve_values(values)?);
        debug!("category {} = {}", name, cat);
        self.insert(name, cat);
        Ok(())
    }

    /// `name += values`
    pub fn augment(&mut self, name: &str, values: &str) -> Result<(), RuleError> {
        let added = Category::new(self.resolve_values(values)?);
        let cat = self.get(name)?.union(&added);
        debug!("category {} += {} -> {}", name, added, cat);
        self.insert(name, cat);
        Ok(())
    }

    /// `name -= values`
    pub fn reduce(&mut self, name: &str, values: &str) -> Result<(), RuleError> {
        let removed = Category::new(self.resolve_values(values)?);
        let cat = self.get(name)?.difference(&removed);
        debug!("category {} -= {} -> {}", name, removed, cat);
        self.insert(name, cat);
        Ok(())
    }

    /// Split a value list on commas and whitespace, expanding `[name]`
    /// references from the store.
    pub fn resolve_values(&self, values: &str) -> Result<Vec<SmolStr>, RuleError> {
        let mut out = Vec::new();
        for value in values.split(|c: char| c == ',' || c.is_whitespace()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if let Some(name) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                out.extend(self.get(name)?.values().iter().cloned());
            } else {
                if value.chars().any(|c| RESERVED.contains(&c) || "()[]{}".contains(c)) {
                    return Err(RuleError::format_err(&format!(
                        "'{value}' cannot be used as a category value"
                    )));
                }
                out.push(SmolStr::new(value));
            }
        }
        Ok(out)
    }

    /// Does this ruleset line edit the category store rather than declare a
    /// sound change? The rule notation itself never contains `=`.
    pub fn is_category_line(line: &str) -> bool {
        line.contains('=')
    }

    /// Execute one category line: `name = values`, `name += values`,
    /// `name -= values`, or a feature declaration `name.feat = values`.
    pub fn apply_line(&mut self, line: &str) -> Result<(), RuleError> {
        let eq = line
            .find('=')
            .ok_or_else(|| RuleError::format_err("category line without '='"))?;
        let (lhs, rhs) = line.split_at(eq);
        let values = &rhs[1..];
        let (name, op) = match lhs.strip_suffix('+') {
            Some(name) => (name.trim(), "+="),
            None => match lhs.strip_suffix('-') {
                Some(name) => (name.trim(), "-="),
                None => (lhs.trim(), "="),
            },
        };
        if name.is_empty() {
            return Err(RuleError::format_err("category line without a name"));
        }
        if let Some((base, feat)) = name.split_once('.') {
            if op != "=" {
                return Err(RuleError::format_err("feature declarations only support '='"));
            }
            let values = self.resolve_values(values)?;
            let cat = self
                .cats
                .get_mut(base)
                .ok_or_else(|| RuleError::unknown_category(base))?;
            return cat.set_feature(feat, values);
        }
        match op {
            "+=" => self.augment(name, values),
            "-=" => self.reduce(name, values),
            _ => self.define(name, values),
        }
    }

    /// Build a store from a block of category lines, e.g. the contents of a
    /// categories file. Blank lines are skipped; the first bad line fails.
    pub fn from_lines(text: &str) -> Result<Self, RuleError> {
        let mut store = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            store.apply_line(line)?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(lines: &str) -> CategoryStore {
        CategoryStore::from_lines(lines).unwrap()
    }

    #[test]
    fn define_lookup_order() {
        let s = store("V = a, e, i, o, u");
        assert_eq!(s.get("V").unwrap().to_string(), "a, e, i, o, u");
        assert_eq!(s.get("V").unwrap().index_of("i"), Some(2));
    }

    #[test]
    fn references_resolve_at_define_time() {
        let s = store("V = a,i,u\nN = m,n\nS = [V],[N]");
        assert_eq!(s.get("S").unwrap().to_string(), "a, i, u, m, n");
    }

    #[test]
    fn unknown_reference_fails_loudly() {
        let err = CategoryStore::from_lines("S = [V]").unwrap_err();
        assert_eq!(err, RuleError::unknown_category("V"));
    }

    #[test]
    fn augment_and_reduce() {
        let mut s = store("V = a,e");
        s.apply_line("V += i,o").unwrap();
        assert_eq!(s.get("V").unwrap().to_string(), "a, e, i, o");
        s.apply_line("V -= e,o").unwrap();
        assert_eq!(s.get("V").unwrap().to_string(), "a, i");
        assert!(s.apply_line("W += x").is_err());
    }

    #[test]
    fn empty_categories_are_pruned() {
        let mut s = store("V = a,e");
        s.apply_line("V -= a,e").unwrap();
        assert!(s.lookup("V").is_none());
        s.apply_line("W =").unwrap();
        assert!(s.lookup("W").is_none());
    }

    #[test]
    fn category_identities() {
        let s = store("A = a,b,c\nB = b,d");
        let a = s.get("A").unwrap();
        let b = s.get("B").unwrap();
        assert_eq!(a.intersection(a), *a);
        assert!(a.difference(a).is_empty());
        let lhs = a.union(b).difference(b);
        for v in a.difference(b).iter() {
            assert!(lhs.contains(v));
        }
    }

    #[test]
    fn features_are_subsets() {
        let mut s = store("C = p,t,k,b,d,g");
        s.apply_line("C.voiced = b,d,g").unwrap();
        assert_eq!(s.get("C").unwrap().feature("voiced").unwrap().len(), 3);
        assert!(s.apply_line("C.weird = z").is_err());
        assert!(s.apply_line("X.voiced = b").is_err());
    }

    #[test]
    fn reserved_values_rejected() {
        assert!(CategoryStore::from_lines("V = a,#").is_err());
        assert!(CategoryStore::from_lines("V = a,*").is_err());
    }
}
