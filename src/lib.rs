//! An ordered sound-change applier for constructed-language work.
//!
//! Words written in a user-defined orthography are segmented into graphemes,
//! and a ruleset written in a compact notation is applied to them in order:
//!
//! ```
//! use soundlaw::{apply_ruleset, parse_ruleset, CategoryStore, Graphemes, Word};
//!
//! let graphs = Graphemes::default();
//! let mut cats = CategoryStore::new();
//! let rules = parse_ruleset("V = a,e,i,o,u\n[V] > / _ #", &mut cats, &graphs);
//! let words = vec![Word::parse("kata", &graphs)];
//! let out = apply_ruleset(words, &rules).unwrap();
//! assert_eq!(out[0].render(&graphs), "kat");
//! ```
//!
//! A rule line reads `targets > replacements / environments ! exceptions
//! flags`; `+` and `-` at the start of a line write epenthesis and deletion.
//! Lines containing `=` edit the category store instead. See the module docs
//! of [`rule`], [`notation`] and [`ruleset`] for the details of each layer.

pub mod builtin_rules;
pub mod category;
pub mod error;
pub mod language;
pub mod matcher;
pub mod notation;
pub mod pattern;
pub mod rule;
pub mod ruleset;
pub mod tokenizer;
pub mod word;

pub use category::{Category, CategoryStore};
pub use error::{LineDiagnostic, RuleError};
pub use language::Language;
pub use pattern::{Atom, Environment, Pattern, Target};
pub use rule::{Flags, Outcome, Rule};
pub use ruleset::{apply_ruleset, apply_source, parse_ruleset, parse_ruleset_verbose};
pub use tokenizer::{tokenize, Graphemes};
pub use word::Word;
