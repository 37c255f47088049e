//! The engine's load-bearing guarantees, exercised end to end.

use smol_str::SmolStr;

use soundlaw::matcher::target_candidates;
use soundlaw::pattern::{Atom, Pattern, Target};
use soundlaw::rule::Outcome;
use soundlaw::{parse_ruleset, CategoryStore, Graphemes, Rule, Word};

fn graphs() -> Graphemes {
    Graphemes::new('\'', ["sh", "ng", "aa"]).unwrap()
}

fn parse_rule(src: &str) -> Rule {
    Rule::parse(src, &CategoryStore::new(), &Graphemes::default()).unwrap()
}

#[test]
fn tokenize_render_tokenize_is_identity() {
    let g = graphs();
    for text in ["kata", "shaana", "s'hang", "a'ang sha", "ng'asha", "  spaced  out  "] {
        let tokens = g.tokenize(text);
        let rendered = g.render(&tokens);
        assert_eq!(g.tokenize(&rendered), tokens, "via {rendered:?} from {text:?}");
    }
}

#[test]
fn unchanged_means_identical_tokens() {
    let g = Graphemes::default();
    for (src, input) in [("x > y", "kata"), ("a > b / z _", "kata"), ("a > a", "kata")] {
        let rule = parse_rule(src);
        let mut w = Word::parse(input, &g);
        let before = w.tokens().to_vec();
        if rule.apply(&mut w).unwrap() == Outcome::Unchanged {
            assert_eq!(w.tokens(), before.as_slice(), "rule {src}");
        }
    }
}

#[test]
fn identity_rules_always_signal_unchanged() {
    let g = Graphemes::default();
    for (src, input) in [("a > a", "banana"), ("a > a / _ n", "banana"), ("t > t", "kata")] {
        let rule = parse_rule(src);
        let mut w = Word::parse(input, &g);
        assert_eq!(rule.apply(&mut w).unwrap(), Outcome::Unchanged, "rule {src}");
    }
}

#[test]
fn match_positions_are_strictly_ordered_and_in_range() {
    let g = Graphemes::default();
    let w = Word::parse("banana na", &g);
    let target = Target::every(Pattern::new(vec![
        Atom::Literal(SmolStr::new("n")),
        Atom::Literal(SmolStr::new("a")),
    ]));
    let hits = target_candidates(&w, &target);
    assert!(!hits.is_empty());
    for pair in hits.windows(2) {
        assert!(pair[0].0 > pair[1].0, "not strictly decreasing: {hits:?}");
    }
    for (pos, _) in hits {
        assert!(pos < w.len());
    }
}

#[test]
fn direction_agrees_when_only_one_site_matches() {
    let g = Graphemes::default();
    for (plain, ltr, input) in [
        ("t > d", "t > d ltr", "kata"),
        ("an > ?", "an > ? ltr", "pan"),
        ("a > e / k _", "a > e / k _ ltr", "mikan"),
    ] {
        let mut w1 = Word::parse(input, &g);
        let mut w2 = Word::parse(input, &g);
        parse_rule(plain).apply(&mut w1).unwrap();
        parse_rule(ltr).apply(&mut w2).unwrap();
        assert_eq!(w1, w2, "rules '{plain}' vs '{ltr}'");
    }
}

#[test]
fn boundary_count_survives_every_operation() {
    let g = Graphemes::default();
    let sources = ["a > e", "+ t / _ #", "- n", "an > ?", "a > % %"];
    for src in sources {
        let mut w = Word::parse("ana ana", &g);
        let n = w.boundary_count();
        parse_rule(src).apply(&mut w).unwrap();
        assert_eq!(w.boundary_count(), n, "rule {src}");
    }
}

#[test]
fn ruleset_parsing_survives_bad_lines_and_keeps_applying() {
    let g = Graphemes::default();
    let mut cats = CategoryStore::new();
    let rules = parse_ruleset("a > e\n[Oops] > x\ne > i", &mut cats, &g);
    assert_eq!(rules.len(), 2);
    let out = soundlaw::apply_ruleset(vec![Word::parse("kata", &g)], &rules).unwrap();
    assert_eq!(out[0].render(&g), "kiti");
}
