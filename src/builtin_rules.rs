use indoc::indoc;

use crate::error::RuleError;
use crate::language::parse_graphs_list;
use crate::ruleset::apply_source;

/// A named bundle of orthography, categories, a ruleset, and input words
/// with their expected outputs. These double as acceptance tests and as the
/// material the `suite` subcommand runs.
pub trait RulesetScenario {
    fn get_name(&self) -> &'static str;
    /// graphs list: separator first, then polygraphs
    fn get_graphs(&self) -> &'static str {
        "'"
    }
    /// category lines applied before the ruleset
    fn get_categories(&self) -> &'static str {
        ""
    }
    fn get_ruleset(&self) -> &'static str;
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)>;
}

#[derive(Clone, Debug)]
pub struct Scenario {
    pub name: String,
    pub graphs: String,
    pub categories: String,
    pub ruleset: String,
    /// (input word, expected output)
    pub cases: Vec<(String, String)>,
}

/// Run one scenario end-to-end. Returns (input, expected, actual) triples.
pub fn run_scenario(scenario: &Scenario) -> Result<Vec<(String, String, String)>, RuleError> {
    let graphs = parse_graphs_list(&scenario.graphs)?;
    let inputs: Vec<&str> = scenario.cases.iter().map(|(i, _)| i.as_str()).collect();
    let (outputs, diagnostics) =
        apply_source(&graphs, &scenario.categories, &scenario.ruleset, &inputs)?;
    if let Some(diag) = diagnostics.first() {
        return Err(diag.error.clone());
    }
    Ok(scenario
        .cases
        .iter()
        .zip(outputs)
        .map(|((input, expected), actual)| (input.clone(), expected.clone(), actual))
        .collect())
}

#[derive(Debug, Default)]
pub struct ScenarioSuite {
    scenarios: Vec<Scenario>,
}

impl ScenarioSuite {
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    fn add<T: RulesetScenario>(&mut self, set: &T) {
        self.scenarios.push(Scenario {
            name: set.get_name().to_owned(),
            graphs: set.get_graphs().to_owned(),
            categories: set.get_categories().to_owned(),
            ruleset: set.get_ruleset().to_owned(),
            cases: set
                .get_inputs_expected()
                .into_iter()
                .map(|(i, e)| (i.to_owned(), e.to_owned()))
                .collect(),
        });
    }
}

impl IntoIterator for ScenarioSuite {
    type Item = Scenario;
    type IntoIter = std::vec::IntoIter<Scenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.into_iter()
    }
}

pub fn all_builtin_scenarios() -> ScenarioSuite {
    let mut suite = ScenarioSuite::default();
    suite.add(&SmokeSubstitution {});
    suite.add(&SmokeEpenthesis {});
    suite.add(&SmokeDeletion {});
    suite.add(&SmokeFinalVowelLoss {});
    suite.add(&SmokeMetathesis {});
    suite.add(&SmokeElse {});
    suite.add(&SmokeCorrespondence {});
    suite.add(&SmokeNonce {});
    suite.add(&SmokeFeatures {});
    suite.add(&SmokePolygraphs {});
    suite.add(&SmokeWildcard {});
    suite.add(&SmokeOptional {});
    suite.add(&SmokeException {});
    suite.add(&SmokeCount {});
    suite.add(&SmokeRepeat {});
    suite.add(&SmokeAge {});
    suite.add(&SmokeCategoryEdits {});
    suite.add(&SuiteLenition {});
    suite
}

// smoke scenarios
pub struct SmokeSubstitution {}
pub struct SmokeEpenthesis {}
pub struct SmokeDeletion {}
pub struct SmokeFinalVowelLoss {}
pub struct SmokeMetathesis {}
pub struct SmokeElse {}
pub struct SmokeCorrespondence {}
pub struct SmokeNonce {}
pub struct SmokeFeatures {}
pub struct SmokePolygraphs {}
pub struct SmokeWildcard {}
pub struct SmokeOptional {}
pub struct SmokeException {}
pub struct SmokeCount {}
pub struct SmokeRepeat {}
pub struct SmokeAge {}
pub struct SmokeCategoryEdits {}

// fuller chains
pub struct SuiteLenition {}

/// the simplest possible change
impl RulesetScenario for SmokeSubstitution {
    fn get_name(&self) -> &'static str {
        "SmokeSubstitution"
    }
    fn get_ruleset(&self) -> &'static str {
        "a > b"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("a", "b"), ("kata", "kbtb")]
    }
}

/// insertion at the word edge
impl RulesetScenario for SmokeEpenthesis {
    fn get_name(&self) -> &'static str {
        "SmokeEpenthesis"
    }
    fn get_ruleset(&self) -> &'static str {
        "+ b / _ #"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("a", "ab"), ("tata", "tatab")]
    }
}

/// bare deletion
impl RulesetScenario for SmokeDeletion {
    fn get_name(&self) -> &'static str {
        "SmokeDeletion"
    }
    fn get_ruleset(&self) -> &'static str {
        "- b"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("ab", "a"), ("baba", "aa")]
    }
}

/// category target, environment-gated deletion
impl RulesetScenario for SmokeFinalVowelLoss {
    fn get_name(&self) -> &'static str {
        "SmokeFinalVowelLoss"
    }
    fn get_categories(&self) -> &'static str {
        "V = a,e,i,o,u"
    }
    fn get_ruleset(&self) -> &'static str {
        "[V] > / _ #"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("kata", "kat"), ("kat", "kat")]
    }
}

/// `?` replacement reverses the matched span
impl RulesetScenario for SmokeMetathesis {
    fn get_name(&self) -> &'static str {
        "SmokeMetathesis"
    }
    fn get_ruleset(&self) -> &'static str {
        "a n > ?"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("pan", "pna"), ("anan", "nana")]
    }
}

/// the else-branch fires where the primary gate fails
impl RulesetScenario for SmokeElse {
    fn get_name(&self) -> &'static str {
        "SmokeElse"
    }
    fn get_ruleset(&self) -> &'static str {
        "a > e / _ i > o / _ u"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("ai au aa", "ei ou aa")]
    }
}

/// positional category-to-category substitution
impl RulesetScenario for SmokeCorrespondence {
    fn get_name(&self) -> &'static str {
        "SmokeCorrespondence"
    }
    fn get_categories(&self) -> &'static str {
        "V = a,i,u\nP = p,t,k\nB = b,d,g"
    }
    fn get_ruleset(&self) -> &'static str {
        "[P] > [B] / [V] _ [V]"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        // voicing only between vowels, and each stop maps to its own ordinal
        vec![("apa", "aba"), ("aka", "aga"), ("apta", "apta")]
    }
}

/// nonce categories written inline
impl RulesetScenario for SmokeNonce {
    fn get_name(&self) -> &'static str {
        "SmokeNonce"
    }
    fn get_ruleset(&self) -> &'static str {
        "[m,n] > n / _ #"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("tam", "tan"), ("mata", "mata")]
    }
}

/// feature-filtered category references
impl RulesetScenario for SmokeFeatures {
    fn get_name(&self) -> &'static str {
        "SmokeFeatures"
    }
    fn get_categories(&self) -> &'static str {
        "C = p,t,k,b,d,g\nC.voiced = b,d,g"
    }
    fn get_ruleset(&self) -> &'static str {
        "[C+voiced] > / _ #"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("tad", "ta"), ("tat", "tat")]
    }
}

/// polygraphs tokenize as single segments
impl RulesetScenario for SmokePolygraphs {
    fn get_name(&self) -> &'static str {
        "SmokePolygraphs"
    }
    fn get_graphs(&self) -> &'static str {
        "',sh,ng"
    }
    fn get_ruleset(&self) -> &'static str {
        "sh > s"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        // s'h is two graphemes, so the rule must leave it alone
        vec![("shang", "sang"), ("s'hang", "s'hang")]
    }
}

/// wildcard environments reach across the word
impl RulesetScenario for SmokeWildcard {
    fn get_name(&self) -> &'static str {
        "SmokeWildcard"
    }
    fn get_ruleset(&self) -> &'static str {
        "a > e / _ * i"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("katami", "ketemi"), ("kata", "kata")]
    }
}

/// optional groups in environments
impl RulesetScenario for SmokeOptional {
    fn get_name(&self) -> &'static str {
        "SmokeOptional"
    }
    fn get_ruleset(&self) -> &'static str {
        "u > o / t (r) _"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("tu", "to"), ("tru", "tro"), ("ku", "ku")]
    }
}

/// exceptions veto otherwise-matching sites
impl RulesetScenario for SmokeException {
    fn get_name(&self) -> &'static str {
        "SmokeException"
    }
    fn get_ruleset(&self) -> &'static str {
        "a > o ! _ n"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("ana", "ano"), ("an", "an")]
    }
}

/// count selectors pick ordinals from the match list
impl RulesetScenario for SmokeCount {
    fn get_name(&self) -> &'static str {
        "SmokeCount"
    }
    fn get_ruleset(&self) -> &'static str {
        "a@0|2 > o"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("banana", "bonano"), ("ba", "bo")]
    }
}

/// repeat re-applies within the pass until the count or a fixpoint
impl RulesetScenario for SmokeRepeat {
    fn get_name(&self) -> &'static str {
        "SmokeRepeat"
    }
    fn get_ruleset(&self) -> &'static str {
        "ab > b repeat:0"
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("aaab", "b"), ("ba", "ba")]
    }
}

/// age keeps a rule alive across later passes
impl RulesetScenario for SmokeAge {
    fn get_name(&self) -> &'static str {
        "SmokeAge"
    }
    fn get_ruleset(&self) -> &'static str {
        indoc! {"
            a > b age:2
            o > a
        "}
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        // the o-born a is caught because the first rule is still active
        vec![("oa", "bb")]
    }
}

/// category lines interleave with rules and take effect immediately
impl RulesetScenario for SmokeCategoryEdits {
    fn get_name(&self) -> &'static str {
        "SmokeCategoryEdits"
    }
    fn get_ruleset(&self) -> &'static str {
        indoc! {"
            V = a,e
            [V] > o
            V += o
            [V] > u / _ #
        "}
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("kate", "kotu")]
    }
}

/// a small chain in the shape real changes take
impl RulesetScenario for SuiteLenition {
    fn get_name(&self) -> &'static str {
        "SuiteLenition"
    }
    fn get_categories(&self) -> &'static str {
        indoc! {"
            V = a,e,i,o,u
            P = p,t,k
            B = b,d,g
        "}
    }
    fn get_ruleset(&self) -> &'static str {
        indoc! {"
            [P] > [B] / [V] _ [V]
            [V] > / _ # age:2
            + e / # _ s
        "}
    }
    fn get_inputs_expected(&self) -> Vec<(&'static str, &'static str)> {
        vec![("apati", "abad"), ("skata", "eskad"), ("puke", "pug")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_is_populated() {
        let suite = all_builtin_scenarios();
        assert!(suite.len() > 10);
    }
}
