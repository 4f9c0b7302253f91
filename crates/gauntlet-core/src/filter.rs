//! Selection filtering: which discovered tests actually execute.
//!
//! A filter set is an ordered list of include/exclude rules over category,
//! identifier, and name, parsed from CLI tokens of the form
//! `INCLUDE|EXCLUDE CATEGORY|IDENTIFIER|NAME=value[;value...]`. Malformed
//! tokens degrade to "no filtering on that token" rather than failing
//! startup.

use crate::case::TestIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Whether a rule admits or vetoes matching tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// Matching tests become candidates for inclusion.
    Include,
    /// Matching tests are vetoed outright.
    Exclude,
}

/// The identity field a rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleTarget {
    /// The category path (full path or any segment).
    Category,
    /// The external tracking identifier.
    Identifier,
    /// The test name.
    Name,
}

impl RuleTarget {
    const ALL: [RuleTarget; 3] = [RuleTarget::Category, RuleTarget::Identifier, RuleTarget::Name];
}

/// One include/exclude rule with its case-normalized matcher set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Include or exclude.
    pub kind: RuleKind,
    /// Which identity field to match.
    pub target: RuleTarget,
    /// Lowercased values; a test matches if its field value is in the set.
    pub matchers: HashSet<String>,
}

impl FilterRule {
    /// Whether this rule's matcher set contains the candidate's value for
    /// its target. Matching is case-insensitive; a test without an
    /// identifier never matches an identifier rule; category rules accept
    /// the full path or any path segment.
    fn matches(&self, test: &TestIdentity) -> bool {
        match self.target {
            RuleTarget::Name => self.matchers.contains(&test.name.to_lowercase()),
            RuleTarget::Identifier => test
                .identifier
                .as_deref()
                .is_some_and(|id| self.matchers.contains(&id.to_lowercase())),
            RuleTarget::Category => {
                self.matchers.contains(&test.category.to_lowercase())
                    || test
                        .category_segments()
                        .any(|seg| self.matchers.contains(&seg.to_lowercase()))
            }
        }
    }
}

/// An ordered sequence of filter rules. Empty means "run everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    rules: Vec<FilterRule>,
}

impl FilterSet {
    /// A filter that admits every test.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses CLI filter tokens into a filter set.
    ///
    /// Each token is `KIND TARGET=value[;value...]`; kind and target are
    /// matched case-insensitively. Malformed tokens and unknown kind/target
    /// words are dropped with a warning, never rejected.
    pub fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = tokens
            .into_iter()
            .filter_map(|token| {
                let token = token.as_ref();
                let rule = parse_token(token);
                if rule.is_none() {
                    warn!("ignoring malformed filter token: {token:?}");
                }
                rule
            })
            .collect();
        Self { rules }
    }

    /// The parsed rules, in the order they were given.
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Whether no rules were specified.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Decides whether a discovered test is selected to run.
    ///
    /// An exclude match is an absolute veto. Include rules are additive but
    /// only constrain a target when at least one include rule exists for it;
    /// a target with no include rules is not filtered on.
    pub fn is_eligible(&self, test: &TestIdentity) -> bool {
        if self
            .rules
            .iter()
            .any(|r| r.kind == RuleKind::Exclude && r.matches(test))
        {
            return false;
        }

        for target in RuleTarget::ALL {
            let mut includes = self
                .rules
                .iter()
                .filter(|r| r.kind == RuleKind::Include && r.target == target)
                .peekable();
            if includes.peek().is_some() && !includes.any(|r| r.matches(test)) {
                return false;
            }
        }
        true
    }
}

fn parse_token(token: &str) -> Option<FilterRule> {
    let (kind_word, rest) = token.trim().split_once(char::is_whitespace)?;
    let kind = match kind_word.to_ascii_uppercase().as_str() {
        "INCLUDE" => RuleKind::Include,
        "EXCLUDE" => RuleKind::Exclude,
        _ => return None,
    };

    let (target_word, values) = rest.trim().split_once('=')?;
    let target = match target_word.trim().to_ascii_uppercase().as_str() {
        "CATEGORY" => RuleTarget::Category,
        "IDENTIFIER" => RuleTarget::Identifier,
        "NAME" => RuleTarget::Name,
        _ => return None,
    };

    let matchers: HashSet<String> = values
        .split(';')
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect();
    if matchers.is_empty() {
        return None;
    }

    Some(FilterRule {
        kind,
        target,
        matchers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str, category: &str, identifier: Option<&str>) -> TestIdentity {
        TestIdentity {
            name: name.to_string(),
            description: String::new(),
            category: category.to_string(),
            identifier: identifier.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_set_admits_everything() {
        let filter = FilterSet::none();
        assert!(filter.is_eligible(&identity("Anything", "Any/Where", None)));
    }

    #[test]
    fn test_parse_single_include() {
        let filter = FilterSet::parse(["INCLUDE CATEGORY=Smoke"]);
        assert_eq!(filter.rules().len(), 1);
        assert_eq!(filter.rules()[0].kind, RuleKind::Include);
        assert_eq!(filter.rules()[0].target, RuleTarget::Category);
        assert!(filter.rules()[0].matchers.contains("smoke"));
    }

    #[test]
    fn test_parse_multi_value_and_case() {
        let filter = FilterSet::parse(["exclude name=Foo; Bar ;baz"]);
        let rule = &filter.rules()[0];
        assert_eq!(rule.kind, RuleKind::Exclude);
        assert_eq!(rule.matchers.len(), 3);
        assert!(rule.matchers.contains("bar"));
    }

    #[test]
    fn test_malformed_tokens_are_dropped() {
        let filter = FilterSet::parse([
            "INCLUDE",                 // no target
            "FROB CATEGORY=Smoke",    // unknown kind
            "INCLUDE COLOR=Red",      // unknown target
            "INCLUDE NAME=",          // no values
            "INCLUDE CATEGORY=Smoke", // the one valid token
        ]);
        assert_eq!(filter.rules().len(), 1);
    }

    #[test]
    fn test_include_category_admits_and_rejects() {
        let filter = FilterSet::parse(["INCLUDE CATEGORY=Smoke"]);
        assert!(filter.is_eligible(&identity("A", "Smoke", None)));
        assert!(!filter.is_eligible(&identity("B", "Regression", None)));
    }

    #[test]
    fn test_exclude_vetoes_despite_include_match() {
        let filter = FilterSet::parse(["EXCLUDE NAME=Foo", "INCLUDE CATEGORY=Smoke"]);
        assert!(!filter.is_eligible(&identity("Foo", "Smoke", None)));
        assert!(filter.is_eligible(&identity("Bar", "Smoke", None)));
    }

    #[test]
    fn test_unfiltered_targets_are_unconstrained() {
        // Only category has include rules; names are not filtered on.
        let filter = FilterSet::parse(["INCLUDE CATEGORY=Smoke"]);
        assert!(filter.is_eligible(&identity("UnlistedName", "Smoke", None)));
    }

    #[test]
    fn test_multiple_includes_for_one_target_are_additive() {
        let filter = FilterSet::parse(["INCLUDE NAME=Alpha", "INCLUDE NAME=Beta"]);
        assert!(filter.is_eligible(&identity("alpha", "", None)));
        assert!(filter.is_eligible(&identity("Beta", "", None)));
        assert!(!filter.is_eligible(&identity("Gamma", "", None)));
    }

    #[test]
    fn test_category_matches_segment_or_full_path() {
        let filter = FilterSet::parse(["INCLUDE CATEGORY=network"]);
        assert!(filter.is_eligible(&identity("A", "smoke/network", None)));

        let filter = FilterSet::parse(["INCLUDE CATEGORY=smoke/network"]);
        assert!(filter.is_eligible(&identity("A", "Smoke/Network", None)));
        assert!(!filter.is_eligible(&identity("B", "smoke", None)));
    }

    #[test]
    fn test_missing_identifier_never_matches() {
        let include = FilterSet::parse(["INCLUDE IDENTIFIER=JIRA-42"]);
        assert!(!include.is_eligible(&identity("A", "", None)));
        assert!(include.is_eligible(&identity("A", "", Some("jira-42"))));

        let exclude = FilterSet::parse(["EXCLUDE IDENTIFIER=JIRA-42"]);
        assert!(exclude.is_eligible(&identity("A", "", None)));
    }
}
