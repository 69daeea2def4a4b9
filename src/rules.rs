//! Mutation rule model
//!
//! A rule document lists groups of operators that share one regular
//! expression. Every group member maps an operator to the replacement
//! function that implements its runtime variants.
//!
//! # Example Document
//!
//! ```yaml
//! version: "1.0"
//! groups:
//!   - kind: binary
//!     pattern: '(?P<lhs>[^\n]*) (?P<operator>\+|-) (?P<rhs>[^;\n]*)'
//!     member_count: 2
//!     members:
//!       - { operator: "+", mutations: 3, function: MUT_ADD }
//!       - { operator: "-", mutations: 3, function: MUT_SUB }
//! ```

use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{MutationError, Result};

/// Capture holding the text left of a binary operator or literal.
pub const LHS_CAPTURE: &str = "lhs";
/// Capture holding the text right of a binary operator, or the literal.
pub const RHS_CAPTURE: &str = "rhs";
/// Capture holding the matched operator.
pub const OPERATOR_CAPTURE: &str = "operator";
/// Capture holding the operand of a unary operator.
pub const OPERAND_CAPTURE: &str = "operand";

/// How a group rewrites its matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MutationKind {
    /// `lhs op rhs` becomes `fn(lhs, rhs, index)`
    #[serde(rename = "binary", alias = "operator_replacement_binary")]
    BinaryOperatorReplacement,
    /// `op operand` becomes `fn(operand, index)`
    #[serde(rename = "unary", alias = "operator_replacement_unary")]
    UnaryOperatorReplacement,
    /// `lhs op literal` becomes `lhs op fn(literal, index)`
    #[serde(rename = "literal", alias = "literal_value_replacement")]
    LiteralValueReplacement,
    /// A kind this engine does not know how to apply
    #[serde(other)]
    Unsupported,
}

impl MutationKind {
    /// Named captures a pattern of this kind must define
    pub fn required_captures(&self) -> &'static [&'static str] {
        match self {
            MutationKind::BinaryOperatorReplacement | MutationKind::LiteralValueReplacement => {
                &[LHS_CAPTURE, OPERATOR_CAPTURE, RHS_CAPTURE]
            }
            MutationKind::UnaryOperatorReplacement => &[OPERATOR_CAPTURE, OPERAND_CAPTURE],
            MutationKind::Unsupported => &[],
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::BinaryOperatorReplacement => "binary",
            MutationKind::UnaryOperatorReplacement => "unary",
            MutationKind::LiteralValueReplacement => "literal",
            MutationKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// One operator and the replacement function standing in for it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleMember {
    /// Operator text exactly as the pattern captures it
    #[serde(default)]
    pub operator: String,
    /// Number of runtime variants the replacement function provides
    #[serde(default)]
    pub mutations: u32,
    /// Name of the replacement function
    #[serde(default)]
    pub function: String,
}

impl RuleMember {
    pub fn new(operator: &str, mutations: u32, function: &str) -> Self {
        Self {
            operator: operator.to_string(),
            mutations,
            function: function.to_string(),
        }
    }

    /// A member is usable once every field has a value
    pub fn is_complete(&self) -> bool {
        !self.operator.is_empty() && self.mutations > 0 && !self.function.is_empty()
    }
}

/// A compiled rule group
#[derive(Debug, Clone)]
pub struct RuleGroup {
    pub kind: MutationKind,
    pub pattern: Regex,
    pub members: Vec<RuleMember>,
}

impl RuleGroup {
    /// Build a group, checking it is usable.
    ///
    /// The pattern must compile and define the captures its kind needs, and
    /// `expected_members` must equal the number of complete members given.
    pub fn build(
        kind: MutationKind,
        pattern: &str,
        expected_members: usize,
        members: Vec<RuleMember>,
    ) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| MutationError::InvalidPattern {
            pattern: pattern.to_string(),
            regex_error: e.to_string(),
        })?;

        for capture in kind.required_captures() {
            if !pattern.capture_names().flatten().any(|name| name == *capture) {
                return Err(MutationError::ConfigError {
                    message: format!(
                        "{} group pattern has no '{}' capture",
                        kind, capture
                    ),
                });
            }
        }

        if let Some(incomplete) = members.iter().find(|m| !m.is_complete()) {
            return Err(MutationError::ConfigError {
                message: format!(
                    "{} group member '{}' needs an operator, a positive mutation count and a function",
                    kind, incomplete.operator
                ),
            });
        }

        if expected_members == 0 || members.len() != expected_members {
            return Err(MutationError::ConfigError {
                message: format!(
                    "{} group declares {} member(s) but lists {}",
                    kind,
                    expected_members,
                    members.len()
                ),
            });
        }

        Ok(Self {
            kind,
            pattern,
            members,
        })
    }

    /// Find the member for a captured operator
    pub fn member(&self, operator: &str) -> Option<&RuleMember> {
        self.members.iter().find(|m| m.operator == operator)
    }

    /// Operators handled by this group, in declaration order
    pub fn operators(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.operator.as_str())
    }
}

/// Ordered, read-only collection of usable rule groups
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub version: String,
    groups: Vec<RuleGroup>,
    rejected: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RuleDocument {
    version: String,
    #[serde(default)]
    groups: Vec<GroupDocument>,
}

#[derive(Debug, Deserialize)]
struct GroupDocument {
    kind: Option<MutationKind>,
    pattern: Option<String>,
    #[serde(default)]
    member_count: usize,
    #[serde(default)]
    members: Vec<RuleMember>,
}

impl RuleSet {
    pub fn new(groups: Vec<RuleGroup>) -> Self {
        Self {
            version: String::new(),
            groups,
            rejected: Vec::new(),
        }
    }

    /// Load a rule document from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MutationError::ConfigError {
            message: format!("Failed to read rule file '{}': {}", path.display(), e),
        })?;

        Self::from_yaml(&content).map_err(|e| MutationError::ConfigError {
            message: format!("Failed to parse rule file '{}': {}", path.display(), e),
        })
    }

    /// Parse a rule document, keeping only usable groups.
    ///
    /// Unusable groups are logged and remembered in [`RuleSet::rejected`].
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let document: RuleDocument = serde_yaml::from_str(content)?;
        let mut set = RuleSet {
            version: document.version,
            ..RuleSet::default()
        };

        for (position, group) in document.groups.into_iter().enumerate() {
            let built = match (group.kind, group.pattern) {
                (Some(kind), Some(pattern)) => {
                    RuleGroup::build(kind, &pattern, group.member_count, group.members)
                }
                (None, _) => Err(MutationError::ConfigError {
                    message: "group has no kind".to_string(),
                }),
                (_, None) => Err(MutationError::ConfigError {
                    message: "group has no pattern".to_string(),
                }),
            };

            match built {
                Ok(rule) => {
                    if rule.kind == MutationKind::Unsupported {
                        warn!(group = position, "rule group has an unsupported kind");
                    }
                    debug!(group = position, kind = %rule.kind, members = rule.members.len(), "loaded rule group");
                    set.groups.push(rule);
                }
                Err(e) => {
                    warn!(group = position, error = %e, "dropping unusable rule group");
                    set.rejected.push(format!("group #{}: {}", position, e));
                }
            }
        }

        Ok(set)
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    /// Reasons for every group dropped while loading
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule_document() {
        let yaml = r#"
version: "1.0"
groups:
  - kind: binary
    pattern: '(?P<lhs>[^\n]*) (?P<operator>\+|-) (?P<rhs>[^;\n]*)'
    member_count: 2
    members:
      - operator: "+"
        mutations: 3
        function: MUT_ADD
      - operator: "-"
        mutations: 3
        function: MUT_SUB
  - kind: unary
    pattern: '(?P<operator>!)(?P<operand>\w+)'
    member_count: 1
    members:
      - { operator: "!", mutations: 1, function: MUT_NOT }
"#;

        let rules = RuleSet::from_yaml(yaml).unwrap();
        assert_eq!(rules.version, "1.0");
        assert_eq!(rules.len(), 2);
        assert!(rules.rejected().is_empty());

        let binary = &rules.groups()[0];
        assert_eq!(binary.kind, MutationKind::BinaryOperatorReplacement);
        assert_eq!(binary.operators().collect::<Vec<_>>(), vec!["+", "-"]);
        assert_eq!(binary.member("-").unwrap().function, "MUT_SUB");
        assert!(binary.member("*").is_none());

        assert_eq!(rules.groups()[1].kind, MutationKind::UnaryOperatorReplacement);
    }

    #[test]
    fn test_member_count_mismatch_drops_group() {
        let yaml = r#"
version: "1.0"
groups:
  - kind: binary
    pattern: '(?P<lhs>[^\n]*) (?P<operator>\+) (?P<rhs>[^;\n]*)'
    member_count: 2
    members:
      - { operator: "+", mutations: 3, function: MUT_ADD }
"#;
        let rules = RuleSet::from_yaml(yaml).unwrap();
        assert!(rules.is_empty());
        assert_eq!(rules.rejected().len(), 1);
        assert!(rules.rejected()[0].contains("declares 2"));
    }

    #[test]
    fn test_incomplete_member_drops_group() {
        let yaml = r#"
version: "1.0"
groups:
  - kind: literal
    pattern: '(?P<lhs>\w+) (?P<operator>=) (?P<rhs>\d+)'
    member_count: 1
    members:
      - { operator: "=", mutations: 0, function: MUT_LIT }
"#;
        let rules = RuleSet::from_yaml(yaml).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_missing_capture_drops_group() {
        let err = RuleGroup::build(
            MutationKind::UnaryOperatorReplacement,
            r"(?P<operator>!)\w+",
            1,
            vec![RuleMember::new("!", 1, "MUT_NOT")],
        )
        .unwrap_err();
        assert!(err.to_string().contains("'operand'"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RuleGroup::build(
            MutationKind::BinaryOperatorReplacement,
            r"(?P<lhs>[^\n]*",
            1,
            vec![RuleMember::new("+", 1, "MUT_ADD")],
        )
        .unwrap_err();
        assert!(matches!(err, MutationError::InvalidPattern { .. }));
    }

    #[test]
    fn test_unknown_kind_is_kept_as_unsupported() {
        let yaml = r#"
version: "1.0"
groups:
  - kind: statement_deletion
    pattern: 'return'
    member_count: 1
    members:
      - { operator: "return", mutations: 1, function: MUT_RET }
"#;
        let rules = RuleSet::from_yaml(yaml).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.groups()[0].kind, MutationKind::Unsupported);
    }

    #[test]
    fn test_group_without_kind_is_rejected() {
        let yaml = r#"
version: "1.0"
groups:
  - pattern: '(?P<lhs>x) (?P<operator>\+) (?P<rhs>y)'
    member_count: 1
    members:
      - { operator: "+", mutations: 1, function: MUT_ADD }
"#;
        let rules = RuleSet::from_yaml(yaml).unwrap();
        assert!(rules.is_empty());
        assert!(rules.rejected()[0].contains("no kind"));
    }

    #[test]
    fn test_empty_document() {
        let rules = RuleSet::from_yaml("version: \"1.0\"\n").unwrap();
        assert!(rules.is_empty());
    }
}
