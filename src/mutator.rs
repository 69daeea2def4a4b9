//! Per-file mutation
//!
//! Applies every rule group, in order, to the text of one file. Each match is
//! handed to a pure evaluator that returns the replacement text together with
//! the number of indices it consumed, so the file-local index is threaded
//! through explicitly.

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::classifier::{classify_context, is_invalid_candidate, MatchContext};
use crate::codegen::index_call;
use crate::error::{MutationError, Result};
use crate::operand::{parse_left_operand, parse_right_operand};
use crate::rules::{
    MutationKind, RuleGroup, RuleMember, RuleSet, LHS_CAPTURE, OPERAND_CAPTURE, OPERATOR_CAPTURE,
    RHS_CAPTURE,
};

/// Upper bound on substitution passes for operator groups.
///
/// One pass can leave repeated operators of the same expression behind, so
/// operator groups are re-applied until no new mutation appears.
pub const DEFAULT_MAX_PASSES: usize = 6;

/// Outcome of mutating one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMutation {
    /// Mutated text, without the index definition
    pub source: String,
    /// Number of indices consumed; local indices run from 0 to this value
    pub mutations: u64,
}

/// Text produced for a single match
#[derive(Debug)]
struct Replacement {
    text: String,
    advance: u64,
}

impl Replacement {
    fn unchanged(caps: &Captures<'_>) -> Self {
        Self {
            text: caps[0].to_string(),
            advance: 0,
        }
    }

    fn text(text: String) -> Self {
        Self { text, advance: 0 }
    }

    fn call(text: String, member: &RuleMember) -> Self {
        Self {
            text,
            advance: u64::from(member.mutations),
        }
    }
}

/// Applies a rule set to file contents
#[derive(Debug, Clone)]
pub struct FileMutator<'r> {
    rules: &'r RuleSet,
    max_passes: usize,
}

impl<'r> FileMutator<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Override the pass limit for operator groups
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Mutate `source`, numbering call sites from zero.
    ///
    /// Groups with an unsupported kind are skipped with a warning. A match
    /// whose operator has no member entry fails the whole file.
    pub fn mutate(&self, source: &str) -> Result<FileMutation> {
        let mut text = source.to_string();
        let mut next_index = 0u64;

        for (position, group) in self.rules.groups().iter().enumerate() {
            let before = next_index;
            match group.kind {
                MutationKind::BinaryOperatorReplacement => {
                    if !contains_candidate_operator(&text, group) {
                        debug!(group = position, "no candidate operators, skipping group");
                        continue;
                    }
                    text = self.converge(group, text, &mut next_index, mutate_binary)?;
                }
                MutationKind::UnaryOperatorReplacement => {
                    text = self.converge(group, text, &mut next_index, mutate_unary)?;
                }
                MutationKind::LiteralValueReplacement => {
                    let (mutated, after) =
                        substitute(&group.pattern, &text, next_index, |caps, index| {
                            mutate_literal(group, caps, index)
                        })?;
                    text = mutated;
                    next_index = after;
                }
                MutationKind::Unsupported => {
                    let err = MutationError::UnsupportedKind { group: position };
                    warn!(error = %err, "skipping rule group");
                    continue;
                }
            }
            debug!(
                group = position,
                kind = %group.kind,
                mutations = next_index - before,
                "applied rule group"
            );
        }

        Ok(FileMutation {
            source: text,
            mutations: next_index,
        })
    }

    /// Re-apply a group until a pass adds nothing, up to `max_passes` times
    fn converge<F>(
        &self,
        group: &RuleGroup,
        mut text: String,
        next_index: &mut u64,
        evaluate: F,
    ) -> Result<String>
    where
        F: Fn(&RuleGroup, &Captures<'_>, u64) -> Result<Replacement>,
    {
        for _ in 0..self.max_passes {
            let before = *next_index;
            let (mutated, after) = substitute(&group.pattern, &text, before, |caps, index| {
                evaluate(group, caps, index)
            })?;
            text = mutated;
            *next_index = after;
            if after == before {
                break;
            }
        }
        Ok(text)
    }
}

/// Cheap guard before running a binary group's pattern.
///
/// Looks for any member operator surrounded by spaces. A bare `*` is ignored
/// since pointer declarations and dereferences would make it match nearly
/// every file. Only binary groups use this guard; unary groups always run
/// their pattern.
pub fn contains_candidate_operator(text: &str, group: &RuleGroup) -> bool {
    group
        .operators()
        .filter(|operator| *operator != "*")
        .any(|operator| text.contains(&format!(" {} ", operator)))
}

/// Replace every match of `pattern`, numbering from `start_index`.
///
/// Returns the new text and the next free index.
fn substitute<F>(pattern: &Regex, text: &str, start_index: u64, evaluate: F) -> Result<(String, u64)>
where
    F: Fn(&Captures<'_>, u64) -> Result<Replacement>,
{
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;
    let mut index = start_index;

    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&text[last_end..whole.start()]);
        let replacement = evaluate(&caps, index)?;
        out.push_str(&replacement.text);
        index += replacement.advance;
        last_end = whole.end();
    }
    out.push_str(&text[last_end..]);

    Ok((out, index))
}

fn capture<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map_or("", |m| m.as_str())
}

fn lookup<'g>(group: &'g RuleGroup, operator: &str) -> Result<&'g RuleMember> {
    group
        .member(operator)
        .ok_or_else(|| MutationError::UnknownOperator {
            kind: group.kind.to_string(),
            operator: operator.to_string(),
        })
}

fn mutate_binary(group: &RuleGroup, caps: &Captures<'_>, index: u64) -> Result<Replacement> {
    let lhs = capture(caps, LHS_CAPTURE);
    let rhs = capture(caps, RHS_CAPTURE);
    let operator = capture(caps, OPERATOR_CAPTURE);

    match classify_context(lhs) {
        // Dropping the operator keeps comment art from being matched again.
        MatchContext::Comment => return Ok(Replacement::text(format!("{}{}", lhs, rhs))),
        MatchContext::Literal => return Ok(Replacement::unchanged(caps)),
        MatchContext::Code => {}
    }

    let left = parse_left_operand(lhs);
    let right = parse_right_operand(rhs);
    if is_invalid_candidate(operator, left.operand, right.operand) {
        return Ok(Replacement::unchanged(caps));
    }

    let member = lookup(group, operator)?;
    let text = format!(
        "{}{}({}, {}, {}){}",
        left.pre_operand,
        member.function,
        left.operand,
        right.operand,
        index_call(index),
        right.post_operand
    );
    Ok(Replacement::call(text, member))
}

fn mutate_unary(group: &RuleGroup, caps: &Captures<'_>, index: u64) -> Result<Replacement> {
    let operand = capture(caps, OPERAND_CAPTURE);
    let member = lookup(group, capture(caps, OPERATOR_CAPTURE))?;
    let text = format!("{}({}, {})", member.function, operand, index_call(index));
    Ok(Replacement::call(text, member))
}

fn mutate_literal(group: &RuleGroup, caps: &Captures<'_>, index: u64) -> Result<Replacement> {
    let lhs = capture(caps, LHS_CAPTURE);
    let rhs = capture(caps, RHS_CAPTURE);
    let operator = capture(caps, OPERATOR_CAPTURE);

    match classify_context(lhs) {
        MatchContext::Comment => return Ok(Replacement::text(format!("{}{}", lhs, rhs))),
        MatchContext::Literal => return Ok(Replacement::unchanged(caps)),
        MatchContext::Code => {}
    }

    let member = lookup(group, operator)?;
    let text = format!(
        "{} {} {}({}, {})",
        lhs,
        operator,
        member.function,
        rhs,
        index_call(index)
    );
    Ok(Replacement::call(text, member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn binary_group(members: &[(&str, u32, &str)]) -> RuleGroup {
        let operators = members
            .iter()
            .map(|(operator, _, _)| regex::escape(operator))
            .collect::<Vec<_>>()
            .join("|");
        RuleGroup::build(
            MutationKind::BinaryOperatorReplacement,
            &format!(r"(?P<lhs>[^\n]*) (?P<operator>{}) (?P<rhs>[^;\n]*)", operators),
            members.len(),
            members
                .iter()
                .map(|(operator, mutations, function)| RuleMember::new(operator, *mutations, function))
                .collect(),
        )
        .unwrap()
    }

    fn unary_not() -> RuleGroup {
        RuleGroup::build(
            MutationKind::UnaryOperatorReplacement,
            r"(?P<operator>!)(?P<operand>\w+)",
            1,
            vec![RuleMember::new("!", 2, "MUT_NOT")],
        )
        .unwrap()
    }

    fn literal_assign() -> RuleGroup {
        RuleGroup::build(
            MutationKind::LiteralValueReplacement,
            r"(?P<lhs>[^\n]*\w) (?P<operator>=) (?P<rhs>\d+)",
            1,
            vec![RuleMember::new("=", 2, "MUT_LIT")],
        )
        .unwrap()
    }

    fn add_sub() -> RuleSet {
        RuleSet::new(vec![binary_group(&[("+", 3, "MUT_ADD"), ("-", 3, "MUT_SUB")])])
    }

    #[test]
    fn test_simple_addition() {
        let rules = add_sub();
        let result = FileMutator::new(&rules).mutate("result = a + b;").unwrap();
        assert_eq!(result.source, "result = MUT_ADD(a, b, MUTATION_INDEX(0));");
        assert_eq!(result.mutations, 3);
    }

    #[test]
    fn test_pointer_subtraction_untouched() {
        let rules = add_sub();
        let line = "if (pLeft - pRight > 0) {";
        let result = FileMutator::new(&rules).mutate(line).unwrap();
        assert_eq!(result.source, line);
        assert_eq!(result.mutations, 0);
    }

    #[test]
    fn test_string_concatenation_untouched() {
        let rules = add_sub();
        let line = r#"s = "abc" + name;"#;
        let result = FileMutator::new(&rules).mutate(line).unwrap();
        assert_eq!(result.source, line);
        assert_eq!(result.mutations, 0);
    }

    #[test]
    fn test_operator_in_string_untouched() {
        let rules = add_sub();
        let line = r#"printf("a + b");"#;
        let result = FileMutator::new(&rules).mutate(line).unwrap();
        assert_eq!(result.source, line);
        assert_eq!(result.mutations, 0);
    }

    #[test]
    fn test_operator_in_comment_gets_no_call() {
        let rules = add_sub();
        let result = FileMutator::new(&rules)
            .mutate("// total = a + b\nint x = y;\n")
            .unwrap();
        assert_eq!(result.source, "// total = ab\nint x = y;\n");
        assert_eq!(result.mutations, 0);
    }

    #[test]
    fn test_repeated_operator_converges() {
        let rules = add_sub();
        let result = FileMutator::new(&rules).mutate("x = a + b + c;").unwrap();
        assert_eq!(
            result.source,
            "x = MUT_ADD(a, MUT_ADD(b, c, MUTATION_INDEX(0)), MUTATION_INDEX(3));"
        );
        assert_eq!(result.mutations, 6);
    }

    #[test]
    fn test_pass_limit() {
        let rules = add_sub();
        let result = FileMutator::new(&rules)
            .with_max_passes(1)
            .mutate("x = a + b + c;")
            .unwrap();
        assert_eq!(result.source, "x = a + MUT_ADD(b, c, MUTATION_INDEX(0));");
        assert_eq!(result.mutations, 3);
    }

    #[test]
    fn test_operands_keep_brackets() {
        let rules = add_sub();
        let result = FileMutator::new(&rules)
            .mutate("if (items[i] - count(x, y) > 0) {")
            .unwrap();
        assert_eq!(
            result.source,
            "if (MUT_SUB(items[i], count(x, y), MUTATION_INDEX(0)) > 0) {"
        );
    }

    #[test]
    fn test_each_line_gets_its_own_index() {
        let rules = add_sub();
        let result = FileMutator::new(&rules)
            .mutate("a = b + c;\nd = e - f;\n")
            .unwrap();
        assert_eq!(
            result.source,
            "a = MUT_ADD(b, c, MUTATION_INDEX(0));\nd = MUT_SUB(e, f, MUTATION_INDEX(3));\n"
        );
        assert_eq!(result.mutations, 6);
    }

    #[test]
    fn test_precheck_ignores_bare_star() {
        let rules = RuleSet::new(vec![binary_group(&[("*", 2, "MUT_MUL")])]);
        let line = "int y = x * 2;";
        let result = FileMutator::new(&rules).mutate(line).unwrap();
        assert_eq!(result.source, line);
        assert_eq!(result.mutations, 0);
    }

    #[test]
    fn test_contains_candidate_operator() {
        let group = binary_group(&[("+", 1, "MUT_ADD"), ("*", 1, "MUT_MUL")]);
        assert!(contains_candidate_operator("a + b", &group));
        assert!(!contains_candidate_operator("a+b", &group));
        assert!(!contains_candidate_operator("a * b", &group));
    }

    #[test]
    fn test_unary() {
        let rules = RuleSet::new(vec![unary_not()]);
        let result = FileMutator::new(&rules).mutate("if (!ready) {").unwrap();
        assert_eq!(result.source, "if (MUT_NOT(ready, MUTATION_INDEX(0))) {");
        assert_eq!(result.mutations, 2);
    }

    #[test]
    fn test_literal() {
        let rules = RuleSet::new(vec![literal_assign()]);
        let result = FileMutator::new(&rules).mutate("count = 10;").unwrap();
        assert_eq!(result.source, "count = MUT_LIT(10, MUTATION_INDEX(0));");
        assert_eq!(result.mutations, 2);
    }

    #[test]
    fn test_literal_in_comment() {
        let rules = RuleSet::new(vec![literal_assign()]);
        let result = FileMutator::new(&rules).mutate("// count = 10\n").unwrap();
        assert_eq!(result.source, "// count10\n");
        assert_eq!(result.mutations, 0);
    }

    #[test]
    fn test_groups_apply_in_order() {
        let rules = RuleSet::new(vec![add_sub().groups()[0].clone(), literal_assign()]);
        let result = FileMutator::new(&rules)
            .mutate("x = y + 1;\nn = 5;\n")
            .unwrap();
        assert_eq!(
            result.source,
            "x = MUT_ADD(y, 1, MUTATION_INDEX(0));\nn = MUT_LIT(5, MUTATION_INDEX(3));\n"
        );
        assert_eq!(result.mutations, 5);
    }

    #[test]
    fn test_unsupported_group_is_skipped() {
        let unsupported = RuleGroup::build(
            MutationKind::Unsupported,
            "return",
            1,
            vec![RuleMember::new("return", 1, "MUT_RET")],
        )
        .unwrap();
        let rules = RuleSet::new(vec![unsupported, add_sub().groups()[0].clone()]);
        let result = FileMutator::new(&rules).mutate("return a + b;").unwrap();
        assert_eq!(result.source, "return MUT_ADD(a, b, MUTATION_INDEX(0));");
    }

    #[test]
    fn test_operator_without_member_fails_file() {
        let group = RuleGroup::build(
            MutationKind::BinaryOperatorReplacement,
            r"(?P<lhs>[^\n]*) (?P<operator>\+|-) (?P<rhs>[^;\n]*)",
            1,
            vec![RuleMember::new("+", 1, "MUT_ADD")],
        )
        .unwrap();
        let rules = RuleSet::new(vec![group]);
        let err = FileMutator::new(&rules).mutate("x = a + b - c;").unwrap_err();
        assert!(matches!(err, MutationError::UnknownOperator { .. }));
    }

    #[test]
    fn test_file_without_operators_is_identical() {
        let rules = add_sub();
        let source = "#include <stdio.h>\nint main(void) {\n    return 0;\n}\n";
        let result = FileMutator::new(&rules).mutate(source).unwrap();
        assert_eq!(result.source, source);
        assert_eq!(result.mutations, 0);
    }
}
