use std::collections::BTreeSet;

use super::{Grade, GradeDetail, GradingError, GradingStrategy};
use crate::model::{Answer, AnswerKey};

/// Order-insensitive comparison for closures, candidate keys and minimal covers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetEqualityGrader;

impl GradingStrategy for SetEqualityGrader {
    fn evaluate(&self, key: &AnswerKey, answer: &Answer) -> Result<Grade, GradingError> {
        let (expected, submitted): (BTreeSet<String>, BTreeSet<String>) = match (key, answer) {
            (AnswerKey::AttributeSet { attributes }, Answer::Set(items)) => (
                normalize_members(attributes.iter().map(String::as_str)),
                normalize_members(items.iter().map(String::as_str)),
            ),
            (AnswerKey::KeySet { keys }, Answer::KeySet(submitted)) => {
                (normalize_keys(keys), normalize_keys(submitted))
            }
            (AnswerKey::DependencySet { dependencies }, Answer::Set(items)) => (
                dependencies.iter().map(|d| normalize_dependency(d)).collect(),
                items
                    .iter()
                    .filter(|d| !d.trim().is_empty())
                    .map(|d| normalize_dependency(d))
                    .collect(),
            ),
            _ => return Err(GradingError::mismatch(key, answer)),
        };

        let missing: Vec<String> = expected.difference(&submitted).cloned().collect();
        let extra: Vec<String> = submitted.difference(&expected).cloned().collect();

        Ok(Grade::Hard {
            correct: missing.is_empty() && extra.is_empty(),
            detail: GradeDetail::Set { missing, extra },
        })
    }
}

fn normalize_member(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn normalize_members<'a>(items: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    items
        .map(normalize_member)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Each key becomes its sorted attributes joined into one canonical member.
fn normalize_keys(keys: &[Vec<String>]) -> BTreeSet<String> {
    keys.iter()
        .map(|key| normalize_members(key.iter().map(String::as_str)))
        .filter(|key| !key.is_empty())
        .map(|key| join_attributes(&key))
        .collect()
}

fn join_attributes(attributes: &BTreeSet<String>) -> String {
    let single_letters = attributes.iter().all(|a| a.chars().count() == 1);
    let parts: Vec<&str> = attributes.iter().map(String::as_str).collect();
    if single_letters {
        parts.concat()
    } else {
        parts.join(",")
    }
}

fn dependency_side(side: &str) -> String {
    let attributes: BTreeSet<String> = if side.contains(',') {
        side.split(',')
            .map(normalize_member)
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        side.chars().map(|c| c.to_uppercase().collect()).collect()
    };
    join_attributes(&attributes)
}

/// Canonical form of a functional dependency such as `"ba -> c"` → `"AB→C"`.
///
/// Whitespace is dropped, `->` is read as `→`, and the attributes on each side are
/// sorted. Strings without an arrow are only upper-cased.
#[must_use]
pub fn normalize_dependency(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.replace("->", "→");

    match compact.split_once('→') {
        Some((lhs, rhs)) => format!("{}→{}", dependency_side(lhs), dependency_side(rhs)),
        None => compact.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn closure_grading_ignores_order_and_case() {
        let key = AnswerKey::AttributeSet {
            attributes: strings(&["A", "B", "C"]),
        };
        let grade = SetEqualityGrader
            .evaluate(&key, &Answer::Set(strings(&["B", " c", "a"])))
            .unwrap();
        assert_eq!(grade.correct(), Some(true));
    }

    #[test]
    fn closure_grading_reports_missing_and_extra() {
        let key = AnswerKey::AttributeSet {
            attributes: strings(&["A", "B", "C", "D", "E"]),
        };
        let grade = SetEqualityGrader
            .evaluate(&key, &Answer::Set(strings(&["A", "B", "C", "F"])))
            .unwrap();
        assert_eq!(grade.correct(), Some(false));
        assert_eq!(
            grade.detail(),
            &GradeDetail::Set {
                missing: strings(&["D", "E"]),
                extra: strings(&["F"]),
            }
        );
    }

    #[test]
    fn candidate_keys_compare_as_set_of_sets() {
        let key = AnswerKey::KeySet {
            keys: vec![strings(&["A"]), strings(&["B", "C"])],
        };
        let submitted = Answer::KeySet(vec![strings(&["C", "B"]), strings(&["A"])]);
        let grade = SetEqualityGrader.evaluate(&key, &submitted).unwrap();
        assert_eq!(grade.correct(), Some(true));
    }

    #[test]
    fn candidate_keys_from_compact_lines() {
        let key = AnswerKey::KeySet {
            keys: vec![strings(&["A", "D"]), strings(&["B", "C"])],
        };
        let grade = SetEqualityGrader
            .evaluate(&key, &Answer::keys_from_lines("cb\nDA\n"))
            .unwrap();
        assert_eq!(grade.correct(), Some(true));
    }

    #[test]
    fn missing_candidate_key_fails() {
        let key = AnswerKey::KeySet {
            keys: vec![strings(&["A"]), strings(&["B", "C"])],
        };
        let grade = SetEqualityGrader
            .evaluate(&key, &Answer::KeySet(vec![strings(&["A"])]))
            .unwrap();
        assert_eq!(grade.correct(), Some(false));
        assert_eq!(
            grade.detail(),
            &GradeDetail::Set {
                missing: strings(&["BC"]),
                extra: Vec::new(),
            }
        );
    }

    #[test]
    fn dependencies_normalize_arrows_and_sides() {
        assert_eq!(normalize_dependency("b a -> c"), "AB→C");
        assert_eq!(normalize_dependency("CD → E"), "CD→E");
        assert_eq!(
            normalize_dependency("Emp, Dept -> Mgr, Loc"),
            "DEPT,EMP→LOC,MGR"
        );
    }

    #[test]
    fn minimal_cover_grading_ignores_line_order() {
        let key = AnswerKey::DependencySet {
            dependencies: strings(&["A → B", "B → C", "CD → E"]),
        };
        let grade = SetEqualityGrader
            .evaluate(
                &key,
                &Answer::dependencies_from_lines("dc -> e\nA->B\nb → c\n"),
            )
            .unwrap();
        assert_eq!(grade.correct(), Some(true));
    }

    #[test]
    fn key_set_answer_does_not_fit_attribute_closure() {
        let key = AnswerKey::AttributeSet {
            attributes: strings(&["A"]),
        };
        assert!(
            SetEqualityGrader
                .evaluate(&key, &Answer::KeySet(vec![strings(&["A"])]))
                .is_err()
        );
    }
}
