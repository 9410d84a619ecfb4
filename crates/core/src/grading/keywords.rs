use super::{Grade, GradeDetail, GradingError, GradingStrategy};
use crate::model::{Answer, AnswerKey, Concept, GradingSettings, KeywordRule};

/// Coverage band used for feedback colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageBand {
    Success,
    Partial,
    Low,
}

/// Common SQL ordering mistakes spotted in free-text answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlHint {
    /// `= NULL` used where `IS NULL` is needed.
    NullComparison,
    WhereAfterHaving,
    WhereAfterGroupBy,
}

/// Advisory keyword-coverage grader for SQL and relational-algebra answers.
#[derive(Debug, Clone, Default)]
pub struct KeywordGrader {
    settings: GradingSettings,
}

impl KeywordGrader {
    #[must_use]
    pub fn new(settings: GradingSettings) -> Self {
        Self { settings }
    }

    fn band(&self, coverage: u8) -> CoverageBand {
        if coverage >= self.settings.pass_threshold() {
            CoverageBand::Success
        } else if coverage >= self.settings.partial_threshold() {
            CoverageBand::Partial
        } else {
            CoverageBand::Low
        }
    }
}

impl GradingStrategy for KeywordGrader {
    fn evaluate(&self, key: &AnswerKey, answer: &Answer) -> Result<Grade, GradingError> {
        let (
            AnswerKey::Keywords {
                concepts,
                sql_checks,
            },
            Answer::Text(text),
        ) = (key, answer)
        else {
            return Err(GradingError::mismatch(key, answer));
        };

        let input = text.trim();
        let upper = input.to_uppercase();

        let (found, missing): (Vec<&Concept>, Vec<&Concept>) = concepts
            .iter()
            .partition(|concept| concept_present(concept, input, &upper));

        let coverage = coverage_percent(found.len(), concepts.len());
        let hints = if *sql_checks {
            sql_hints(&upper)
        } else {
            Vec::new()
        };

        Ok(Grade::Advisory {
            coverage,
            band: self.band(coverage),
            meets_threshold: coverage >= self.settings.pass_threshold(),
            detail: GradeDetail::Keywords {
                found: found.iter().map(|c| c.label.clone()).collect(),
                missing: missing.iter().map(|c| c.label.clone()).collect(),
                hints,
            },
        })
    }
}

fn concept_present(concept: &Concept, input: &str, upper: &str) -> bool {
    match concept.effective_rule() {
        KeywordRule::MinLength(n) => input.chars().count() > n,
        KeywordRule::AnyOf(words) => words.iter().any(|w| keyword_present(w, upper)),
        KeywordRule::AllOf(words) => words.iter().all(|w| keyword_present(w, upper)),
    }
}

/// Case-insensitive substring match. A keyword stripped down to letters, digits and
/// spaces is also accepted, so `"COUNT(*)"` matches `"count (*)"` via `"COUNT"`.
fn keyword_present(keyword: &str, upper: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    let keyword_upper = keyword.to_uppercase();
    if upper.contains(&keyword_upper) {
        return true;
    }
    let stripped: String = keyword_upper
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let stripped = stripped.trim();
    !stripped.is_empty() && upper.contains(stripped)
}

fn coverage_percent(found: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (found * 100 + total / 2) / total;
    u8::try_from(pct.min(100)).unwrap_or(100)
}

fn sql_hints(upper: &str) -> Vec<SqlHint> {
    let mut hints = Vec::new();

    if upper.contains("= NULL") && !upper.contains("IS NULL") {
        hints.push(SqlHint::NullComparison);
    }
    if let (Some(where_at), Some(having_at)) = (upper.find("WHERE"), upper.find("HAVING")) {
        if where_at > having_at {
            hints.push(SqlHint::WhereAfterHaving);
        }
    }
    if let (Some(where_at), Some(group_at)) = (upper.find("WHERE"), upper.find("GROUP BY")) {
        if group_at < where_at {
            hints.push(SqlHint::WhereAfterGroupBy);
        }
    }

    hints
}
