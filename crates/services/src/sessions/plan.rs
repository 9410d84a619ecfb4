use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rng};

use study_core::model::{
    CategoryName, Exercise, ExerciseBank, ExerciseId, SessionOrder, StudySettings,
};

use crate::error::SessionError;

/// Which exercises a session draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Category(CategoryName),
    /// Every category, in bank order.
    All,
}

impl Selection {
    #[must_use]
    pub fn category(&self) -> Option<&CategoryName> {
        match self {
            Selection::Category(name) => Some(name),
            Selection::All => None,
        }
    }
}

/// How a session orders and sizes its exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub order: SessionOrder,
    pub subset_size: Option<usize>,
    /// Reject a subset larger than the selection instead of clamping it.
    pub strict: bool,
    /// Fixed shuffle seed for reproducible orders.
    pub seed: Option<u64>,
}

impl SessionOptions {
    #[must_use]
    pub fn sequential() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shuffled() -> Self {
        Self {
            order: SessionOrder::Shuffled,
            ..Self::default()
        }
    }

    /// Order and strictness taken from the user's settings.
    #[must_use]
    pub fn from_settings(settings: &StudySettings) -> Self {
        Self {
            order: settings.default_order(),
            strict: settings.strict_subset(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_subset(mut self, size: usize) -> Self {
        self.subset_size = Some(size);
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Resolve a selection and options into the ordered exercise ids of a session.
///
/// Shuffled orders are a uniform permutation, seeded when `options.seed` is set.
///
/// # Errors
///
/// Returns `SessionError::InvalidCategory` for unknown categories and
/// `SessionError::InvalidRequest` for empty selections or oversized strict subsets.
pub fn build_order(
    bank: &ExerciseBank,
    selection: &Selection,
    options: &SessionOptions,
) -> Result<Vec<ExerciseId>, SessionError> {
    let mut ids: Vec<ExerciseId> = match selection {
        Selection::Category(name) => bank.get(name)?.iter().map(Exercise::id).cloned().collect(),
        Selection::All => bank.all().map(Exercise::id).cloned().collect(),
    };
    let available = ids.len();

    if options.order == SessionOrder::Shuffled {
        match options.seed {
            Some(seed) => ids.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => ids.shuffle(&mut rng()),
        }
    }

    if let Some(size) = options.subset_size {
        if size > available && options.strict {
            return Err(SessionError::invalid(format!(
                "subset of {size} requested but only {available} exercises are available"
            )));
        }
        ids.truncate(size);
    }

    if ids.is_empty() {
        return Err(SessionError::invalid("session has no exercises"));
    }
    Ok(ids)
}
