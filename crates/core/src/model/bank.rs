use std::collections::HashMap;
use thiserror::Error;

use crate::model::exercise::Exercise;
use crate::model::ids::{CategoryName, ExerciseId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("unknown category: {0}")]
    CategoryNotFound(CategoryName),

    #[error("unknown exercise: {0}")]
    ExerciseNotFound(ExerciseId),

    #[error("duplicate exercise id: {0}")]
    DuplicateId(ExerciseId),

    #[error("duplicate category: {0}")]
    DuplicateCategory(CategoryName),

    #[error("exercise {id} belongs to {actual}, not {expected}")]
    CategoryMismatch {
        id: ExerciseId,
        expected: CategoryName,
        actual: CategoryName,
    },
}

impl BankError {
    /// True for the lookup failures (`CategoryNotFound`, `ExerciseNotFound`).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BankError::CategoryNotFound(_) | BankError::ExerciseNotFound(_)
        )
    }
}

/// Static, read-only collection of exercises grouped by category.
///
/// Categories keep the order they were supplied in; that order drives
/// [`ExerciseBank::categories`] and [`ExerciseBank::all`].
#[derive(Debug, Clone, Default)]
pub struct ExerciseBank {
    groups: Vec<(CategoryName, Vec<Exercise>)>,
    by_category: HashMap<CategoryName, usize>,
    by_id: HashMap<ExerciseId, (usize, usize)>,
}

impl ExerciseBank {
    /// Build a bank from category groups.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` or `BankError::DuplicateCategory` for repeated keys,
    /// and `BankError::CategoryMismatch` if an exercise sits under a foreign category.
    pub fn new(
        groups: impl IntoIterator<Item = (CategoryName, Vec<Exercise>)>,
    ) -> Result<Self, BankError> {
        let mut bank = Self::default();

        for (category, exercises) in groups {
            if bank.by_category.contains_key(&category) {
                return Err(BankError::DuplicateCategory(category));
            }
            let group_index = bank.groups.len();

            for (position, exercise) in exercises.iter().enumerate() {
                if exercise.category() != &category {
                    return Err(BankError::CategoryMismatch {
                        id: exercise.id().clone(),
                        expected: category,
                        actual: exercise.category().clone(),
                    });
                }
                if bank
                    .by_id
                    .insert(exercise.id().clone(), (group_index, position))
                    .is_some()
                {
                    return Err(BankError::DuplicateId(exercise.id().clone()));
                }
            }

            bank.by_category.insert(category.clone(), group_index);
            bank.groups.push((category, exercises));
        }

        Ok(bank)
    }

    /// Category names in supply order.
    #[must_use]
    pub fn categories(&self) -> Vec<&CategoryName> {
        self.groups.iter().map(|(name, _)| name).collect()
    }

    #[must_use]
    pub fn contains_category(&self, category: &CategoryName) -> bool {
        self.by_category.contains_key(category)
    }

    /// Exercises of a category in their authored order.
    ///
    /// # Errors
    ///
    /// Returns `BankError::CategoryNotFound` for unknown categories.
    pub fn get(&self, category: &CategoryName) -> Result<&[Exercise], BankError> {
        self.by_category
            .get(category)
            .map(|&index| self.groups[index].1.as_slice())
            .ok_or_else(|| BankError::CategoryNotFound(category.clone()))
    }

    /// Look up an exercise anywhere in the bank.
    ///
    /// # Errors
    ///
    /// Returns `BankError::ExerciseNotFound` for unknown ids.
    pub fn by_id(&self, id: &ExerciseId) -> Result<&Exercise, BankError> {
        self.by_id
            .get(id)
            .map(|&(group, position)| &self.groups[group].1[position])
            .ok_or_else(|| BankError::ExerciseNotFound(id.clone()))
    }

    /// Category an exercise belongs to.
    ///
    /// # Errors
    ///
    /// Returns `BankError::ExerciseNotFound` for unknown ids.
    pub fn category_of(&self, id: &ExerciseId) -> Result<&CategoryName, BankError> {
        self.by_id
            .get(id)
            .map(|&(group, _)| &self.groups[group].0)
            .ok_or_else(|| BankError::ExerciseNotFound(id.clone()))
    }

    /// Every exercise, category by category.
    pub fn all(&self) -> impl Iterator<Item = &Exercise> {
        self.groups.iter().flat_map(|(_, exercises)| exercises.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
