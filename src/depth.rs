//! Recursion accounting shared by the three parsers.
//!
//! A [`DepthBudget`] is `Copy` and is handed *by value* into every recursive
//! parse call, so each level sees the budget left by its ancestors only and
//! siblings never drain each other. Every value entered, scalar or container,
//! spends one unit: a value nested `d` levels deep (the top-level value being
//! level 1) parses only if `d <= limit`.
//!
//! Every level also costs the parser a native stack frame, so no budget,
//! "unlimited" included, ever allows more than [`MAX_DEPTH`] levels.

use crate::{Error, Result};

/// Hard ceiling on nesting, whatever limit the caller asked for.
pub const MAX_DEPTH: usize = 256;

/// Remaining nesting allowance for one parse call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthBudget {
    limit: Option<usize>,
    remaining: usize,
}

impl DepthBudget {
    /// A budget with no caller-chosen limit; only [`MAX_DEPTH`] applies.
    #[must_use]
    pub const fn unlimited() -> Self {
        DepthBudget {
            limit: None,
            remaining: MAX_DEPTH,
        }
    }

    /// A budget allowing values nested at most `limit` levels deep, capped at
    /// [`MAX_DEPTH`].
    #[must_use]
    pub const fn limited(limit: usize) -> Self {
        let remaining = if limit < MAX_DEPTH { limit } else { MAX_DEPTH };
        DepthBudget {
            limit: Some(limit),
            remaining,
        }
    }

    /// Builds a budget from an optional limit, `None` meaning unlimited.
    #[must_use]
    pub const fn new(limit: Option<usize>) -> Self {
        match limit {
            Some(limit) => Self::limited(limit),
            None => Self::unlimited(),
        }
    }

    /// Spends one level for the value about to be parsed and returns the
    /// budget its children get.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DepthLimitExceeded`] once the budget is exhausted.
    pub fn descend(self) -> Result<Self> {
        if self.remaining == 0 {
            return Err(Error::depth_limit_exceeded(self.effective_limit()));
        }
        Ok(DepthBudget {
            remaining: self.remaining - 1,
            ..self
        })
    }

    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// The number of levels actually allowed.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.limit.map_or(MAX_DEPTH, |limit| limit.min(MAX_DEPTH))
    }
}

impl Default for DepthBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limited_budget_allows_exactly_limit_levels() {
        let mut budget = DepthBudget::limited(3);
        for _ in 0..3 {
            budget = budget.descend().unwrap();
        }
        assert!(matches!(
            budget.descend(),
            Err(Error::DepthLimitExceeded { limit: 3 })
        ));
    }

    #[test]
    fn test_siblings_share_parent_budget() {
        let parent = DepthBudget::limited(2).descend().unwrap();
        let first = parent.descend().unwrap();
        let second = parent.descend().unwrap();
        assert_eq!(first, second);
        assert!(first.descend().is_err());
    }

    #[test]
    fn test_unlimited_stops_at_ceiling() {
        let mut budget = DepthBudget::new(None);
        for _ in 0..MAX_DEPTH {
            budget = budget.descend().unwrap();
        }
        assert_eq!(budget.limit(), None);
        assert!(matches!(
            budget.descend(),
            Err(Error::DepthLimitExceeded { limit: MAX_DEPTH })
        ));
    }

    #[test]
    fn test_large_limit_is_capped() {
        let budget = DepthBudget::limited(1_000_000);
        assert_eq!(budget.effective_limit(), MAX_DEPTH);
        assert_eq!(DepthBudget::limited(12).effective_limit(), 12);
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        assert!(DepthBudget::limited(0).descend().is_err());
    }
}
