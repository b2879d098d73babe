use crate::pumpkin_assert_simple;

/// Schedules the objective terms by weight.
///
/// The levels are the distinct weights of the soft clauses in decreasing order, except that the
/// last level is always 1 so that every residual weight is assumed eventually. A term is assumed
/// when its residual weight is at least the active level; lowering the level merges the next
/// tier into the assumed ones.
#[derive(Debug, Clone)]
pub(crate) struct Stratification {
    levels: Vec<u64>,
    active: usize,
}

impl Stratification {
    pub(crate) fn new(weights: impl IntoIterator<Item = u64>, is_enabled: bool) -> Stratification {
        if !is_enabled {
            return Stratification::disabled();
        }

        let mut levels: Vec<u64> = weights.into_iter().collect();
        levels.sort_unstable_by(|lhs, rhs| rhs.cmp(lhs));
        levels.dedup();

        match levels.last_mut() {
            Some(last) => *last = 1,
            None => levels.push(1),
        }

        Stratification { levels, active: 0 }
    }

    /// A single tier; every term is assumed.
    pub(crate) fn disabled() -> Stratification {
        Stratification {
            levels: vec![1],
            active: 0,
        }
    }

    pub(crate) fn active_level(&self) -> u64 {
        self.levels[self.active]
    }

    pub(crate) fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn is_final_level(&self) -> bool {
        self.active + 1 == self.levels.len()
    }

    /// The index of the tier to which a term with the given residual weight belongs; [`None`]
    /// for a used up term.
    pub(crate) fn tier_of(&self, weight: u64) -> Option<usize> {
        self.levels.iter().position(|&level| weight >= level)
    }

    /// Whether a term with the given residual weight belongs to the active tier or a tier merged
    /// into it.
    pub(crate) fn is_active(&self, weight: u64) -> bool {
        self.tier_of(weight).is_some_and(|tier| tier <= self.active)
    }

    /// Merges the next tier into the assumed ones.
    pub(crate) fn advance(&mut self) {
        pumpkin_assert_simple!(!self.is_final_level(), "The final level cannot be lowered.");
        self.active += 1;
    }
}
