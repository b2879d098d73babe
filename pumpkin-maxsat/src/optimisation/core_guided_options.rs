use std::fmt::Display;

use clap::ValueEnum;

/// How the cores returned by the oracle are shrunk before they are processed.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoreMinimisation {
    /// Cores are processed as returned by the oracle.
    None,
    /// The oracle is called again under the core, as long as this shrinks the core.
    #[default]
    Trim,
    /// Every member is dropped in turn; it stays dropped when the rest is still a core.
    Reduce,
    /// Trimming followed by reduction.
    TrimAndReduce,
}

impl CoreMinimisation {
    pub(crate) fn trims(self) -> bool {
        matches!(self, CoreMinimisation::Trim | CoreMinimisation::TrimAndReduce)
    }

    pub(crate) fn reduces(self) -> bool {
        matches!(self, CoreMinimisation::Reduce | CoreMinimisation::TrimAndReduce)
    }
}

impl Display for CoreMinimisation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreMinimisation::None => write!(f, "none"),
            CoreMinimisation::Trim => write!(f, "trim"),
            CoreMinimisation::Reduce => write!(f, "reduce"),
            CoreMinimisation::TrimAndReduce => write!(f, "trim-and-reduce"),
        }
    }
}

/// Options of the [`CoreGuidedSearch`](super::CoreGuidedSearch).
#[derive(Debug, Clone, Copy)]
pub struct CoreGuidedOptions {
    /// Whether the soft clauses are assumed tier by tier, heaviest first. Without stratification
    /// every soft clause is assumed from the first call.
    pub stratification: bool,
    /// Whether the bound of a new sum is raised while the oracle proves it cannot hold.
    pub exhaustion: bool,
    /// Whether a core over the active output of a sum and soft clauses of the same weight adds
    /// the soft clauses to that sum instead of creating a new one.
    pub core_extension: bool,
    pub core_minimisation: CoreMinimisation,
    /// The maximum number of oracle calls spent on trimming a single core.
    pub trim_rounds: usize,
    /// The conflict budget of each oracle call made while reducing a core.
    pub minimisation_budget: u64,
    /// Whether objective terms which cannot be violated by an improving solution are made hard.
    pub hardening: bool,
}

impl Default for CoreGuidedOptions {
    fn default() -> Self {
        CoreGuidedOptions {
            stratification: true,
            exhaustion: true,
            core_extension: true,
            core_minimisation: CoreMinimisation::default(),
            trim_rounds: 5,
            minimisation_budget: 1000,
            hardening: true,
        }
    }
}
