//! Contains the core-guided optimisation of weighted partial MaxSAT formulas.
mod core_guided_options;
mod core_guided_search;
mod maxsat_error;
pub(crate) mod objective;
pub(crate) mod stratification;

pub use core_guided_options::CoreGuidedOptions;
pub use core_guided_options::CoreMinimisation;
pub use core_guided_search::CoreGuidedSearch;
pub use maxsat_error::MaxSatError;
