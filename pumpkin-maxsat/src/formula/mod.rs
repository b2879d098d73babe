//! The in-memory weighted partial MaxSAT formula.
mod wcnf_formula;

pub use wcnf_formula::Formula;
pub use wcnf_formula::SoftClause;
pub use wcnf_formula::SoftClauseId;
