//! # Pumpkin MaxSAT
//! A core-guided solver for weighted partial MaxSAT.
//!
//! A [`Formula`](formula::Formula) consists of hard clauses, which every solution has to satisfy,
//! and weighted soft clauses; an optimal solution minimises the total weight of the violated soft
//! clauses. The [`CoreGuidedSearch`](optimisation::CoreGuidedSearch) finds such a solution by
//! repeatedly asking a [`SatOracle`](engine::SatOracle) for a model which violates none of the
//! (relaxed) soft clauses, and relaxing the unsatisfiable cores it receives with incremental
//! totalisers.
//!
//! ```
//! use std::num::NonZeroI32;
//!
//! use pumpkin_maxsat::basic_types::Literal;
//! use pumpkin_maxsat::engine::ClausalSolver;
//! use pumpkin_maxsat::formula::Formula;
//! use pumpkin_maxsat::optimisation::CoreGuidedOptions;
//! use pumpkin_maxsat::optimisation::CoreGuidedSearch;
//!
//! let x = Literal::from_dimacs(NonZeroI32::new(1).unwrap());
//! // The soft clause (x) with weight 5 conflicts with the hard clause (~x).
//! let formula = Formula::new([(vec![x], Some(5)), (vec![!x], None)]);
//!
//! let mut search = CoreGuidedSearch::new(
//!     formula,
//!     ClausalSolver::default(),
//!     CoreGuidedOptions::default(),
//! );
//! let solution = search.solve().expect("the hard clauses are satisfiable");
//!
//! assert_eq!(solution.cost(), 5);
//! assert_eq!(solution.lines(false).to_string(), "o 5\nv -1");
//! ```
pub mod basic_types;
pub mod containers;
pub mod encoders;
pub mod engine;
pub mod formula;
pub mod optimisation;
pub mod parsers;
pub mod pumpkin_asserts;
pub mod results;
pub mod statistics;

pub use convert_case;
pub use rand;
