//! Contains structures related to the statistic logging of the solver.
mod statistic_logging;

pub use statistic_logging::configure_statistic_logging;
pub use statistic_logging::log_statistic;
pub use statistic_logging::should_log_statistics;
