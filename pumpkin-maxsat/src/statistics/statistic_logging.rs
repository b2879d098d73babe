//! Process-wide logging of statistics in the form `{prefix} {name}={value}`.
//!
//! Statistics are written to stderr so that they never mix with the solution lines on stdout.
use std::fmt::Display;
use std::io::stderr;
use std::io::Write;
use std::sync::OnceLock;

use convert_case::Case;
use convert_case::Casing;

#[derive(Debug, Clone, Copy)]
struct StatisticOptions {
    statistic_prefix: &'static str,
    statistics_casing: Option<Case>,
}

impl StatisticOptions {
    fn format(&self, name: impl Display, value: impl Display) -> String {
        let name = match self.statistics_casing {
            Some(casing) => name.to_string().to_case(casing),
            None => name.to_string(),
        };
        format!("{} {name}={value}", self.statistic_prefix)
    }
}

static STATISTIC_OPTIONS: OnceLock<StatisticOptions> = OnceLock::new();

/// Enables the logging of statistics with the given prefix, converting the names to `casing` if
/// one is given. Only the first call has an effect.
pub fn configure_statistic_logging(prefix: &'static str, casing: Option<Case>) {
    let _ = STATISTIC_OPTIONS.get_or_init(|| StatisticOptions {
        statistic_prefix: prefix,
        statistics_casing: casing,
    });
}

/// Logs the statistic `name` with `value`; does nothing unless
/// [`configure_statistic_logging`] has been called.
pub fn log_statistic(name: impl Display, value: impl Display) {
    if let Some(options) = STATISTIC_OPTIONS.get() {
        let line = options.format(name, value);
        let _ = writeln!(stderr().lock(), "{line}");
    }
}

/// Returns whether statistics are logged, i.e. whether [`configure_statistic_logging`] has been
/// called.
pub fn should_log_statistics() -> bool {
    STATISTIC_OPTIONS.get().is_some()
}
