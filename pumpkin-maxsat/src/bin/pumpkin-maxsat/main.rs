mod result;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use log::error;
use log::info;
use log::warn;
use log::Level;
use log::LevelFilter;
use pumpkin_maxsat::convert_case::Case;
use pumpkin_maxsat::engine::ClausalSolver;
use pumpkin_maxsat::engine::SatOptions;
use pumpkin_maxsat::formula::Formula;
use pumpkin_maxsat::optimisation::CoreGuidedOptions;
use pumpkin_maxsat::optimisation::CoreGuidedSearch;
use pumpkin_maxsat::optimisation::CoreMinimisation;
use pumpkin_maxsat::parsers::dimacs::parse_wcnf;
use pumpkin_maxsat::pumpkin_asserts::is_checked;
use pumpkin_maxsat::pumpkin_asserts::PUMPKIN_ASSERT_LEVEL_DEFINITION;
use pumpkin_maxsat::pumpkin_asserts::PUMPKIN_ASSERT_MODERATE;
use pumpkin_maxsat::statistics::configure_statistic_logging;
use pumpkin_maxsat::statistics::should_log_statistics;
use result::CliResult;

#[derive(Debug, Parser)]
#[command(
    help_template = "\
{before-help}{name} {version}
Authors: {author}
About: {about}

{usage-heading}\n{tab}{usage}

{all-args}{after-help}
",
    author,
    version,
    about,
    arg_required_else_help = true
)]
struct Args {
    /// The instance to solve, given in the DIMACS WCNF format: a header
    /// 'p wcnf <variables> <clauses> [<top>]' followed by one clause per line, each starting with
    /// its weight; clauses with a weight of at least 'top' are hard.
    #[clap(verbatim_doc_comment)]
    instance_path: PathBuf,

    /// Enables log message output from the solver.
    ///
    /// Possible values: bool
    #[arg(short = 'v', long = "verbose", verbatim_doc_comment)]
    verbose: bool,

    /// Enables logging of statistics from the solver.
    ///
    /// Possible values: bool
    #[arg(short = 's', long = "log-statistics", verbatim_doc_comment)]
    log_statistics: bool,

    /// If `--verbose` is enabled then this option removes the timestamp information from the log
    /// messages.
    ///
    /// Possible values: bool
    #[arg(long = "omit-timestamp", verbatim_doc_comment)]
    omit_timestamp: bool,

    /// If `--verbose` is enabled then this option removes the call site information from the log
    /// messages. The call site is the file and line from which the message originated.
    ///
    /// Possible values: bool
    #[arg(long = "omit-call-site", default_value_t = false, verbatim_doc_comment)]
    omit_call_site: bool,

    /// Assumes every soft clause from the first oracle call instead of going through the soft
    /// clauses by decreasing weight.
    ///
    /// Possible values: bool
    #[arg(long = "no-stratification", verbatim_doc_comment)]
    no_stratification: bool,

    /// Turns off raising the bound of a new sum for as long as the bound is proven to be too low.
    ///
    /// Possible values: bool
    #[arg(long = "no-exhaustion", verbatim_doc_comment)]
    no_exhaustion: bool,

    /// Always relaxes a core with a new sum, also when its soft clauses could be added to the sum
    /// whose output is in the core.
    ///
    /// Possible values: bool
    #[arg(long = "no-core-extension", verbatim_doc_comment)]
    no_core_extension: bool,

    /// How cores are minimised before they are relaxed.
    ///
    /// - "none" processes the cores as returned by the oracle
    /// - "trim" calls the oracle under the core while this shrinks it (see "--trim-rounds")
    /// - "reduce" tries to leave out every literal of the core in turn (see
    ///   "--minimisation-budget")
    /// - "trim-and-reduce" trims before reducing
    #[arg(long, value_enum, default_value_t, verbatim_doc_comment)]
    core_minimisation: CoreMinimisation,

    /// The maximum number of oracle calls used to trim a core.
    ///
    /// Possible values: usize
    #[arg(long = "trim-rounds", default_value_t = 5, verbatim_doc_comment)]
    trim_rounds: usize,

    /// The number of conflicts the oracle may spend on each attempt to leave a literal out of a
    /// core.
    ///
    /// Possible values: u64
    #[arg(long = "minimisation-budget", default_value_t = 1000, verbatim_doc_comment)]
    minimisation_budget: u64,

    /// Turns off hardening, i.e. fixing the soft clauses which no improving solution can violate.
    ///
    /// Possible values: bool
    #[arg(long = "no-hardening", verbatim_doc_comment)]
    no_hardening: bool,

    /// Determines that no restarts are allowed by the oracle.
    ///
    /// Possible values: bool
    #[arg(long = "no-restarts", verbatim_doc_comment)]
    no_restarts: bool,

    /// The base interval length is used as a multiplier to the Luby restart sequence of the
    /// oracle, i.e. 1, 1, 2, 1, 1, 2, 4, ... (see "Optimal speedup of Las Vegas algorithms -
    /// Luby et al. (1993)").
    ///
    /// Possible values: u64
    #[arg(
        long = "restart-base-interval",
        default_value_t = 50,
        verbatim_doc_comment
    )]
    restart_base_interval: u64,

    /// The random seed to use for the Pseudo Random Number Generator.
    ///
    /// Randomisation is used to break ties in the initial ordering of the variables.
    ///
    /// Possible values: u64
    #[arg(
        short = 'r',
        long = "random-seed",
        default_value_t = 42,
        verbatim_doc_comment
    )]
    random_seed: u64,

    /// Terminates the 'v' line of the solution with a 0.
    ///
    /// Possible values: bool
    #[arg(long = "trailing-zero", verbatim_doc_comment)]
    trailing_zero: bool,
}

fn configure_logging(
    verbose: bool,
    log_statistics: bool,
    omit_timestamp: bool,
    omit_call_site: bool,
) -> std::io::Result<()> {
    if log_statistics {
        configure_statistic_logging("c stat", Some(Case::Camel));
    }

    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            write!(buf, "c ")?;
            if record.level() != Level::Info && !omit_timestamp {
                write!(buf, "{} ", buf.timestamp())?;
            }
            write!(buf, "{} ", record.level())?;
            if record.level() != Level::Info && !omit_call_site {
                write!(
                    buf,
                    "[{}:{}] ",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0)
                )?;
            }
            writeln!(buf, "{}", record.args())
        })
        .filter_level(level_filter)
        .target(env_logger::Target::Stderr)
        .init();

    info!("Logging successfully configured");
    Ok(())
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {e}");
            std::process::exit(1);
        }
    }
}

fn run() -> CliResult<()> {
    let args = Args::parse();

    configure_logging(
        args.verbose,
        args.log_statistics,
        args.omit_timestamp,
        args.omit_call_site,
    )?;

    if is_checked(PUMPKIN_ASSERT_MODERATE) {
        warn!(
            "Potential performance degradation: the Pumpkin assert level is set to {PUMPKIN_ASSERT_LEVEL_DEFINITION}, meaning many debug asserts are active which may result in performance degradation."
        );
    }

    let instance_file = File::open(&args.instance_path)?;
    let formula = parse_wcnf::<Formula>(instance_file, ())?;
    info!(
        "Read {} hard and {} soft clauses over {} variables",
        formula.hard_clauses().count(),
        formula.num_soft_clauses(),
        formula.num_variables()
    );

    let sat_options = SatOptions {
        restarts_enabled: !args.no_restarts,
        restart_base_interval: args.restart_base_interval,
        random_seed: args.random_seed,
        ..SatOptions::default()
    };
    let options = CoreGuidedOptions {
        stratification: !args.no_stratification,
        exhaustion: !args.no_exhaustion,
        core_extension: !args.no_core_extension,
        core_minimisation: args.core_minimisation,
        trim_rounds: args.trim_rounds,
        minimisation_budget: args.minimisation_budget,
        hardening: !args.no_hardening,
    };

    let mut search = CoreGuidedSearch::new(formula, ClausalSolver::new(sat_options), options);
    let result = search.solve();

    if should_log_statistics() {
        search.log_statistics();
    }

    let solution = result?;
    println!("{}", solution.lines(args.trailing_zero));
    Ok(())
}
