//! Runs the solver binary on the instances in `tests/wcnf` and checks the reported solutions.
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use pumpkin_maxsat::engine::Model;
use pumpkin_maxsat::formula::Formula;
use pumpkin_maxsat::parsers::dimacs::parse_wcnf;
use wait_timeout::ChildExt;

#[derive(Debug)]
pub(crate) struct Files {
    pub(crate) log_file: PathBuf,
    pub(crate) err_file: PathBuf,
}

impl Files {
    pub(crate) fn cleanup(self) -> std::io::Result<()> {
        std::fs::remove_file(self.log_file)?;
        std::fs::remove_file(self.err_file)?;
        Ok(())
    }
}

/// The outcome of running the solver on an instance.
#[derive(Debug)]
pub(crate) struct SolverRun {
    pub(crate) exit_code: Option<i32>,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

pub(crate) fn instance_path(instance_name: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}/tests/wcnf/{instance_name}.wcnf",
        env!("CARGO_MANIFEST_DIR")
    ))
}

/// Runs the solver with `args`; the output files are named after `run_name` so that runs on the
/// same instance do not overwrite each other.
pub(crate) fn run_solver<'a>(
    instance_path: impl AsRef<Path>,
    run_name: &str,
    args: impl IntoIterator<Item = &'a str>,
) -> SolverRun {
    const TEST_TIMEOUT: Duration = Duration::from_secs(60);

    let instance_path = instance_path.as_ref();
    let solver = PathBuf::from(env!("CARGO_BIN_EXE_pumpkin-maxsat"));

    let files = Files {
        log_file: instance_path.with_extension(format!("{run_name}.log")),
        err_file: instance_path.with_extension(format!("{run_name}.err")),
    };

    let mut command = Command::new(solver);
    for arg in args {
        let _ = command.arg(arg);
    }

    let mut child = command
        .arg(instance_path)
        .stdout(File::create(&files.log_file).expect("Failed to create log file."))
        .stderr(File::create(&files.err_file).expect("Failed to create error file."))
        .stdin(Stdio::null())
        .spawn()
        .expect("Failed to run solver.");

    let status = match child.wait_timeout(TEST_TIMEOUT) {
        Ok(None) => {
            let _ = child.kill();
            panic!("solver took more than {} seconds", TEST_TIMEOUT.as_secs())
        }
        Ok(Some(status)) => status,
        Err(e) => panic!("error starting solver: {e}"),
    };

    let run = SolverRun {
        exit_code: status.code(),
        stdout: std::fs::read_to_string(&files.log_file).expect("Failed to read solver output"),
        stderr: std::fs::read_to_string(&files.err_file).expect("Failed to read solver errors"),
    };
    files.cleanup().expect("Failed to remove the output files");
    run
}

/// The `o` and `v` lines printed by the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReportedSolution {
    pub(crate) cost: u64,
    pub(crate) literals: Vec<i64>,
    pub(crate) has_trailing_zero: bool,
}

impl FromStr for ReportedSolution {
    type Err = String;

    fn from_str(output: &str) -> Result<Self, Self::Err> {
        let mut cost = None;
        let mut values = None;

        for line in output.lines() {
            if let Some(value) = line.strip_prefix("o ") {
                let parsed = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| format!("invalid cost '{value}': {e}"))?;
                if cost.replace(parsed).is_some() {
                    return Err("more than one 'o' line".to_owned());
                }
            } else if let Some(value) = line.strip_prefix('v') {
                let literals = value
                    .split_whitespace()
                    .map(|literal| {
                        literal
                            .parse::<i64>()
                            .map_err(|e| format!("invalid literal '{literal}': {e}"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if values.replace(literals).is_some() {
                    return Err("more than one 'v' line".to_owned());
                }
            } else {
                return Err(format!("unexpected line on stdout: '{line}'"));
            }
        }

        let cost = cost.ok_or("missing 'o' line")?;
        let mut literals = values.ok_or("missing 'v' line")?;
        let has_trailing_zero = literals.last() == Some(&0);
        if has_trailing_zero {
            let _ = literals.pop();
        }

        Ok(ReportedSolution {
            cost,
            literals,
            has_trailing_zero,
        })
    }
}

pub(crate) fn read_formula(instance_path: impl AsRef<Path>) -> Formula {
    let file = File::open(instance_path).expect("Failed to open instance");
    parse_wcnf::<Formula>(file, ()).expect("Valid instance")
}

/// Checks that the reported assignment covers every variable, satisfies the hard clauses, and has
/// the reported cost.
pub(crate) fn verify_solution(formula: &Formula, solution: &ReportedSolution) {
    assert_eq!(
        solution.literals.len(),
        formula.num_variables() as usize,
        "every variable of the instance is reported"
    );
    for (index, &literal) in solution.literals.iter().enumerate() {
        assert_eq!(
            literal.unsigned_abs(),
            index as u64 + 1,
            "the literals are in the order of their variables"
        );
    }

    // Variable zero is not part of the instance.
    let model = Model::new(
        std::iter::once(true).chain(solution.literals.iter().map(|&literal| literal > 0)),
    );
    assert!(formula.satisfies_hard_clauses(&model));
    assert_eq!(formula.cost_of(&model), solution.cost);
}
