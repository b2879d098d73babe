use pumpkin_maxsat::optimisation::MaxSatError;
use pumpkin_maxsat::parsers::dimacs::DimacsParseError;
use thiserror::Error;

pub(crate) type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub(crate) enum CliError {
    #[error("IO error, more details: {0}")]
    IOError(#[from] std::io::Error),
    #[error("The wcnf file was invalid, more details: {0}")]
    InvalidWcnf(#[from] DimacsParseError),
    #[error("Failed to solve the instance, more details: {0}")]
    MaxSat(#[from] MaxSatError),
}
