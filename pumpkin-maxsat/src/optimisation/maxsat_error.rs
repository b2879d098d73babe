use thiserror::Error;

use crate::encoders::EncodingError;
use crate::engine::OracleProtocolError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaxSatError {
    #[error("the hard clauses are unsatisfiable")]
    HardClausesUnsatisfiable,
    #[error("the total weight of the soft clauses exceeds {}", u64::MAX)]
    SoftWeightOverflow,
    #[error("the oracle broke its contract: {0}")]
    OracleProtocol(#[from] OracleProtocolError),
    #[error("failed to encode a sum: {0}")]
    Encoding(#[from] EncodingError),
}
