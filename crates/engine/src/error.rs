//! The module contains the errors the ledger can throw.
//!
//! The errors are:
//!
//! - [`Parse`] thrown when a text matches none of the accepted entry shapes.
//! - [`NoActiveCycle`] thrown when an operation needs an active cycle.
//! - [`NotFound`] thrown when a cycle id does not resolve.
//! - [`Persistence`] thrown when the store or the (de)serialization fails.
//! - [`InvalidHorizon`] thrown when a ledger is built with an unusable cycle
//!   length.
//!
//!  [`Parse`]: LedgerError::Parse
//!  [`NoActiveCycle`]: LedgerError::NoActiveCycle
//!  [`NotFound`]: LedgerError::NotFound
//!  [`Persistence`]: LedgerError::Persistence
//!  [`InvalidHorizon`]: LedgerError::InvalidHorizon
use sea_orm::DbErr;
use thiserror::Error;

use crate::parsing::ParseError;

/// Ledger custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("No active accounting cycle, start one first")]
    NoActiveCycle,
    #[error("\"{0}\" cycle not found!")]
    NotFound(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("Cycle horizon of {0} days is out of range")]
    InvalidHorizon(i64),
}

impl LedgerError {
    /// `true` for errors the user can recover from by retrying differently.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Persistence(_) | Self::InvalidHorizon(_))
    }
}

/// Errors raised by a [`KvStore`](crate::KvStore) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(format!("serialization failed: {err}"))
    }
}
