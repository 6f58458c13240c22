//! The module contains the errors the engine can throw.
//!
//! Every error belongs to an [`ErrorKind`]:
//!
//! - [`Client`] errors are the caller's fault (bad amount, unknown receiver,
//!   insufficient funds...) and are raised before any transaction opens.
//! - [`Internal`] errors are storage faults or inconsistencies; the ones
//!   raised inside an atomic unit are wrapped in [`CommitFailed`] while the
//!   original cause stays reachable through [`EngineError::root_cause`].
//! - [`Cancelled`] errors come from the caller's [`CallContext`].
//!
//!  [`Client`]: ErrorKind::Client
//!  [`Internal`]: ErrorKind::Internal
//!  [`Cancelled`]: ErrorKind::Cancelled
//!  [`CommitFailed`]: EngineError::CommitFailed
//!  [`CallContext`]: crate::CallContext
use sea_orm::DbErr;
use thiserror::Error;

use crate::AccountId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Client,
    Internal,
    Cancelled,
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("receiver not found: {0}")]
    ReceiverNotFound(String),
    #[error("merch not found: {0}")]
    MerchNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("sender account missing: {0}")]
    SenderNotFound(String),
    #[error("buyer account missing: {0}")]
    BuyerNotFound(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("failed to update coins of account {account}")]
    UpdateCoinsFailed {
        account: AccountId,
        #[source]
        source: Box<EngineError>,
    },
    #[error("failed to register coin transfer")]
    RegisterTransferFailed {
        #[source]
        source: Box<EngineError>,
    },
    #[error("failed to add merch to inventory of account {account}")]
    AddToInventoryFailed {
        account: AccountId,
        #[source]
        source: Box<EngineError>,
    },
    #[error("{operation} failed to commit (accounts: {accounts})")]
    CommitFailed {
        operation: &'static str,
        accounts: String,
        #[source]
        source: Box<EngineError>,
    },
    #[error("operation cancelled: {0}")]
    Cancelled(String),
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_)
            | Self::InvalidName(_)
            | Self::InvalidRecipient(_)
            | Self::InsufficientFunds(_)
            | Self::UserNotFound(_)
            | Self::ReceiverNotFound(_)
            | Self::MerchNotFound(_)
            | Self::ExistingKey(_) => ErrorKind::Client,
            Self::Cancelled(_) | Self::DeadlineExceeded => ErrorKind::Cancelled,
            Self::SenderNotFound(_)
            | Self::BuyerNotFound(_)
            | Self::KeyNotFound(_)
            | Self::InvalidId(_)
            | Self::UpdateCoinsFailed { .. }
            | Self::RegisterTransferFailed { .. }
            | Self::AddToInventoryFailed { .. }
            | Self::CommitFailed { .. }
            | Self::Database(_) => ErrorKind::Internal,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Client
    }

    /// Follows the chain of wrapping variants down to the error that
    /// actually happened.
    pub fn root_cause(&self) -> &EngineError {
        match self {
            Self::UpdateCoinsFailed { source, .. }
            | Self::RegisterTransferFailed { source }
            | Self::AddToInventoryFailed { source, .. }
            | Self::CommitFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The step-level classification of an atomic-unit failure: the error
    /// directly wrapped by [`EngineError::CommitFailed`], or `self`.
    pub fn step(&self) -> &EngineError {
        match self {
            Self::CommitFailed { source, .. } => source,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_unwraps_nested_failures() {
        let account = AccountId::new();
        let err = EngineError::CommitFailed {
            operation: "send_coin",
            accounts: account.to_string(),
            source: Box::new(EngineError::UpdateCoinsFailed {
                account,
                source: Box::new(EngineError::KeyNotFound("users".to_string())),
            }),
        };

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(matches!(err.step(), EngineError::UpdateCoinsFailed { .. }));
        assert!(matches!(err.root_cause(), EngineError::KeyNotFound(_)));
    }

    #[test]
    fn validation_errors_are_client_errors() {
        assert!(EngineError::InvalidAmount("x".to_string()).is_client_error());
        assert!(EngineError::ReceiverNotFound("x".to_string()).is_client_error());
        assert!(!EngineError::SenderNotFound("x".to_string()).is_client_error());
        assert_eq!(EngineError::DeadlineExceeded.kind(), ErrorKind::Cancelled);
    }
}
