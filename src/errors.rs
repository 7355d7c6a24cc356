//! Unified error types and result handling.
//!
//! Validation problems are collected into a single [`Error::Validation`] so a
//! caller sees every rejected field at once; everything else aborts the
//! enclosing database transaction. The summary search path deliberately never
//! surfaces errors (see [`crate::core::search`]).

use thiserror::Error;

/// A single recoverable validation problem with a deal request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// Both sides of the deal reference the same account
    #[error("a deal cannot move money from an account to itself (account {account_id})")]
    SameAccount {
        /// The account appearing on both sides
        account_id: i64,
    },

    /// The (normalized) amount is zero
    #[error("the deal amount is zero")]
    ZeroAmount,

    /// A textual amount did not parse as an integer after normalization
    #[error("the amount {input:?} is not a number")]
    MalformedAmount {
        /// The raw text the caller supplied
        input: String,
    },
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The deal request was rejected; nothing was persisted
    #[error("deal validation failed: {}", format_issues(issues))]
    Validation {
        /// Every issue found, not just the first
        issues: Vec<ValidationIssue>,
    },

    /// A referenced account does not exist
    #[error("account {id} not found")]
    AccountNotFound {
        /// The missing account id
        id: i64,
    },

    /// A referenced deal does not exist
    #[error("deal {id} not found")]
    DealNotFound {
        /// The missing deal id
        id: i64,
    },

    /// A deal did not end up with exactly two entries
    #[error("deal {deal_id} has {count} entries, expected exactly 2")]
    EntryCountViolation {
        /// The offending deal
        deal_id: i64,
        /// The observed entry count
        count: usize,
    },

    /// Configuration / seed file error
    #[error("configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
