//! Core business logic - framework-agnostic ledger operations.
//!
//! The modules here own everything with invariants: deal reconciliation,
//! entry and friend-link management, settlement-rule derivation, and the
//! fail-soft summary search. Persistence flows through SeaORM connections
//! passed in by the caller; nothing here holds state of its own.

/// Chart-of-accounts lookups, settlement rules, payment dates
pub mod account;
/// The deal pipeline: validate, reconcile, derive subordinates, destroy
pub mod deal;
/// Entry reconciliation and friend-link management
pub mod entry;
/// Summary prefix search for autocomplete
pub mod search;
