//! Application layer containing the payout orchestration.
//!
//! [`orchestrator::PayoutOrchestrator`] is the entry point for executing a
//! run. It drives the pure domain decisions, calls the provider through
//! [`retry::with_retry`], and hands every mutation to the store as one
//! change set. [`queries::PayoutQueries`] serves the read side.

pub mod audit;
pub mod event_lock;
pub mod orchestrator;
pub mod queries;
pub mod retry;
