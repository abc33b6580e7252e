//! Resilient loading and aggregation of the toolbox document tree.
//!
//! This crate wraps a [`Transport`](toolbox_transport::Transport) with
//! retry and backoff ([`loader`]) and aggregates the root manifest plus one
//! sub-document per category into a single model ([`pipeline`]).

pub mod loader;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use loader::{LoadOutcome, Loader};
pub use pipeline::{
    AggregateResult, AggregateState, Aggregator, ProgressReporter, SilentProgress, load_all,
};
