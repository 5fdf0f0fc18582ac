//! Lag features, the autoregressive model and its recursive projection.

pub mod features;
pub mod projector;
pub mod regression;
