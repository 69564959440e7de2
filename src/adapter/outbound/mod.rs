//! Outbound adapters (driven side).

pub mod kafka;
pub mod predictor;
