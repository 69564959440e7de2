//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the two external dependencies of a model
//! service: the message broker and the prediction capability.

pub mod broker;
pub mod predictor;
