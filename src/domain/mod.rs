//! Broker- and model-agnostic domain types.

pub mod envelope;
pub mod error;
pub mod identity;
pub mod state;
pub mod topic;

pub use envelope::Envelope;
pub use identity::ModelIdentity;
pub use state::ServiceState;
pub use topic::{TopicPair, TopicSpec};
