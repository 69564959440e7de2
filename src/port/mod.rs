//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │       Application        │
//!     ┌───────────┤  ModelService / Orchestr.├───────────┐
//!     │           └──────────────────────────┘           │
//!     ▼                                                  ▼
//! ┌──────────┐                                     ┌───────────┐
//! │  Broker  │                                     │ Predictor │
//! │ Adapter  │                                     │  Adapter  │
//! └──────────┘                                     └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`Broker`], [`TopicAdmin`], [`MessageConsumer`], [`MessageProducer`] - Message bus
//! - [`Predictor`] - Versioned prediction capability

pub mod outbound;

pub use outbound::broker::{Broker, MessageConsumer, MessageProducer, TopicAdmin};
pub use outbound::predictor::Predictor;
