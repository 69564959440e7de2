//! Topic naming for model services.
//!
//! Every model service reads from and writes to a pair of topics whose names
//! are derived from its [`ModelIdentity`]:
//!
//! ```text
//! model_server.<name>.<major>.<minor>.inputs
//! model_server.<name>.<major>.<minor>.outputs
//! ```
//!
//! The last two dot-separated components before the suffix are always the
//! decimal versions, so two different identities never map to the same pair.

use std::fmt;

use super::identity::ModelIdentity;

/// Prefix shared by every topic the server manages.
pub const TOPIC_PREFIX: &str = "model_server";

const INPUT_SUFFIX: &str = "inputs";
const OUTPUT_SUFFIX: &str = "outputs";

/// Input and output topic names for one model service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPair {
    input_topic: String,
    output_topic: String,
}

impl TopicPair {
    /// Derive the topic pair for a model identity.
    #[must_use]
    pub fn for_model(identity: &ModelIdentity) -> Self {
        let base = base_topic_name(identity);
        Self {
            input_topic: format!("{base}.{INPUT_SUFFIX}"),
            output_topic: format!("{base}.{OUTPUT_SUFFIX}"),
        }
    }

    #[must_use]
    pub fn input_topic(&self) -> &str {
        &self.input_topic
    }

    #[must_use]
    pub fn output_topic(&self) -> &str {
        &self.output_topic
    }

    /// Both topic names, input first.
    #[must_use]
    pub fn topics(&self) -> [&str; 2] {
        [&self.input_topic, &self.output_topic]
    }
}

impl fmt::Display for TopicPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.input_topic, self.output_topic)
    }
}

fn base_topic_name(identity: &ModelIdentity) -> String {
    format!(
        "{TOPIC_PREFIX}.{}.{}.{}",
        identity.name(),
        identity.major_version(),
        identity.minor_version()
    )
}

/// A topic creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
}

impl TopicSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, partitions: i32, replication_factor: i32) -> Self {
        Self {
            name: name.into(),
            partitions,
            replication_factor,
        }
    }
}
