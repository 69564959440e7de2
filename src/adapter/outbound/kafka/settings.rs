//! Broker connection settings.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Consumer group used when none is configured.
pub const DEFAULT_GROUP_ID: &str = "modelbus.model_server";

/// Where a consumer group with no committed offset starts reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    Earliest,
    #[default]
    Latest,
}

impl OffsetReset {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::Latest => "latest",
        }
    }
}

/// `[broker]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Bootstrap address, `host:port[,host:port...]`.
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_group_id")]
    pub group_id: String,
    #[serde(default)]
    pub offset_reset: OffsetReset,
    /// Extra client properties passed through verbatim. Keys managed by the
    /// fields above are ignored.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            group_id: default_group_id(),
            offset_reset: OffsetReset::default(),
            properties: BTreeMap::new(),
        }
    }
}

fn default_group_id() -> String {
    DEFAULT_GROUP_ID.to_string()
}
