//! Predictor that returns its input.

use serde_json::Value;

use crate::port::outbound::predictor::Predictor;

pub const KIND: &str = "identity";

/// Echoes every input. Handy for smoke-testing a deployment end to end.
#[derive(Debug, Clone)]
pub struct IdentityPredictor {
    name: String,
    major_version: u32,
    minor_version: u32,
}

impl IdentityPredictor {
    #[must_use]
    pub fn new(name: impl Into<String>, major_version: u32, minor_version: u32) -> Self {
        Self {
            name: name.into(),
            major_version,
            minor_version,
        }
    }
}

impl Predictor for IdentityPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn major_version(&self) -> u32 {
        self.major_version
    }

    fn minor_version(&self) -> u32 {
        self.minor_version
    }

    fn predict(&self, input: Value) -> anyhow::Result<Value> {
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn returns_input_unchanged() {
        let predictor = IdentityPredictor::new("echo", 1, 0);
        let input = json!({"x": 1, "nested": [true, null]});
        assert_eq!(predictor.predict(input.clone()).unwrap(), input);
    }
}
