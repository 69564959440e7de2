//! JSON boundary of the processing loop.

use serde_json::Value;

use crate::domain::Envelope;
use crate::error::MessageError;

/// Decode an inbound envelope as UTF-8 JSON.
pub(crate) fn decode(envelope: &Envelope) -> Result<Value, MessageError> {
    let Some(payload) = envelope.payload.as_deref() else {
        return Err(MessageError::Decode {
            reason: "message has no payload".to_string(),
            preview: envelope.preview(),
        });
    };
    serde_json::from_slice(payload).map_err(|e| MessageError::Decode {
        reason: e.to_string(),
        preview: envelope.preview(),
    })
}

/// Encode a prediction for publication.
pub(crate) fn encode(prediction: &Value) -> Result<Vec<u8>, MessageError> {
    serde_json::to_vec(prediction).map_err(MessageError::Encode)
}
