//! Raw messages as they come off the broker.

/// Longest payload prefix included in diagnostics.
pub const PREVIEW_LEN: usize = 64;

/// An inbound message: opaque bytes plus their position on the broker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Message value. `None` for tombstones.
    pub payload: Option<Vec<u8>>,
    /// Partition the message was read from, when the broker reports one.
    pub partition: Option<i32>,
    /// Offset of the message within its partition.
    pub offset: Option<i64>,
}

impl Envelope {
    /// Create an envelope carrying `payload` with no position metadata.
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(payload.into()),
            partition: None,
            offset: None,
        }
    }

    /// Attach the broker position.
    #[must_use]
    pub fn at(mut self, partition: i32, offset: i64) -> Self {
        self.partition = Some(partition);
        self.offset = Some(offset);
        self
    }

    /// Payload length in bytes (0 for tombstones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lossy UTF-8 rendering of the first [`PREVIEW_LEN`] bytes, for logs.
    #[must_use]
    pub fn preview(&self) -> String {
        let Some(payload) = &self.payload else {
            return "<null>".to_string();
        };
        let end = payload.len().min(PREVIEW_LEN);
        let mut preview = String::from_utf8_lossy(&payload[..end]).into_owned();
        if payload.len() > PREVIEW_LEN {
            preview.push('…');
        }
        preview
    }
}
