//! In-memory [`Broker`] for tests.
//!
//! Topics are append-only logs held behind a mutex. Consumers read from the
//! topic's committed offset, so messages published before a consumer
//! subscribes are still delivered. Every failure mode the services care
//! about can be injected from the test side.
//!
//! `MemoryBroker` is a cheap handle: clones share the same topics.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use crate::domain::{Envelope, TopicSpec};
use crate::error::BrokerError;
use crate::port::outbound::broker::{Broker, MessageConsumer, MessageProducer, TopicAdmin};

#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    changed: Notify,
}

#[derive(Default)]
struct State {
    topics: BTreeMap<String, Topic>,
    create_topic_calls: usize,
    open_consumers: usize,
    open_producers: usize,
    admin_failure: Option<BrokerError>,
    topic_creation_failure: Option<BrokerError>,
    consumer_failures: VecDeque<BrokerError>,
    producer_failures: VecDeque<BrokerError>,
    send_failures: usize,
    receive_failures: usize,
    commit_failures: usize,
    consumer_close_failure: Option<BrokerError>,
    producer_close_failure: Option<BrokerError>,
}

struct Topic {
    spec: TopicSpec,
    log: Vec<Option<Vec<u8>>>,
    committed: usize,
    closed: bool,
}

impl Topic {
    fn new(spec: TopicSpec) -> Self {
        Self {
            spec,
            log: Vec::new(),
            committed: 0,
            closed: false,
        }
    }
}

impl State {
    fn topic_mut(&mut self, name: &str) -> &mut Topic {
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| Topic::new(TopicSpec::new(name, 1, 1)))
    }
}

impl MemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Test-side I/O
    // -----------------------------------------------------------------------

    /// Append a message, creating the topic if needed.
    pub fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) {
        self.append(topic, Some(payload.into()));
    }

    /// Append a message with no payload.
    pub fn publish_tombstone(&self, topic: &str) {
        self.append(topic, None);
    }

    /// Append `value` serialized as JSON.
    pub fn publish_json(&self, topic: &str, value: &Value) {
        let bytes = serde_json::to_vec(value).expect("JSON values always serialize");
        self.publish(topic, bytes);
    }

    /// End the topic's stream: consumers that reach its end get `Ok(None)`.
    pub fn close_topic(&self, topic: &str) {
        self.inner.state.lock().topic_mut(topic).closed = true;
        self.inner.changed.notify_waiters();
    }

    /// Every payload on `topic`, tombstones skipped.
    #[must_use]
    pub fn messages(&self, topic: &str) -> Vec<Vec<u8>> {
        let state = self.inner.state.lock();
        state
            .topics
            .get(topic)
            .map(|t| t.log.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Every payload on `topic` parsed as JSON.
    ///
    /// # Panics
    ///
    /// If a payload is not valid JSON.
    #[must_use]
    pub fn json_messages(&self, topic: &str) -> Vec<Value> {
        self.messages(topic)
            .iter()
            .map(|bytes| serde_json::from_slice(bytes).expect("payload is JSON"))
            .collect()
    }

    /// Wait until `topic` holds at least `count` payloads or `timeout`
    /// elapses, then return whatever it holds.
    pub async fn wait_for_messages(
        &self,
        topic: &str,
        count: usize,
        timeout: Duration,
    ) -> Vec<Vec<u8>> {
        let wait = async {
            loop {
                let notified = self.inner.changed.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.messages(topic).len() >= count {
                    return;
                }
                notified.await;
            }
        };
        let _ = tokio::time::timeout(timeout, wait).await;
        self.messages(topic)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn topic_names(&self) -> Vec<String> {
        self.inner.state.lock().topics.keys().cloned().collect()
    }

    #[must_use]
    pub fn topic_spec(&self, topic: &str) -> Option<TopicSpec> {
        self.inner
            .state
            .lock()
            .topics
            .get(topic)
            .map(|t| t.spec.clone())
    }

    /// Number of create-topic requests received, including ones for topics
    /// that already existed.
    #[must_use]
    pub fn create_topic_calls(&self) -> usize {
        self.inner.state.lock().create_topic_calls
    }

    /// Next offset the consumer group will read on `topic`.
    #[must_use]
    pub fn committed_offset(&self, topic: &str) -> usize {
        self.inner
            .state
            .lock()
            .topics
            .get(topic)
            .map_or(0, |t| t.committed)
    }

    #[must_use]
    pub fn open_consumers(&self) -> usize {
        self.inner.state.lock().open_consumers
    }

    #[must_use]
    pub fn open_producers(&self) -> usize {
        self.inner.state.lock().open_producers
    }

    #[must_use]
    pub fn open_connections(&self) -> usize {
        let state = self.inner.state.lock();
        state.open_consumers + state.open_producers
    }

    // -----------------------------------------------------------------------
    // Failure injection
    // -----------------------------------------------------------------------

    /// Every admin handle request fails until cleared with
    /// [`Self::clear_failures`].
    pub fn fail_admin(&self, error: BrokerError) {
        self.inner.state.lock().admin_failure = Some(error);
    }

    /// Every create-topic request fails until cleared.
    pub fn fail_topic_creation(&self, error: BrokerError) {
        self.inner.state.lock().topic_creation_failure = Some(error);
    }

    /// The next consumer connection fails.
    pub fn fail_next_consumer(&self, error: BrokerError) {
        self.inner.state.lock().consumer_failures.push_back(error);
    }

    /// The next producer connection fails.
    pub fn fail_next_producer(&self, error: BrokerError) {
        self.inner.state.lock().producer_failures.push_back(error);
    }

    /// The next `count` sends fail.
    pub fn fail_next_sends(&self, count: usize) {
        self.inner.state.lock().send_failures += count;
    }

    /// The next `count` receives fail.
    pub fn fail_next_receives(&self, count: usize) {
        self.inner.state.lock().receive_failures += count;
        self.inner.changed.notify_waiters();
    }

    /// The next `count` commits fail.
    pub fn fail_next_commits(&self, count: usize) {
        self.inner.state.lock().commit_failures += count;
    }

    /// The next consumer close reports `error` (the consumer is still
    /// released).
    pub fn fail_consumer_close(&self, error: BrokerError) {
        self.inner.state.lock().consumer_close_failure = Some(error);
    }

    /// The next producer close reports `error` (the producer is still
    /// released).
    pub fn fail_producer_close(&self, error: BrokerError) {
        self.inner.state.lock().producer_close_failure = Some(error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.inner.state.lock();
        state.admin_failure = None;
        state.topic_creation_failure = None;
        state.consumer_failures.clear();
        state.producer_failures.clear();
        state.send_failures = 0;
        state.receive_failures = 0;
        state.commit_failures = 0;
        state.consumer_close_failure = None;
        state.producer_close_failure = None;
    }

    fn append(&self, topic: &str, payload: Option<Vec<u8>>) {
        self.inner.state.lock().topic_mut(topic).log.push(payload);
        self.inner.changed.notify_waiters();
    }
}

impl std::fmt::Debug for MemoryBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBroker")
            .field("topics", &self.topic_names())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn admin(&self) -> Result<Box<dyn TopicAdmin>, BrokerError> {
        if let Some(error) = self.inner.state.lock().admin_failure.clone() {
            return Err(error);
        }
        Ok(Box::new(MemoryAdmin {
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn consumer(&self, topic: &str) -> Result<Box<dyn MessageConsumer>, BrokerError> {
        let mut state = self.inner.state.lock();
        if let Some(error) = state.consumer_failures.pop_front() {
            return Err(error);
        }
        state.open_consumers += 1;
        Ok(Box::new(MemoryConsumer {
            inner: Arc::clone(&self.inner),
            topic: topic.to_string(),
            position: None,
            released: false,
        }))
    }

    async fn producer(&self) -> Result<Box<dyn MessageProducer>, BrokerError> {
        let mut state = self.inner.state.lock();
        if let Some(error) = state.producer_failures.pop_front() {
            return Err(error);
        }
        state.open_producers += 1;
        Ok(Box::new(MemoryProducer {
            inner: Arc::clone(&self.inner),
            released: false,
        }))
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

struct MemoryAdmin {
    inner: Arc<Inner>,
}

#[async_trait]
impl TopicAdmin for MemoryAdmin {
    async fn create_topic(&self, spec: &TopicSpec) -> Result<(), BrokerError> {
        let mut state = self.inner.state.lock();
        state.create_topic_calls += 1;
        if let Some(error) = state.topic_creation_failure.clone() {
            return Err(error);
        }
        if state.topics.contains_key(&spec.name) {
            return Err(BrokerError::TopicAlreadyExists(spec.name.clone()));
        }
        state
            .topics
            .insert(spec.name.clone(), Topic::new(spec.clone()));
        Ok(())
    }
}

struct MemoryConsumer {
    inner: Arc<Inner>,
    topic: String,
    /// Next offset to read; taken from the committed offset on first use.
    position: Option<usize>,
    released: bool,
}

impl MemoryConsumer {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.inner.state.lock().open_consumers -= 1;
        }
    }

    fn poll(&mut self) -> Option<Result<Option<Envelope>, BrokerError>> {
        let mut state = self.inner.state.lock();
        if self.released {
            return Some(Ok(None));
        }
        if state.receive_failures > 0 {
            state.receive_failures -= 1;
            return Some(Err(BrokerError::Receive("injected receive failure".into())));
        }
        let topic = state.topics.get(&self.topic)?;
        let position = *self.position.get_or_insert(topic.committed);
        match topic.log.get(position) {
            Some(payload) => {
                let envelope = Envelope {
                    payload: payload.clone(),
                    partition: None,
                    offset: None,
                }
                .at(0, position as i64);
                self.position = Some(position + 1);
                Some(Ok(Some(envelope)))
            }
            None if topic.closed => Some(Ok(None)),
            None => None,
        }
    }
}

#[async_trait]
impl MessageConsumer for MemoryConsumer {
    async fn recv(&mut self) -> Result<Option<Envelope>, BrokerError> {
        let inner = Arc::clone(&self.inner);
        loop {
            let notified = inner.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(result) = self.poll() {
                return result;
            }
            notified.await;
        }
    }

    async fn commit(&mut self, envelope: &Envelope) -> Result<(), BrokerError> {
        let mut state = self.inner.state.lock();
        if state.commit_failures > 0 {
            state.commit_failures -= 1;
            return Err(BrokerError::Commit("injected commit failure".into()));
        }
        let Some(offset) = envelope.offset else {
            return Ok(());
        };
        let topic = state.topic_mut(&self.topic);
        topic.committed = topic.committed.max(offset as usize + 1);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrokerError> {
        self.release();
        match self.inner.state.lock().consumer_close_failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Drop for MemoryConsumer {
    fn drop(&mut self) {
        self.release();
    }
}

struct MemoryProducer {
    inner: Arc<Inner>,
    released: bool,
}

impl MemoryProducer {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.inner.state.lock().open_producers -= 1;
        }
    }
}

#[async_trait]
impl MessageProducer for MemoryProducer {
    async fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        {
            let mut state = self.inner.state.lock();
            if self.released {
                return Err(BrokerError::Send("producer closed".into()));
            }
            if state.send_failures > 0 {
                state.send_failures -= 1;
                return Err(BrokerError::Send("injected send failure".into()));
            }
            state.topic_mut(topic).log.push(Some(payload.to_vec()));
        }
        self.inner.changed.notify_waiters();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrokerError> {
        self.release();
        match self.inner.state.lock().producer_close_failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Drop for MemoryProducer {
    fn drop(&mut self) {
        self.release();
    }
}
