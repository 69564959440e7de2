//! Kafka integration tests.
//!
//! These tests require a running Kafka broker.
//! Run with: cargo test --features kafka-integration -- --ignored
//!
//! The bootstrap server can be configured via KAFKA_BOOTSTRAP env var.

#![cfg(feature = "kafka-integration")]

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rdkafka::admin::AdminClient;
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::time::timeout;

use modelbus::adapter::outbound::kafka::{BrokerConfig, KafkaBroker, OffsetReset};
use modelbus::adapter::outbound::predictor::IdentityPredictor;
use modelbus::application::{
    ModelService, PredictionGateway, ProvisioningConfig, ServiceConfig, ServiceOrchestrator,
    StartupConfig,
};
use modelbus::domain::{ModelIdentity, TopicPair};
use modelbus::port::Broker;

fn kafka_bootstrap() -> String {
    std::env::var("KAFKA_BOOTSTRAP").unwrap_or_else(|_| "localhost:9092".to_string())
}

fn kafka_is_available() -> bool {
    let admin: Result<AdminClient<DefaultClientContext>, _> = ClientConfig::new()
        .set("bootstrap.servers", kafka_bootstrap())
        .create();

    admin.is_ok_and(|admin| {
        admin
            .inner()
            .fetch_metadata(None, Duration::from_secs(5))
            .is_ok()
    })
}

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}

fn broker(group_id: String) -> Arc<dyn Broker> {
    Arc::new(KafkaBroker::new(BrokerConfig {
        address: kafka_bootstrap(),
        group_id,
        offset_reset: OffsetReset::Earliest,
        ..BrokerConfig::default()
    }))
}

#[tokio::test]
#[ignore]
async fn test_identity_model_round_trip() {
    if !kafka_is_available() {
        eprintln!("Skipping test: Kafka not available at {}", kafka_bootstrap());
        return;
    }

    let suffix = unique_suffix();
    let name = format!("it_echo_{suffix}");
    let broker = broker(format!("modelbus-it-{suffix}"));

    let gateway = PredictionGateway::new(Arc::new(IdentityPredictor::new(&name, 1, 0))).unwrap();
    let service = ModelService::new(
        gateway,
        Arc::clone(&broker),
        ProvisioningConfig::default(),
        ServiceConfig::default(),
    );
    let topics = TopicPair::for_model(&ModelIdentity::try_new(&name, 1, 0).unwrap());

    let (tx, rx) = watch::channel(false);
    let mut orchestrator = ServiceOrchestrator::new(vec![service], StartupConfig::default());
    let run = tokio::spawn(async move { orchestrator.run(rx).await });

    let mut outputs = broker.consumer(topics.output_topic()).await.unwrap();
    let mut producer = broker.producer().await.unwrap();

    // Input topic appears once the service has provisioned it.
    let input = json!({"message": "hello", "count": 42});
    let payload = serde_json::to_vec(&input).unwrap();
    timeout(Duration::from_secs(30), async {
        while producer.send(topics.input_topic(), &payload).await.is_err() {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    })
    .await
    .expect("input published");

    let envelope = timeout(Duration::from_secs(60), outputs.recv())
        .await
        .expect("prediction arrived in time")
        .unwrap()
        .expect("output stream open");
    let output: Value = serde_json::from_slice(envelope.payload.as_deref().unwrap()).unwrap();
    assert_eq!(output, input);

    outputs.close().await.unwrap();
    producer.close().await.unwrap();
    tx.send(true).unwrap();
    let result = timeout(Duration::from_secs(30), run).await.unwrap().unwrap();
    assert!(result.is_ok(), "orchestrator failed: {:?}", result.err());
}
