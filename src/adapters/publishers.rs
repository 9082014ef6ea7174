use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{domain::post::events::FeedEvent, services::response::ServiceError};

/// Anything feed events can be pushed through.
#[async_trait]
pub trait Publisher: Send + Sync {
	async fn publish(
		&self,
		event: &FeedEvent,
	) -> Result<(), ServiceError>;
}

/// Fan-out point for websocket listeners. Every subscriber receives every frame.
#[derive(Clone)]
pub struct SocketHub(broadcast::Sender<String>);

impl SocketHub {
	pub fn new(capacity: usize) -> Self {
		let (tx, _rx) = broadcast::channel(capacity);
		Self(tx)
	}
	pub fn subscribe(&self) -> broadcast::Receiver<String> {
		self.0.subscribe()
	}
	pub fn listeners(&self) -> usize {
		self.0.receiver_count()
	}
}

#[async_trait]
impl Publisher for SocketHub {
	async fn publish(
		&self,
		event: &FeedEvent,
	) -> Result<(), ServiceError> {
		let frame = event.to_frame()?;

		// No listeners is not an error.
		if self.0.send(frame).is_err() {
			tracing::debug!(action = event.action(), "no socket listeners for feed event");
		}
		Ok(())
	}
}

/// Relays feed events to a NATS subject for listeners outside this process.
pub struct NatsPublisher {
	client: async_nats::Client,
	subject: String,
}

impl NatsPublisher {
	pub fn new(
		client: async_nats::Client,
		subject: &str,
	) -> Self {
		Self {
			client,
			subject: subject.to_string(),
		}
	}
}

#[async_trait]
impl Publisher for NatsPublisher {
	async fn publish(
		&self,
		event: &FeedEvent,
	) -> Result<(), ServiceError> {
		let frame = event.to_frame()?;
		self.client.publish(self.subject.clone(), frame.into()).await.map_err(|err| {
			tracing::error!("Message publishing error while relaying feed event :{:?}", err);
			ServiceError::MessagePublishingError(err.to_string())
		})
	}
}

/// Publishes to every inner publisher even when one fails; reports the first failure.
pub struct FanoutPublisher {
	publishers: Vec<Arc<dyn Publisher>>,
}

impl FanoutPublisher {
	pub fn new(publishers: Vec<Arc<dyn Publisher>>) -> Self {
		Self { publishers }
	}
}

#[async_trait]
impl Publisher for FanoutPublisher {
	async fn publish(
		&self,
		event: &FeedEvent,
	) -> Result<(), ServiceError> {
		let mut first_error = None;
		for publisher in &self.publishers {
			if let Err(err) = publisher.publish(event).await {
				first_error.get_or_insert(err);
			}
		}
		match first_error {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}
}

#[cfg(any(test, feature = "test"))]
#[derive(Default)]
pub struct RecordingPublisher {
	events: tokio::sync::Mutex<Vec<FeedEvent>>,
	fail: bool,
}

#[cfg(any(test, feature = "test"))]
impl RecordingPublisher {
	/// A publisher that records the event and then reports failure.
	pub fn failing() -> Self {
		Self {
			fail: true,
			..Default::default()
		}
	}
	pub async fn events(&self) -> Vec<FeedEvent> {
		self.events.lock().await.clone()
	}
}

#[cfg(any(test, feature = "test"))]
#[async_trait]
impl Publisher for RecordingPublisher {
	async fn publish(
		&self,
		event: &FeedEvent,
	) -> Result<(), ServiceError> {
		self.events.lock().await.push(event.clone());
		match self.fail {
			true => Err(ServiceError::MessagePublishingError("recording publisher set to fail".to_string())),
			false => Ok(()),
		}
	}
}
