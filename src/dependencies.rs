use std::sync::Arc;

use async_nats::Client;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
	adapters::{
		images::ImageStore,
		publishers::{Publisher, SocketHub},
		repositories::FeedRepository,
	},
	common::middleware_auth::AuthKeys,
	config::Config,
	services::response::ServiceError,
};

/// `AppState` carries every collaborator a handler needs; nothing is looked up globally.
#[derive(Clone)]
pub struct AppState {
	pub repository: Arc<dyn FeedRepository>,
	pub publisher: Arc<dyn Publisher>,
	pub images: ImageStore,
	pub hub: SocketHub,
	pub auth: AuthKeys,
}

pub async fn connection_pool(config: &Config) -> Result<PgPool, ServiceError> {
	let pool = PgPoolOptions::new().max_connections(config.max_connections).connect(&config.database_url).await?;
	Ok(pool)
}

pub async fn queue_client(config: &Config) -> Result<Option<Client>, ServiceError> {
	let Some(url) = config.queue_url.as_deref() else {
		return Ok(None);
	};

	let client = async_nats::ConnectOptions::new()
		.name("feed")
		.connect(url)
		.await
		.map_err(|err| ServiceError::QueueServiceError(err.to_string()))?;
	Ok(Some(client))
}
