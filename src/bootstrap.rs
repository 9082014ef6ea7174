use std::sync::Arc;

use crate::{
	adapters::{
		images::ImageStore,
		publishers::{FanoutPublisher, NatsPublisher, Publisher, SocketHub},
		repositories::PgFeedRepository,
	},
	common::middleware_auth::AuthKeys,
	config::Config,
	database::migrate,
	dependencies::{connection_pool, queue_client, AppState},
	services::response::ServiceError,
};

/// Frames a slow socket listener may fall behind by before it starts skipping.
pub const SOCKET_CHANNEL_CAPACITY: usize = 100;

pub struct Bootstrap;
impl Bootstrap {
	pub async fn app_state(config: &Config) -> Result<AppState, ServiceError> {
		let pool = connection_pool(config).await?;
		migrate(&pool).await?;
		tracing::info!("database migrations applied");

		let hub = SocketHub::new(SOCKET_CHANNEL_CAPACITY);
		let mut publishers: Vec<Arc<dyn Publisher>> = vec![Arc::new(hub.clone())];
		if let Some(client) = queue_client(config).await? {
			tracing::info!(subject = %config.notify_subject, "relaying feed events to the queue service");
			publishers.push(Arc::new(NatsPublisher::new(client, &config.notify_subject)));
		}

		let images = ImageStore::new(&config.image_root, &config.upload_dir);
		images.prepare().await?;

		Ok(AppState {
			repository: Arc::new(PgFeedRepository::new(pool)),
			publisher: Arc::new(FanoutPublisher::new(publishers)),
			images,
			hub,
			auth: AuthKeys::new(config.jwt_secret.as_bytes()),
		})
	}
}
