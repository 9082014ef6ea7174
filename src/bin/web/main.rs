use std::{net::SocketAddr, str::FromStr, time::Duration};

use axum::{
	extract::DefaultBodyLimit,
	http::{
		header::{AUTHORIZATION, CONTENT_TYPE},
		HeaderValue, Method,
	},
};

use feed::{bootstrap::Bootstrap, config::Config, routes::create_routes, services::response::ServiceError};
use tower_http::{
	cors::{AllowOrigin, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
	let config = Config::new()?;

	// ! Tracing
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			// axum logs rejections from built-in extractors with the `axum::rejection`
			// target, at `TRACE` level. `axum::rejection=trace` enables showing those events
			format!("feed={level},web={level},tower_http=debug,axum::rejection=trace", level = config.log_level).into()
		}))
		.with(tracing_subscriber::fmt::layer())
		.init();

	// ! Connection
	tracing::info!("connections are being pooled");
	let state = Bootstrap::app_state(&config).await?;

	let origins: Vec<HeaderValue> = config.allow_origins.iter().filter_map(|origin| origin.parse::<HeaderValue>().ok()).collect();

	let app = create_routes(state)
		.layer(DefaultBodyLimit::max(config.max_upload_bytes))
		.layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
		.layer(
			CorsLayer::new()
				.allow_origin(AllowOrigin::list(origins))
				.allow_methods([Method::GET, Method::POST, Method::PATCH, Method::PUT, Method::DELETE])
				.allow_headers([CONTENT_TYPE, AUTHORIZATION]),
		)
		.layer(TraceLayer::new_for_http());

	let addr = SocketAddr::from_str(&config.server_ip_port).map_err(|err| ServiceError::ConfigError(format!("SERVER_IP_PORT: {err}")))?;
	tracing::info!(%addr, "start web server");
	axum::Server::bind(&addr)
		.serve(app.into_make_service())
		.await
		.map_err(|err| ServiceError::ServerError(err.to_string()))
}
