use std::{path::PathBuf, str::FromStr};

use crate::services::response::ServiceError;

pub struct Config {
	/// Which errors we want to log
	pub log_level: String,

	/// Port server is listening to
	pub server_ip_port: String,
	pub database_url: String,
	pub max_connections: u32,
	/// Optional NATS relay for feed events
	pub queue_url: Option<String>,
	pub notify_subject: String,
	pub allow_origins: Vec<String>,
	pub jwt_secret: String,

	/// Stored image paths are resolved against this directory
	pub image_root: PathBuf,
	pub upload_dir: String,
	pub max_upload_bytes: usize,
	pub request_timeout_secs: u64,
}

impl Config {
	pub fn new() -> Result<Config, ServiceError> {
		dotenv::dotenv().ok();
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ServiceError> {
		let required = |key: &str| lookup(key).filter(|value| !value.is_empty()).ok_or_else(|| ServiceError::ConfigError(format!("{key} must be set")));

		let database_url = required("DATABASE_URL")?;
		let jwt_secret = required("JWT_SECRET")?;
		let log_level = lookup("LOG_LEVEL").unwrap_or("info".to_string());
		let server_ip_port = lookup("SERVER_IP_PORT").unwrap_or("0.0.0.0:8080".into());
		let queue_url = lookup("QUEUE_URL").filter(|url| !url.is_empty());
		let notify_subject = lookup("NOTIFY_SUBJECT").unwrap_or("feed.posts".to_string());
		let allow_origins = lookup("ALLOW_ORIGINS")
			.unwrap_or("http://localhost:3000".to_string())
			.split(',')
			.map(|origin| origin.trim().to_string())
			.filter(|origin| !origin.is_empty())
			.collect();
		let image_root = PathBuf::from(lookup("IMAGE_ROOT").unwrap_or(".".to_string()));
		let upload_dir = lookup("UPLOAD_DIR").unwrap_or("images".to_string());

		Ok(Config {
			log_level,
			server_ip_port,
			database_url,
			max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 30)?,
			queue_url,
			notify_subject,
			allow_origins,
			jwt_secret,
			image_root,
			upload_dir,
			max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
			request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
		})
	}
}

fn parse_or<T: FromStr>(
	lookup: &impl Fn(&str) -> Option<String>,
	key: &str,
	default: T,
) -> Result<T, ServiceError> {
	match lookup(key) {
		None => Ok(default),
		Some(raw) => raw.trim().parse::<T>().map_err(|_| ServiceError::ConfigError(format!("{key} has an invalid value: {raw}"))),
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::Config;
	use crate::services::response::ServiceError;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key| vars.get(key).cloned()
	}

	#[test]
	fn test_defaults() {
		let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/feed"), ("JWT_SECRET", "somesupersecretsecret")])).unwrap();

		assert_eq!(config.server_ip_port, "0.0.0.0:8080");
		assert_eq!(config.upload_dir, "images");
		assert_eq!(config.notify_subject, "feed.posts");
		assert_eq!(config.allow_origins, vec!["http://localhost:3000".to_string()]);
		assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
		assert_eq!(config.request_timeout_secs, 30);
		assert!(config.queue_url.is_none());
	}

	#[test]
	fn test_missing_required_values() {
		assert!(matches!(
			Config::from_lookup(lookup(&[("JWT_SECRET", "secret")])),
			Err(ServiceError::ConfigError(msg)) if msg.contains("DATABASE_URL")
		));
		assert!(matches!(
			Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/feed"), ("JWT_SECRET", "")])),
			Err(ServiceError::ConfigError(msg)) if msg.contains("JWT_SECRET")
		));
	}

	#[test]
	fn test_overrides() {
		let config = Config::from_lookup(lookup(&[
			("DATABASE_URL", "postgres://localhost/feed"),
			("JWT_SECRET", "secret"),
			("QUEUE_URL", "nats://localhost:4222"),
			("ALLOW_ORIGINS", "http://a.io, http://b.io,"),
			("REQUEST_TIMEOUT_SECS", "5"),
		]))
		.unwrap();

		assert_eq!(config.queue_url.as_deref(), Some("nats://localhost:4222"));
		assert_eq!(config.allow_origins, vec!["http://a.io".to_string(), "http://b.io".to_string()]);
		assert_eq!(config.request_timeout_secs, 5);

		assert!(Config::from_lookup(lookup(&[
			("DATABASE_URL", "postgres://localhost/feed"),
			("JWT_SECRET", "secret"),
			("MAX_UPLOAD_BYTES", "lots"),
		]))
		.is_err());
	}
}
