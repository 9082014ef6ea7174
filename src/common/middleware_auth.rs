use axum::{
	extract::State,
	http::{header::AUTHORIZATION, Request},
	middleware::Next,
	response::Response,
};
#[cfg(any(test, feature = "test"))]
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
#[cfg(any(test, feature = "test"))]
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::response::ServiceError;

/// The acting user, inserted into request extensions once the bearer token checks out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
	pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
	pub user_id: String,
	#[serde(default)]
	pub email: String,
	pub exp: i64,
}

/// HS256 keys shared with the service that issues tokens.
#[derive(Clone)]
pub struct AuthKeys {
	#[cfg(any(test, feature = "test"))]
	encoding: EncodingKey,
	decoding: DecodingKey,
}

impl AuthKeys {
	pub fn new(secret: &[u8]) -> Self {
		Self {
			#[cfg(any(test, feature = "test"))]
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
		}
	}

	/// Tokens are minted by the account service; this exists for tests only.
	#[cfg(any(test, feature = "test"))]
	pub fn issue(
		&self,
		user_id: Uuid,
		email: &str,
		ttl: Duration,
	) -> Result<String, ServiceError> {
		let claims = Claims {
			user_id: user_id.to_string(),
			email: email.to_string(),
			exp: (Utc::now() + ttl).timestamp(),
		};
		encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|err| ServiceError::ServerError(err.to_string()))
	}

	pub fn verify(
		&self,
		token: &str,
	) -> Result<AuthUser, ServiceError> {
		let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256)).map_err(|err| {
			tracing::debug!("rejected bearer token: {}", err);
			ServiceError::NotAuthenticated
		})?;
		let user_id = Uuid::parse_str(&data.claims.user_id).map_err(|_| ServiceError::NotAuthenticated)?;
		Ok(AuthUser { user_id })
	}
}

pub async fn require_auth<B>(
	State(keys): State<AuthKeys>,
	mut request: Request<B>,
	next: Next<B>,
) -> Result<Response, ServiceError> {
	let token = request
		.headers()
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
		.ok_or(ServiceError::NotAuthenticated)?;

	let user = keys.verify(token.trim())?;

	let extensions = request.extensions_mut();
	extensions.insert(user);

	Ok(next.run(request).await)
}

#[cfg(test)]
mod test {
	use chrono::Duration;
	use uuid::Uuid;

	use super::AuthKeys;
	use crate::services::response::ServiceError;

	#[test]
	fn test_issued_token_verifies() {
		let keys = AuthKeys::new(b"somesupersecretsecret");
		let user_id = Uuid::new_v4();

		let token = keys.issue(user_id, "migo@krust.io", Duration::hours(1)).unwrap();

		assert_eq!(keys.verify(&token).unwrap().user_id, user_id);
	}

	#[test]
	fn test_rejected_tokens() {
		let keys = AuthKeys::new(b"somesupersecretsecret");
		let other = AuthKeys::new(b"another-secret");
		let user_id = Uuid::new_v4();

		let foreign = other.issue(user_id, "migo@krust.io", Duration::hours(1)).unwrap();
		let expired = keys.issue(user_id, "migo@krust.io", Duration::hours(-2)).unwrap();

		for token in [foreign.as_str(), expired.as_str(), "not-a-token"] {
			assert!(matches!(keys.verify(token), Err(ServiceError::NotAuthenticated)));
		}
	}
}
