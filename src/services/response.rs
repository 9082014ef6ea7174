use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::{post::Post, user::CreatorSummary};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsPage {
	pub message: String,
	pub posts: Vec<Post>,
	pub total_items: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostCreated {
	pub message: String,
	pub post: Post,
	pub creator: CreatorSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostPayload {
	pub message: String,
	pub post: Post,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
	pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
	#[error("Validation failed, entered data is incorrect.")]
	ValidationFailed(#[from] ValidationErrors),
	#[error("No image provided.")]
	NoImage,
	#[error("Invalid image path.")]
	InvalidImagePath,
	#[error("Could not find post.")]
	PostNotFound,
	#[error("Could not find user.")]
	UserNotFound,
	#[error("Not authorized!")]
	NotAuthorized,
	#[error("Not authenticated.")]
	NotAuthenticated,
	#[error("{0}")]
	BadRequest(String),
	#[error("database error: {0}")]
	DatabaseError(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	MigrationError(#[from] sqlx::migrate::MigrateError),
	#[error("transaction error: {0}")]
	TransactionError(&'static str),
	#[error("io error: {0}")]
	IoError(#[from] std::io::Error),
	#[error("parsing error: {0}")]
	ParsingError(#[from] serde_json::Error),
	#[error("message publishing error: {0}")]
	MessagePublishingError(String),
	#[error("queue service error: {0}")]
	QueueServiceError(String),
	#[error("configuration error: {0}")]
	ConfigError(String),
	#[error("server error: {0}")]
	ServerError(String),
}

impl ServiceError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::ValidationFailed(_) | Self::NoImage | Self::InvalidImagePath => StatusCode::UNPROCESSABLE_ENTITY,
			Self::PostNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
			Self::NotAuthorized => StatusCode::FORBIDDEN,
			Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
			Self::BadRequest(_) => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ServiceError {
	fn into_response(self) -> Response {
		let status = self.status_code();

		// Unclassified failures are reported here and hidden from the client.
		let body = if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
			ErrorBody {
				message: "An internal error occurred.".to_string(),
				data: None,
			}
		} else {
			let data = match &self {
				Self::ValidationFailed(errors) => serde_json::to_value(errors).ok(),
				_ => None,
			};
			ErrorBody {
				message: self.to_string(),
				data,
			}
		};

		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod test {
	use axum::{http::StatusCode, response::IntoResponse};

	use super::ServiceError;

	#[test]
	fn test_status_codes() {
		assert_eq!(ServiceError::NoImage.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(ServiceError::InvalidImagePath.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(ServiceError::PostNotFound.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(ServiceError::NotAuthorized.status_code(), StatusCode::FORBIDDEN);
		assert_eq!(ServiceError::NotAuthenticated.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			ServiceError::TransactionError("transaction has not begun").status_code(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
		assert_eq!(
			ServiceError::DatabaseError(sqlx::Error::RowNotFound).into_response().status(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}
}
