use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::Post;
use crate::services::response::ServiceError;

/// Event name every feed notification is emitted under.
pub const POSTS_CHANNEL: &str = "posts";

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum FeedEvent {
	Create { post: Post },
	Update { post: Post },
	Delete { post: Uuid },
}

impl FeedEvent {
	pub fn action(&self) -> &'static str {
		match self {
			Self::Create { .. } => "create",
			Self::Update { .. } => "update",
			Self::Delete { .. } => "delete",
		}
	}

	pub fn channel(&self) -> &'static str {
		POSTS_CHANNEL
	}

	/// JSON frame pushed to listeners: `{"event": "posts", "data": {"action": .., "post": ..}}`.
	pub fn to_frame(&self) -> Result<String, ServiceError> {
		Ok(serde_json::to_string(&SocketFrame {
			event: self.channel().to_string(),
			data: self,
		})?)
	}
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SocketFrame<T> {
	pub event: String,
	pub data: T,
}
