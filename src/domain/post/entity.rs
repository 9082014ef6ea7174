use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::CreatorSummary;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub title: String,
	pub content: String,
	pub image_url: String,
	pub creator: Creator,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// A post's creator, either as a bare reference or populated with the owner's summary.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Creator {
	Populated(CreatorSummary),
	Id(Uuid),
}

impl Creator {
	pub fn id(&self) -> Uuid {
		match self {
			Self::Populated(summary) => summary.id,
			Self::Id(id) => *id,
		}
	}
}

impl From<Uuid> for Creator {
	fn from(value: Uuid) -> Self {
		Self::Id(value)
	}
}

impl From<CreatorSummary> for Creator {
	fn from(value: CreatorSummary) -> Self {
		Self::Populated(value)
	}
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NewPost {
	pub title: String,
	pub content: String,
	pub image_url: String,
	pub creator: Uuid,
}
