use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner of posts. `posts` is the back-reference list kept in step with the posts table.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub email: String,
	pub name: String,
	#[serde(skip)]
	pub password: String,
	pub status: String,
	pub posts: Vec<Uuid>,
}

impl User {
	pub fn summary(&self) -> CreatorSummary {
		CreatorSummary {
			id: self.id,
			name: self.name.clone(),
		}
	}
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CreatorSummary {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub name: String,
}

#[test]
fn test_password_is_never_serialized() {
	let user = User {
		id: Uuid::new_v4(),
		email: "migo@krust.io".to_string(),
		name: "Migo".to_string(),
		password: "hashed".to_string(),
		status: "I am new!".to_string(),
		posts: vec![],
	};

	let jsonified = serde_json::to_value(&user).unwrap();
	assert!(jsonified.get("password").is_none());
	assert_eq!(jsonified["_id"], user.id.to_string());
}
