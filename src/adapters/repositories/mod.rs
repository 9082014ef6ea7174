#[cfg(any(test, feature = "test"))]
pub mod memory;
pub mod post_repository;

use async_trait::async_trait;
use uuid::Uuid;

pub use self::post_repository::PgFeedRepository;
use crate::{
	domain::{
		post::{NewPost, Post},
		user::{CreatorSummary, User},
	},
	services::response::ServiceError,
};

/// Store of posts and their owners.
///
/// `insert_post` and `remove_post` touch both the post and the owner's `posts`
/// back-reference and must apply both or neither.
#[async_trait]
pub trait FeedRepository: Send + Sync {
	async fn count_posts(&self) -> Result<i64, ServiceError>;

	/// Newest first, creator populated.
	async fn page_posts(
		&self,
		offset: i64,
		limit: i64,
	) -> Result<Vec<Post>, ServiceError>;

	async fn find_post(
		&self,
		id: Uuid,
		populate: bool,
	) -> Result<Option<Post>, ServiceError>;

	async fn find_user(
		&self,
		id: Uuid,
	) -> Result<Option<User>, ServiceError>;

	async fn insert_post(
		&self,
		post: NewPost,
	) -> Result<(Post, CreatorSummary), ServiceError>;

	/// Overwrites title, content and image path. The returned post keeps the given `creator` form.
	async fn save_post(
		&self,
		post: &Post,
	) -> Result<Post, ServiceError>;

	async fn remove_post(
		&self,
		id: Uuid,
		owner: Uuid,
	) -> Result<(), ServiceError>;
}
