use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::FeedRepository;
use crate::{
	domain::{
		post::{Creator, NewPost, Post},
		user::{CreatorSummary, User},
	},
	services::response::ServiceError,
};

struct StoredPost {
	sequence: u64,
	post: Post,
}

#[derive(Default)]
struct MemoryState {
	posts: HashMap<Uuid, StoredPost>,
	users: HashMap<Uuid, User>,
	sequence: u64,
}

impl MemoryState {
	fn populate(
		&self,
		mut post: Post,
	) -> Post {
		if let Some(user) = self.users.get(&post.creator.id()) {
			post.creator = Creator::Populated(user.summary());
		}
		post
	}
}

/// Process-local `FeedRepository`. Each call takes the lock once, so the post and
/// back-reference writes of a single call are never observed half-applied.
#[derive(Default)]
pub struct InMemoryFeedRepository {
	state: RwLock<MemoryState>,
}

impl InMemoryFeedRepository {
	pub fn new() -> Self {
		Default::default()
	}

	pub async fn add_user(
		&self,
		user: User,
	) {
		self.state.write().await.users.insert(user.id, user);
	}
}

#[async_trait]
impl FeedRepository for InMemoryFeedRepository {
	async fn count_posts(&self) -> Result<i64, ServiceError> {
		Ok(self.state.read().await.posts.len() as i64)
	}

	async fn page_posts(
		&self,
		offset: i64,
		limit: i64,
	) -> Result<Vec<Post>, ServiceError> {
		let state = self.state.read().await;
		let mut stored: Vec<&StoredPost> = state.posts.values().collect();
		stored.sort_by(|a, b| (b.post.created_at, b.sequence).cmp(&(a.post.created_at, a.sequence)));

		Ok(stored
			.into_iter()
			.skip(offset.max(0) as usize)
			.take(limit.max(0) as usize)
			.map(|stored| state.populate(stored.post.clone()))
			.collect())
	}

	async fn find_post(
		&self,
		id: Uuid,
		populate: bool,
	) -> Result<Option<Post>, ServiceError> {
		let state = self.state.read().await;
		Ok(state.posts.get(&id).map(|stored| match populate {
			true => state.populate(stored.post.clone()),
			false => stored.post.clone(),
		}))
	}

	async fn find_user(
		&self,
		id: Uuid,
	) -> Result<Option<User>, ServiceError> {
		Ok(self.state.read().await.users.get(&id).cloned())
	}

	async fn insert_post(
		&self,
		post: NewPost,
	) -> Result<(Post, CreatorSummary), ServiceError> {
		let mut state = self.state.write().await;
		state.sequence += 1;
		let sequence = state.sequence;

		let owner = state.users.get_mut(&post.creator).ok_or(ServiceError::UserNotFound)?;
		let now = Utc::now();
		let created = Post {
			id: Uuid::new_v4(),
			title: post.title,
			content: post.content,
			image_url: post.image_url,
			creator: Creator::Id(owner.id),
			created_at: now,
			updated_at: now,
		};
		owner.posts.push(created.id);
		let summary = owner.summary();

		state.posts.insert(
			created.id,
			StoredPost {
				sequence,
				post: created.clone(),
			},
		);
		Ok((created, summary))
	}

	async fn save_post(
		&self,
		post: &Post,
	) -> Result<Post, ServiceError> {
		let mut state = self.state.write().await;
		let stored = state.posts.get_mut(&post.id).ok_or(ServiceError::PostNotFound)?;

		stored.post.title = post.title.clone();
		stored.post.content = post.content.clone();
		stored.post.image_url = post.image_url.clone();
		stored.post.updated_at = Utc::now();

		Ok(Post {
			creator: post.creator.clone(),
			..stored.post.clone()
		})
	}

	async fn remove_post(
		&self,
		id: Uuid,
		owner: Uuid,
	) -> Result<(), ServiceError> {
		let mut state = self.state.write().await;
		state.posts.remove(&id).ok_or(ServiceError::PostNotFound)?;
		if let Some(user) = state.users.get_mut(&owner) {
			user.posts.retain(|post_id| *post_id != id);
		}
		Ok(())
	}
}
