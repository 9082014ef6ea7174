use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::FeedRepository;
use crate::{
	database::DatabaseExecutor,
	domain::{
		post::{Creator, NewPost, Post},
		user::{CreatorSummary, User},
	},
	services::response::ServiceError,
};

const SELECT_POST: &str = "SELECT p.id, p.title, p.content, p.image_url, p.creator_id, u.name AS creator_name, p.created_at, p.updated_at \
	FROM posts p LEFT JOIN users u ON u.id = p.creator_id";

const RETURNING_POST: &str = "RETURNING id, title, content, image_url, creator_id, NULL::TEXT AS creator_name, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PostRow {
	id: Uuid,
	title: String,
	content: String,
	image_url: String,
	creator_id: Uuid,
	creator_name: Option<String>,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
}

impl PostRow {
	fn into_post(
		self,
		populate: bool,
	) -> Post {
		let creator = match (populate, self.creator_name) {
			(true, Some(name)) => Creator::Populated(CreatorSummary { id: self.creator_id, name }),
			_ => Creator::Id(self.creator_id),
		};
		Post {
			id: self.id,
			title: self.title,
			content: self.content,
			image_url: self.image_url,
			creator,
			created_at: self.created_at,
			updated_at: self.updated_at,
		}
	}
}

pub struct PgFeedRepository {
	pool: PgPool,
}

impl PgFeedRepository {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl FeedRepository for PgFeedRepository {
	async fn count_posts(&self) -> Result<i64, ServiceError> {
		Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts").fetch_one(&self.pool).await?)
	}

	async fn page_posts(
		&self,
		offset: i64,
		limit: i64,
	) -> Result<Vec<Post>, ServiceError> {
		let sql = format!("{SELECT_POST} ORDER BY p.created_at DESC, p.id DESC OFFSET $1 LIMIT $2");
		let rows = sqlx::query_as::<_, PostRow>(&sql).bind(offset).bind(limit).fetch_all(&self.pool).await?;
		Ok(rows.into_iter().map(|row| row.into_post(true)).collect())
	}

	async fn find_post(
		&self,
		id: Uuid,
		populate: bool,
	) -> Result<Option<Post>, ServiceError> {
		let sql = format!("{SELECT_POST} WHERE p.id = $1");
		let row = sqlx::query_as::<_, PostRow>(&sql).bind(id).fetch_optional(&self.pool).await?;
		Ok(row.map(|row| row.into_post(populate)))
	}

	async fn find_user(
		&self,
		id: Uuid,
	) -> Result<Option<User>, ServiceError> {
		Ok(sqlx::query_as::<_, User>("SELECT id, email, name, password, status, posts FROM users WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?)
	}

	async fn insert_post(
		&self,
		post: NewPost,
	) -> Result<(Post, CreatorSummary), ServiceError> {
		let mut executor = DatabaseExecutor::new(self.pool.clone());
		executor.begin().await?;

		let owner = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM users WHERE id = $1 FOR UPDATE")
			.bind(post.creator)
			.fetch_optional(&mut **executor.transaction()?)
			.await?;
		let Some((owner_id, owner_name)) = owner else {
			executor.rollback().await?;
			return Err(ServiceError::UserNotFound);
		};

		let sql = format!("INSERT INTO posts (id, title, content, image_url, creator_id) VALUES ($1, $2, $3, $4, $5) {RETURNING_POST}");
		let row = sqlx::query_as::<_, PostRow>(&sql)
			.bind(Uuid::new_v4())
			.bind(&post.title)
			.bind(&post.content)
			.bind(&post.image_url)
			.bind(owner_id)
			.fetch_one(&mut **executor.transaction()?)
			.await?;

		sqlx::query("UPDATE users SET posts = array_append(posts, $1) WHERE id = $2")
			.bind(row.id)
			.bind(owner_id)
			.execute(&mut **executor.transaction()?)
			.await?;

		executor.commit().await?;
		Ok((row.into_post(false), CreatorSummary { id: owner_id, name: owner_name }))
	}

	async fn save_post(
		&self,
		post: &Post,
	) -> Result<Post, ServiceError> {
		let sql = format!("UPDATE posts SET title = $2, content = $3, image_url = $4, updated_at = NOW() WHERE id = $1 {RETURNING_POST}");
		let row = sqlx::query_as::<_, PostRow>(&sql)
			.bind(post.id)
			.bind(&post.title)
			.bind(&post.content)
			.bind(&post.image_url)
			.fetch_optional(&self.pool)
			.await?
			.ok_or(ServiceError::PostNotFound)?;

		Ok(Post {
			creator: post.creator.clone(),
			..row.into_post(false)
		})
	}

	async fn remove_post(
		&self,
		id: Uuid,
		owner: Uuid,
	) -> Result<(), ServiceError> {
		let mut executor = DatabaseExecutor::new(self.pool.clone());
		executor.begin().await?;

		let deleted = sqlx::query("DELETE FROM posts WHERE id = $1").bind(id).execute(&mut **executor.transaction()?).await?;
		if deleted.rows_affected() == 0 {
			executor.rollback().await?;
			return Err(ServiceError::PostNotFound);
		}

		sqlx::query("UPDATE users SET posts = array_remove(posts, $1) WHERE id = $2")
			.bind(id)
			.bind(owner)
			.execute(&mut **executor.transaction()?)
			.await?;

		executor.commit().await
	}
}

// These run against the database named by `DATABASE_URL` and return early without one.
#[cfg(test)]
mod test {
	use chrono::{Duration, Utc};
	use sqlx::postgres::PgPool;
	use uuid::Uuid;

	use super::PgFeedRepository;
	use crate::{
		adapters::repositories::FeedRepository,
		database::migrate,
		domain::{
			post::{Creator, NewPost},
			user::CreatorSummary,
		},
		services::response::ServiceError,
	};

	async fn repository() -> Option<PgFeedRepository> {
		dotenv::dotenv().ok();
		let url = std::env::var("DATABASE_URL").ok()?;
		let pool = PgPool::connect(&url).await.unwrap();
		migrate(&pool).await.unwrap();
		Some(PgFeedRepository::new(pool))
	}

	async fn add_user(
		repository: &PgFeedRepository,
		name: &str,
	) -> CreatorSummary {
		let id = Uuid::new_v4();
		sqlx::query("INSERT INTO users (id, email, name, password) VALUES ($1, $2, $3, 'hashed')")
			.bind(id)
			.bind(format!("{id}@krust.io"))
			.bind(name)
			.execute(&repository.pool)
			.await
			.unwrap();
		CreatorSummary { id, name: name.to_string() }
	}

	fn draft(
		title: &str,
		creator: Uuid,
	) -> NewPost {
		NewPost {
			title: title.to_string(),
			content: "Some content".to_string(),
			image_url: format!("images/{}-x.png", Uuid::new_v4()),
			creator,
		}
	}

	#[tokio::test]
	async fn test_insert_and_remove_keep_creator_posts_in_step() {
		let Some(repository) = repository().await else { return };

		'_given: {
			let creator = add_user(&repository, "Migo").await;

			'_when: {
				let (post, summary) = repository.insert_post(draft("Stored", creator.id)).await.unwrap();

				'_then: {
					assert_eq!(summary, creator);
					assert_eq!(post.creator, Creator::Id(creator.id));
					let user = repository.find_user(creator.id).await.unwrap().unwrap();
					assert_eq!(user.posts, vec![post.id]);

					let populated = repository.find_post(post.id, true).await.unwrap().unwrap();
					assert_eq!(populated.creator, Creator::Populated(creator.clone()));
					let plain = repository.find_post(post.id, false).await.unwrap().unwrap();
					assert_eq!(plain.creator, Creator::Id(creator.id));

					repository.remove_post(post.id, creator.id).await.unwrap();
					assert!(repository.find_post(post.id, false).await.unwrap().is_none());
					let user = repository.find_user(creator.id).await.unwrap().unwrap();
					assert!(user.posts.is_empty());

					assert!(matches!(repository.remove_post(post.id, creator.id).await, Err(ServiceError::PostNotFound)));
				}
			}
		}
	}

	#[tokio::test]
	async fn test_insert_for_unknown_user_rolls_back() {
		let Some(repository) = repository().await else { return };
		let orphan = draft("Orphan", Uuid::new_v4());
		let image_url = orphan.image_url.clone();

		let result = repository.insert_post(orphan).await;

		assert!(matches!(result, Err(ServiceError::UserNotFound)));
		let stored = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE image_url = $1")
			.bind(&image_url)
			.fetch_one(&repository.pool)
			.await
			.unwrap();
		assert_eq!(stored, 0);
	}

	#[tokio::test]
	async fn test_save_post_keeps_creator() {
		let Some(repository) = repository().await else { return };
		let creator = add_user(&repository, "Mago").await;
		let (mut post, _) = repository.insert_post(draft("Before", creator.id)).await.unwrap();

		post.title = "After".to_string();
		post.creator = Creator::Populated(creator.clone());
		let saved = repository.save_post(&post).await.unwrap();

		assert_eq!(saved.title, "After");
		assert_eq!(saved.creator, Creator::Populated(creator.clone()));
		assert!(saved.updated_at >= post.updated_at);
		assert_eq!(repository.find_post(post.id, false).await.unwrap().unwrap().title, "After");

		repository.remove_post(post.id, creator.id).await.unwrap();
		assert!(matches!(repository.save_post(&post).await, Err(ServiceError::PostNotFound)));
	}

	#[tokio::test]
	async fn test_page_posts_newest_first_with_populated_creator() {
		let Some(repository) = repository().await else { return };
		let creator = add_user(&repository, "Migo").await;

		// Push the fixture rows ahead of anything else in a shared database.
		let base = Utc::now() + Duration::days(365 * 100);
		let mut created = vec![];
		for n in 0..3 {
			let (post, _) = repository.insert_post(draft(&format!("Post {n}"), creator.id)).await.unwrap();
			sqlx::query("UPDATE posts SET created_at = $2 WHERE id = $1")
				.bind(post.id)
				.bind(base + Duration::seconds(n))
				.execute(&repository.pool)
				.await
				.unwrap();
			created.push(post.id);
		}

		let first = repository.page_posts(0, 2).await.unwrap();
		let second = repository.page_posts(2, 2).await.unwrap();

		assert_eq!(first.iter().map(|post| post.id).collect::<Vec<_>>(), vec![created[2], created[1]]);
		assert_eq!(second[0].id, created[0]);
		assert!(first.iter().all(|post| post.creator == Creator::Populated(creator.clone())));
		assert!(repository.count_posts().await.unwrap() >= 3);

		for id in created {
			repository.remove_post(id, creator.id).await.unwrap();
		}
	}
}
