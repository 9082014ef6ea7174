use axum::extract::ws::{Message, WebSocket};
use futures::{
	stream::{SplitSink, SplitStream},
	SinkExt, StreamExt,
};
use tokio::{
	sync::broadcast::{self, error::RecvError},
	task::JoinHandle,
};
use uuid::Uuid;

use super::response::{MessageBody, PostCreated, PostPayload, PostsPage, ServiceError};
use crate::{
	adapters::publishers::SocketHub,
	common::middleware_auth::AuthUser,
	dependencies::AppState,
	domain::post::{
		check_image_path,
		commands::{CreatePost, UpdatePost, UploadedImage},
		events::FeedEvent,
		page_offset, Creator, NewPost, Post, PostFields, POSTS_PER_PAGE,
	},
};

enum ImageSource {
	Upload(UploadedImage),
	Stored(String),
}

pub struct FeedHandler;
impl FeedHandler {
	#[tracing::instrument(skip(state))]
	pub async fn get_posts(
		state: &AppState,
		page: Option<&str>,
	) -> Result<PostsPage, ServiceError> {
		let total_items = state.repository.count_posts().await?;
		let posts = state.repository.page_posts(page_offset(page), POSTS_PER_PAGE).await?;

		Ok(PostsPage {
			message: "Posts fetched".to_string(),
			posts,
			total_items,
		})
	}

	#[tracing::instrument(skip(state, command), fields(user_id = %actor.user_id))]
	pub async fn create_post(
		state: &AppState,
		actor: AuthUser,
		command: CreatePost,
	) -> Result<PostCreated, ServiceError> {
		let fields = PostFields::new(&command.title, &command.content).validated()?;
		let image = command.image.ok_or(ServiceError::NoImage)?;

		let image_url = state.images.save(&image).await?;
		let draft = NewPost {
			title: fields.title,
			content: fields.content,
			image_url: image_url.clone(),
			creator: actor.user_id,
		};
		let (post, creator) = match state.repository.insert_post(draft).await {
			Ok(created) => created,
			Err(err) => {
				state.images.clear(&image_url).await;
				return Err(err);
			}
		};

		let announced = Post {
			creator: Creator::Populated(creator.clone()),
			..post.clone()
		};
		Self::notify(state, FeedEvent::Create { post: announced }).await;

		Ok(PostCreated {
			message: "Post created successfully!".to_string(),
			post,
			creator,
		})
	}

	#[tracing::instrument(skip(state))]
	pub async fn get_post(
		state: &AppState,
		post_id: &str,
	) -> Result<PostPayload, ServiceError> {
		let id = parse_post_id(post_id)?;
		let post = state.repository.find_post(id, false).await?.ok_or(ServiceError::PostNotFound)?;

		Ok(PostPayload {
			message: "Post fetched".to_string(),
			post,
		})
	}

	#[tracing::instrument(skip(state, command), fields(user_id = %actor.user_id))]
	pub async fn update_post(
		state: &AppState,
		actor: AuthUser,
		post_id: &str,
		command: UpdatePost,
	) -> Result<PostPayload, ServiceError> {
		let fields = PostFields::new(&command.title, &command.content).validated()?;
		let source = match (command.image, command.image_url) {
			(Some(image), _) => ImageSource::Upload(image),
			(None, Some(path)) => ImageSource::Stored(check_image_path(&path, state.images.upload_dir())?),
			(None, None) => return Err(ServiceError::NoImage),
		};

		let id = parse_post_id(post_id)?;
		let mut post = state.repository.find_post(id, true).await?.ok_or(ServiceError::PostNotFound)?;
		if post.creator.id() != actor.user_id {
			return Err(ServiceError::NotAuthorized);
		}

		let (image_url, uploaded) = match source {
			ImageSource::Upload(image) => (state.images.save(&image).await?, true),
			ImageSource::Stored(path) if path == post.image_url => (path, false),
			ImageSource::Stored(_) => return Err(ServiceError::InvalidImagePath),
		};
		let previous_image = std::mem::replace(&mut post.image_url, image_url.clone());
		post.title = fields.title;
		post.content = fields.content;

		let updated = match state.repository.save_post(&post).await {
			Ok(updated) => updated,
			Err(err) => {
				if uploaded {
					state.images.clear(&image_url).await;
				}
				return Err(err);
			}
		};
		if previous_image != image_url {
			state.images.clear(&previous_image).await;
		}

		Self::notify(state, FeedEvent::Update { post: updated.clone() }).await;

		Ok(PostPayload {
			message: "Post updated".to_string(),
			post: updated,
		})
	}

	#[tracing::instrument(skip(state), fields(user_id = %actor.user_id))]
	pub async fn delete_post(
		state: &AppState,
		actor: AuthUser,
		post_id: &str,
	) -> Result<MessageBody, ServiceError> {
		let id = parse_post_id(post_id)?;
		let post = state.repository.find_post(id, false).await?.ok_or(ServiceError::PostNotFound)?;
		if post.creator.id() != actor.user_id {
			return Err(ServiceError::NotAuthorized);
		}

		state.repository.remove_post(id, post.creator.id()).await?;
		state.images.clear(&post.image_url).await;

		Self::notify(state, FeedEvent::Delete { post: id }).await;

		Ok(MessageBody {
			message: "Post deleted.".to_string(),
		})
	}

	/// The mutation is already stored, so a failed notification is logged rather than returned.
	async fn notify(
		state: &AppState,
		event: FeedEvent,
	) {
		if let Err(err) = state.publisher.publish(&event).await {
			tracing::error!(action = event.action(), "feed event publishing failed: {}", err);
		}
	}
}

fn parse_post_id(raw: &str) -> Result<Uuid, ServiceError> {
	Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::PostNotFound)
}

pub struct SocketHandler;
impl SocketHandler {
	/// This function deals with a single websocket connection, i.e., a single
	/// connected listener, for which we will spawn two independent tasks (for
	/// pushing feed events / watching for the client going away).
	pub async fn run_socket_broker(
		stream: WebSocket,
		hub: SocketHub,
	) {
		let (sender, receiver) = stream.split();

		let mut send_task = SocketHandler::_send_feed_events_to_this_client(hub.subscribe(), sender);

		let mut recv_task = SocketHandler::_receive_messages_from_this_client(receiver);

		// Waits on multiple concurrent branches, returning when the first branch completes,
		// cancelling the remaining branches.
		tokio::select! {
			_ = (&mut send_task) => recv_task.abort(),
			_ = (&mut recv_task) => send_task.abort(),
		};
	}

	fn _send_feed_events_to_this_client(
		mut events: broadcast::Receiver<String>,
		mut sender: SplitSink<WebSocket, Message>,
	) -> JoinHandle<()> {
		tokio::spawn(async move {
			loop {
				match events.recv().await {
					Ok(frame) => {
						if sender.send(Message::Text(frame)).await.is_err() {
							break;
						}
					}
					Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "socket listener fell behind the feed"),
					Err(RecvError::Closed) => break,
				}
			}
		})
	}

	// Listeners only receive; anything they send is ignored until they close.
	fn _receive_messages_from_this_client(mut receiver: SplitStream<WebSocket>) -> JoinHandle<()> {
		tokio::spawn(async move {
			while let Some(Ok(message)) = receiver.next().await {
				if let Message::Close(_) = message {
					break;
				}
			}
		})
	}
}
