use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Extension, Json,
};
use axum_macros::debug_handler;
use serde::Deserialize;

use crate::{
	common::{middleware_auth::AuthUser, upload::PostForm},
	dependencies::AppState,
	services::{
		handlers::FeedHandler,
		response::{MessageBody, PostCreated, PostPayload, PostsPage, ServiceError},
	},
};

/// `page` stays a raw string so odd values fall back to the first page instead of a 400.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
	page: Option<String>,
}

pub async fn get_posts(
	State(state): State<AppState>,
	Query(query): Query<PageQuery>,
) -> Result<Json<PostsPage>, ServiceError> {
	Ok(Json(FeedHandler::get_posts(&state, query.page.as_deref()).await?))
}

#[debug_handler]
pub async fn create_post(
	State(state): State<AppState>,
	Extension(user): Extension<AuthUser>,
	form: PostForm,
) -> Result<(StatusCode, Json<PostCreated>), ServiceError> {
	let created = FeedHandler::create_post(&state, user, form.into()).await?;
	Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_post(
	State(state): State<AppState>,
	Path(post_id): Path<String>,
) -> Result<Json<PostPayload>, ServiceError> {
	Ok(Json(FeedHandler::get_post(&state, &post_id).await?))
}

pub async fn update_post(
	State(state): State<AppState>,
	Extension(user): Extension<AuthUser>,
	Path(post_id): Path<String>,
	form: PostForm,
) -> Result<Json<PostPayload>, ServiceError> {
	Ok(Json(FeedHandler::update_post(&state, user, &post_id, form.into()).await?))
}

pub async fn delete_post(
	State(state): State<AppState>,
	Extension(user): Extension<AuthUser>,
	Path(post_id): Path<String>,
) -> Result<Json<MessageBody>, ServiceError> {
	Ok(Json(FeedHandler::delete_post(&state, user, &post_id).await?))
}
