use axum::{
	async_trait,
	body::Body,
	extract::{FromRequest, Multipart},
	http::{header::CONTENT_TYPE, Request},
	Json,
};
use serde::Deserialize;

use crate::{
	domain::post::commands::{CreatePost, UpdatePost, UploadedImage},
	services::response::ServiceError,
};

/// Post fields as submitted, from either `multipart/form-data` or a JSON body.
///
/// An `image` part carrying a file becomes `image`; an `image` part without a file name
/// (or the JSON `image` key) is a previously stored path and becomes `image_path`.
#[derive(Debug, Default)]
pub struct PostForm {
	pub title: String,
	pub content: String,
	pub image: Option<UploadedImage>,
	pub image_path: Option<String>,
}

#[derive(Deserialize)]
struct PostBody {
	#[serde(default)]
	title: String,
	#[serde(default)]
	content: String,
	#[serde(default)]
	image: Option<String>,
}

impl PostForm {
	async fn from_multipart(mut multipart: Multipart) -> Result<Self, ServiceError> {
		let mut form = PostForm::default();

		while let Some(field) = multipart.next_field().await.map_err(|err| ServiceError::BadRequest(err.to_string()))? {
			let name = field.name().unwrap_or_default().to_string();
			let file_name = field.file_name().map(str::to_owned);
			let content_type = field.content_type().unwrap_or_default().to_string();

			match (name.as_str(), file_name) {
				("image", Some(file_name)) => {
					let bytes = field.bytes().await.map_err(|err| ServiceError::BadRequest(err.to_string()))?;
					if file_name.is_empty() || bytes.is_empty() || !UploadedImage::accepts(&content_type) {
						tracing::debug!(file_name = %file_name, content_type = %content_type, "ignoring upload that is not an accepted image");
						continue;
					}
					form.image = Some(UploadedImage {
						file_name,
						content_type,
						bytes,
					});
				}
				("image", None) => {
					let path = field.text().await.map_err(|err| ServiceError::BadRequest(err.to_string()))?;
					form.image_path = Some(path).filter(|path| !path.trim().is_empty());
				}
				("title", _) => form.title = field.text().await.map_err(|err| ServiceError::BadRequest(err.to_string()))?,
				("content", _) => form.content = field.text().await.map_err(|err| ServiceError::BadRequest(err.to_string()))?,
				_ => {}
			}
		}
		Ok(form)
	}
}

#[async_trait]
impl<S> FromRequest<S, Body> for PostForm
where
	S: Send + Sync,
{
	type Rejection = ServiceError;

	async fn from_request(
		req: Request<Body>,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let is_multipart = req
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(|value| value.starts_with("multipart/form-data"))
			.unwrap_or(false);

		if is_multipart {
			let multipart = Multipart::from_request(req, state).await.map_err(|rejection| ServiceError::BadRequest(rejection.to_string()))?;
			return PostForm::from_multipart(multipart).await;
		}

		let Json(body) = Json::<PostBody>::from_request(req, state).await.map_err(|rejection| ServiceError::BadRequest(rejection.to_string()))?;
		Ok(PostForm {
			title: body.title,
			content: body.content,
			image: None,
			image_path: body.image.filter(|path| !path.trim().is_empty()),
		})
	}
}

impl From<PostForm> for CreatePost {
	fn from(value: PostForm) -> Self {
		CreatePost {
			title: value.title,
			content: value.content,
			image: value.image,
		}
	}
}

impl From<PostForm> for UpdatePost {
	fn from(value: PostForm) -> Self {
		UpdatePost {
			title: value.title,
			content: value.content,
			image: value.image,
			image_url: value.image_path,
		}
	}
}
