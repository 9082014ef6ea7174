use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::{
	domain::post::{check_image_path, commands::UploadedImage, normalize_image_path},
	services::response::ServiceError,
};

/// Post images on local disk. Stored paths look like `<upload_dir>/<file>` and are
/// resolved against `root`.
#[derive(Clone, Debug)]
pub struct ImageStore {
	root: PathBuf,
	upload_dir: String,
}

impl ImageStore {
	pub fn new(
		root: impl Into<PathBuf>,
		upload_dir: &str,
	) -> Self {
		Self {
			root: root.into(),
			upload_dir: normalize_image_path(upload_dir).trim_end_matches('/').to_string(),
		}
	}

	pub fn upload_dir(&self) -> &str {
		&self.upload_dir
	}

	pub fn upload_path(&self) -> PathBuf {
		self.root.join(&self.upload_dir)
	}

	pub fn resolve(
		&self,
		stored: &str,
	) -> PathBuf {
		self.root.join(normalize_image_path(stored))
	}

	pub async fn prepare(&self) -> Result<(), ServiceError> {
		tokio::fs::create_dir_all(self.upload_path()).await?;
		Ok(())
	}

	/// Writes the upload and returns the path to record on the post.
	pub async fn save(
		&self,
		image: &UploadedImage,
	) -> Result<String, ServiceError> {
		let file_name = format!(
			"{}-{}-{}",
			Utc::now().format("%Y%m%dT%H%M%S%3fZ"),
			&Uuid::new_v4().simple().to_string()[..8],
			sanitize_file_name(&image.file_name)
		);
		let stored = normalize_image_path(&format!("{}/{}", self.upload_dir, file_name));

		self.prepare().await?;
		tokio::fs::write(self.resolve(&stored), &image.bytes).await?;
		tracing::debug!(path = %stored, bytes = image.bytes.len(), "image saved");
		Ok(stored)
	}

	/// Best-effort removal. Failures are logged, never returned.
	pub async fn clear(
		&self,
		stored: &str,
	) {
		if check_image_path(stored, &self.upload_dir).is_err() {
			tracing::warn!(path = %stored, "refusing to clear image outside the upload directory");
			return;
		}

		let path = self.resolve(stored);
		if let Err(err) = tokio::fs::remove_file(&path).await {
			tracing::warn!(path = %path.display(), "failed to clear image: {}", err);
		}
	}
}

fn sanitize_file_name(raw: &str) -> String {
	let base = normalize_image_path(raw).rsplit('/').next().unwrap_or_default().to_string();
	let cleaned: String = base
		.chars()
		.map(|c| match c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
			true => c,
			false => '_',
		})
		.collect();

	match cleaned.trim_start_matches('.') {
		"" => "image".to_string(),
		name => name.to_string(),
	}
}

#[cfg(test)]
mod test {
	use bytes::Bytes;

	use super::{sanitize_file_name, ImageStore};
	use crate::domain::post::commands::UploadedImage;

	#[test]
	fn test_sanitize_file_name() {
		assert_eq!(sanitize_file_name("x.png"), "x.png");
		assert_eq!(sanitize_file_name("C:\\Users\\migo\\my photo.png"), "my_photo.png");
		assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
		assert_eq!(sanitize_file_name(".."), "image");
		assert_eq!(sanitize_file_name(""), "image");
	}

	#[tokio::test]
	async fn test_save_then_clear() {
		let root = tempfile::tempdir().unwrap();
		let store = ImageStore::new(root.path(), "images\\");

		let stored = store
			.save(&UploadedImage {
				file_name: "x.png".to_string(),
				content_type: "image/png".to_string(),
				bytes: Bytes::from_static(b"\x89PNG"),
			})
			.await
			.unwrap();

		assert!(stored.starts_with("images/"));
		assert!(stored.ends_with("-x.png"));
		assert_eq!(tokio::fs::read(store.resolve(&stored)).await.unwrap(), b"\x89PNG");

		store.clear(&stored).await;
		assert!(!store.resolve(&stored).exists());
	}

	#[tokio::test]
	async fn test_clear_swallows_failures() {
		let root = tempfile::tempdir().unwrap();
		let store = ImageStore::new(root.path(), "images");
		let outside = root.path().join("keep.txt");
		tokio::fs::write(&outside, b"keep").await.unwrap();

		// Missing file and escaping path both return quietly.
		store.clear("images/missing.png").await;
		store.clear("images/../keep.txt").await;

		assert!(outside.exists());
	}
}
