use bytes::Bytes;

/// Content types a post image may be uploaded with. Anything else is treated as no upload.
pub const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpg", "image/jpeg"];

#[derive(Clone, Debug)]
pub struct UploadedImage {
	pub file_name: String,
	pub content_type: String,
	pub bytes: Bytes,
}

impl UploadedImage {
	pub fn accepts(content_type: &str) -> bool {
		ACCEPTED_IMAGE_TYPES.contains(&content_type.trim().to_ascii_lowercase().as_str())
	}
}

#[derive(Clone, Debug, Default)]
pub struct CreatePost {
	pub title: String,
	pub content: String,
	pub image: Option<UploadedImage>,
}

/// `image` wins over `image_url` when both are present.
#[derive(Clone, Debug, Default)]
pub struct UpdatePost {
	pub title: String,
	pub content: String,
	pub image: Option<UploadedImage>,
	pub image_url: Option<String>,
}

#[test]
fn test_accepted_image_types() {
	assert!(UploadedImage::accepts("image/png"));
	assert!(UploadedImage::accepts("IMAGE/JPEG"));
	assert!(UploadedImage::accepts("image/jpg"));
	assert!(!UploadedImage::accepts("image/gif"));
	assert!(!UploadedImage::accepts("application/pdf"));
	assert!(!UploadedImage::accepts(""));
}
