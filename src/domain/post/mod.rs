pub mod commands;
pub mod entity;
pub mod events;

use validator::Validate;

pub use self::entity::{Creator, NewPost, Post};
use crate::services::response::ServiceError;

/// Fixed page size of the feed listing.
pub const POSTS_PER_PAGE: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct PostFields {
	#[validate(length(min = 1, message = "Title must not be empty."))]
	pub title: String,
	#[validate(length(min = 1, message = "Content must not be empty."))]
	pub content: String,
}

impl PostFields {
	pub fn new(
		title: &str,
		content: &str,
	) -> Self {
		Self {
			title: title.trim().to_string(),
			content: content.trim().to_string(),
		}
	}

	pub fn validated(self) -> Result<Self, ServiceError> {
		self.validate()?;
		Ok(self)
	}
}

/// Rows to skip for a raw `page` query value. Absent or unparsable pages read as page 1,
/// and pages below 1 never produce a negative offset.
pub fn page_offset(page: Option<&str>) -> i64 {
	let page = page.and_then(|raw| raw.trim().parse::<i64>().ok()).unwrap_or(1);
	page.saturating_sub(1).saturating_mul(POSTS_PER_PAGE).max(0)
}

pub fn normalize_image_path(raw: &str) -> String {
	raw.replace('\\', "/")
}

/// Accepts a client-supplied image path only when it points inside `upload_dir`.
pub fn check_image_path(
	raw: &str,
	upload_dir: &str,
) -> Result<String, ServiceError> {
	let normalized = normalize_image_path(raw.trim());
	let prefix = format!("{}/", normalize_image_path(upload_dir).trim_end_matches('/'));

	let inside = normalized.starts_with(&prefix) && normalized.len() > prefix.len();
	let escapes = normalized.split('/').any(|segment| segment == "..");
	if !inside || escapes {
		return Err(ServiceError::InvalidImagePath);
	}
	Ok(normalized)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_page_offset() {
		assert_eq!(page_offset(None), 0);
		assert_eq!(page_offset(Some("1")), 0);
		assert_eq!(page_offset(Some("2")), 2);
		assert_eq!(page_offset(Some(" 3 ")), 4);
		assert_eq!(page_offset(Some("0")), 0);
		assert_eq!(page_offset(Some("-4")), 0);
		assert_eq!(page_offset(Some("abc")), 0);
		assert_eq!(page_offset(Some(&i64::MAX.to_string())), i64::MAX);
	}

	#[test]
	fn test_fields_are_trimmed_before_validation() {
		let fields = PostFields::new("  A  ", "\tB\n").validated().unwrap();
		assert_eq!(fields.title, "A");
		assert_eq!(fields.content, "B");

		match PostFields::new("   ", "content").validated() {
			Err(ServiceError::ValidationFailed(errors)) => {
				assert!(errors.field_errors().contains_key("title"));
				assert!(!errors.field_errors().contains_key("content"));
			}
			other => panic!("expected validation failure, got {:?}", other),
		}
	}

	#[test]
	fn test_image_path_rules() {
		assert_eq!(normalize_image_path("images\\2024\\a.png"), "images/2024/a.png");
		assert_eq!(check_image_path("images\\a.png", "images").unwrap(), "images/a.png");
		assert_eq!(check_image_path("images/a.png", "images/").unwrap(), "images/a.png");

		for rejected in ["images/", "/etc/passwd", "images/../secret.txt", "other/a.png", "imagesa.png", ""] {
			assert!(
				matches!(check_image_path(rejected, "images"), Err(ServiceError::InvalidImagePath)),
				"{rejected} should be rejected"
			);
		}
	}
}
