pub mod images;
pub mod publishers;
pub mod repositories;
