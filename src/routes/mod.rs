mod feed;
mod socket;

use axum::{
	middleware,
	routing::{get, post},
	Router,
};
use tower_http::services::ServeDir;

use crate::{common::middleware_auth::require_auth, dependencies::AppState};

pub fn create_routes(state: AppState) -> Router {
	let feed = Router::new()
		.route("/posts", get(feed::get_posts))
		.route("/post", post(feed::create_post))
		.route("/post/:post_id", get(feed::get_post).put(feed::update_post).delete(feed::delete_post))
		.route_layer(middleware::from_fn_with_state(state.auth.clone(), require_auth));

	let images = format!("/{}", state.images.upload_dir());
	let image_files = ServeDir::new(state.images.upload_path());

	Router::new()
		.nest("/feed", feed)
		.route("/socket", get(socket::socket_route))
		.nest_service(&images, image_files)
		.with_state(state)
}
