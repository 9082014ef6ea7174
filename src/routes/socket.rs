use axum::{
	extract::{State, WebSocketUpgrade},
	response::IntoResponse,
};

use crate::{dependencies::AppState, services::handlers::SocketHandler};

pub async fn socket_route(
	ws: WebSocketUpgrade,
	State(state): State<AppState>,
) -> impl IntoResponse {
	tracing::info!(listeners = state.hub.listeners(), "feed listener connecting");

	ws.on_upgrade(move |socket| SocketHandler::run_socket_broker(socket, state.hub))
}
