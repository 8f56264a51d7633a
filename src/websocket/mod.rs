// WebSocket module - organized into focused submodules
//
// - handler: WebSocket upgrade handler (entry point)
// - connection: Main WebSocket connection handling logic
// - routes: HTTP route setup (health, metrics, etc.)

mod connection;
mod handler;
mod routes;

pub use handler::websocket_handler;
pub use routes::create_router;
