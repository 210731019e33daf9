//! JSON service surfaces.
//!
//! Each service gets its own router so it can run as an independent
//! process. Handlers always answer 200 with a structured result; mapping
//! result codes onto HTTP statuses is left to the gateway.

pub mod crawler;
pub mod feed;
pub mod rss;
pub mod search;
pub mod server;

pub use crawler::crawler_router;
pub use feed::feed_router;
pub use rss::rss_router;
pub use search::search_router;
pub use server::{serve, serve_listener, shutdown_signal};
