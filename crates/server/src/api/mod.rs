pub mod artworks;
pub mod audit;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod orders;
pub mod routes;

pub use routes::create_router;
