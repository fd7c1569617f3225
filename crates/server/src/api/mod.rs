pub mod handlers;
pub mod history;
pub mod middleware;
pub mod routes;
pub mod sync;
pub mod titles;

pub use routes::create_router;
