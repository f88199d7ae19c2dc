pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod state;

pub use app::build_app;
pub use error::AppError;
pub use state::AppState;
