//! Pay-per-review CV critique service.
//!
//! `POST /api/review-cv` answers unpaid uploads with HTTP 402 and an STX
//! payment requirement; once a payment proof is accepted the CV is reviewed
//! by a language model and the result stored under a review id.

pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod review;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use db::{ReviewRecord, ReviewStore};
pub use error::ApiError;
pub use state::AppState;
