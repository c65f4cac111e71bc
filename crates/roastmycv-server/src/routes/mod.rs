pub mod health;
pub mod review;
pub mod reviews;

use actix_web::web;

/// Mount every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    health::configure(cfg);
    review::configure(cfg);
    reviews::configure(cfg);
}
