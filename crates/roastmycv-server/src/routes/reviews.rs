use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub payer: Option<String>,
    pub limit: Option<u32>,
}

/// GET /api/reviews/{id}
pub async fn get_review(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let record = state
        .store
        .get(&id)?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;
    Ok(HttpResponse::Ok().json(record))
}

/// GET /api/reviews?payer=<address> - a payer's reviews, newest first
pub async fn list_reviews(
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let payer = query
        .payer
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("payer query parameter is required".to_string()))?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let reviews = state.store.list_by_payer(payer, limit)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "reviews": reviews,
        "count": reviews.len(),
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/reviews", web::get().to(list_reviews))
        .route("/api/reviews/{id}", web::get().to(get_review));
}
