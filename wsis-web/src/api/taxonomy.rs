//! Taxonomy endpoint
//!
//! Serves the static site list and category tree the form and dashboard
//! render from. Configuration data only; never changes at runtime.

use axum::Json;
use serde::Serialize;
use wsis_common::taxonomy::{Category, CATEGORIES, SITES};

/// Taxonomy response
#[derive(Debug, Serialize)]
pub struct TaxonomyResponse {
    pub sites: &'static [&'static str],
    pub categories: &'static [Category],
}

/// GET /api/taxonomy
pub async fn get_taxonomy() -> Json<TaxonomyResponse> {
    Json(TaxonomyResponse {
        sites: SITES,
        categories: CATEGORIES,
    })
}
