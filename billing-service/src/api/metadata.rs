use axum::extract::{Query, State};
use axum::Json;
use billing_client::metadata::CatalogView;
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::metrics_server::API_REQUESTS_TOTAL;

#[derive(Debug, Default, Deserialize)]
pub struct MetadataQuery {
    pub meter_type: Option<String>,
    pub field: Option<String>,
}

pub async fn get_billing_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<CatalogView>, ApiError> {
    metrics::counter!(API_REQUESTS_TOTAL, "route" => "get_billing_metadata").increment(1);

    // `?meter_type=` is the same as leaving the filter out.
    let meter_type = query.meter_type.as_deref().filter(|s| !s.is_empty());
    let field = query.field.as_deref().filter(|s| !s.is_empty());

    let view = state.catalog.lookup(meter_type, field)?;
    Ok(Json(view))
}
