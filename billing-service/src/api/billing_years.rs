use axum::extract::{Path, State};
use axum::Json;
use billing_client::codec::BillingYearView;
use billing_client::db::StoredBillingYear;
use serde::Serialize;

use super::{ApiError, AppState};
use crate::metrics_server::API_REQUESTS_TOTAL;

/// A stored billing year as returned to clients: the surrogate id next to
/// the view fields.
#[derive(Debug, Serialize)]
pub struct BillingYearResponse {
    pub id: i64,
    #[serde(flatten)]
    pub view: BillingYearView,
}

impl TryFrom<&StoredBillingYear> for BillingYearResponse {
    type Error = ApiError;

    fn try_from(row: &StoredBillingYear) -> Result<Self, Self::Error> {
        let view = row.view().map_err(|e| {
            tracing::error!(id = row.id, error = %e, "stored billing year is unreadable");
            e
        })?;
        Ok(Self { id: row.id, view })
    }
}

#[derive(Debug, Serialize)]
pub struct BillingYearList {
    pub billing_years: Vec<BillingYearResponse>,
    pub count: usize,
}

pub async fn list_billing_years(
    State(state): State<AppState>,
) -> Result<Json<BillingYearList>, ApiError> {
    metrics::counter!(API_REQUESTS_TOTAL, "route" => "list_billing_years").increment(1);

    let rows = state.store.list_all().await?;
    let billing_years = rows
        .iter()
        .map(BillingYearResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(BillingYearList {
        count: billing_years.len(),
        billing_years,
    }))
}

pub async fn get_billing_year(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<BillingYearResponse>, ApiError> {
    metrics::counter!(API_REQUESTS_TOTAL, "route" => "get_billing_year").increment(1);

    let id: i64 = raw_id.parse().map_err(|_| ApiError::InvalidId(raw_id.clone()))?;
    let row = state.store.get(id).await?;
    Ok(Json(BillingYearResponse::try_from(&row)?))
}
