use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use billing_client::codec::CodecError;
use billing_client::db::StoreError;
use billing_client::metadata::CatalogError;
use billing_client::{Error, ErrorKind};
use serde_json::json;

use crate::metrics_server::API_ERRORS_TOTAL;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Client(#[from] Error),
    #[error("invalid billing year id: {0:?}")]
    InvalidId(String),
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        Self::Client(e.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Client(e.into())
    }
}

impl From<CodecError> for ApiError {
    fn from(e: CodecError) -> Self {
        Self::Client(e.into())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            // An unknown meter_type is a bad filter, not a missing resource.
            Self::Client(Error::Catalog(CatalogError::MeterTypeNotFound { .. })) => {
                StatusCode::BAD_REQUEST
            }
            Self::Client(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation | ErrorKind::InvalidEnumValue => StatusCode::BAD_REQUEST,
                ErrorKind::SchemaMismatch | ErrorKind::Storage => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::Client(Error::Catalog(CatalogError::MeterTypeNotFound { given, valid_values })) => {
                json!({
                    "error": format!("Invalid meter_type: {given}"),
                    "valid_values": valid_values,
                })
            }
            Self::Client(Error::Catalog(CatalogError::FieldNotFound {
                meter_type,
                given,
                available_fields,
            })) => json!({
                "error": format!("Field '{given}' not found in {meter_type}"),
                "available_fields": available_fields,
            }),
            Self::Client(e) if e.kind() == ErrorKind::Storage => {
                json!({ "error": "storage error" })
            }
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        metrics::counter!(API_ERRORS_TOTAL, "status" => status.as_u16().to_string()).increment(1);

        (status, Json(self.body())).into_response()
    }
}
