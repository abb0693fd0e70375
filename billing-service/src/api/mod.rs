//! Read-only HTTP surface over the store and the metadata catalog.

pub mod billing_years;
pub mod error;
pub mod metadata;

use std::sync::Arc;

use axum::{routing::get, Router};
use billing_client::db::BillingYearStore;
use billing_client::metadata::MetadataCatalog;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BillingYearStore>,
    pub catalog: Arc<MetadataCatalog>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/billing-years", get(billing_years::list_billing_years))
        .route("/api/billing-years/:id", get(billing_years::get_billing_year))
        .route("/api/billing-metadata", get(metadata::get_billing_metadata))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use billing_client::codec::decode_str;
    use billing_client::db::{NewBillingYearRecord, SqliteBillingYearStore};
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    use super::*;

    const SAMPLE_YEAR: &str = include_str!("../../../data/sample_billing_year.json");
    const METADATA_PATH: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/billing_structure_metadata.json"
    );

    async fn app_with_store() -> (Router, Arc<SqliteBillingYearStore>) {
        let store = Arc::new(SqliteBillingYearStore::in_memory().await.unwrap());
        store.init().await.unwrap();
        let state = AppState {
            store: store.clone(),
            catalog: Arc::new(MetadataCatalog::new(METADATA_PATH)),
        };
        (router(state), store)
    }

    async fn seed(store: &SqliteBillingYearStore) -> i64 {
        let by = decode_str(SAMPLE_YEAR).unwrap();
        store
            .put(&NewBillingYearRecord::encode(&by).unwrap())
            .await
            .unwrap()
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let (app, _store) = app_with_store().await;
        let (status, body) = get_json(app, "/api/billing-years").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "billing_years": [], "count": 0 }));
    }

    #[tokio::test]
    async fn lists_stored_years_with_derived_values() {
        let (app, store) = app_with_store().await;
        let id = seed(&store).await;

        let (status, body) = get_json(app, "/api/billing-years").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], json!(1));

        let year = &body["billing_years"][0];
        assert_eq!(year["id"], json!(id));
        assert_eq!(year["start_month"], json!(5));
        assert_eq!(year["start_year"], json!(2024));
        assert_eq!(year["num_months"], json!(2));
        assert_eq!(
            year["months"],
            json!([
                { "month_name": "May", "year": 2024 },
                { "month_name": "June", "year": 2024 },
            ])
        );

        let may = &year["billing_months"][0];
        assert_eq!(may["main"]["nem2a_meter_type"], json!("GENERATION_METER"));
        assert_eq!(may["adu"]["nem2a_meter_type"], json!("BENEFIT_METER"));
        let export = &may["main"]["energy_export_meter_channel_2"];
        assert_eq!(export["peak"]["subcomponent_values"], json!([-113.825]));
        assert_eq!(export["peak"]["value"], json!(-113.825));
        assert_eq!(may["main"]["pge_nem_billing"]["value"], json!(9.25));
        assert_eq!(may["main"]["pce_nem_credit"]["value"], Value::Null);
        assert_eq!(may["main"]["billing_date"], json!({ "value": "2024-05-14" }));

        let june_adu = &year["billing_months"][1]["adu"];
        assert_eq!(june_adu["billing_date"], json!({ "value": null }));
    }

    #[tokio::test]
    async fn get_single_year() {
        let (app, store) = app_with_store().await;
        let id = seed(&store).await;

        let (status, body) = get_json(app.clone(), &format!("/api/billing-years/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], json!(id));
        assert_eq!(
            body["billing_months"][1]["main"]["total_bill_in_mail"]["value"],
            json!(55.25)
        );

        let (status, body) = get_json(app.clone(), "/api/billing-years/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("999"));

        let (status, body) = get_json(app, "/api/billing-years/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn full_metadata_catalog() {
        let (app, _store) = app_with_store().await;
        let (status, body) = get_json(app, "/api/billing-metadata").await;
        assert_eq!(status, StatusCode::OK);

        let meters = body.as_object().unwrap();
        assert_eq!(meters.len(), 2);
        for key in ["generation_meter", "benefit_meter"] {
            assert_eq!(body[key]["fields"].as_object().unwrap().len(), 22);
        }
        let tou = &body["generation_meter"]["fields"]["energy_export_meter_channel_2"]["metadata"]
            ["tou_field"];
        assert_eq!(tou["peak"]["unit"], json!("KILOWATT_HOURS"));
    }

    #[tokio::test]
    async fn metadata_filters() {
        let (app, _store) = app_with_store().await;

        let (status, body) =
            get_json(app.clone(), "/api/billing-metadata?meter_type=benefit_meter").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_object().unwrap().len(), 1);
        assert_eq!(body["benefit_meter"]["fields"].as_object().unwrap().len(), 22);

        let (status, body) = get_json(
            app.clone(),
            "/api/billing-metadata?meter_type=generation_meter&field=total_bill_in_mail",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let fields = body["generation_meter"]["fields"].as_object().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields["total_bill_in_mail"]["metadata"]["simple_field"]["unit"],
            json!("DOLLARS")
        );

        // field without meter_type is ignored
        let (_, filtered) = get_json(app.clone(), "/api/billing-metadata?field=pce_nem_credit").await;
        let (_, full) = get_json(app.clone(), "/api/billing-metadata").await;
        assert_eq!(filtered, full);

        let (_, empty) = get_json(app, "/api/billing-metadata?meter_type=&field=").await;
        assert_eq!(empty, full);
    }

    #[tokio::test]
    async fn metadata_filter_errors() {
        let (app, _store) = app_with_store().await;

        let (status, body) = get_json(
            app.clone(),
            "/api/billing-metadata?meter_type=INVALID_METER&field=pce_energy_cost",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(
            body["valid_values"],
            json!(["generation_meter", "benefit_meter"])
        );

        let (status, body) = get_json(
            app,
            "/api/billing-metadata?meter_type=generation_meter&field=nonexistent_field",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nonexistent_field"));
        assert_eq!(body["available_fields"].as_array().unwrap().len(), 22);
    }

    #[tokio::test]
    async fn missing_metadata_source_is_not_found() {
        let store = Arc::new(SqliteBillingYearStore::in_memory().await.unwrap());
        let state = AppState {
            store,
            catalog: Arc::new(MetadataCatalog::new("/nonexistent/metadata.json")),
        };
        let (status, body) = get_json(router(state), "/api/billing-metadata").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }
}
