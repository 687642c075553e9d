use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use doctor_cell::models::Doctor;
use doctor_cell::router::doctor_routes;
use doctor_cell::services::directory::{DoctorDirectory, MemoryDoctorDirectory};

fn directory() -> Arc<MemoryDoctorDirectory> {
    Arc::new(MemoryDoctorDirectory::new(vec![
        Doctor {
            id: Uuid::from_u128(1),
            name: "Dr. Sarah Smith".to_string(),
            specialization: "Cardiologist".to_string(),
            consultation_fee_cents: 15000,
            availability_text: Some("Mon-Fri 9am-4pm".to_string()),
            department_id: None,
        },
        Doctor {
            id: Uuid::from_u128(2),
            name: "Dr. John Doe".to_string(),
            specialization: "General Physician".to_string(),
            consultation_fee_cents: 8000,
            availability_text: None,
            department_id: None,
        },
    ]))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn listing_returns_catalogue_entries_with_fees() {
    let app = doctor_routes(directory() as Arc<dyn DoctorDirectory>);

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["doctors"][0]["entry"], "Dr. Sarah Smith (Cardiologist)");
    assert_eq!(body["doctors"][0]["consultation_fee"], "150.00");
    assert_eq!(body["doctors"][1]["entry"], "Dr. John Doe (General Physician)");
    assert_eq!(body["doctors"][1]["consultation_fee"], "80.00");
}

#[tokio::test]
async fn empty_catalogue_reports_explicit_message() {
    let app = doctor_routes(Arc::new(MemoryDoctorDirectory::empty()) as Arc<dyn DoctorDirectory>);

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["message"], "No doctors found in the directory.");
    assert_eq!(body["doctors"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn get_doctor_returns_record_by_id() {
    let app = doctor_routes(directory() as Arc<dyn DoctorDirectory>);

    let response = app
        .oneshot(
            Request::get(format!("/{}", Uuid::from_u128(1)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["doctor"]["name"], "Dr. Sarah Smith");
}

#[tokio::test]
async fn get_unknown_doctor_is_not_found() {
    let app = doctor_routes(directory() as Arc<dyn DoctorDirectory>);

    let response = app
        .oneshot(
            Request::get(format!("/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
