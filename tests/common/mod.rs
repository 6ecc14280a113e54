//! In-process stand-in for the ingestion/validation/translation backend.

#![allow(dead_code)]

use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

use feature_selector::core::{TranslateRequest, ValidationRequest};

/// root(mandatory) → A(mandatory), B(xor) → B1, B2, C(or) → C1, C2
pub fn shop_tree() -> Value {
    json!({
        "label": "Application",
        "value": "root",
        "mandatory": true,
        "children": [
            { "label": "Catalog", "value": "A", "mandatory": true, "children": [] },
            {
                "label": "Payment-xor",
                "value": "B",
                "mandatory": false,
                "children": [
                    { "label": "Card", "value": "B1", "mandatory": false, "children": [] },
                    { "label": "Cash", "value": "B2", "mandatory": false, "children": [] }
                ]
            },
            {
                "label": "Filters-or",
                "value": "C",
                "mandatory": false,
                "children": [
                    { "label": "ByDiscount", "value": "C1", "mandatory": false, "children": [] },
                    { "label": "ByWeather", "value": "C2", "mandatory": false, "children": [] }
                ]
            }
        ]
    })
}

pub fn shop_response() -> Value {
    json!({ "treeData": shop_tree(), "constraints": ["B1 requires A"] })
}

async fn parse_xml(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let xml = body["xml"].as_str().unwrap_or_default();
    if xml.contains("<broken") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid XML file", "details": "mismatched tag" })),
        );
    }
    if xml.contains("<empty") {
        return (StatusCode::OK, Json(json!({ "constraints": [] })));
    }
    if xml.contains("<slow") {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    (StatusCode::OK, Json(shop_response()))
}

/// Rejects any XOR group with more than one selected child.
async fn validate(Json(request): Json<ValidationRequest>) -> Json<Value> {
    match request.selected.xor.iter().find(|(_, ids)| ids.len() > 1) {
        Some((owner, ids)) => Json(json!({
            "isValid": false,
            "error": format!("XOR group {} has {} selected features", owner, ids.len())
        })),
        None => Json(json!({ "isValid": true })),
    }
}

async fn translate(Json(request): Json<TranslateRequest>) -> Json<Value> {
    match request.prompt.as_str() {
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!("slow"))
        }
        "structured" => Json(json!({ "logic": "Card ∨ Cash" })),
        _ => Json(json!("B1 → A")),
    }
}

/// Start the fake backend on an ephemeral port and return its base URL.
pub async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/parse-xml", post(parse_xml))
        .route("/validate-configuration", post(validate))
        .route("/translate", post(translate));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake backend");
    let addr = listener.local_addr().expect("Fake backend has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake backend failed");
    });
    format!("http://{}", addr)
}
