use axum::{http::StatusCode, http::Uri, Json};
use serde_json::{json, Value};

/// `GET /` liveness message
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "API is running" }))
}

/// Answer for any path no route matched
pub async fn not_found_handler(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("The requested URL {} was not found on this server.", uri.path()),
            "status": 404,
        })),
    )
}
