use axum::response::IntoResponse;

pub async fn metrics_handler() -> impl IntoResponse {
    // Prometheus exposition lives on the dedicated metrics port
    "Metrics are served on the metrics port"
}
