use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use tally_core::TransferRequest;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub async fn submit_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SubmitTransactionRequest>,
) -> axum::response::Response {
    match services.ledger.submit(TransferRequest::from(body)) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt.transaction)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.history() {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
