use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tally_core::LedgerError;

pub fn ledger_error_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::AlreadyExists(_) => StatusCode::CONFLICT,
        LedgerError::NotFound(_)
        | LedgerError::SenderNotFound
        | LedgerError::RecipientNotFound => StatusCode::NOT_FOUND,
        LedgerError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::InvalidAmount(_) | LedgerError::SelfTransfer => StatusCode::BAD_REQUEST,
        LedgerError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    json_error(ledger_error_status(&err), err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
