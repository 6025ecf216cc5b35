use axum::{
    routing::{get, post},
    Router,
};

pub mod accounts;
pub mod system;
pub mod transactions;

/// Router for all authenticated, rate-limited endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/account", post(accounts::create_account))
        .route("/account/:id", get(accounts::get_account))
        .route("/accounts", get(accounts::list_accounts))
        .route("/transaction", post(transactions::submit_transaction))
        .route("/transactions", get(transactions::list_transactions))
}
