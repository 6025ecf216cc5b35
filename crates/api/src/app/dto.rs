use serde::Deserialize;

use tally_core::{AccountId, TransactionKind, TransferRequest};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Generated when absent.
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub balance: f64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitTransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub from_id: Option<String>,
    pub to_id: Option<String>,
}

impl CreateAccountRequest {
    /// An empty id counts as absent; any other id is kept as sent.
    pub fn account_id(&self) -> Option<AccountId> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(AccountId::from)
    }
}

impl From<SubmitTransactionRequest> for TransferRequest {
    fn from(body: SubmitTransactionRequest) -> Self {
        TransferRequest {
            kind: body.kind,
            amount: body.amount,
            from_id: body.from_id.map(AccountId::from),
            to_id: body.to_id.map(AccountId::from),
        }
    }
}
