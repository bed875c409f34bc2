use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::models::{AppState, NewTxRequest, NewTxResponse, PendingResponse};
use crate::error::LedgerError;

/// Queue a transaction for the next block. Values are not validated beyond
/// being present.
#[post("/transactions/new")]
pub async fn new_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> Result<HttpResponse, LedgerError> {
    let NewTxRequest {
        sender,
        recipient,
        amount,
    } = body.into_inner();

    let (Some(sender), Some(recipient), Some(amount)) = (sender, recipient, amount) else {
        warn!("POST /transactions/new - rejected: missing values");
        return Err(LedgerError::MissingValues);
    };

    debug!("POST /transactions/new - {sender} -> {recipient} ({amount})");
    let index = {
        let mut ledger = state.ledger.lock().expect("mutex poisoned");
        ledger.new_transaction(sender, recipient, amount)
    };

    Ok(HttpResponse::Created().json(NewTxResponse {
        message: format!("Transaction will be added to block {index}"),
    }))
}

/// Transactions waiting for the next block, in submission order.
#[get("/transactions/pending")]
pub async fn pending_transactions(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(PendingResponse {
        transactions: ledger.pending(),
        length: ledger.pending().len(),
    })
}
