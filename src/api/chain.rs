use actix_web::{HttpResponse, Responder, get, web};
use log::info;

use super::models::{AppState, ChainResponse, MineResponse};
use crate::error::MiningError;

/// Get the full chain.
#[get("/chain")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        chain: ledger.chain(),
        length: ledger.len(),
    })
}

/// Run the proof search for the next block, pay this node the reward and
/// forge the block from every pending transaction.
#[get("/mine")]
pub async fn mine(state: web::Data<AppState>) -> Result<HttpResponse, MiningError> {
    let block = state.miner.mine(&state.ledger).await?;
    info!(
        "GET /mine - forged block #{} for node {}",
        block.index,
        state.miner.node_id()
    );

    Ok(HttpResponse::Ok().json(MineResponse {
        message: "New block forged",
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}
