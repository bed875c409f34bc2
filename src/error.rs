use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Client-side errors on ledger inputs. Never mutate state.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Missing values")]
    MissingValues,
    #[error("Error: Please supply a valid list of nodes")]
    NoPeers,
    #[error("invalid peer address: {0}")]
    InvalidPeerAddress(String),
}

/// Outcomes of a mining job other than a forged block.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("proof search aborted")]
    Aborted,
    #[error("proof search exhausted the nonce space")]
    Exhausted,
    #[error("a mining job is already running")]
    Busy,
    #[error("chain tip kept moving; gave up after {0} attempts")]
    Stale(u32),
    #[error("mining worker failed: {0}")]
    Worker(String),
}

/// Reasons a peer contributed no chain during conflict resolution.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("request to {peer} failed: {reason}")]
    Unreachable { peer: String, reason: String },
    #[error("{peer} answered with status {status}")]
    Status { peer: String, status: u16 },
    #[error("{peer} sent a malformed chain: {reason}")]
    Malformed { peer: String, reason: String },
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

impl ResponseError for MiningError {
    fn status_code(&self) -> StatusCode {
        match self {
            MiningError::Busy | MiningError::Stale(_) => StatusCode::CONFLICT,
            MiningError::Aborted | MiningError::Exhausted => StatusCode::SERVICE_UNAVAILABLE,
            MiningError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
