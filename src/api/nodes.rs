use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::models::{
    AppState, RegisterNodesRequest, RegisterNodesResponse, ResolveResponse, ResolvedChain,
};
use crate::consensus::{HttpChainSource, peer_authority, resolve_conflicts};
use crate::error::LedgerError;

/// Register peer nodes. Either every address is accepted or none is.
#[post("/nodes/register")]
pub async fn register_nodes(
    state: web::Data<AppState>,
    body: web::Json<RegisterNodesRequest>,
) -> Result<HttpResponse, LedgerError> {
    let nodes = body.into_inner().nodes.unwrap_or_default();
    if nodes.is_empty() {
        return Err(LedgerError::NoPeers);
    }
    for node in &nodes {
        peer_authority(node)?;
    }

    let total_nodes = {
        let mut ledger = state.ledger.lock().expect("mutex poisoned");
        for node in &nodes {
            ledger.register_peer(node)?;
        }
        ledger.peers().iter().cloned().collect::<Vec<_>>()
    };
    info!("POST /nodes/register - {} peer(s) known", total_nodes.len());

    Ok(HttpResponse::Created().json(RegisterNodesResponse {
        message: "New nodes have been added",
        total_nodes,
    }))
}

/// Apply the longest-chain rule against every registered peer.
#[get("/nodes/resolve")]
pub async fn resolve(state: web::Data<AppState>) -> impl Responder {
    let source = HttpChainSource::new(state.peer_timeout);
    let replaced = resolve_conflicts(&state.ledger, &source).await;
    if replaced {
        state.miner.chain_moved();
    }

    let chain = state.ledger.lock().expect("mutex poisoned").chain().to_vec();
    let resp = if replaced {
        ResolveResponse {
            message: "Our chain was replaced",
            replaced,
            chain: ResolvedChain::Replaced(chain),
        }
    } else {
        ResolveResponse {
            message: "Our chain is authoritative",
            replaced,
            chain: ResolvedChain::Kept(chain),
        }
    };
    HttpResponse::Ok().json(resp)
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use super::super::{init_routes, testing};

    #[actix_web::test]
    async fn registers_and_deduplicates_peers() {
        let app = test::init_service(
            App::new()
                .app_data(testing::state(2))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/nodes/register")
            .set_json(json!({
                "nodes": ["http://127.0.0.1:5002", "http://127.0.0.1:5001", "127.0.0.1:5002"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total_nodes"], json!(["127.0.0.1:5001", "127.0.0.1:5002"]));
    }

    #[actix_web::test]
    async fn empty_or_bad_registration_is_rejected() {
        let state = testing::state(2);
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(init_routes),
        )
        .await;

        let payloads = [
            json!({}),
            json!({"nodes": []}),
            json!({"nodes": ["http://ok:1", "/nohost"]}),
        ];
        for payload in payloads {
            let req = test::TestRequest::post()
                .uri("/nodes/register")
                .set_json(payload)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 400);
        }
        assert!(state.ledger.lock().unwrap().peers().is_empty());
    }

    #[actix_web::test]
    async fn resolve_without_peers_keeps_our_chain() {
        let app = test::init_service(
            App::new()
                .app_data(testing::state(2))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/nodes/resolve").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Our chain is authoritative");
        assert_eq!(body["replaced"], false);
        assert_eq!(body["chain"].as_array().unwrap().len(), 1);
        assert!(body.get("new_chain").is_none());
    }

    #[actix_web::test]
    async fn unreachable_peer_is_skipped() {
        let state = testing::state(2);
        // nothing listens on port 1
        state.ledger.lock().unwrap().register_peer("127.0.0.1:1").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/nodes/resolve").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["replaced"], false);
    }
}
