mod api;
mod blockchain;
mod config;
mod consensus;
mod error;
mod miner;
mod transaction;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{info, warn};
use uuid::Uuid;

use api::AppState;
use blockchain::CancelToken;
use config::NodeConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    let node_id = Uuid::new_v4().simple().to_string();
    let state = web::Data::new(AppState::new(&config, node_id.clone(), CancelToken::new()));
    {
        let mut ledger = state.ledger.lock().expect("mutex poisoned");
        for peer in &config.peers {
            if let Err(e) = ledger.register_peer(peer) {
                warn!("ignoring start-up peer: {e}");
            }
        }
    }

    println!(
        "⛓️ Starting node {node_id} at http://{}:{} (difficulty {})",
        config.host, config.port, config.difficulty
    );

    let on_signal = state.clone();
    actix_web::rt::spawn(async move {
        if actix_web::rt::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested; cancelling any running proof search");
            on_signal.miner.shutdown();
        }
    });

    let data = state.clone();
    let result = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    state.miner.shutdown();
    result
}
