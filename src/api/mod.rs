mod chain;
mod health;
pub mod models;
mod nodes;
mod tx;

use actix_web::web::ServiceConfig;

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(health::health_check)
        .service(chain::get_chain)
        .service(chain::mine)
        .service(tx::new_transaction)
        .service(tx::pending_transactions)
        .service(nodes::register_nodes)
        .service(nodes::resolve);
}
