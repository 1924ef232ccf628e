use std::net::SocketAddr;
use std::sync::Arc;

use log::info;

use super::routes::history_routes;
use crate::storage::RecordStore;

/// HTTP server for the history dashboard.
pub struct WebServer {
    store: Arc<dyn RecordStore>,
}

impl WebServer {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Serves until the process is stopped.
    pub async fn start(&self, addr: SocketAddr) {
        let routes = history_routes(self.store.clone());
        info!("Web interface listening on {}", addr);
        warp::serve(routes).run(addr).await;
    }
}
