//! Banker Server
//!
//! Serves one allocator over HTTP. The initial state is loaded from the
//! descriptor named by `BANKER_STATE`; the port comes from `PORT`.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use banker::{descriptor, Banker, BankerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let path = std::env::var("BANKER_STATE").map_err(|_| "BANKER_STATE must name a descriptor file")?;

    let state = descriptor::load(Path::new(&path))?;
    let banker = Arc::new(Banker::with_config(state, BankerConfig::from_env()));
    let app = banker_server::router(banker);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
