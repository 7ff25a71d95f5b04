use std::sync::Arc;

use gangway::config::Config;
use gangway::proxy::router::RouteTable;
use gangway::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let routes = Arc::new(RouteTable::from_config(&cfg.routes)?);

    let server = Server::bind(&cfg, routes).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    server.stop().await
}
