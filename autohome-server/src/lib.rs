use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use autohome_core::AutoHome;
use autohome_core::configs::Settings;
use tokio::net::TcpListener;

use crate::app::create_app;

pub mod app;
pub mod errors;
pub mod handles;

pub async fn run(settings: &Settings, home: Arc<AutoHome>) -> anyhow::Result<()> {
    let app = create_app(home, &settings.server.prefix);

    let ip_addr = settings
        .server
        .host
        .parse::<IpAddr>()
        .with_context(|| format!("invalid server host '{}'", settings.server.host))?;

    let address = SocketAddr::from((ip_addr, settings.server.port));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("cannot bind {address}"))?;

    tracing::info!("listening on {:?}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
