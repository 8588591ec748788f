use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tool_worker::{app, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("tool_worker=info".parse()?)
                .add_directive("tool_core=info".parse()?)
                .add_directive("toolkits=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;

    info!(
        addr = %config.addr,
        auth = config.secret.is_some(),
        "Starting tool worker"
    );

    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
