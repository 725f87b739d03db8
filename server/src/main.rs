use forkhook::prelude::*;
use forkhook_game::{ForkGame, GameConfig};

#[tokio::main]
async fn main() -> Result<(), ForkhookError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::var("FORKHOOK_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = ServerBuilder::new()
        .bind(&addr)
        .build::<ForkGame>(|deck_count| GameConfig {
            deck_count,
            seed: None,
        })
        .await?;

    tracing::info!(%addr, "forkhook server listening");
    server.run().await
}
