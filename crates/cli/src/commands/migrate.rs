use tracing::info;

use crate::config::StoreConfig;

/// Create the store's tables, then exit.
pub async fn run(config: &StoreConfig) -> anyhow::Result<()> {
    match config.backend.as_str() {
        "file" => {
            info!(path = %config.path.display(), "file backend has no schema, nothing to migrate");
            Ok(())
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            info!("running certificate store migrations...");
            crate::factory::create_postgres_store(config).await?;
            info!("certificate store migrations complete");
            Ok(())
        }
        other => anyhow::bail!("unsupported store backend: {other}"),
    }
}
