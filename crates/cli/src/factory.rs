use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;

use majalis_artifact::{FsArtifactStore, FsTemplateSource};
use majalis_core::SessionRoster;
use majalis_email::{EmailConfig, EmailNotifier};
use majalis_issuer::Issuer;
use majalis_notifier::{LogNotifier, Notifier};
use majalis_render::{CertificateLabels, ComposedRenderer, FontSource};
use majalis_store::CertificateStore;
use majalis_store_memory::FileCertificateStore;
#[cfg(feature = "postgres")]
use majalis_store_postgres::{PostgresCertificateStore, PostgresConfig};

use crate::config::{MajalisConfig, StorageConfig, StoreConfig};

/// Create the certificate store named by `[store] backend`, seeded from
/// `[store] seed` when set.
pub async fn create_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn CertificateStore>> {
    let rosters = match config.seed {
        Some(ref path) => load_rosters(path)?,
        None => Vec::new(),
    };
    let seeded = rosters.len();

    let store: Arc<dyn CertificateStore> = match config.backend.as_str() {
        "file" => {
            let store = FileCertificateStore::open(&config.path).await?;
            for roster in rosters {
                store.insert_roster(roster).await?;
            }
            Arc::new(store)
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            let store = create_postgres_store(config).await?;
            for roster in &rosters {
                store.insert_roster(roster).await?;
            }
            Arc::new(store)
        }
        other => bail!("unsupported store backend: {other}"),
    };

    if seeded > 0 {
        info!(backend = %config.backend, sessions = seeded, "store seeded");
    }
    Ok(store)
}

/// Connect to Postgres and run migrations.
#[cfg(feature = "postgres")]
pub async fn create_postgres_store(
    config: &StoreConfig,
) -> anyhow::Result<PostgresCertificateStore> {
    let url = config
        .url
        .as_deref()
        .context("postgres backend requires [store] url")?;

    let defaults = PostgresConfig::default();
    let pg_config = PostgresConfig {
        url: url.to_owned(),
        pool_size: config.pool_size.unwrap_or(defaults.pool_size),
        schema: config.schema.clone().unwrap_or(defaults.schema),
        table_prefix: config.prefix.clone().unwrap_or(defaults.table_prefix),
        ssl_mode: config.ssl_mode.clone(),
        ssl_root_cert: config.ssl_root_cert.clone(),
    };

    PostgresCertificateStore::new(pg_config)
        .await
        .context("connecting to postgres")
}

fn load_rosters(path: &Path) -> anyhow::Result<Vec<SessionRoster>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing seed file {}", path.display()))
}

/// Email when `[email] enabled`, otherwise log-only delivery.
pub fn create_notifier(config: &EmailConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    if !config.enabled {
        info!("email delivery disabled, notifications will only be logged");
        return Ok(Arc::new(LogNotifier));
    }
    let notifier = EmailNotifier::new(config).context("configuring SMTP")?;
    info!(host = %config.smtp_host, port = config.smtp_port, "email delivery enabled");
    Ok(Arc::new(notifier))
}

pub fn create_renderer(
    storage: &StorageConfig,
    labels: &CertificateLabels,
) -> anyhow::Result<ComposedRenderer> {
    let font = match storage.font {
        Some(ref path) => FontSource::load(path)?,
        None => FontSource::Builtin,
    };
    Ok(ComposedRenderer::new(labels.clone(), font))
}

/// Wire an [`Issuer`] from the whole configuration.
pub async fn create_issuer(config: &MajalisConfig) -> anyhow::Result<Issuer> {
    let store = create_store(&config.store).await?;
    let renderer = create_renderer(&config.storage, &config.labels)?;
    let notifier = create_notifier(&config.email)?;

    let issuer = Issuer::builder()
        .store(store)
        .artifacts(Arc::new(FsArtifactStore::new(
            &config.storage.certificates_dir,
        )))
        .templates(Arc::new(FsTemplateSource::new(&config.storage.uploads_dir)))
        .composed_renderer(Arc::new(renderer))
        .notifier(notifier)
        .config(config.issuer.to_issuer_config())
        .build()?;
    Ok(issuer)
}
