use std::process::ExitCode;

use serde::Serialize;

use majalis_core::CertificateId;
use majalis_email::EmailNotifier;

use crate::OutputFormat;
use crate::config::MajalisConfig;
use crate::factory;

/// Result of one dependency check.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Check {
    Ok,
    Disabled,
    Failed { error: String },
}

impl Check {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Ok,
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }

    fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub store: Check,
    pub email: Check,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        !self.store.is_failed() && !self.email.is_failed()
    }
}

/// Open the store and, when email is enabled, reach the SMTP server.
pub async fn check(config: &MajalisConfig) -> Health {
    let store = Check::from_result(check_store(config).await);
    let email = if config.email.enabled {
        Check::from_result(check_email(config).await)
    } else {
        Check::Disabled
    };
    Health { store, email }
}

async fn check_store(config: &MajalisConfig) -> anyhow::Result<()> {
    let store = factory::create_store(&config.store).await?;
    store.find_verification(&CertificateId::generate()).await?;
    Ok(())
}

async fn check_email(config: &MajalisConfig) -> anyhow::Result<()> {
    EmailNotifier::new(&config.email)?.health_check().await?;
    Ok(())
}

pub async fn run(config: &MajalisConfig, format: &OutputFormat) -> anyhow::Result<ExitCode> {
    let health = check(config).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&health)?),
        OutputFormat::Text => {
            for (name, check) in [("store", &health.store), ("email", &health.email)] {
                match check {
                    Check::Ok => println!("{name}: ok"),
                    Check::Disabled => println!("{name}: disabled"),
                    Check::Failed { error } => eprintln!("{name}: failed: {error}"),
                }
            }
        }
    }

    Ok(if health.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use majalis_email::EmailConfig;

    use crate::config::StoreConfig;

    use super::*;

    #[tokio::test]
    async fn file_store_with_email_disabled_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let config = MajalisConfig {
            store: StoreConfig {
                path: dir.path().join("state.json"),
                ..StoreConfig::default()
            },
            ..MajalisConfig::default()
        };

        let health = check(&config).await;
        assert_eq!(health.store, Check::Ok);
        assert_eq!(health.email, Check::Disabled);
        assert!(health.is_healthy());
    }

    #[tokio::test]
    async fn unreachable_mail_server_fails_the_email_check() {
        let dir = tempfile::tempdir().unwrap();
        let config = MajalisConfig {
            store: StoreConfig {
                path: dir.path().join("state.json"),
                ..StoreConfig::default()
            },
            email: EmailConfig::new("127.0.0.1", "no-reply@majalis.com")
                .with_port(1)
                .with_tls(false),
            ..MajalisConfig::default()
        };

        let health = check(&config).await;
        assert_eq!(health.store, Check::Ok);
        assert!(health.email.is_failed());
        assert!(!health.is_healthy());
    }

    #[tokio::test]
    async fn unreadable_state_file_fails_the_store_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ broken").unwrap();
        let config = MajalisConfig {
            store: StoreConfig {
                path,
                ..StoreConfig::default()
            },
            ..MajalisConfig::default()
        };

        let health = check(&config).await;
        assert!(health.store.is_failed());
        assert!(!health.is_healthy());
    }
}
