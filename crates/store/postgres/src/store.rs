use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use majalis_core::{
    ArtifactFormat, Attendee, AttendeeId, Certificate, CertificateId, SESSION_DATE_FORMAT,
    Session, SessionId, SessionRoster, UserId, VerificationRecord,
};
use majalis_store::error::StoreError;
use majalis_store::store::CertificateStore;

use crate::config::PostgresConfig;
use crate::migrations;

type SessionRow = (
    String,
    String,
    String,
    String,
    NaiveDate,
    NaiveTime,
    NaiveTime,
    Option<String>,
    Option<String>,
);
type AttendeeRow = (String, String, String, Option<String>, DateTime<Utc>);
type CertificateRow = (String, String, String, DateTime<Utc>, String, String);
type VerificationRow = (String, DateTime<Utc>, String, String, NaiveDate, String);

/// Build `PgConnectOptions` from a [`PostgresConfig`], applying SSL settings
/// when configured.
pub(crate) fn build_connect_options(
    config: &PostgresConfig,
) -> Result<sqlx::postgres::PgConnectOptions, StoreError> {
    let mut options: sqlx::postgres::PgConnectOptions = config
        .url
        .parse()
        .map_err(|e: sqlx::Error| StoreError::Connection(e.to_string()))?;

    if let Some(ref mode) = config.ssl_mode {
        let ssl_mode = match mode.as_str() {
            "disable" => sqlx::postgres::PgSslMode::Disable,
            "prefer" => sqlx::postgres::PgSslMode::Prefer,
            "require" => sqlx::postgres::PgSslMode::Require,
            "verify-ca" => sqlx::postgres::PgSslMode::VerifyCa,
            "verify-full" => sqlx::postgres::PgSslMode::VerifyFull,
            other => {
                return Err(StoreError::Connection(format!("unknown ssl_mode: {other}")));
            }
        };
        options = options.ssl_mode(ssl_mode);
    }

    if let Some(ref path) = config.ssl_root_cert {
        options = options.ssl_root_cert(path);
    }

    Ok(options)
}

/// Map a write failure, separating constraint violations from transport
/// and backend errors.
fn map_write_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = error {
        if db.is_unique_violation() || db.is_foreign_key_violation() {
            return StoreError::Constraint(db.message().to_owned());
        }
    }
    StoreError::Backend(error.to_string())
}

fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn certificate_from_row(row: CertificateRow) -> Result<Certificate, StoreError> {
    let (id, session_id, attendee_id, created_at, format, artifact) = row;
    Ok(Certificate {
        id: CertificateId::parse(&id).map_err(|e| StoreError::Serialization(e.to_string()))?,
        session_id: SessionId::new(session_id),
        attendee_id: AttendeeId::new(attendee_id),
        created_at,
        format: format
            .parse::<ArtifactFormat>()
            .map_err(|e| StoreError::Serialization(e.to_string()))?,
        artifact,
    })
}

/// PostgreSQL-backed implementation of [`CertificateStore`].
///
/// Uses `sqlx::PgPool` for connection pooling. Idempotent allocation relies
/// on the `UNIQUE (session_id, attendee_id)` constraint created by
/// [`migrations::run_migrations`]: inserts use `ON CONFLICT DO NOTHING` on
/// that pair, so a losing concurrent writer simply inserts zero rows.
pub struct PostgresCertificateStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresCertificateStore {
    /// Create a new `PostgresCertificateStore` from the provided configuration.
    ///
    /// Connects to `PostgreSQL`, creates the connection pool, and runs
    /// migrations to ensure the required tables exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if pool creation fails, or
    /// [`StoreError::Backend`] if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StoreError> {
        let connect_options = build_connect_options(&config)?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Self::from_pool(pool, config).await
    }

    /// Create a `PostgresCertificateStore` from an existing pool and config.
    ///
    /// Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, StoreError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(backend)?;

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    /// Insert a session and its attendees, for seeding and fixtures.
    ///
    /// Existing rows with the same ids are left as they are.
    pub async fn insert_roster(&self, roster: &SessionRoster) -> Result<(), StoreError> {
        let sessions = self.config.sessions_table();
        let attendees = self.config.attendees_table();
        let session = &roster.session;

        let insert_session = format!(
            "INSERT INTO {sessions} \
             (id, owner_id, title, presenter_name, date, start_time, end_time, description, template) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO NOTHING"
        );
        sqlx::query(&insert_session)
            .bind(session.id.as_str())
            .bind(session.owner_id.as_str())
            .bind(&session.title)
            .bind(&session.presenter_name)
            .bind(session.date)
            .bind(session.start_time)
            .bind(session.end_time)
            .bind(session.description.as_deref())
            .bind(session.template.as_deref())
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        let insert_attendee = format!(
            "INSERT INTO {attendees} (id, session_id, name, email, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO NOTHING"
        );
        for attendee in &roster.attendees {
            sqlx::query(&insert_attendee)
                .bind(attendee.id.as_str())
                .bind(attendee.session_id.as_str())
                .bind(&attendee.name)
                .bind(attendee.email.as_deref())
                .bind(attendee.created_at)
                .execute(&self.pool)
                .await
                .map_err(map_write_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl CertificateStore for PostgresCertificateStore {
    async fn find_certificate(
        &self,
        session_id: &SessionId,
        attendee_id: &AttendeeId,
    ) -> Result<Option<Certificate>, StoreError> {
        let table = self.config.certificates_table();
        let query = format!(
            "SELECT id, session_id, attendee_id, created_at, format, artifact \
             FROM {table} WHERE session_id = $1 AND attendee_id = $2"
        );

        let row: Option<CertificateRow> = sqlx::query_as(&query)
            .bind(session_id.as_str())
            .bind(attendee_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(certificate_from_row).transpose()
    }

    async fn insert_certificate_if_absent(
        &self,
        certificate: &Certificate,
    ) -> Result<bool, StoreError> {
        let table = self.config.certificates_table();

        // Conflicts on the pair are the expected race and insert nothing.
        // Any other violation (unknown attendee, attendee of another session,
        // duplicate id) is an error.
        let query = format!(
            "INSERT INTO {table} (id, session_id, attendee_id, created_at, format, artifact) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (session_id, attendee_id) DO NOTHING"
        );

        let result = sqlx::query(&query)
            .bind(certificate.id.as_str())
            .bind(certificate.session_id.as_str())
            .bind(certificate.attendee_id.as_str())
            .bind(certificate.created_at)
            .bind(certificate.format.as_str())
            .bind(&certificate.artifact)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        let inserted = result.rows_affected() > 0;
        debug!(
            certificate_id = %certificate.id,
            session_id = %certificate.session_id,
            attendee_id = %certificate.attendee_id,
            inserted,
            "insert certificate if absent"
        );
        Ok(inserted)
    }

    async fn find_session_with_attendees(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionRoster>, StoreError> {
        let sessions = self.config.sessions_table();
        let attendees = self.config.attendees_table();

        let session_query = format!(
            "SELECT id, owner_id, title, presenter_name, date, start_time, end_time, \
             description, template FROM {sessions} WHERE id = $1"
        );
        let row: Option<SessionRow> = sqlx::query_as(&session_query)
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        let Some((id, owner_id, title, presenter_name, date, start_time, end_time, description, template)) =
            row
        else {
            return Ok(None);
        };

        let session = Session {
            id: SessionId::new(id),
            owner_id: UserId::new(owner_id),
            title,
            presenter_name,
            date,
            start_time,
            end_time,
            description,
            template,
        };

        let attendee_query = format!(
            "SELECT id, session_id, name, email, created_at FROM {attendees} \
             WHERE session_id = $1 ORDER BY created_at, id"
        );
        let rows: Vec<AttendeeRow> = sqlx::query_as(&attendee_query)
            .bind(session_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        let attendees = rows
            .into_iter()
            .map(|(id, session_id, name, email, created_at)| Attendee {
                id: AttendeeId::new(id),
                session_id: SessionId::new(session_id),
                name,
                email,
                created_at,
            })
            .collect();

        Ok(Some(SessionRoster { session, attendees }))
    }

    async fn find_verification(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let certificates = self.config.certificates_table();
        let sessions = self.config.sessions_table();
        let attendees = self.config.attendees_table();

        let query = format!(
            "SELECT c.id, c.created_at, s.title, s.presenter_name, s.date, a.name \
             FROM {certificates} c \
             JOIN {sessions} s ON c.session_id = s.id \
             JOIN {attendees} a ON c.attendee_id = a.id \
             WHERE c.id = $1"
        );

        let row: Option<VerificationRow> = sqlx::query_as(&query)
            .bind(certificate_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(
            |(id, issued_at, session_title, presenter_name, date, attendee_name)| {
                Ok(VerificationRecord {
                    certificate_id: CertificateId::parse(&id)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?,
                    issued_at,
                    session_title,
                    presenter_name,
                    session_date: date.format(SESSION_DATE_FORMAT).to_string(),
                    attendee_name,
                })
            },
        )
        .transpose()
    }

    async fn list_certificates(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Certificate>, StoreError> {
        let table = self.config.certificates_table();
        let query = format!(
            "SELECT id, session_id, attendee_id, created_at, format, artifact \
             FROM {table} WHERE session_id = $1 ORDER BY created_at, id"
        );

        let rows: Vec<CertificateRow> = sqlx::query_as(&query)
            .bind(session_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter().map(certificate_from_row).collect()
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use majalis_store::testing::{fixture_roster, run_store_conformance_tests};

    use super::*;

    fn test_config() -> PostgresConfig {
        PostgresConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/majalis_test".to_string()),
            table_prefix: format!("test_{}_", uuid::Uuid::new_v4().simple()),
            ..PostgresConfig::default()
        }
    }

    #[tokio::test]
    async fn store_conformance() {
        let store = PostgresCertificateStore::new(test_config())
            .await
            .expect("pool creation should succeed");
        let roster = fixture_roster("postgres");
        let other = fixture_roster("postgres-other");
        for r in [&roster, &other] {
            store.insert_roster(r).await.expect("seeding should succeed");
        }
        run_store_conformance_tests(&store, &roster, &other)
            .await
            .expect("store conformance tests should pass");
    }

    #[tokio::test]
    async fn unknown_attendee_is_a_constraint_error() {
        let store = PostgresCertificateStore::new(test_config())
            .await
            .expect("pool creation should succeed");
        let roster = fixture_roster("postgres-fk");
        store.insert_roster(&roster).await.unwrap();

        let cert = Certificate::mint(
            roster.session.id.clone(),
            AttendeeId::new("ghost"),
            ArtifactFormat::ComposedPdf,
            Utc::now(),
        );
        let err = store.insert_certificate_if_absent(&cert).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }
}
