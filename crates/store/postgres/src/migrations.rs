use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating required tables if they do not exist.
///
/// Creates the sessions, attendees, and certificates tables in the
/// configured schema with the configured table prefix. The certificates
/// table carries the `UNIQUE (session_id, attendee_id)` constraint that
/// makes allocation idempotent under concurrent requests.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let sessions_table = config.sessions_table();
    let attendees_table = config.attendees_table();
    let certificates_table = config.certificates_table();
    let prefix = &config.table_prefix;

    let create_sessions = format!(
        "CREATE TABLE IF NOT EXISTS {sessions_table} (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL,
            presenter_name TEXT NOT NULL,
            date DATE NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            description TEXT,
            template TEXT
        )"
    );

    let create_attendees = format!(
        "CREATE TABLE IF NOT EXISTS {attendees_table} (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES {sessions_table} (id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            email TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT {prefix}attendees_session_key UNIQUE (id, session_id)
        )"
    );

    let create_attendees_idx = format!(
        "CREATE INDEX IF NOT EXISTS {prefix}attendees_session_idx ON {attendees_table} (session_id)"
    );

    // The composite key ties the attendee to the certificate's session.
    // Certificates cascade away with their session or attendee; nothing in
    // this crate deletes them directly.
    let create_certificates = format!(
        "CREATE TABLE IF NOT EXISTS {certificates_table} (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES {sessions_table} (id) ON DELETE CASCADE,
            attendee_id TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            format TEXT NOT NULL,
            artifact TEXT NOT NULL,
            CONSTRAINT {prefix}certificates_pair_key UNIQUE (session_id, attendee_id),
            CONSTRAINT {prefix}certificates_attendee_fkey FOREIGN KEY (attendee_id, session_id)
                REFERENCES {attendees_table} (id, session_id) ON DELETE CASCADE
        )"
    );

    sqlx::query(&create_sessions).execute(pool).await?;
    sqlx::query(&create_attendees).execute(pool).await?;
    sqlx::query(&create_attendees_idx).execute(pool).await?;
    sqlx::query(&create_certificates).execute(pool).await?;

    Ok(())
}
