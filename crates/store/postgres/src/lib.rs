pub mod config;
pub mod migrations;
mod store;

pub use config::PostgresConfig;
pub use store::PostgresCertificateStore;
