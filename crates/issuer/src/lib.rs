//! Certificate issuance for Majalis sessions.
//!
//! [`Allocator`] hands out one stable [`CertificateId`](majalis_core::CertificateId)
//! per (session, attendee) pair, [`Issuer`] runs a whole session roster
//! through allocate, render and notify, and [`Verifier`] answers public
//! lookups by certificate id.

pub mod allocator;
pub mod builder;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod verification;

pub use allocator::{Allocation, Allocator};
pub use builder::IssuerBuilder;
pub use config::IssuerConfig;
pub use error::IssueError;
pub use orchestrator::{Authorization, Issuer};
pub use verification::Verifier;
