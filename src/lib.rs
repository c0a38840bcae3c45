//! Docmint
//!
//! Multi-tenant document generation with plan-based usage metering.
//!
//! Clients submit structured data; the service renders it into a PDF via one
//! of several templates and meters the page count against the account's
//! subscription plan. Previews are free up to a small monthly allowance;
//! past that they are billed like downloads.
//!
//! ## Standalone
//!
//! Run the binary:
//! ```bash
//! docmint-server
//! ```
//!
//! ## Embedded (Axum)
//!
//! When the `server` feature is enabled, this crate can be embedded into a larger Axum app:
//! ```rust,ignore
//! use axum::Router;
//! use docmint::infrastructure::AppConfig;
//! use docmint::server::{build_state_with_pool, router};
//! use sqlx::PgPool;
//!
//! let cfg = AppConfig::from_env()?;
//! let pool = PgPool::connect(&cfg.database_url).await?;
//! let state = build_state_with_pool(cfg, pool, true).await?;
//! let app = Router::new().nest("/pdf", router(state));
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod templates;

// Standalone + embedded HTTP server support (Axum).
// Enabled behind the `server` feature so the core library can be used without Axum.
#[cfg(feature = "server")]
pub mod server;

pub use application::*;
pub use domain::*;
pub use infrastructure::*;

#[cfg(feature = "server")]
pub use server::*;
