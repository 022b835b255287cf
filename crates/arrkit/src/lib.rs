//! # arrkit
//!
//! Blocking clients for the services an *arr stack is made of.
//!
//! This crate provides:
//! - Typed payloads for the Radarr/Sonarr v3 and Prowlarr v1 APIs
//! - [`ArrBackend`] and [`IndexerBackend`] traits with `ureq` implementations
//! - In-memory [`MockArr`] and [`MockIndexer`] for tests
//! - Seedr credential validation
//!
//! ## Example
//!
//! ```no_run
//! use arrkit::{ArrBackend, HttpArr};
//!
//! let sonarr = HttpArr::new("http://localhost:8989", "0123456789abcdef");
//! for folder in sonarr.root_folders().unwrap() {
//!     println!("{}", folder.path);
//! }
//! ```
//!
//! ## Timeouts
//!
//! Service calls use [`DEFAULT_TIMEOUT`]; Seedr calls use
//! [`seedr::SEEDR_TIMEOUT`]. Every HTTP client has a `with_timeout`
//! constructor for callers that need something else.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod seedr;
pub mod types;

use std::time::Duration;

pub use backend::arr::HttpArr;
pub use backend::prowlarr::HttpProwlarr;
pub use backend::{ArrBackend, IndexerBackend, MockArr, MockIndexer};
pub use error::{Error, ErrorCategory, Result};
pub use seedr::{CredentialValidator, SeedrAccount, SeedrValidator};
pub use types::{
    Application, Command, CustomFormat, DownloadClient, Field, FormatItem, MediaManagementConfig,
    NamingConfig, QualityDefinition, QualityProfile, RootFolder, ServiceKind, SystemStatus,
};

/// Timeout for Radarr, Sonarr and Prowlarr calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
