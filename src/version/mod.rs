//! Release auditing layer
//!
//! This module assembles the releases of a repository, classifies a version
//! against an expiry policy and produces the result consumed by the reports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│  Analyzer   │◀────│    Cache    │
//! │  (fetch)    │     │  (dataset)  │     │ (snapshots) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │   Sources   │     │   Policy    │
//! │  (GitHub)   │     │(days, minor)│
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`analyzer`]: Dataset selection and policy evaluation
//! - [`analysis`]: Analysis result, timeline entries and status
//! - [`cache`]: Embedded and user-supplied release snapshots
//! - [`refresh`]: Snapshot capture and cache status
//! - [`source`]: Release source trait for fetching releases
//! - [`sources`]: Concrete release sources (GitHub)
//! - [`policy`]: Policy trait
//! - [`policies`]: Days and versions policies
//! - [`timeline`]: Release timeline around the compared version
//! - [`release`]: The release record
//! - [`error`]: Error types
//! - [`semver`]: Shared semver utilities

pub mod analysis;
pub mod analyzer;
pub mod cache;
pub mod error;
pub mod policies;
pub mod policy;
pub mod refresh;
pub mod release;
pub mod semver;
pub mod source;
pub mod sources;
pub mod timeline;
