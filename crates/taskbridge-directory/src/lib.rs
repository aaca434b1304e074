//! # taskbridge-directory
//!
//! In-memory user directory for the taskbridge client.
//!
//! - **[`pattern`]** -- [`QueryPattern`]: free text to an ordered,
//!   word-anchored, case-insensitive matcher over display names.
//! - **[`directory`]** -- [`UserDirectory`]: per-workspace cache of user
//!   records, filled from API responses and never evicted.
//! - **[`photo`]** -- [`PhotoPrefetcher`]: hands each photo URL to a
//!   [`PhotoLoader`] at most once per process.
//! - **[`model`]** -- [`User`], [`Workspace`], [`CurrentUser`] and their
//!   tolerant wire forms.
//!
//! Nothing here performs I/O.  The API crate wires the directory to a
//! transport and supplies a network-backed photo loader.

pub mod directory;
pub mod model;
pub mod pattern;
pub mod photo;

// ── re-exports ───────────────────────────────────────────────────────

pub use directory::UserDirectory;
pub use model::{CurrentUser, User, Workspace};
pub use pattern::QueryPattern;
pub use photo::{NoopPhotoLoader, PhotoLoader, PhotoPrefetcher};
