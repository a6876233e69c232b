//! Domain models and types for datastore-backup.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed names** ([`KindName`], [`NamespaceName`])
//! - **Export shapes** ([`ExportRequest`], [`ExportProgress`], [`ExportOutcome`], [`ExportResult`])
//! - **Error types** ([`BackupError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Kind and namespace names are both strings on the wire; newtypes keep them apart:
//!
//! ```rust
//! use datastore_backup::domain::{KindName, NamespaceName};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kind = KindName::new("Order")?;
//! let namespace = NamespaceName::new("tenant-a");
//!
//! // let wrong: KindName = namespace;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod export;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::BackupError;
pub use export::{ExportOutcome, ExportProgress, ExportRequest, ExportResult};
pub use ids::{KindName, NamespaceName};
pub use result::Result;
