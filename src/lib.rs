//! Schema Forest
//!
//! Turns the OpenAPI v2 definitions served by a Kubernetes discovery endpoint
//! into one expanded tree per API type, ready for a tree widget, and answers
//! lookups by `apiVersion` and `kind`.
//!
//! ## Features
//!
//! - **Cycle-safe expansion**: self-referential types produce finite trees
//! - **Owned subtrees**: every `$ref` usage gets its own copy of the target
//! - **Unique display handles**: every node carries a distinct `value`
//! - **GVK lookup**: group/version/kind matching with defined fallbacks
//! - **Per-cluster snapshots**: independent forests, replaced wholesale
//!
//! ## Pipeline
//!
//! ```text
//! raw document
//!   -> DefinitionIndex      name -> definition, document order
//!   -> build_forest         forest v0
//!   -> resolve_refs         forest v1
//!   -> resolve_array_items
//!   -> collapse_levels      forest v2
//!   -> assign_identities    forest v3 (final, read-only)
//! ```
//!
//! ```no_run
//! use schema_forest::{BuildConfig, Forest};
//!
//! let raw = std::fs::read("openapi-v2.json")?;
//! let forest = Forest::build(&raw, &BuildConfig::default())?;
//! if let Some(pod) = forest.fetch_by_gvk("v1", "Pod") {
//!     println!("{}", pod.outline());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod document;
pub mod error;
pub mod forest;
pub mod graph;

pub use catalog::{ForestCatalog, Installed};
pub use checksum::Checksum;
pub use config::{BuildConfig, ForestConfig, OutputFormat};
pub use document::{Definition, DefinitionIndex, Property};
pub use error::{ForestError, Result};
pub use forest::{BuildContext, Forest, ForestSummary, Gvk, GvkMatch, MatchTier, TreeNode};
pub use graph::RefGraph;
