//! MintForge Core - Collection Media Pipeline
//!
//! # Guarantees
//! 1. Validation Is Read-Only
//! 2. IDs Reconcile Before Traits Are Compared
//! 3. Trait Signatures Ignore Order, Case and Padding
//! 4. Every Verdict Has Its Own Exit Code
//! 5. Originals Are Never Rewritten

pub mod collector;
pub mod metadata;
pub mod signature;
pub mod validation;
pub mod report;
pub mod hashing;
pub mod config;
pub mod cid;
pub mod rewrite;
pub mod imaging;

pub use collector::{collect_ids, scan_dir, FileIndex, FileKind, IdCollision, TokenId};
pub use metadata::{AttributeEntry, Attributes, MetadataRecord};
pub use signature::TraitSignature;
pub use validation::{validate_supply, DuplicatePair, SupplyOutcome, SupplyReport};
pub use report::{render_text, ReportEnvelope};
pub use hashing::{canonical_json, report_fingerprint};
pub use config::{PipelineConfig, ReportLimits};
pub use cid::{normalize_cid_base, CidBase};
pub use rewrite::{rewrite_metadata, RewriteSummary};
pub use imaging::{convert_to_webp, resize_half, ImageBatch};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
