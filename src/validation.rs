//! Supply Validation - Reconciliation and Uniqueness
//!
//! Cross-checks the image corpus against the metadata corpus, then looks for
//! duplicate trait combinations. The verdict is a typed outcome; exit codes are
//! derived from it and nowhere else.

use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::collector::{collect_ids, CollectError, FileIndex, FileKind, IdCollision, TokenId};
use crate::metadata::MetadataRecord;
use crate::signature::TraitSignature;

pub const EXIT_OK: u8 = 0;
pub const EXIT_NO_INPUT: u8 = 1;
pub const EXIT_ID_MISMATCH: u8 = 2;
pub const EXIT_NOT_UNIQUE: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SupplyOutcome {
    Valid,
    NoImages,
    NoMetadata,
    IdMismatch,
    DuplicateTraits,
    InvalidMetadata {
        token_id: TokenId,
        path: PathBuf,
        reason: String,
    },
}

impl SupplyOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            SupplyOutcome::Valid => EXIT_OK,
            SupplyOutcome::NoImages | SupplyOutcome::NoMetadata => EXIT_NO_INPUT,
            SupplyOutcome::IdMismatch => EXIT_ID_MISMATCH,
            SupplyOutcome::DuplicateTraits | SupplyOutcome::InvalidMetadata { .. } => {
                EXIT_NOT_UNIQUE
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SupplyOutcome::Valid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdRange {
    pub first: TokenId,
    pub last: TokenId,
}

/// `token_id` carries the same traits as the earlier `duplicate_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    pub token_id: TokenId,
    pub duplicate_of: TokenId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniquenessReport {
    pub checked: usize,
    pub duplicates: Vec<DuplicatePair>,
}

/// Set algebra over the two ID corpora. All lists are ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub overlap: Vec<TokenId>,
    pub missing_images: Vec<TokenId>,
    pub missing_metadata: Vec<TokenId>,
}

impl Reconciliation {
    pub fn of(images: &FileIndex, metadata: &FileIndex) -> Self {
        let overlap = images.ids().filter(|id| metadata.contains(*id)).collect();
        let missing_images = metadata.ids().filter(|id| !images.contains(*id)).collect();
        let missing_metadata = images.ids().filter(|id| !metadata.contains(*id)).collect();
        Self { overlap, missing_images, missing_metadata }
    }

    pub fn is_complete(&self) -> bool {
        self.missing_images.is_empty() && self.missing_metadata.is_empty()
    }

    pub fn id_range(&self) -> Option<IdRange> {
        Some(IdRange {
            first: *self.overlap.first()?,
            last: *self.overlap.last()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplyReport {
    pub images_dir: PathBuf,
    pub metadata_dir: PathBuf,
    pub image_count: usize,
    pub metadata_count: usize,
    pub overlap_count: usize,
    pub id_range: Option<IdRange>,
    pub missing_images: Vec<TokenId>,
    pub missing_metadata: Vec<TokenId>,
    pub image_collisions: Vec<IdCollision>,
    pub metadata_collisions: Vec<IdCollision>,
    /// `None` when the run stopped before trait uniqueness was evaluated.
    pub uniqueness: Option<UniquenessReport>,
    pub outcome: SupplyOutcome,
}

impl SupplyReport {
    pub fn exit_code(&self) -> u8 {
        self.outcome.exit_code()
    }
}

/// Record each ID whose signature was already claimed by an earlier ID.
///
/// Input order decides which ID counts as the original, so callers feed
/// signatures in ascending ID order.
pub fn find_duplicates<I>(signatures: I) -> Vec<DuplicatePair>
where
    I: IntoIterator<Item = (TokenId, TraitSignature)>,
{
    let mut first_seen: HashMap<TraitSignature, TokenId> = HashMap::new();
    let mut duplicates = vec![];

    for (token_id, signature) in signatures {
        match first_seen.entry(signature) {
            Entry::Occupied(e) => duplicates.push(DuplicatePair {
                token_id,
                duplicate_of: *e.get(),
            }),
            Entry::Vacant(e) => {
                e.insert(token_id);
            }
        }
    }

    duplicates
}

/// Load every listed metadata file and check its trait signature for reuse.
///
/// Any unreadable or malformed file fails the whole check.
pub fn check_uniqueness<'a, I>(files: I) -> Result<UniquenessReport, SupplyOutcome>
where
    I: IntoIterator<Item = (TokenId, &'a Path)>,
{
    let mut signatures = vec![];
    for (token_id, path) in files {
        let record = MetadataRecord::load(path).map_err(|e| SupplyOutcome::InvalidMetadata {
            token_id,
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        signatures.push((token_id, TraitSignature::of(&record)));
    }

    let checked = signatures.len();
    Ok(UniquenessReport {
        checked,
        duplicates: find_duplicates(signatures),
    })
}

/// Validate that `images_dir` and `metadata_dir` form a complete collection
/// with unique trait combinations.
///
/// Only directory-listing failures are errors. Every validation verdict,
/// including unparsable metadata, is reported through `SupplyReport::outcome`.
pub fn validate_supply(images_dir: &Path, metadata_dir: &Path) -> Result<SupplyReport, CollectError> {
    let images = collect_ids(images_dir, FileKind::Image)?;
    let metadata = collect_ids(metadata_dir, FileKind::Metadata)?;
    info!(images = images.len(), metadata = metadata.len(), "corpora scanned");

    let reconciliation = Reconciliation::of(&images, &metadata);

    let mut report = SupplyReport {
        images_dir: images_dir.to_path_buf(),
        metadata_dir: metadata_dir.to_path_buf(),
        image_count: images.len(),
        metadata_count: metadata.len(),
        overlap_count: reconciliation.overlap.len(),
        id_range: reconciliation.id_range(),
        missing_images: reconciliation.missing_images.clone(),
        missing_metadata: reconciliation.missing_metadata.clone(),
        image_collisions: images.collisions().to_vec(),
        metadata_collisions: metadata.collisions().to_vec(),
        uniqueness: None,
        outcome: SupplyOutcome::Valid,
    };

    if images.is_empty() {
        report.outcome = SupplyOutcome::NoImages;
        return Ok(report);
    }
    if metadata.is_empty() {
        report.outcome = SupplyOutcome::NoMetadata;
        return Ok(report);
    }

    if !reconciliation.is_complete() {
        warn!(
            missing_images = reconciliation.missing_images.len(),
            missing_metadata = reconciliation.missing_metadata.len(),
            "image and metadata IDs do not match, skipping uniqueness check"
        );
        report.outcome = SupplyOutcome::IdMismatch;
        return Ok(report);
    }

    // Reconciled, so every overlap ID has a metadata path.
    let files = reconciliation
        .overlap
        .iter()
        .filter_map(|id| metadata.get(*id).map(|path| (*id, path)));

    match check_uniqueness(files) {
        Ok(uniqueness) => {
            info!(
                checked = uniqueness.checked,
                duplicates = uniqueness.duplicates.len(),
                "trait uniqueness evaluated"
            );
            report.outcome = if uniqueness.duplicates.is_empty() {
                SupplyOutcome::Valid
            } else {
                SupplyOutcome::DuplicateTraits
            };
            report.uniqueness = Some(uniqueness);
        }
        Err(outcome) => {
            warn!(?outcome, "metadata could not be parsed");
            report.outcome = outcome;
        }
    }

    Ok(report)
}
