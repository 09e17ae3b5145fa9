//! Report Rendering
//!
//! Human-readable and JSON forms of a `SupplyReport`. The text form is
//! advisory; callers branch on the exit code.

use serde::Serialize;
use std::fmt::Write;

use crate::collector::IdCollision;
use crate::config::ReportLimits;
use crate::hashing::report_fingerprint;
use crate::validation::{SupplyOutcome, SupplyReport};

/// JSON envelope printed by `validate --json`.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'a> {
    pub exit_code: u8,
    pub report_hash: String,
    pub report: &'a SupplyReport,
}

impl<'a> ReportEnvelope<'a> {
    pub fn new(report: &'a SupplyReport) -> Result<Self, serde_json::Error> {
        Ok(Self {
            exit_code: report.exit_code(),
            report_hash: report_fingerprint(report)?,
            report,
        })
    }
}

fn join_preview<T: ToString>(items: &[T], limit: usize) -> String {
    let shown: Vec<String> = items.iter().take(limit).map(ToString::to_string).collect();
    let mut line = shown.join(", ");
    if items.len() > limit {
        line.push_str(" ...");
    }
    line
}

fn write_collisions(out: &mut String, label: &str, collisions: &[IdCollision]) {
    if collisions.is_empty() {
        return;
    }
    let _ = writeln!(out, "[WARN] {} {label} filenames share a token ID with another file:", collisions.len());
    for c in collisions {
        let _ = writeln!(
            out,
            "  - ID {}: using {}, ignoring {}",
            c.id,
            c.kept.display(),
            c.overwritten.display()
        );
    }
    out.push('\n');
}

/// Render the report as plain text.
pub fn render_text(report: &SupplyReport, limits: &ReportLimits) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Scanning images:   {}", report.images_dir.display());
    let _ = writeln!(out, "Scanning metadata: {}\n", report.metadata_dir.display());

    match &report.outcome {
        SupplyOutcome::NoImages => {
            let _ = writeln!(out, "[FAIL] No PNG images found named like 1.png, 2.png, ...");
            return out;
        }
        SupplyOutcome::NoMetadata => {
            let _ = writeln!(
                out,
                "[FAIL] No metadata JSON files found named like 1.json, 2.json, ... in {}",
                report.metadata_dir.display()
            );
            return out;
        }
        _ => {}
    }

    let _ = writeln!(out, "=== Supply Summary ===");
    let _ = writeln!(out, "Images found:    {}", report.image_count);
    let _ = writeln!(out, "Metadata found:  {}", report.metadata_count);
    let _ = writeln!(out, "Overlapping IDs: {}", report.overlap_count);
    if let Some(range) = report.id_range {
        let _ = writeln!(out, "ID range detected: {} - {}", range.first, range.last);
    }
    out.push('\n');

    write_collisions(&mut out, "image", &report.image_collisions);
    write_collisions(&mut out, "metadata", &report.metadata_collisions);

    if !report.missing_images.is_empty() {
        let _ = writeln!(out, "[FAIL] Missing images for {} IDs:", report.missing_images.len());
        let _ = writeln!(out, "  {}\n", join_preview(&report.missing_images, limits.missing_preview));
    }
    if !report.missing_metadata.is_empty() {
        let _ = writeln!(out, "[FAIL] Missing metadata for {} IDs:", report.missing_metadata.len());
        let _ = writeln!(out, "  {}\n", join_preview(&report.missing_metadata, limits.missing_preview));
    }

    match &report.outcome {
        SupplyOutcome::IdMismatch => {
            let _ = writeln!(out, "[FAIL] Image and metadata IDs do not match. Uniqueness not checked.");
        }
        SupplyOutcome::InvalidMetadata { path, reason, .. } => {
            let _ = writeln!(out, "[FAIL] {} {reason}", path.display());
            let _ = writeln!(out, "[FAIL] Uniqueness validation failed.");
        }
        SupplyOutcome::DuplicateTraits => {
            let duplicates = report
                .uniqueness
                .as_ref()
                .map(|u| u.duplicates.as_slice())
                .unwrap_or_default();
            let _ = writeln!(out, "[FAIL] Duplicate trait combinations found: {}", duplicates.len());
            for pair in duplicates.iter().take(limits.duplicate_preview) {
                let _ = writeln!(out, "  - Token {} duplicates token {}", pair.token_id, pair.duplicate_of);
            }
            if duplicates.len() > limits.duplicate_preview {
                let _ = writeln!(out, "  ...");
            }
            let _ = writeln!(out, "[FAIL] Uniqueness validation failed.");
        }
        SupplyOutcome::Valid => {
            let _ = writeln!(out, "[OK] All metadata trait combinations are unique.");
            let _ = writeln!(out, "[OK] All checks passed. Collection is valid and unique.");
        }
        SupplyOutcome::NoImages | SupplyOutcome::NoMetadata => {}
    }

    out
}
