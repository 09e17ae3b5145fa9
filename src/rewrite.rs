//! Metadata Rewriter
//!
//! Points each token's metadata at its image under a CID base. Writes to a
//! separate output directory; source files are only read.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::cid::CidBase;
use crate::collector::{scan_dir, CollectError, FileKind};

const IMAGE_MIME: &str = "image/png";

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("No metadata folder found at {0}")]
    MetadataDirMissing(PathBuf),

    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} invalid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}: metadata root must be a JSON object")]
    NotAnObject(PathBuf),

    #[error("Output directory {0} is the metadata directory; originals would be overwritten")]
    OutputIsSource(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub cid_base: CidBase,
    pub out_dir: PathBuf,
    pub updated: usize,
}

/// Apply the CID rewrite to one metadata document in place.
///
/// `stem` is the metadata filename stem; the image is `<stem>.png`.
pub fn rewrite_document(doc: &mut Map<String, Value>, stem: &str, cid_base: &CidBase) {
    let filename = format!("{stem}.{}", FileKind::Image.extension());
    doc.insert("image".to_string(), Value::String(cid_base.join(&filename)));

    if !doc.get("properties").is_some_and(Value::is_object) {
        doc.insert("properties".to_string(), json!({}));
    }
    if let Some(Value::Object(props)) = doc.get_mut("properties") {
        let first_is_object = props
            .get("files")
            .and_then(Value::as_array)
            .and_then(|files| files.first())
            .is_some_and(Value::is_object);

        if first_is_object {
            if let Some(first) = props
                .get_mut("files")
                .and_then(|files| files.get_mut(0))
                .and_then(Value::as_object_mut)
            {
                first.insert("uri".to_string(), Value::String(filename));
                first.insert("type".to_string(), Value::String(IMAGE_MIME.to_string()));
            }
        } else {
            props.insert("files".to_string(), json!([{"uri": filename, "type": IMAGE_MIME}]));
        }
    }

    doc.shift_remove("asset_paths");
}

fn same_dir(a: &Path, b: &Path) -> Result<bool, RewriteError> {
    let canonical = |p: &Path| {
        fs::canonicalize(p).map_err(|source| RewriteError::Io {
            path: p.to_path_buf(),
            source,
        })
    };
    Ok(canonical(a)? == canonical(b)?)
}

/// Rewrite every `<id>.json` under `metadata_dir` into `out_dir`.
pub fn rewrite_metadata(
    metadata_dir: &Path,
    out_dir: &Path,
    cid_base: &CidBase,
) -> Result<RewriteSummary, RewriteError> {
    if !metadata_dir.is_dir() {
        return Err(RewriteError::MetadataDirMissing(metadata_dir.to_path_buf()));
    }

    fs::create_dir_all(out_dir).map_err(|source| RewriteError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    if same_dir(metadata_dir, out_dir)? {
        return Err(RewriteError::OutputIsSource(out_dir.to_path_buf()));
    }

    info!(base = %cid_base, out = %out_dir.display(), "rewriting metadata");

    let mut updated = 0;
    for file in scan_dir(metadata_dir, FileKind::Metadata)? {
        let path = &file.path;
        let (Some(name), Some(stem)) = (path.file_name(), path.file_stem().and_then(|s| s.to_str()))
        else {
            continue;
        };

        let content = fs::read_to_string(path).map_err(|source| RewriteError::Io {
            path: path.clone(),
            source,
        })?;
        let mut value: Value = serde_json::from_str(&content).map_err(|source| RewriteError::Json {
            path: path.clone(),
            source,
        })?;
        let doc = value
            .as_object_mut()
            .ok_or_else(|| RewriteError::NotAnObject(path.clone()))?;

        rewrite_document(doc, stem, cid_base);

        let out_path = out_dir.join(name);
        let rendered = serde_json::to_string_pretty(&value).map_err(|source| RewriteError::Json {
            path: out_path.clone(),
            source,
        })?;
        fs::write(&out_path, rendered).map_err(|source| RewriteError::Io {
            path: out_path.clone(),
            source,
        })?;

        debug!(token = file.id, out = %out_path.display(), "metadata rewritten");
        updated += 1;
    }

    Ok(RewriteSummary {
        cid_base: cid_base.clone(),
        out_dir: out_dir.to_path_buf(),
        updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid::normalize_cid_base;

    fn rewrite(value: Value, stem: &str) -> Value {
        let base = normalize_cid_base("bafyexample").unwrap();
        let mut value = value;
        rewrite_document(value.as_object_mut().unwrap(), stem, &base);
        value
    }

    #[test]
    fn test_fields_rewritten() {
        let out = rewrite(
            json!({
                "name": "Bot #7",
                "image": "7.png",
                "asset_paths": ["art/7.png"],
                "properties": {"files": [{"uri": "old.png", "type": "image/jpeg", "cdn": true}], "category": "image"}
            }),
            "7",
        );

        assert_eq!(
            out,
            json!({
                "name": "Bot #7",
                "image": "ipfs://bafyexample/7.png",
                "properties": {"files": [{"uri": "7.png", "type": "image/png", "cdn": true}], "category": "image"}
            })
        );
    }

    #[test]
    fn test_missing_properties_created() {
        let out = rewrite(json!({"properties": "nope"}), "007");
        assert_eq!(out["image"], "ipfs://bafyexample/007.png");
        assert_eq!(out["properties"], json!({"files": [{"uri": "007.png", "type": "image/png"}]}));
    }

    #[test]
    fn test_bad_files_list_replaced() {
        for files in [json!([]), json!(["7.png"]), json!({"uri": "x"})] {
            let out = rewrite(json!({"properties": {"files": files}}), "7");
            assert_eq!(out["properties"]["files"], json!([{"uri": "7.png", "type": "image/png"}]));
        }
    }

    #[test]
    fn test_key_order_preserved() {
        let out = rewrite(json!({"name": "a", "image": "x", "attributes": []}), "1");
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "image", "attributes", "properties"]);
    }
}
