//! IPFS CID Base Normalization

use serde::Serialize;
use std::fmt;
use thiserror::Error;

const SCHEME: &str = "ipfs://";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CidError {
    #[error("No CID provided")]
    Empty,
}

/// Canonical `ipfs://<cid>/` prefix for token assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CidBase(String);

impl CidBase {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI of a file directly under the CID.
    pub fn join(&self, filename: &str) -> String {
        format!("{}{}", self.0, filename)
    }
}

impl fmt::Display for CidBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts `<cid>`, `ipfs://<cid>`, `ipfs://<cid>/` and `ipfs://ipfs/<cid>/`.
pub fn normalize_cid_base(input: &str) -> Result<CidBase, CidError> {
    let mut s = input.trim();
    s = s.strip_prefix(SCHEME).unwrap_or(s);
    s = s.strip_prefix("ipfs/").unwrap_or(s);
    s = s.strip_prefix('/').unwrap_or(s);
    let cid = s.trim_matches('/');

    if cid.is_empty() {
        return Err(CidError::Empty);
    }

    Ok(CidBase(format!("{SCHEME}{cid}/")))
}
