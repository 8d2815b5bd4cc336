//! Alignment profiles loaded from `--config`.
//!
//! A profile is a flat JSON or TOML document. Every key is optional and
//! unknown keys are rejected so that a typo never silently falls back to a
//! default.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlignProfile {
    pub gap_penalty: Option<f64>,
    pub chunk_size: Option<usize>,
    pub overlap_size: Option<usize>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub embed_concurrency: Option<usize>,
    pub embed_batch_size: Option<usize>,
    pub embed_timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

impl AlignProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid profile {}", path.display()))
    }

    /// JSON first; a document that is not JSON at all is retried as TOML
    pub fn parse(raw: &str) -> Result<Self> {
        match serde_json::from_str::<Self>(raw) {
            Ok(profile) => Ok(profile),
            Err(err) if err.is_data() => Err(err.into()),
            Err(json_err) => toml::from_str::<Self>(raw).map_err(|toml_err| {
                anyhow::Error::new(toml_err).context(format!("not JSON: {json_err}"))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_profile() {
        let profile =
            AlignProfile::parse(r#"{"gap_penalty": 0.5, "chunk_size": 8, "model": "all-minilm"}"#)
                .unwrap();
        assert_eq!(profile.gap_penalty, Some(0.5));
        assert_eq!(profile.chunk_size, Some(8));
        assert_eq!(profile.model.as_deref(), Some("all-minilm"));
        assert_eq!(profile.overlap_size, None);
    }

    #[test]
    fn parses_toml_profile() {
        let profile = AlignProfile::parse(
            "chunk_size = 12\noverlap_size = 3\nembed_timeout_ms = 1500\n",
        )
        .unwrap();
        assert_eq!(profile.chunk_size, Some(12));
        assert_eq!(profile.overlap_size, Some(3));
        assert_eq!(profile.embed_timeout_ms, Some(1500));
    }

    #[test]
    fn empty_documents_are_default() {
        assert_eq!(AlignProfile::parse("{}").unwrap(), AlignProfile::default());
        assert_eq!(AlignProfile::parse("").unwrap(), AlignProfile::default());
    }

    #[test]
    fn unknown_keys_are_rejected_in_both_formats() {
        let err = AlignProfile::parse(r#"{"chunk_sise": 4}"#).unwrap_err();
        assert!(format!("{err:#}").contains("chunk_sise"), "{err:#}");

        let err = AlignProfile::parse("gap = 0.3\n").unwrap_err();
        assert!(format!("{err:#}").contains("unknown field `gap`"), "{err:#}");
    }
}
