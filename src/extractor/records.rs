// src/extractor/records.rs

//! Loads the endpoint records the extractor left in the session directory.

use crate::constants::API_EXTRACTION_FILE;
use crate::core_types::ApiInfo;
use crate::errors::{io_error_with_path, json_error, Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One per-controller output file: `{"controller_name": .., "file_path": .., "apis": [..]}`.
#[derive(Debug, Deserialize)]
struct ControllerRecordFile {
    #[serde(default)]
    controller_name: Option<String>,
    apis: Vec<ApiInfo>,
}

/// Either shape the extractor is allowed to write.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Controller(ControllerRecordFile),
    Flat(Vec<ApiInfo>),
}

impl RecordFile {
    fn into_apis(self) -> Vec<ApiInfo> {
        match self {
            RecordFile::Controller(file) => {
                log::debug!(
                    "Controller {} exposes {} APIs",
                    file.controller_name.as_deref().unwrap_or("<unnamed>"),
                    file.apis.len()
                );
                file.apis
            }
            RecordFile::Flat(apis) => apis,
        }
    }
}

/// Parses one record file.
pub fn parse_record_file(path: &Path) -> Result<Vec<ApiInfo>> {
    let text = fs::read_to_string(path).map_err(|e| io_error_with_path(e, path))?;
    let file: RecordFile =
        serde_json::from_str(&text).map_err(|e| json_error(e, path.display().to_string()))?;
    Ok(file.into_apis())
}

/// Collects every endpoint record under `session_dir`.
///
/// Reads `api_extraction.json` when present, then every `data/API/*.json`
/// in name order. Files that fail to decode are logged and skipped; the
/// remaining files are still loaded.
pub fn load_extracted_apis(session_dir: &Path) -> Result<Vec<ApiInfo>> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    let flat = session_dir.join(API_EXTRACTION_FILE);
    if flat.is_file() {
        candidates.push(flat);
    }

    let pattern = session_dir.join("data").join("API").join("*.json");
    let pattern = pattern.to_string_lossy();
    let mut per_controller: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| Error::Extraction(format!("invalid record glob '{pattern}': {e}")))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Skipping unreadable extraction output: {}", e);
                None
            }
        })
        .collect();
    per_controller.sort();
    candidates.extend(per_controller);

    let mut apis = Vec::new();
    for path in &candidates {
        match parse_record_file(path) {
            Ok(mut loaded) => {
                log::debug!("Loaded {} APIs from {}", loaded.len(), path.display());
                apis.append(&mut loaded);
            }
            Err(e) => log::warn!("Skipping extraction output {}: {}", path.display(), e),
        }
    }
    Ok(apis)
}
