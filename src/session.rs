// src/session.rs

//! Per-run session directories.
//!
//! Every run writes into `<root>/<YYYYMMDD_HHMMSS>/`:
//! `session_info.json`, `framework_analysis.json`, `data/API/*.json` (written
//! by the extractor), `data/node_NNN_<stage>.json` snapshots, `logs/llm/*.log`
//! and `summary.json`.

use crate::constants::SESSION_INFO_FILE;
use crate::core_types::ApiInfo;
use crate::errors::{io_error_with_path, json_error, Result};
use crate::flow::{FlowObserver, SharedContext};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Metadata written to `session_info.json` when a session starts.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    /// RFC 3339 local time.
    pub start_time: String,
    pub project_path: PathBuf,
    pub command: String,
    pub model: String,
    pub version: String,
}

/// Handle to one run's output directory.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub dir: PathBuf,
    #[serde(skip)]
    llm_log: Arc<LlmCallLog>,
}

impl Session {
    /// Creates a fresh timestamped session directory under `root`.
    ///
    /// A numeric suffix is appended when a session with the same second
    /// already exists.
    pub fn create(root: &Path) -> Result<Self> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut id = stamp.clone();
        let mut suffix = 1;
        while root.join(&id).exists() {
            id = format!("{stamp}_{suffix}");
            suffix += 1;
        }
        Self::open(root.join(&id), id)
    }

    /// Uses `dir` as the session directory, creating the standard layout.
    pub fn open(dir: PathBuf, id: String) -> Result<Self> {
        let llm_dir = dir.join("logs").join("llm");
        for sub in [dir.join("data").join("API"), llm_dir.clone()] {
            fs::create_dir_all(&sub).map_err(|e| io_error_with_path(e, &sub))?;
        }
        log::info!("Session directory: {}", dir.display());
        Ok(Self {
            id,
            dir,
            llm_log: Arc::new(LlmCallLog::new(llm_dir)),
        })
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.join("data")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.dir.join("logs")
    }

    /// Shared per-call LLM log.
    pub fn llm_log(&self) -> Arc<LlmCallLog> {
        Arc::clone(&self.llm_log)
    }

    /// Writes `value` as pretty JSON to `relative` inside the session.
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        relative: impl AsRef<Path>,
        value: &T,
    ) -> Result<PathBuf> {
        let path = self.dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error_with_path(e, parent))?;
        }
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| json_error(e, path.display().to_string()))?;
        fs::write(&path, text).map_err(|e| io_error_with_path(e, &path))?;
        Ok(path)
    }

    /// Writes `session_info.json`.
    pub fn write_info(&self, project_path: &Path, command: &str, model: &str) -> Result<PathBuf> {
        let info = SessionInfo {
            session_id: self.id.clone(),
            start_time: Local::now().to_rfc3339(),
            project_path: project_path.to_path_buf(),
            command: command.to_string(),
            model: model.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        self.write_json(SESSION_INFO_FILE, &info)
    }
}

/// Writes one log file per LLM call, numbered in call order.
#[derive(Debug)]
pub struct LlmCallLog {
    dir: PathBuf,
    counter: AtomicUsize,
}

impl LlmCallLog {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            counter: AtomicUsize::new(0),
        }
    }

    /// Records a prompt/response pair as `NNNN_<controller>_<method>.log`.
    pub fn record(&self, api: &ApiInfo, system_role: &str, prompt: &str, response: &str) -> Result<PathBuf> {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let name = format!(
            "{:04}_{}_{}.log",
            seq,
            sanitize(&api.controller_name),
            sanitize(&api.method_name)
        );
        let path = self.dir.join(name);
        let body = format!(
            "[{}] {} {}\n\n=== SYSTEM ===\n{}\n\n=== PROMPT ===\n{}\n\n=== RESPONSE ===\n{}\n",
            Local::now().to_rfc3339(),
            api.req.method,
            api.req.path,
            system_role,
            prompt,
            response
        );
        fs::write(&path, body).map_err(|e| io_error_with_path(e, &path))?;
        Ok(path)
    }
}

fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Writes a JSON snapshot of the context after every stage to
/// `data/node_NNN_<stage>.json` in the context's session.
pub struct SnapshotObserver;

impl FlowObserver for SnapshotObserver {
    fn stage_completed(
        &self,
        sequence: usize,
        stage: &str,
        _action: &str,
        ctx: &SharedContext,
    ) -> Result<()> {
        if let Some(session) = &ctx.session {
            let relative = Path::new("data").join(format!("node_{sequence:03}_{stage}.json"));
            let path = session.write_json(relative, ctx)?;
            log::debug!("Context snapshot written to {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::ProjectInfo;
    use tempfile::tempdir;

    #[test]
    fn test_create_builds_layout_and_unique_ids() -> anyhow::Result<()> {
        let root = tempdir()?;
        let first = Session::create(root.path())?;
        let second = Session::create(root.path())?;
        assert_ne!(first.dir, second.dir);
        assert!(first.data_dir().join("API").is_dir());
        assert!(first.logs_dir().join("llm").is_dir());
        assert_eq!(first.id.len(), "20240101_120000".len());
        Ok(())
    }

    #[test]
    fn test_write_info() -> anyhow::Result<()> {
        let root = tempdir()?;
        let session = Session::create(root.path())?;
        let path = session.write_info(Path::new("/proj"), "sa", "qwen")?;
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        assert_eq!(value["session_id"], session.id.as_str());
        assert_eq!(value["command"], "sa");
        assert_eq!(value["model"], "qwen");
        Ok(())
    }

    #[test]
    fn test_llm_log_numbers_calls() -> anyhow::Result<()> {
        let root = tempdir()?;
        let session = Session::create(root.path())?;
        let log = session.llm_log();
        let api = ApiInfo {
            controller_name: "User Controller".to_string(),
            method_name: "get/{id}".to_string(),
            ..ApiInfo::default()
        };
        let first = log.record(&api, "role", "prompt text", "response text")?;
        let second = session.llm_log().record(&api, "role", "p", "r")?;
        assert!(first.ends_with("0001_User_Controller_get__id_.log"));
        assert!(second.file_name().unwrap().to_string_lossy().starts_with("0002_"));
        let body = fs::read_to_string(first)?;
        assert!(body.contains("=== PROMPT ===\nprompt text"));
        assert!(body.contains("=== RESPONSE ===\nresponse text"));
        Ok(())
    }

    #[test]
    fn test_snapshot_observer_writes_numbered_files() -> anyhow::Result<()> {
        let root = tempdir()?;
        let session = Session::create(root.path())?;
        let ctx = SharedContext::new(ProjectInfo::new("/proj"), Some(session.clone()));
        SnapshotObserver.stage_completed(2, "api_extraction", "default", &ctx)?;
        let snapshot = session.data_dir().join("node_002_api_extraction.json");
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(snapshot)?)?;
        assert_eq!(value["project_info"]["project_type"], "Unknown");
        assert_eq!(value["session"]["id"], session.id.as_str());
        Ok(())
    }

    #[test]
    fn test_snapshot_observer_without_session_is_noop() -> anyhow::Result<()> {
        SnapshotObserver.stage_completed(1, "x", "default", &SharedContext::default())?;
        Ok(())
    }
}
