// src/extractor/java.rs

//! Adapter for the Java parser jar.
//!
//! Endpoint extraction runs `<java> -jar <jar> <project> API -o <session>`,
//! which writes `<session>/data/API/<Controller>.json`. Definition lookups run
//! `<java> -jar <jar> <project> DEF -s <symbol>` and read the JSON array the
//! tool prints on stdout.

use super::{ApiExtractor, DefinitionLookup, ExtractionReport};
use crate::constants::{JAVA_PARSER_ENV, JAVA_PATH_ENV};
use crate::errors::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Runs the Java parser as a subprocess.
#[derive(Debug, Clone, Default)]
pub struct JavaParser {
    java: Option<PathBuf>,
    jar: Option<PathBuf>,
}

impl JavaParser {
    pub fn new(java: Option<PathBuf>, jar: Option<PathBuf>) -> Self {
        Self { java, jar }
    }

    /// Fills missing paths from `JAVA_PATH` / `WFG_JAVA_PARSER`.
    pub fn with_env_fallback(self) -> Self {
        Self {
            java: self.java.or_else(|| env::var_os(JAVA_PATH_ENV).map(PathBuf::from)),
            jar: self.jar.or_else(|| env::var_os(JAVA_PARSER_ENV).map(PathBuf::from)),
        }
    }

    fn paths(&self) -> Result<(&Path, &Path)> {
        let java = self.java.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "path to the java executable is not set (config 'parser.java_path' or {JAVA_PATH_ENV})"
            ))
        })?;
        let jar = self.jar.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "path to the Java parser jar is not set (config 'parser.jar_path' or {JAVA_PARSER_ENV})"
            ))
        })?;
        Ok((java, jar))
    }

    fn run(&self, project_root: &Path, args: &[&str]) -> Result<Output> {
        let (java, jar) = self.paths()?;
        let mut cmd = Command::new(java);
        cmd.arg("-jar").arg(jar).arg(project_root).args(args);
        log::info!("cmd: {:?}", cmd);
        cmd.output()
            .map_err(|e| Error::Extraction(format!("failed to launch {}: {e}", java.display())))
    }
}

impl ApiExtractor for JavaParser {
    fn ensure_available(&self) -> Result<()> {
        let (_, jar) = self.paths()?;
        if !jar.is_file() {
            return Err(Error::Config(format!(
                "Java parser jar not found at {}",
                jar.display()
            )));
        }
        Ok(())
    }

    fn extract(&self, project_root: &Path, output_dir: &Path) -> Result<ExtractionReport> {
        let output_arg = output_dir.to_string_lossy();
        let output = self.run(project_root, &["API", "-o", output_arg.as_ref()])?;

        let report = ExtractionReport {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !report.succeeded() {
            log::error!("java_parser failed: {}", report.stderr.trim());
        }
        Ok(report)
    }
}

impl DefinitionLookup for JavaParser {
    fn lookup(&self, project_root: &Path, symbol: &str) -> Result<String> {
        let output = self.run(project_root, &["DEF", "-s", symbol])?;
        if !output.status.success() {
            return Err(Error::DefinitionLookup {
                symbol: symbol.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
