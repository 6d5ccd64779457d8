// src/stages/api_extraction.rs

use crate::core_types::ApiInfo;
use crate::errors::{Error, Result};
use crate::extractor::{load_extracted_apis, Toolchain, ToolchainRegistry};
use crate::flow::{ContextPatch, DefaultAction, SharedContext, Stage, StageOutcome};
use std::path::PathBuf;

/// Runs the extractor for the detected project type and loads its records.
pub struct ApiExtractionStage {
    toolchains: ToolchainRegistry,
}

impl ApiExtractionStage {
    pub fn new(toolchains: ToolchainRegistry) -> Self {
        Self { toolchains }
    }
}

pub struct ExtractionJob {
    toolchain: Toolchain,
    project_root: PathBuf,
    output_dir: PathBuf,
}

impl Stage for ApiExtractionStage {
    type Prepared = ExtractionJob;
    type Output = Vec<ApiInfo>;
    type Action = DefaultAction;

    fn name(&self) -> &'static str {
        "api_extraction"
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<ExtractionJob> {
        let info = ctx
            .project_info
            .as_ref()
            .ok_or_else(|| Error::Config("no project info in context".to_string()))?;
        let session = ctx
            .session
            .as_ref()
            .ok_or_else(|| Error::Config("API extraction needs a session directory".to_string()))?;

        let toolchain = self.toolchains.for_project_type(&info.project_type)?.clone();
        toolchain.extractor.ensure_available()?;
        log::info!(
            "Extracting APIs from {} project {}",
            toolchain.language,
            info.root_path.display()
        );
        Ok(ExtractionJob {
            toolchain,
            project_root: info.root_path.clone(),
            output_dir: session.dir.clone(),
        })
    }

    fn execute(&self, job: &ExtractionJob) -> Result<Vec<ApiInfo>> {
        let report = job
            .toolchain
            .extractor
            .extract(&job.project_root, &job.output_dir)?;
        if !report.succeeded() {
            log::warn!(
                "Extractor exited with status {}; loading whatever it wrote",
                report.status
            );
        }
        load_extracted_apis(&job.output_dir)
    }

    fn finalize(
        &self,
        _ctx: &SharedContext,
        _job: ExtractionJob,
        apis: Vec<ApiInfo>,
    ) -> Result<StageOutcome<DefaultAction>> {
        log::info!("Extracted {} APIs", apis.len());
        Ok(StageOutcome::new(
            ContextPatch::new().apis(apis),
            DefaultAction::Default,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::ProjectInfo;
    use crate::extractor::{ApiExtractor, DefinitionLookup, ExtractionReport};
    use crate::session::Session;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Writes one controller file, then reports a failing exit status.
    struct PartialExtractor;

    impl ApiExtractor for PartialExtractor {
        fn extract(&self, _: &Path, output_dir: &Path) -> Result<ExtractionReport> {
            fs::write(
                output_dir.join("data/API/Ping.json"),
                r#"{"apis":[{"controller_name":"Ping","method_name":"ping",
                    "code_pos":"Ping.java:L0-L1","req":{"method":"GET","path":"/ping"}}]}"#,
            )
            .map_err(|e| crate::errors::io_error_with_path(e, output_dir))?;
            Ok(ExtractionReport {
                status: 1,
                stdout: String::new(),
                stderr: "boom".to_string(),
            })
        }
    }

    impl DefinitionLookup for PartialExtractor {
        fn lookup(&self, _: &Path, _: &str) -> Result<String> {
            Ok("[]".to_string())
        }
    }

    fn context(project_type: &str, session: Option<Session>) -> SharedContext {
        let mut info = ProjectInfo::new("/proj");
        info.project_type = project_type.to_string();
        SharedContext::new(info, session)
    }

    fn stage() -> ApiExtractionStage {
        ApiExtractionStage::new(
            ToolchainRegistry::new().register_adapter("Java", Arc::new(PartialExtractor)),
        )
    }

    #[test]
    fn test_nonzero_status_still_loads_records() -> anyhow::Result<()> {
        let sessions = tempdir()?;
        let ctx = context("Java", Some(Session::create(sessions.path())?));
        let stage = stage();
        let job = stage.prepare(&ctx)?;
        let apis = stage.execute(&job)?;
        assert_eq!(apis.len(), 1);
        let outcome = stage.finalize(&ctx, job, apis)?;
        assert_eq!(outcome.patch.apis.unwrap()[0].label(), "Ping.ping");
        Ok(())
    }

    #[test]
    fn test_unsupported_project_type_is_fatal() -> anyhow::Result<()> {
        let sessions = tempdir()?;
        let ctx = context("Python", Some(Session::create(sessions.path())?));
        let err = stage().prepare(&ctx).err().unwrap();
        assert!(matches!(err, Error::UnsupportedProjectType(ref t) if t == "Python"));
        assert!(err.is_fatal());
        Ok(())
    }

    #[test]
    fn test_requires_session() {
        let ctx = context("Java", None);
        assert!(matches!(stage().prepare(&ctx), Err(Error::Config(_))));
    }
}
