// src/stages/project_analysis.rs

use crate::constants::FRAMEWORK_ANALYSIS_FILE;
use crate::core_types::ProjectInfo;
use crate::detect::{detect_project_type, scan_source_files};
use crate::errors::{Error, Result};
use crate::flow::{ContextPatch, DefaultAction, SharedContext, Stage, StageOutcome};
use std::path::PathBuf;

/// Detects the project type and lists its source files.
///
/// Writes `framework_analysis.json` into the session when there is one.
pub struct ProjectAnalysisStage;

impl Stage for ProjectAnalysisStage {
    type Prepared = PathBuf;
    type Output = ProjectInfo;
    type Action = DefaultAction;

    fn name(&self) -> &'static str {
        "project_analysis"
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<PathBuf> {
        let info = ctx
            .project_info
            .as_ref()
            .ok_or_else(|| Error::Config("no project path in context".to_string()))?;
        log::info!("Preparing to analyze project: {}", info.root_path.display());
        Ok(info.root_path.clone())
    }

    fn execute(&self, root: &PathBuf) -> Result<ProjectInfo> {
        let project_type = detect_project_type(root);
        let files = scan_source_files(root)?;
        log::info!("Found {} source files", files.len());
        Ok(ProjectInfo {
            project_type,
            root_path: root.clone(),
            files,
        })
    }

    fn finalize(
        &self,
        ctx: &SharedContext,
        _root: PathBuf,
        info: ProjectInfo,
    ) -> Result<StageOutcome<DefaultAction>> {
        if let Some(session) = &ctx.session {
            session.write_json(FRAMEWORK_ANALYSIS_FILE, &info)?;
        }
        Ok(StageOutcome::new(
            ContextPatch::new().project_info(info),
            DefaultAction::Default,
        ))
    }
}
