//! Deterministic prompt templating.
//!
//! A template document is JSON. It is either a list of lines, or an object
//! with a `user_prompt` (list of lines, or any JSON object rendered as text)
//! and an optional `system_prompt`. Callers select a top-level section by key
//! or use the whole document.

mod store;
mod substitution;

pub use store::TemplateStore;
pub use substitution::{substitute, PromptParams, SubstitutionMode};

use crate::errors::{Error, Result};
use serde_json::Value;

/// Which part of a template document to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSection<'a> {
    /// The entire document.
    Whole,
    /// A named top-level key; it must exist.
    Key(&'a str),
}

/// A loaded template ready to produce prompts.
///
/// # Examples
///
/// ```
/// use wfg::prompt::{PromptBuilder, PromptParams};
///
/// let builder = PromptBuilder::from_lines("greeting", ["Hello <NAME>", "Code: <FUNCTION>"]);
/// let params: PromptParams = [("NAME", "X"), ("FUNCTION", "int y;")].into_iter().collect();
/// assert_eq!(builder.build(&params), "Hello X\nCode: int y;");
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    name: String,
    user_text: String,
    system_text: Option<String>,
    mode: SubstitutionMode,
}

impl PromptBuilder {
    /// Loads `name` from `store` and selects `section`.
    ///
    /// # Errors
    /// `Error::TemplateLoad` if the template or the requested section does not exist.
    pub fn load(store: &TemplateStore, name: &str, section: TemplateSection<'_>) -> Result<Self> {
        let document = store.load_document(name)?;
        Self::from_document(name, &document, section)
    }

    /// Builds a template from an already parsed document.
    pub fn from_document(name: &str, document: &Value, section: TemplateSection<'_>) -> Result<Self> {
        let selected = match section {
            TemplateSection::Whole => document,
            TemplateSection::Key(key) => document.get(key).ok_or_else(|| Error::TemplateLoad {
                name: name.to_string(),
                reason: format!("section '{key}' not found"),
            })?,
        };

        let user_text = match selected.get("user_prompt") {
            Some(user) => render_block(user),
            None => render_block(selected),
        };
        let system_text = selected.get("system_prompt").map(render_block);

        Ok(Self {
            name: name.to_string(),
            user_text,
            system_text,
            mode: SubstitutionMode::default(),
        })
    }

    /// Builds a template from an ordered list of lines.
    pub fn from_lines<I, S>(name: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let user_text = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            name: name.to_string(),
            user_text,
            system_text: None,
            mode: SubstitutionMode::default(),
        }
    }

    /// Selects the substitution discipline.
    pub fn with_mode(mut self, mode: SubstitutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The template's system prompt, if it defines one. Not substituted.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_text.as_deref()
    }

    /// Produces the final user prompt.
    pub fn build(&self, params: &PromptParams) -> String {
        substitute(&self.user_text, params, self.mode)
    }
}

/// Lists of strings become lines; any other value is rendered as compact JSON.
fn render_block(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> PromptParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_lines_template_joins_with_newlines() {
        let builder = PromptBuilder::from_lines("t", ["Hello <NAME>", "Code: <FUNCTION>"]);
        let out = builder.build(&params(&[("NAME", "X"), ("FUNCTION", "int y;")]));
        assert_eq!(out, "Hello X\nCode: int y;");
    }

    #[test]
    fn test_structured_template_splits_system_and_user() -> Result<()> {
        let doc = json!({
            "system_prompt": ["You are careful.", "Answer in JSON."],
            "user_prompt": ["Type: <PROJECT_TYPE>", "<FUNCTION>"]
        });
        let builder = PromptBuilder::from_document("doc", &doc, TemplateSection::Whole)?;
        assert_eq!(builder.system_prompt(), Some("You are careful.\nAnswer in JSON."));
        let out = builder.build(&params(&[("PROJECT_TYPE", "Java"), ("FUNCTION", "void f() {}")]));
        assert_eq!(out, "Type: Java\nvoid f() {}");
        Ok(())
    }

    #[test]
    fn test_object_user_prompt_renders_as_json_text() -> Result<()> {
        let doc = json!({"user_prompt": {"task": "analyze <FUNCTION>"}});
        let builder = PromptBuilder::from_document("doc", &doc, TemplateSection::Whole)?;
        let out = builder.build(&params(&[("FUNCTION", "f")]));
        assert_eq!(out, r#"{"task":"analyze f"}"#);
        Ok(())
    }

    #[test]
    fn test_keyed_section_selects_list() -> Result<()> {
        let doc = json!({"meta_prompts": ["Route <SRC_NAME>"], "other": ["x"]});
        let builder =
            PromptBuilder::from_document("doc", &doc, TemplateSection::Key("meta_prompts"))?;
        assert_eq!(builder.build(&params(&[("SRC_NAME", "/users")])), "Route /users");
        assert!(builder.system_prompt().is_none());
        Ok(())
    }

    #[test]
    fn test_missing_section_is_a_load_error() {
        let doc = json!({"user_prompt": ["x"]});
        let result = PromptBuilder::from_document("doc", &doc, TemplateSection::Key("nope"));
        assert!(matches!(result, Err(Error::TemplateLoad { .. })));
    }

    #[test]
    fn test_sequential_mode_is_selectable() {
        let builder = PromptBuilder::from_lines("t", ["<A>"]).with_mode(SubstitutionMode::Sequential);
        assert_eq!(builder.build(&params(&[("A", "<B>"), ("B", "b")])), "b");
    }

    #[test]
    fn test_builtin_analysis_template_has_all_placeholders() -> Result<()> {
        let builder = PromptBuilder::load(
            &TemplateStore::builtin(),
            crate::constants::ANALYSIS_TEMPLATE,
            TemplateSection::Whole,
        )?;
        let out = builder.build(&params(&[
            ("PROJECT_TYPE", "Java"),
            ("FUNCTION", "BODY"),
            ("CONTEXT_INFO", ""),
            ("SRC_NAME", "/api/users"),
            ("SRC_LINE", "A.java:L1-L2"),
            ("HTTP_METHOD", "GET"),
        ]));
        assert!(!out.contains("<FUNCTION>"));
        assert!(!out.contains("<CONTEXT_INFO>"));
        assert!(out.contains("BODY"));
        assert!(builder.system_prompt().is_some());
        Ok(())
    }
}
