// src/detect.rs

//! Project type detection by filesystem signatures, and source file scanning.

use crate::constants::SOURCE_EXTENSIONS;
use crate::core_types::FileInfo;
use crate::errors::{io_error_with_path, Result};
use ignore::WalkBuilder;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use walkdir::WalkDir;

/// Marker file name or extension (with leading dot) → (language, tool).
///
/// Languages appear in priority order; the first detected one wins.
const SIGNATURES: &[(&str, &str, Option<&str>)] = &[
    // Java
    ("pom.xml", "Java", Some("Maven")),
    ("build.gradle", "Java", Some("Gradle")),
    ("build.gradle.kts", "Java", Some("Gradle")),
    ("settings.gradle", "Java", Some("Gradle")),
    (".java", "Java", None),
    // Python
    ("requirements.txt", "Python", Some("pip")),
    ("pyproject.toml", "Python", Some("poetry or PEP 517")),
    ("Pipfile", "Python", Some("pipenv")),
    ("manage.py", "Python", Some("Django")),
    ("setup.py", "Python", Some("setuptools")),
    (".ipynb", "Python", Some("Jupyter")),
    // JavaScript / TypeScript
    ("package.json", "JavaScript/TypeScript", Some("Node.js")),
    ("vite.config.js", "JavaScript/TypeScript", Some("Vite")),
    ("next.config.js", "JavaScript/TypeScript", Some("Next.js")),
    ("tsconfig.json", "TypeScript", None),
    // Others
    ("go.mod", "Go", Some("Modules")),
    ("Cargo.toml", "Rust", Some("Cargo")),
    ("composer.json", "PHP", Some("Composer")),
    ("artisan", "PHP", Some("Laravel")),
    ("Gemfile", "Ruby", Some("Bundler")),
    ("Rakefile", "Ruby", Some("Rake")),
    ("CMakeLists.txt", "C/C++", Some("CMake")),
    ("Makefile", "C/C++", Some("Make")),
];

fn priority(language: &str) -> usize {
    SIGNATURES
        .iter()
        .position(|(_, lang, _)| *lang == language)
        .unwrap_or(usize::MAX)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

/// Walks `root` and returns every detected language with the tools seen.
pub fn detect_languages(root: &Path) -> BTreeMap<String, BTreeSet<String>> {
    let mut detected: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy();
        let ext = entry
            .file_type()
            .is_file()
            .then(|| extension_of(entry.path()))
            .flatten();

        for (marker, language, tool) in SIGNATURES {
            if *marker == name || ext.as_deref() == Some(*marker) {
                let tools = detected.entry(language.to_string()).or_default();
                if let Some(tool) = tool {
                    tools.insert(tool.to_string());
                }
            }
        }
    }
    detected
}

/// Picks the project type for `root`: the highest-priority detected
/// language, or `Unknown`.
pub fn detect_project_type(root: &Path) -> String {
    let detected = detect_languages(root);
    if detected.len() > 1 {
        log::warn!("Multiple framework types detected: {:?}", detected);
    } else {
        log::info!("Framework type: {:?}", detected);
    }
    detected
        .keys()
        .min_by_key(|lang| priority(lang))
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Lists the source files under `root`, skipping hidden files and directories.
pub fn scan_source_files(root: &Path) -> Result<Vec<FileInfo>> {
    let mut walker = WalkBuilder::new(root);
    walker
        .standard_filters(false)
        .hidden(true)
        .require_git(false);

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let Some(file_type) = extension_of(path) else {
            continue;
        };
        if !SOURCE_EXTENSIONS.contains(&file_type.as_str()) {
            continue;
        }
        let size_bytes = entry
            .metadata()
            .map_err(|e| {
                io_error_with_path(
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("metadata unavailable")),
                    path,
                )
            })?
            .len();
        debug!("Found source file: {}", path.display());
        files.push(FileInfo {
            path: path.to_path_buf(),
            size_bytes,
            file_type,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_detects_java_by_build_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("pom.xml"), "<project/>")?;
        assert_eq!(detect_project_type(dir.path()), "Java");
        let tools = &detect_languages(dir.path())["Java"];
        assert!(tools.contains("Maven"));
        Ok(())
    }

    #[test]
    fn test_java_wins_over_other_languages() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("package.json"), "{}")?;
        fs::write(dir.path().join("requirements.txt"), "")?;
        fs::create_dir_all(dir.path().join("src"))?;
        fs::write(dir.path().join("src/App.java"), "class App {}")?;
        assert_eq!(detect_languages(dir.path()).len(), 3);
        assert_eq!(detect_project_type(dir.path()), "Java");
        Ok(())
    }

    #[test]
    fn test_unknown_when_nothing_matches() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("notes.txt"), "hello")?;
        assert_eq!(detect_project_type(dir.path()), "Unknown");
        Ok(())
    }

    #[test]
    fn test_scan_keeps_sources_and_skips_hidden() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("src"))?;
        fs::create_dir_all(dir.path().join(".git"))?;
        fs::write(dir.path().join("src/App.java"), "class App {}")?;
        fs::write(dir.path().join("src/util.py"), "x = 1\n")?;
        fs::write(dir.path().join("README.md"), "# readme")?;
        fs::write(dir.path().join(".git/hook.py"), "")?;
        fs::write(dir.path().join(".hidden.java"), "")?;

        let files = scan_source_files(dir.path())?;
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![Path::new("src/App.java"), Path::new("src/util.py")]
        );
        assert_eq!(files[0].file_type, ".java");
        assert_eq!(files[0].size_bytes, 12);
        Ok(())
    }
}
