// src/slicer.rs

//! Extracts the exact source text of an endpoint from its slice descriptor.
//!
//! A slice descriptor looks like `src/main/java/App.java:L12-L30`. Line
//! numbers are zero-indexed and the range is end-exclusive, matching what the
//! extractor writes, so `L12-L30` yields the 18 lines with indices 12..30.

use crate::errors::{io_error_with_path, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A parsed `<relative-path>:L<start>-L<end>` descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceDescriptor {
    pub relative_path: PathBuf,
    pub start: usize,
    pub end: usize,
}

impl SliceDescriptor {
    /// Parses a descriptor, splitting at the last `:` so drive letters and
    /// colons inside the path survive.
    ///
    /// # Errors
    /// `Error::SliceFormat` if the shape is wrong, a bound is negative or not
    /// an integer, or `start > end`.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let format_err = |reason: &str| Error::SliceFormat {
            descriptor: descriptor.to_string(),
            reason: reason.to_string(),
        };

        let (path, range) = descriptor
            .rsplit_once(':')
            .ok_or_else(|| format_err("missing ':' between path and line range"))?;
        if path.is_empty() {
            return Err(format_err("empty path"));
        }
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| format_err("line range must look like L<start>-L<end>"))?;

        let start = parse_bound(start).map_err(|reason| format_err(&reason))?;
        let end = parse_bound(end).map_err(|reason| format_err(&reason))?;

        if start > end {
            return Err(format_err("start line is greater than end line"));
        }

        Ok(Self {
            relative_path: PathBuf::from(path),
            start,
            end,
        })
    }

    /// Number of lines the descriptor covers.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` when the range is empty (`start == end`).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

fn parse_bound(raw: &str) -> std::result::Result<usize, String> {
    let digits = raw
        .trim()
        .strip_prefix('L')
        .ok_or_else(|| format!("bound '{raw}' is missing the 'L' prefix"))?;
    let value: i64 = digits
        .parse()
        .map_err(|_| format!("bound '{raw}' is not an integer"))?;
    usize::try_from(value).map_err(|_| format!("bound '{raw}' is negative"))
}

/// Reads the lines described by `descriptor` from the file under `root`.
///
/// Lines keep their terminators, so the result can be pasted back into a
/// prompt verbatim. Ranges extending past the end of the file are truncated.
///
/// # Errors
/// * `Error::SliceFormat` for malformed descriptors.
/// * `Error::SliceNotFound` if the resolved file does not exist.
/// * `Error::Io` if the file cannot be read as UTF-8.
///
/// # Examples
///
/// ```
/// use wfg::slicer::slice_code;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("A.java"), "l0\nl1\nl2\nl3\n")?;
/// assert_eq!(slice_code(dir.path(), "A.java:L1-L3")?, "l1\nl2\n");
/// # Ok(())
/// # }
/// ```
pub fn slice_code(root: &Path, descriptor: &str) -> Result<String> {
    let slice = SliceDescriptor::parse(descriptor)?;
    let path = root.join(&slice.relative_path);
    if !path.exists() {
        return Err(Error::SliceNotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(&path).map_err(|e| io_error_with_path(e, &path))?;

    Ok(content
        .split_inclusive('\n')
        .skip(slice.start)
        .take(slice.len())
        .collect())
}
