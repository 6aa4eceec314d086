// ABOUTME: Glob patterns over relative paths used to leave files out of archives.
// ABOUTME: Supports literal segments, '*' within a segment and '**' across segments.

use std::path::{Component, Path, PathBuf};

/// A `/`-separated glob matched against paths relative to the archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludePattern {
    segments: Vec<String>,
}

impl ExcludePattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            segments: pattern
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Whether `path` (relative) is excluded.
    ///
    /// A trailing `**` also matches the directory itself, so `node_modules/**`
    /// prunes the `node_modules` directory during a walk.
    pub fn matches(&self, path: &Path) -> bool {
        let parts: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        let segments: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        match_segments(&segments, &parts)
    }
}

/// `files` minus those whose path relative to `base` matches a pattern.
pub fn retain_included(base: &Path, files: Vec<PathBuf>, patterns: &[ExcludePattern]) -> Vec<PathBuf> {
    files
        .into_iter()
        .filter(|file| {
            let relative = file.strip_prefix(base).unwrap_or(file);
            !patterns.iter().any(|p| p.matches(relative))
        })
        .collect()
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|skip| match_segments(rest, &path[skip..])),
        Some((segment, rest)) => match path.split_first() {
            Some((part, tail)) => match_wildcard(segment, part) && match_segments(rest, tail),
            None => false,
        },
    }
}

fn match_wildcard(pattern: &str, text: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == text,
        Some((prefix, rest)) => {
            let Some(remaining) = text.strip_prefix(prefix) else {
                return false;
            };
            (0..=remaining.len())
                .filter(|i| remaining.is_char_boundary(*i))
                .any(|i| match_wildcard(rest, &remaining[i..]))
        }
    }
}
