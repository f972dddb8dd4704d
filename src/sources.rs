// src/sources.rs

//! Ordered include/exclude source pattern lists.
//!
//! A list mixes include and `!`-prefixed exclude patterns, all relative to the
//! project root. Each include pattern has a *base*: the directory prefix before
//! its first glob meta character. Outputs are placed at
//! `destination + path relative to base`, so `src/js/**/vendors/*.js` keeps
//! the `vendors/` level when copied.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::watch::path_utils::slash_path;

const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// A compiled include pattern with its static base directory.
#[derive(Clone)]
struct Include {
    pattern: String,
    base: PathBuf,
    matcher: GlobMatcher,
}

/// Compiled include/exclude list.
#[derive(Clone)]
pub struct SourceSet {
    includes: Vec<Include>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSet")
            .field(
                "includes",
                &self.includes.iter().map(|i| &i.pattern).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// One matched source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (root-joined) path used for reading.
    pub path: PathBuf,
    /// Path relative to the include pattern's base; the output layout.
    pub rel: PathBuf,
}

impl SourceSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut includes = Vec::new();
        let mut excludes = GlobSetBuilder::new();
        let mut has_excludes = false;

        for raw in patterns {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                return Err(SitepipeError::ConfigError(
                    "empty glob pattern".to_string(),
                ));
            }

            if let Some(neg) = raw.strip_prefix('!') {
                let pattern = normalize_pattern(neg);
                excludes.add(compile(&pattern)?);
                has_excludes = true;
            } else {
                let pattern = normalize_pattern(raw);
                let matcher = compile(&pattern)?.compile_matcher();
                includes.push(Include {
                    base: glob_base(&pattern),
                    pattern,
                    matcher,
                });
            }
        }

        let exclude = if has_excludes {
            Some(excludes.build().map_err(|source| SitepipeError::InvalidGlob {
                pattern: patterns
                    .iter()
                    .map(|p| p.as_ref().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                source,
            })?)
        } else {
            None
        };

        Ok(Self { includes, exclude })
    }

    /// True if `rel_path` (relative to the project root, `/`-separated) is
    /// selected by this list.
    pub fn matches(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.trim_start_matches("./");
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        self.includes.iter().any(|inc| inc.matcher.is_match(rel_path))
    }

    /// Base directories of the include patterns, in declaration order.
    pub fn bases(&self) -> Vec<&Path> {
        self.includes.iter().map(|inc| inc.base.as_path()).collect()
    }

    /// Collect all files under `root` selected by this list.
    ///
    /// Each include is walked from its own base; a file matched by several
    /// includes is reported once, for the first one. Missing bases contribute
    /// nothing. The result is sorted by `rel`.
    pub fn collect(&self, fs: &dyn FileSystem, root: &Path) -> anyhow::Result<Vec<SourceFile>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for inc in self.includes.iter() {
            let base_abs = root.join(&inc.base);

            if fs.is_file(&base_abs) {
                self.consider(root, &base_abs, inc, &mut seen, &mut files);
                continue;
            }
            if !fs.is_dir(&base_abs) {
                continue;
            }

            let mut stack = vec![base_abs];
            while let Some(dir) = stack.pop() {
                for path in fs.read_dir(&dir)? {
                    if fs.is_dir(&path) {
                        stack.push(path);
                    } else if fs.is_file(&path) {
                        self.consider(root, &path, inc, &mut seen, &mut files);
                    }
                }
            }
        }

        files.sort_by(|a, b| a.rel.cmp(&b.rel));
        Ok(files)
    }

    fn consider(
        &self,
        root: &Path,
        path: &Path,
        inc: &Include,
        seen: &mut HashSet<PathBuf>,
        files: &mut Vec<SourceFile>,
    ) {
        let Ok(rel_root) = path.strip_prefix(root) else {
            return;
        };
        let rel_str = slash_path(rel_root);
        if !inc.matcher.is_match(&rel_str) {
            return;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(&rel_str) {
                return;
            }
        }
        if !seen.insert(path.to_path_buf()) {
            return;
        }

        let rel = rel_root
            .strip_prefix(&inc.base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| rel_root.to_path_buf());
        files.push(SourceFile {
            path: path.to_path_buf(),
            rel,
        });
    }
}

fn normalize_pattern(pattern: &str) -> String {
    pattern.trim().trim_start_matches("./").replace('\\', "/")
}

fn compile(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| SitepipeError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })
}

/// Static directory prefix of a pattern.
///
/// `src/images/**/*.png` → `src/images`; a literal file path yields its parent.
pub fn glob_base(pattern: &str) -> PathBuf {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal = parts
        .iter()
        .take_while(|part| !part.contains(GLOB_META))
        .count();

    let take = if literal == parts.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };

    parts[..take]
        .iter()
        .filter(|p| !p.is_empty() && **p != ".")
        .collect::<PathBuf>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn base_stops_at_first_meta_component() {
        assert_eq!(glob_base("src/images/**/*.{jpg,png}"), PathBuf::from("src/images"));
        assert_eq!(glob_base("src/js/**/vendors/*.js"), PathBuf::from("src/js"));
        assert_eq!(glob_base("src/css/vendors/*.css"), PathBuf::from("src/css/vendors"));
        assert_eq!(glob_base("src/main.js"), PathBuf::from("src"));
        assert_eq!(glob_base("*.js"), PathBuf::new());
    }

    #[test]
    fn star_does_not_cross_directories() {
        let set = SourceSet::new(&["src/*.js"]).unwrap();
        assert!(set.matches("src/app.js"));
        assert!(!set.matches("src/lib/app.js"));
    }

    #[test]
    fn negated_entries_exclude() {
        let set = SourceSet::new(&["src/js/**/*.js", "!src/js/**/vendors/*.js"]).unwrap();
        assert!(set.matches("src/js/app.js"));
        assert!(set.matches("src/js/pages/home.js"));
        assert!(!set.matches("src/js/vendors/jquery.js"));
        assert!(!set.matches("src/js/pages/vendors/slider.js"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = SourceSet::new(&["src/[.js"]).unwrap_err();
        assert!(matches!(err, SitepipeError::InvalidGlob { .. }));
    }

    #[test]
    fn collect_reports_paths_relative_to_base() {
        let fs = MockFileSystem::new();
        let root = Path::new("/proj");
        fs.add_file("/proj/src/js/app.js", "a");
        fs.add_file("/proj/src/js/vendors/lib.js", "b");
        fs.add_file("/proj/src/js/pages/home.js", "c");
        fs.add_file("/proj/src/js/notes.txt", "d");

        let set = SourceSet::new(&["src/js/**/*.js", "!src/js/**/vendors/*.js"]).unwrap();
        let rels: Vec<_> = set
            .collect(&fs, root)
            .unwrap()
            .into_iter()
            .map(|f| f.rel)
            .collect();
        assert_eq!(rels, vec![PathBuf::from("app.js"), PathBuf::from("pages/home.js")]);

        let vendors = SourceSet::new(&["src/js/**/vendors/*.js"]).unwrap();
        let rels: Vec<_> = vendors
            .collect(&fs, root)
            .unwrap()
            .into_iter()
            .map(|f| f.rel)
            .collect();
        assert_eq!(rels, vec![PathBuf::from("vendors/lib.js")]);
    }

    #[test]
    fn missing_base_yields_nothing() {
        let fs = MockFileSystem::new();
        let set = SourceSet::new(&["src/css/vendors/*.css"]).unwrap();
        assert!(set.collect(&fs, Path::new("/proj")).unwrap().is_empty());
    }
}
