/*!
 * Ignore rules deciding which entries the scanner skips
 *
 * Two dialects are supported: a denylist of directory names (plus the
 * hidden-directory convention) and gitignore-style glob patterns with
 * last-match-wins precedence.
 */

use std::ffi::OsStr;
use std::path::Path;

use glob_match::glob_match;
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::Code2MdError;

/// Repository metadata directory, never bundled in glob mode
const GIT_DIR: &str = ".git";

/// Rules deciding whether a path relative to the project root is excluded
#[derive(Debug, Clone)]
pub enum IgnoreMatcher {
    /// Plain directory names; hidden directories are always skipped
    Denylist(DenyList),
    /// Gitignore-style patterns
    Glob(GlobRules),
}

/// Directory name denylist
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    names: Vec<String>,
}

/// Compiled gitignore-style patterns
#[derive(Debug, Clone)]
pub struct GlobRules {
    gitignore: Gitignore,
    patterns: Vec<String>,
    rejected: Vec<(String, String)>,
}

impl IgnoreMatcher {
    /// Build a denylist matcher from directory names
    pub fn denylist<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Denylist(DenyList {
            names: names.into_iter().map(Into::into).collect(),
        })
    }

    /// Build a glob matcher. Patterns are evaluated in the given order and
    /// unparsable ones are set aside (see [`IgnoreMatcher::rejected_patterns`]).
    pub fn glob<I, S>(root: &Path, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(root);
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            match builder.add_line(None, pattern) {
                Ok(_) => accepted.push(pattern.to_string()),
                Err(e) => rejected.push((pattern.to_string(), e.to_string())),
            }
        }

        let gitignore = match builder.build() {
            Ok(gitignore) => gitignore,
            Err(e) => {
                rejected.push((accepted.join(", "), e.to_string()));
                accepted.clear();
                Gitignore::empty()
            }
        };

        Self::Glob(GlobRules {
            gitignore,
            patterns: accepted,
            rejected,
        })
    }

    /// Whether `relative` (a path relative to the project root) is excluded
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        self.is_excluded_below(relative, 0, is_dir)
    }

    /// Like [`IgnoreMatcher::is_excluded`] for a walk that starts `origin_depth`
    /// segments below the root. Denylist names are only checked below the
    /// origin, so a hand-picked hidden or denylisted folder is still walked.
    /// Glob patterns always see the full root-relative path, and `.git`
    /// directories are skipped whatever the patterns say.
    pub fn is_excluded_below(&self, relative: &Path, origin_depth: usize, is_dir: bool) -> bool {
        match self {
            Self::Denylist(deny) => deny.is_excluded(relative, origin_depth, is_dir),
            Self::Glob(rules) => {
                (is_dir && relative.file_name() == Some(OsStr::new(GIT_DIR)))
                    || rules.gitignore.matched(relative, is_dir).is_ignore()
            }
        }
    }

    /// Patterns that failed to parse, as recoverable errors
    pub fn rejected_patterns(&self) -> Vec<Code2MdError> {
        match self {
            Self::Denylist(_) => Vec::new(),
            Self::Glob(rules) => rules
                .rejected
                .iter()
                .map(|(pattern, message)| Code2MdError::Pattern {
                    pattern: pattern.clone(),
                    message: message.clone(),
                })
                .collect(),
        }
    }

    /// Short description used in log records
    pub fn describe(&self) -> String {
        match self {
            Self::Denylist(deny) => format!("denylist [{}]", deny.names.join(", ")),
            Self::Glob(rules) => format!("glob patterns [{}]", rules.patterns.join(", ")),
        }
    }
}

impl DenyList {
    fn is_excluded(&self, relative: &Path, origin_depth: usize, is_dir: bool) -> bool {
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();

        // The final segment of a file path is the file name, never matched
        let end = if is_dir {
            segments.len()
        } else {
            segments.len().saturating_sub(1)
        };
        let dir_segments = &segments[origin_depth.min(end)..end];

        dir_segments.iter().any(|segment| self.matches_name(segment))
    }

    fn matches_name(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return true;
        }

        self.names
            .iter()
            .any(|entry| entry == name || glob_match(entry, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> &'static Path {
        Path::new("/project")
    }

    #[test]
    fn test_denylist_directory_segments() {
        let matcher = IgnoreMatcher::denylist(["node_modules", "target"]);

        assert!(matcher.is_excluded(Path::new("node_modules"), true));
        assert!(matcher.is_excluded(Path::new("web/node_modules/x.ts"), false));
        assert!(matcher.is_excluded(Path::new("target/debug"), true));
        assert!(!matcher.is_excluded(Path::new("src/main.rs"), false));
    }

    #[test]
    fn test_denylist_never_matches_file_names() {
        let matcher = IgnoreMatcher::denylist(["target"]);

        assert!(!matcher.is_excluded(Path::new("src/target"), false));
        assert!(!matcher.is_excluded(Path::new(".env.ts"), false));
    }

    #[test]
    fn test_denylist_hidden_directories() {
        let matcher = IgnoreMatcher::denylist(Vec::<String>::new());

        assert!(matcher.is_excluded(Path::new(".github"), true));
        assert!(matcher.is_excluded(Path::new(".github/workflows/ci.yml"), false));
        assert!(!matcher.is_excluded(Path::new("src/.hidden.ts"), false));
    }

    #[test]
    fn test_denylist_below_origin() {
        let matcher = IgnoreMatcher::denylist(["vendor"]);

        assert!(!matcher.is_excluded_below(Path::new(".github/workflows"), 1, true));
        assert!(!matcher.is_excluded_below(Path::new("vendor/lib/a.ts"), 1, false));
        assert!(matcher.is_excluded_below(Path::new("vendor/lib/.cache"), 1, true));
        assert!(matcher.is_excluded_below(Path::new("src/vendor"), 1, true));
        assert!(matcher.is_excluded(Path::new("vendor/lib/a.ts"), false));
    }

    #[test]
    fn test_denylist_glob_names() {
        let matcher = IgnoreMatcher::denylist(["*.egg-info"]);

        assert!(matcher.is_excluded(Path::new("pkg.egg-info"), true));
        assert!(!matcher.is_excluded(Path::new("pkg"), true));
    }

    #[test]
    fn test_glob_basic_patterns() {
        let matcher = IgnoreMatcher::glob(root(), ["*.log", "build/", "docs/**/draft.md"]);

        assert!(matcher.is_excluded(Path::new("debug.log"), false));
        assert!(matcher.is_excluded(Path::new("src/nested/debug.log"), false));
        assert!(matcher.is_excluded(Path::new("build"), true));
        assert!(matcher.is_excluded(Path::new("docs/a/b/draft.md"), false));
        assert!(!matcher.is_excluded(Path::new("src/main.rs"), false));
    }

    #[test]
    fn test_glob_trailing_slash_is_directory_only() {
        let matcher = IgnoreMatcher::glob(root(), ["build/"]);

        assert!(matcher.is_excluded(Path::new("build"), true));
        assert!(!matcher.is_excluded(Path::new("build"), false));
    }

    #[test]
    fn test_glob_negation_last_match_wins() {
        let matcher = IgnoreMatcher::glob(root(), ["*.log", "!keep.log"]);

        assert!(matcher.is_excluded(Path::new("other.log"), false));
        assert!(!matcher.is_excluded(Path::new("keep.log"), false));

        // Order matters: a later broad pattern overrides the negation
        let matcher = IgnoreMatcher::glob(root(), ["!keep.log", "*.log"]);
        assert!(matcher.is_excluded(Path::new("keep.log"), false));
    }

    #[test]
    fn test_glob_always_skips_git_directory() {
        let matcher = IgnoreMatcher::glob(root(), ["*.log"]);

        assert!(matcher.is_excluded(Path::new(".git"), true));
        assert!(matcher.is_excluded(Path::new("vendor/dep/.git"), true));
        assert!(!matcher.is_excluded(Path::new(".github"), true));
        assert!(!matcher.is_excluded(Path::new("node_modules"), true));
    }

    #[test]
    fn test_glob_invalid_pattern_is_skipped() {
        let matcher = IgnoreMatcher::glob(root(), ["src/[", "*.tmp"]);

        assert!(matcher.is_excluded(Path::new("a.tmp"), false));
        assert!(!matcher.is_excluded(Path::new("src/main.rs"), false));

        let rejected = matcher.rejected_patterns();
        assert_eq!(rejected.len(), 1);
        assert!(rejected[0].to_string().contains("src/["));
    }
}
