/*!
 * Configuration handling for code2md
 *
 * Values come from three layers, highest priority first: command-line
 * arguments, a JSON settings file (`--config` or `<root>/.code2md.json`),
 * and built-in defaults.
 */

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use clap_complete::Shell;
use serde::Deserialize;

use crate::error::Result;
use crate::ignore_rules::IgnoreMatcher;
use crate::types::FenceStyle;
use crate::utils::{
    normalize_extension, normalize_ignored_dir, project_name, DEFAULT_EXTENSIONS,
    DEFAULT_IGNORED_DIRS, LANGUAGE_MAP, OUTPUT_DIR_NAME,
};
use crate::{bail, ensure};

/// Settings file looked up in the project root when `--config` is absent
pub const SETTINGS_FILE_NAME: &str = ".code2md.json";

/// Command-line arguments for code2md
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "code2md",
    version = env!("CARGO_PKG_VERSION"),
    about = "Bundle source files into a single Markdown document for code review",
    long_about = "Collects the selected files (or every matching file under the project root) into one Markdown document with a table of contents and one fenced code block per file. Documents and run logs are written to <root>/codereview."
)]
pub struct Args {
    /// Files or directories to bundle (defaults to the whole project root)
    pub paths: Vec<String>,

    /// Project root; output goes to <root>/codereview
    #[clap(long, default_value = ".")]
    pub root: String,

    /// Comma-separated list of extensions to include when scanning directories
    #[clap(long, value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Comma-separated list of directory names to skip (denylist mode)
    #[clap(long, value_delimiter = ',')]
    pub ignore_dirs: Vec<String>,

    /// Comma-separated list of gitignore-style patterns. Switches to glob
    /// mode, which replaces the directory denylist and the hidden-directory
    /// rule; only `.git` is still skipped
    #[clap(long, value_delimiter = ',')]
    pub ignore_patterns: Vec<String>,

    /// Add the patterns of <root>/.gitignore (switches to glob mode)
    #[clap(long)]
    pub gitignore: bool,

    /// Path to a custom gitignore-style file (switches to glob mode)
    #[clap(long)]
    pub gitignore_path: Option<String>,

    /// JSON settings file
    #[clap(long)]
    pub config: Option<String>,

    /// Choose code fences that cannot be closed by the file content
    #[clap(long)]
    pub safe_fences: bool,

    /// Copy the finished document to the system clipboard
    #[clap(long)]
    pub clip: bool,

    /// Print run log records to stderr as they happen
    #[clap(short, long)]
    pub verbose: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Persisted user settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Directory names for denylist mode
    pub ignored_dirs: Option<Vec<String>>,
    /// Gitignore-style patterns; any pattern switches to glob mode
    pub ignore_patterns: Vec<String>,
    /// Extensions included when scanning directories
    pub default_extensions: Option<Vec<String>>,
    /// Extra or overriding extension to language entries
    pub language_map: HashMap<String, String>,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => bail!(Config, "Cannot read settings {}: {}", path.display(), e),
        };
        match serde_json::from_str(&text) {
            Ok(settings) => Ok(settings),
            Err(e) => bail!(Config, "Invalid settings {}: {}", path.display(), e),
        }
    }
}

/// Which ignore dialect a run uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreSource {
    /// Directory names
    Denylist(Vec<String>),
    /// Gitignore-style patterns in evaluation order
    Glob(Vec<String>),
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Canonical project root
    pub project_root: PathBuf,

    /// Project name (root directory name)
    pub project_name: String,

    /// Explicit selection; empty means scan the project root
    pub selection: Vec<PathBuf>,

    /// Normalized extensions used when scanning directories
    pub extensions: Vec<String>,

    /// Ignore rules
    pub ignore: IgnoreSource,

    /// Extension to fence language
    pub languages: HashMap<String, String>,

    /// Fence selection
    pub fence_style: FenceStyle,

    /// Copy output to clipboard
    pub clip: bool,
}

impl Config {
    /// Create configuration from command-line arguments, the settings file
    /// and defaults
    pub fn from_args(args: Args) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let project_root = match fs::canonicalize(cwd.join(&args.root)) {
            Ok(root) => root,
            Err(e) => bail!(Config, "Project root not found: {} ({})", args.root, e),
        };
        ensure!(
            project_root.is_dir(),
            Config,
            "Project root is not a directory: {}",
            project_root.display()
        );

        let settings = match &args.config {
            Some(path) => Settings::load(&cwd.join(path))?,
            None => {
                let default_path = project_root.join(SETTINGS_FILE_NAME);
                if default_path.is_file() {
                    Settings::load(&default_path)?
                } else {
                    Settings::default()
                }
            }
        };

        let extensions = if !args.extensions.is_empty() {
            normalize_extensions(args.extensions.as_slice())
        } else if let Some(exts) = &settings.default_extensions {
            normalize_extensions(exts.as_slice())
        } else {
            normalize_extensions(DEFAULT_EXTENSIONS.as_slice())
        };

        let mut patterns = Vec::new();
        if args.gitignore {
            let path = project_root.join(".gitignore");
            if path.is_file() {
                patterns.extend(read_pattern_file(&path)?);
            }
        }
        if let Some(path) = &args.gitignore_path {
            patterns.extend(read_pattern_file(&cwd.join(path))?);
        }
        patterns.extend(settings.ignore_patterns.iter().cloned());
        patterns.extend(args.ignore_patterns.iter().cloned());

        let ignore = if !patterns.is_empty() {
            IgnoreSource::Glob(patterns)
        } else {
            let dirs: Vec<String> = if !args.ignore_dirs.is_empty() {
                args.ignore_dirs.clone()
            } else if let Some(dirs) = &settings.ignored_dirs {
                dirs.clone()
            } else {
                DEFAULT_IGNORED_DIRS.iter().map(|d| d.to_string()).collect()
            };
            IgnoreSource::Denylist(
                dirs.iter()
                    .filter_map(|d| normalize_ignored_dir(d))
                    .collect(),
            )
        };

        let mut languages: HashMap<String, String> = LANGUAGE_MAP
            .iter()
            .map(|(ext, lang)| (ext.to_string(), lang.to_string()))
            .collect();
        for (ext, lang) in &settings.language_map {
            if let Some(ext) = normalize_extension(ext) {
                languages.insert(ext, lang.clone());
            }
        }

        let selection = args
            .paths
            .iter()
            .map(|p| {
                let path = cwd.join(p);
                fs::canonicalize(&path).unwrap_or(path)
            })
            .collect();

        Ok(Self {
            project_name: project_name(&project_root),
            project_root,
            selection,
            extensions,
            ignore,
            languages,
            fence_style: if args.safe_fences {
                FenceStyle::Adaptive
            } else {
                FenceStyle::Plain
            },
            clip: args.clip,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.project_root.is_dir(),
            Config,
            "Project root not found: {}",
            self.project_root.display()
        );
        ensure!(
            !self.extensions.is_empty() || !self.selection.is_empty(),
            Config,
            "No file extensions configured"
        );
        Ok(())
    }

    /// Build the ignore matcher for this run
    pub fn matcher(&self) -> IgnoreMatcher {
        match &self.ignore {
            IgnoreSource::Denylist(dirs) => IgnoreMatcher::denylist(dirs.iter().cloned()),
            IgnoreSource::Glob(patterns) => IgnoreMatcher::glob(&self.project_root, patterns),
        }
    }

    /// Directory receiving documents and logs
    pub fn output_dir(&self) -> PathBuf {
        self.project_root.join(OUTPUT_DIR_NAME)
    }
}

/// Normalize and de-duplicate extensions, keeping first occurrence order
fn normalize_extensions<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for ext in raw.iter().filter_map(|e| normalize_extension(e.as_ref())) {
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

fn read_pattern_file(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text.lines().map(str::to_string).collect()),
        Err(e) => bail!(Config, "Cannot read ignore file {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Code2MdError;
    use tempfile::tempdir;

    fn args(root: &Path, extra: &[&str]) -> Args {
        let mut argv = vec!["code2md", "--root"];
        let root = root.to_str().unwrap();
        argv.push(root);
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let temp = tempdir()?;
        let config = Config::from_args(args(temp.path(), &[]))?;
        config.validate()?;

        assert_eq!(config.project_root, fs::canonicalize(temp.path())?);
        assert!(config.extensions.contains(&"rs".to_string()));
        assert!(config.selection.is_empty());
        assert_eq!(config.fence_style, FenceStyle::Plain);
        match &config.ignore {
            IgnoreSource::Denylist(dirs) => assert!(dirs.contains(&"node_modules".to_string())),
            other => panic!("expected denylist, got {:?}", other),
        }
        assert_eq!(config.languages.get("py").map(String::as_str), Some("python"));
        Ok(())
    }

    #[test]
    fn test_cli_extensions_are_normalized() -> Result<()> {
        let temp = tempdir()?;
        let config = Config::from_args(args(temp.path(), &["--extensions", ".TS, py,,ts"]))?;

        assert_eq!(config.extensions, vec!["ts", "py"]);
        Ok(())
    }

    #[test]
    fn test_settings_file_in_root() -> Result<()> {
        let temp = tempdir()?;
        fs::write(
            temp.path().join(SETTINGS_FILE_NAME),
            r#"{
                "ignoredDirs": ["vendor/cache", "tmp"],
                "defaultExtensions": [".RS"],
                "languageMap": { ".vue": "vue" }
            }"#,
        )?;

        let config = Config::from_args(args(temp.path(), &[]))?;

        assert_eq!(config.extensions, vec!["rs"]);
        assert_eq!(
            config.ignore,
            IgnoreSource::Denylist(vec!["vendor".to_string(), "tmp".to_string()])
        );
        assert_eq!(config.languages.get("vue").map(String::as_str), Some("vue"));
        Ok(())
    }

    #[test]
    fn test_cli_overrides_settings() -> Result<()> {
        let temp = tempdir()?;
        fs::write(
            temp.path().join(SETTINGS_FILE_NAME),
            r#"{ "ignoredDirs": ["tmp"], "defaultExtensions": ["rs"] }"#,
        )?;

        let config = Config::from_args(args(
            temp.path(),
            &["--extensions", "go", "--ignore-dirs", "third_party"],
        ))?;

        assert_eq!(config.extensions, vec!["go"]);
        assert_eq!(
            config.ignore,
            IgnoreSource::Denylist(vec!["third_party".to_string()])
        );
        Ok(())
    }

    #[test]
    fn test_glob_mode_from_gitignore_and_patterns() -> Result<()> {
        let temp = tempdir()?;
        fs::write(temp.path().join(".gitignore"), "# build output\ntarget/\n")?;
        fs::write(
            temp.path().join(SETTINGS_FILE_NAME),
            r#"{ "ignorePatterns": ["*.log"] }"#,
        )?;

        let config = Config::from_args(args(
            temp.path(),
            &["--gitignore", "--ignore-patterns", "!keep.log"],
        ))?;

        assert_eq!(
            config.ignore,
            IgnoreSource::Glob(vec![
                "# build output".to_string(),
                "target/".to_string(),
                "*.log".to_string(),
                "!keep.log".to_string(),
            ])
        );
        let matcher = config.matcher();
        assert!(matcher.is_excluded(Path::new("target"), true));
        assert!(!matcher.is_excluded(Path::new("keep.log"), false));
        Ok(())
    }

    #[test]
    fn test_missing_root_is_configuration_error() {
        let temp = tempdir().unwrap();
        let result = Config::from_args(args(&temp.path().join("missing"), &[]));

        assert!(matches!(result, Err(Code2MdError::Config(_))));
    }

    #[test]
    fn test_invalid_settings_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE_NAME), "{ not json").unwrap();

        match Config::from_args(args(temp.path(), &[])) {
            Err(Code2MdError::Config(msg)) => assert!(msg.contains("Invalid settings")),
            other => panic!("unexpected result: {:?}", other.map(|c| c.project_root)),
        }
    }

    #[test]
    fn test_selection_and_flags() -> Result<()> {
        let temp = tempdir()?;
        fs::write(temp.path().join("a.rs"), "")?;
        let file = temp.path().join("a.rs");

        let config = Config::from_args(args(
            temp.path(),
            &[file.to_str().unwrap(), "--safe-fences", "--clip"],
        ))?;

        assert_eq!(config.selection, vec![fs::canonicalize(&file)?]);
        assert_eq!(config.fence_style, FenceStyle::Adaptive);
        assert!(config.clip);
        Ok(())
    }
}
