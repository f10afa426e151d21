/*!
 * Utility functions for code2md
 */

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

/// Name of the directory (under the project root) receiving documents and logs
pub const OUTPUT_DIR_NAME: &str = "codereview";

/// Project name used when the root has no usable file name
pub const FALLBACK_PROJECT_NAME: &str = "CodeExport";

/// Derive a link-safe anchor from a relative display path.
///
/// Every character outside `[A-Za-z0-9]` becomes `-`, then the result is
/// lowercased. Distinct paths may collide (`a-b.rs` and `a_b.rs`).
pub fn anchor(relative: &str) -> String {
    relative
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .to_lowercase()
}

/// Lowercased extension of `path` without the dot, empty when there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Normalize a user-supplied extension: trim, drop a leading dot, lowercase
pub fn normalize_extension(raw: &str) -> Option<String> {
    let ext = raw.trim().trim_start_matches('.').to_lowercase();
    (!ext.is_empty()).then_some(ext)
}

/// Normalize a user-supplied ignored directory to its first path segment
pub fn normalize_ignored_dir(raw: &str) -> Option<String> {
    raw.trim()
        .split(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Forward-slash path of `path` relative to `root`, or its file name if it
/// does not live under `root`
pub fn relative_display_path(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => to_forward_slashes(rel),
        _ => path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| to_forward_slashes(path)),
    }
}

/// Join path components with `/` whatever the platform separator is
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Project name derived from the root directory's name
pub fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_string())
}

/// Title shown in the document header: word characters, spaces and dashes only
pub fn document_title(project_name: &str) -> String {
    project_name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect()
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Directories skipped by the denylist when nothing else is configured
pub static DEFAULT_IGNORED_DIRS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "node_modules",
        ".git",
        ".vs",
        ".idea",
        "bin",
        "obj",
        "dist",
        "build",
        "target",
        "venv",
        ".venv",
        "__pycache__",
        "coverage",
        "logs",
        "log",
    ]
});

/// Extensions bundled when the caller does not choose any
pub static DEFAULT_EXTENSIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "ts", "js", "jsx", "tsx", "py", "java", "cpp", "hpp", "c", "h", "cs", "go", "rs", "php",
        "rb", "swift", "kt", "html", "css", "scss", "json", "yaml", "yml", "md", "txt", "xml",
        "sql", "sh", "bash", "ps1", "mk",
    ]
});

/// Extension to fenced-block language identifier
pub static LANGUAGE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ts", "typescript"),
        ("js", "javascript"),
        ("py", "python"),
        ("cpp", "cpp"),
        ("java", "java"),
        ("cs", "csharp"),
        ("rb", "ruby"),
        ("swift", "swift"),
        ("kt", "kotlin"),
        ("go", "go"),
        ("php", "php"),
        ("html", "html"),
        ("css", "css"),
        ("json", "json"),
        ("md", "markdown"),
        ("rs", "rust"),
        ("toml", "toml"),
        ("sql", "sql"),
        ("xml", "xml"),
        ("bash", "bash"),
        ("ps1", "powershell"),
        ("mk", "mk"),
    ])
});
