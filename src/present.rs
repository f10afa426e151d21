/*!
 * Hand the finished document to the user
 *
 * The default presenter prints the document path. The clipboard presenter
 * pipes the document into the first clipboard command found on the system.
 */

use std::env;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use tracing::debug;

use crate::bail;
use crate::error::{Code2MdError, Result};

/// Something that shows a finished document to the user
pub trait Presenter {
    /// Present the document at `document` whose text is `contents`
    fn present(&self, document: &Path, contents: &str) -> Result<()>;
}

/// Prints the document path to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct PathPresenter;

impl Presenter for PathPresenter {
    fn present(&self, document: &Path, _contents: &str) -> Result<()> {
        println!("{}", document.display());
        Ok(())
    }
}

/// Available clipboard providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipboardProvider {
    MacOS,
    Wayland,
    Xsel,
    Xclip,
    Wsl,
    Termux,
    Tmux,
}

impl ClipboardProvider {
    fn command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::MacOS => ("pbcopy", &[]),
            Self::Wayland => ("wl-copy", &[]),
            Self::Xsel => ("xsel", &["-b", "-i"]),
            Self::Xclip => ("xclip", &["-selection", "clipboard", "-in"]),
            Self::Wsl => ("clip.exe", &[]),
            Self::Termux => ("termux-clipboard-set", &[]),
            Self::Tmux => ("tmux", &["load-buffer", "-w", "-"]),
        }
    }
}

/// Copies the document text to the system clipboard
#[derive(Debug, Clone)]
pub struct ClipboardPresenter {
    command: Option<(String, Vec<String>)>,
}

impl ClipboardPresenter {
    /// Detect the clipboard command for this system
    pub fn detect() -> Self {
        let command = determine_clipboard_providers().first().map(|p| {
            let (cmd, args) = p.command();
            (cmd.to_string(), args.iter().map(|a| a.to_string()).collect())
        });
        debug!(command = ?command, "Clipboard provider");
        Self { command }
    }

    /// Use an explicit command that reads the text from stdin
    pub fn with_command<I, S>(cmd: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: Some((cmd.into(), args.into_iter().map(Into::into).collect())),
        }
    }
}

impl Presenter for ClipboardPresenter {
    fn present(&self, document: &Path, contents: &str) -> Result<()> {
        let Some((cmd, args)) = &self.command else {
            bail!(Clipboard, "No suitable clipboard mechanism found");
        };

        execute_clipboard_command(cmd, args, contents)?;
        println!("{} (copied to clipboard)", document.display());
        Ok(())
    }
}

fn execute_clipboard_command(cmd: &str, args: &[String], text: &str) -> Result<()> {
    let failed = |what: &str| Code2MdError::Clipboard(format!("Failed to {} {}", what, cmd));

    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .map_err(|_| failed("spawn"))?;

    let mut stdin = child.stdin.take().ok_or_else(|| failed("open stdin for"))?;
    stdin
        .write_all(text.as_bytes())
        .map_err(|_| failed("write to"))?;
    // Close stdin so the command sees EOF
    drop(stdin);

    let status = child.wait().map_err(|_| failed("wait for"))?;
    if !status.success() {
        bail!(Clipboard, "{} exited with status: {}", cmd, status);
    }
    Ok(())
}

/// Check if a command exists on the PATH
pub fn command_exists(command: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(command).is_file()))
        .unwrap_or(false)
}

static PLATFORM: OnceLock<&'static str> = OnceLock::new();

fn get_platform() -> &'static str {
    PLATFORM.get_or_init(|| {
        if cfg!(target_os = "macos") {
            "macos"
        } else if cfg!(target_os = "windows") {
            "windows"
        } else if cfg!(target_os = "android") {
            "android"
        } else if cfg!(target_os = "linux") {
            if env::var("WSL_DISTRO_NAME").is_ok() {
                "wsl"
            } else {
                "linux"
            }
        } else {
            "unknown"
        }
    })
}

/// Providers to try, most preferred first
fn determine_clipboard_providers() -> Vec<ClipboardProvider> {
    let candidates: &[ClipboardProvider] = match get_platform() {
        "macos" => &[ClipboardProvider::MacOS],
        "windows" | "wsl" => &[ClipboardProvider::Wsl],
        "linux" => &[
            ClipboardProvider::Wayland,
            ClipboardProvider::Xsel,
            ClipboardProvider::Xclip,
        ],
        "android" => &[ClipboardProvider::Termux],
        _ => &[],
    };

    let mut providers: Vec<_> = candidates
        .iter()
        .copied()
        .filter(|p| command_exists(p.command().0))
        .collect();

    // Inside a tmux session the tmux buffer is a usable fallback
    if env::var("TMUX").is_ok() && command_exists("tmux") {
        providers.push(ClipboardProvider::Tmux);
    }

    providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_path_presenter() {
        assert!(PathPresenter
            .present(Path::new("codereview/doc.md"), "# Project")
            .is_ok());
    }

    #[test]
    fn test_command_exists() {
        assert!(!command_exists("definitely-not-a-real-command-xyz"));
    }

    #[test]
    fn test_missing_provider_is_clipboard_error() {
        let presenter = ClipboardPresenter { command: None };
        let result = presenter.present(Path::new("doc.md"), "text");
        assert!(matches!(result, Err(Code2MdError::Clipboard(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_receives_document_text() -> Result<()> {
        let temp = tempdir()?;
        let sink = temp.path().join("clipboard.txt");
        let script = format!("cat > '{}'", sink.display());
        let presenter = ClipboardPresenter::with_command("sh", ["-c", script.as_str()]);

        presenter.present(Path::new("doc.md"), "# Project: demo\n")?;

        assert_eq!(fs::read_to_string(&sink)?, "# Project: demo\n");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command() {
        let presenter = ClipboardPresenter::with_command("sh", ["-c", "cat > /dev/null; exit 3"]);
        match presenter.present(Path::new("doc.md"), "text") {
            Err(Code2MdError::Clipboard(msg)) => assert!(msg.contains("exited with status")),
            other => panic!("unexpected result: {:?}", other.is_ok()),
        }
    }
}
