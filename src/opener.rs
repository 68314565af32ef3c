//! Hand-off of a URL or file path to the host's default application.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::error::{Result, WebSearchError};
use crate::platform::Platform;

/// Something to open: a URL (anything with a `scheme://` prefix) or a
/// local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    Url(String),
    Path(PathBuf),
}

impl OpenTarget {
    pub fn parse(target: &str) -> Self {
        let looks_like_url = target
            .split_once("://")
            .map(|(scheme, _)| {
                !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            })
            .unwrap_or(false);

        if looks_like_url {
            OpenTarget::Url(target.to_string())
        } else {
            OpenTarget::Path(PathBuf::from(target))
        }
    }

    /// `http://` or `https://` URLs, the only targets a browser override
    /// applies to.
    pub fn is_web_url(&self) -> bool {
        match self {
            OpenTarget::Url(url) => url.starts_with("http://") || url.starts_with("https://"),
            OpenTarget::Path(_) => false,
        }
    }

    fn as_arg(&self) -> String {
        match self {
            OpenTarget::Url(url) => url.clone(),
            OpenTarget::Path(path) => path.to_string_lossy().into_owned(),
        }
    }
}

impl fmt::Display for OpenTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenTarget::Url(url) => write!(f, "{url}"),
            OpenTarget::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for OpenCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Process-spawning seam.
pub trait Launcher {
    /// Starts `command` without waiting for it or reading its output.
    /// Only failure to start is reported.
    fn launch_detached(&self, command: &OpenCommand) -> Result<()>;

    /// Runs `command` to completion and returns its trimmed stdout. A
    /// non-zero exit status is an error.
    fn capture(&self, command: &OpenCommand) -> Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch_detached(&self, command: &OpenCommand) -> Result<()> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group, so a hangup sent to the terminal's foreground
        // group does not reach the browser.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|source| WebSearchError::Launch {
            program: command.program.clone(),
            source,
        })?;
        debug!("Launched {} as pid {}", command.program, child.id());
        // Dropping the handle leaves the child running.
        drop(child);
        Ok(())
    }

    fn capture(&self, command: &OpenCommand) -> Result<String> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| WebSearchError::Launch {
                program: command.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WebSearchError::Launch {
                program: command.program.clone(),
                source: io::Error::other(format!("{} ({})", stderr.trim(), output.status)),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Prints the command it would launch instead of launching it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunLauncher;

impl Launcher for DryRunLauncher {
    fn launch_detached(&self, command: &OpenCommand) -> Result<()> {
        println!("{command}");
        Ok(())
    }

    fn capture(&self, command: &OpenCommand) -> Result<String> {
        SystemLauncher.capture(command)
    }
}

/// Host facts the opener dispatches on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInfo {
    /// Shell-style OS type, e.g. `linux-gnu` or `darwin23.0`.
    pub os_type: String,
    pub kernel_release: Option<String>,
    /// Program used for web URLs instead of the platform opener.
    pub browser: Option<String>,
}

pub struct Opener {
    launcher: Box<dyn Launcher>,
    host: HostInfo,
}

impl Opener {
    pub fn new(launcher: Box<dyn Launcher>, host: HostInfo) -> Self {
        Self { launcher, host }
    }

    /// Resolves the command that opens `target` on this host.
    pub fn command_for(&self, target: &OpenTarget) -> Result<OpenCommand> {
        if let Some(browser) = self.browser_override(target) {
            debug!("Using browser override {browser}");
            return Ok(OpenCommand {
                program: browser.to_string(),
                args: vec![target.as_arg()],
            });
        }

        let platform = Platform::detect(&self.host.os_type, self.host.kernel_release.as_deref())?;
        debug!("Detected platform {platform} from OS type {}", self.host.os_type);

        let arg = match (platform, target) {
            (Platform::Wsl, OpenTarget::Path(path)) if path.exists() => self.windows_path(path)?,
            // Both go through `cmd /c start`.
            (Platform::Wsl | Platform::Msys, OpenTarget::Url(_)) => escape_for_cmd(&target.as_arg()),
            _ => target.as_arg(),
        };

        let (program, leading) = platform.opener();
        let mut args: Vec<String> = leading.iter().map(|a| a.to_string()).collect();
        args.push(arg);
        Ok(OpenCommand {
            program: program.to_string(),
            args,
        })
    }

    /// Resolves and launches. Returns the command that was started.
    pub fn open(&self, target: &OpenTarget) -> Result<OpenCommand> {
        let command = self.command_for(target)?;
        info!("Opening {target} with {}", command.program);
        self.launcher.launch_detached(&command)?;
        Ok(command)
    }

    fn browser_override(&self, target: &OpenTarget) -> Option<&str> {
        self.host
            .browser
            .as_deref()
            .filter(|browser| !browser.trim().is_empty())
            .filter(|_| target.is_web_url())
    }

    fn windows_path(&self, path: &Path) -> Result<String> {
        let absolute = std::path::absolute(path).map_err(|e| WebSearchError::PathConversion {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let command = OpenCommand {
            program: "wslpath".to_string(),
            args: vec!["-w".to_string(), absolute.to_string_lossy().into_owned()],
        };
        let converted = self
            .launcher
            .capture(&command)
            .map_err(|e| WebSearchError::PathConversion {
                path: absolute.clone(),
                reason: e.to_string(),
            })?;

        if converted.is_empty() {
            return Err(WebSearchError::PathConversion {
                path: absolute,
                reason: "wslpath returned nothing".to_string(),
            });
        }
        Ok(converted)
    }
}

/// Caret-escapes the characters `cmd.exe` would otherwise treat as
/// operators, so `start` receives the whole URL.
pub fn escape_for_cmd(url: &str) -> String {
    let mut escaped = String::with_capacity(url.len());
    for c in url.chars() {
        if matches!(c, '&' | '|' | '(' | ')' | '<' | '>' | '^') {
            escaped.push('^');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Records launches; `capture` answers with a canned reply.
    #[derive(Clone, Default)]
    pub struct RecordingLauncher {
        pub launched: Rc<RefCell<Vec<OpenCommand>>>,
        pub captured: Rc<RefCell<Vec<OpenCommand>>>,
        pub capture_reply: Option<String>,
    }

    impl Launcher for RecordingLauncher {
        fn launch_detached(&self, command: &OpenCommand) -> Result<()> {
            self.launched.borrow_mut().push(command.clone());
            Ok(())
        }

        fn capture(&self, command: &OpenCommand) -> Result<String> {
            self.captured.borrow_mut().push(command.clone());
            self.capture_reply.clone().ok_or_else(|| WebSearchError::Launch {
                program: command.program.clone(),
                source: io::Error::other("exit status: 1"),
            })
        }
    }

    pub fn host(os_type: &str, kernel_release: Option<&str>, browser: Option<&str>) -> HostInfo {
        HostInfo {
            os_type: os_type.to_string(),
            kernel_release: kernel_release.map(str::to_string),
            browser: browser.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{host, RecordingLauncher};
    use super::*;
    use tempfile::NamedTempFile;

    const WSL_KERNEL: &str = "5.15.153.1-microsoft-standard-WSL2";

    fn opener(launcher: &RecordingLauncher, host: HostInfo) -> Opener {
        Opener::new(Box::new(launcher.clone()), host)
    }

    fn url(s: &str) -> OpenTarget {
        OpenTarget::Url(s.to_string())
    }

    #[test]
    fn parse_distinguishes_urls_and_paths() {
        assert_eq!(OpenTarget::parse("https://example.com"), url("https://example.com"));
        assert_eq!(OpenTarget::parse("ftp://example.com"), url("ftp://example.com"));
        assert_eq!(
            OpenTarget::parse("notes/todo.md"),
            OpenTarget::Path(PathBuf::from("notes/todo.md"))
        );
        assert!(url("https://example.com").is_web_url());
        assert!(url("http://example.com").is_web_url());
        assert!(!url("ftp://example.com").is_web_url());
    }

    #[test]
    fn native_linux_uses_xdg_open() {
        let launcher = RecordingLauncher::default();
        let command = opener(&launcher, host("linux-gnu", Some("6.8.0"), None))
            .open(&url("https://www.google.com"))
            .unwrap();

        assert_eq!(command.program, "xdg-open");
        assert_eq!(command.args, vec!["https://www.google.com"]);
        assert_eq!(launcher.launched.borrow().as_slice(), &[command]);
    }

    #[test]
    fn macos_and_cygwin_use_native_openers() {
        let launcher = RecordingLauncher::default();
        let target = url("https://example.com");
        let mac = opener(&launcher, host("darwin23.0", None, None)).command_for(&target).unwrap();
        let cyg = opener(&launcher, host("cygwin", None, None)).command_for(&target).unwrap();
        assert_eq!(mac.program, "open");
        assert_eq!(cyg.program, "cygstart");
    }

    #[test]
    fn msys_uses_start() {
        let launcher = RecordingLauncher::default();
        let command = opener(&launcher, host("msys", None, None))
            .command_for(&url("https://example.com/?q=a&b"))
            .unwrap();
        assert_eq!(command.program, "cmd");
        assert_eq!(command.args, vec!["/c", "start", "", "https://example.com/?q=a^&b"]);
    }

    #[test]
    fn every_url_handed_to_cmd_is_escaped() {
        let launcher = RecordingLauncher::default();
        let wsl = opener(&launcher, host("linux-gnu", Some(WSL_KERNEL), None))
            .command_for(&url("ftp://example.com/?a&b"))
            .unwrap();
        let win32 = opener(&launcher, host("win32", None, None))
            .command_for(&url("ftp://example.com/?a&b"))
            .unwrap();
        assert_eq!(wsl.args.last().unwrap(), "ftp://example.com/?a^&b");
        assert_eq!(win32.args.last().unwrap(), "ftp://example.com/?a^&b");
    }

    #[test]
    fn wsl_escapes_cmd_metacharacters_in_urls() {
        let launcher = RecordingLauncher::default();
        let command = opener(&launcher, host("linux-gnu", Some(WSL_KERNEL), None))
            .command_for(&url("https://example.com/?q=a&b=(c)"))
            .unwrap();
        assert_eq!(command.program, "cmd.exe");
        assert_eq!(
            command.args,
            vec!["/c", "start", "", "https://example.com/?q=a^&b=^(c^)"]
        );
        assert!(launcher.captured.borrow().is_empty());
    }

    #[test]
    fn wsl_converts_existing_paths() {
        let file = NamedTempFile::new().unwrap();
        let launcher = RecordingLauncher {
            capture_reply: Some("C:\\Users\\me\\file.html".to_string()),
            ..Default::default()
        };
        let target = OpenTarget::Path(file.path().to_path_buf());
        let command = opener(&launcher, host("linux-gnu", Some(WSL_KERNEL), None))
            .command_for(&target)
            .unwrap();

        assert_eq!(command.args.last().unwrap(), "C:\\Users\\me\\file.html");
        let captured = launcher.captured.borrow();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].program, "wslpath");
        assert_eq!(captured[0].args[0], "-w");
    }

    #[test]
    fn wsl_path_conversion_failure_launches_nothing() {
        let file = NamedTempFile::new().unwrap();
        let launcher = RecordingLauncher::default();
        let err = opener(&launcher, host("linux-gnu", Some(WSL_KERNEL), None))
            .open(&OpenTarget::Path(file.path().to_path_buf()))
            .unwrap_err();

        assert!(matches!(err, WebSearchError::PathConversion { .. }));
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn wsl_leaves_missing_paths_alone() {
        let launcher = RecordingLauncher::default();
        let command = opener(&launcher, host("linux-gnu", Some(WSL_KERNEL), None))
            .command_for(&OpenTarget::Path(PathBuf::from("/definitely/not/here.txt")))
            .unwrap();
        assert_eq!(command.args.last().unwrap(), "/definitely/not/here.txt");
        assert!(launcher.captured.borrow().is_empty());
    }

    #[test]
    fn browser_override_applies_to_web_urls_only() {
        let launcher = RecordingLauncher::default();
        let opener = opener(&launcher, host("linux-gnu", None, Some("firefox")));

        let web = opener.command_for(&url("https://example.com")).unwrap();
        assert_eq!(web.program, "firefox");
        assert_eq!(web.args, vec!["https://example.com"]);

        let path = opener
            .command_for(&OpenTarget::Path(PathBuf::from("index.html")))
            .unwrap();
        assert_eq!(path.program, "xdg-open");
    }

    #[test]
    fn browser_override_bypasses_platform_resolution() {
        let launcher = RecordingLauncher::default();
        let command = opener(&launcher, host("plan9", None, Some("w3m")))
            .open(&url("http://example.com"))
            .unwrap();
        assert_eq!(command.program, "w3m");
    }

    #[test]
    fn unsupported_platform_launches_nothing() {
        let launcher = RecordingLauncher::default();
        let err = opener(&launcher, host("plan9", None, None))
            .open(&url("https://example.com"))
            .unwrap_err();

        assert_eq!(err.to_string(), "Platform plan9 not supported");
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn command_display_quotes_empty_and_spaced_args() {
        let command = OpenCommand {
            program: "cmd.exe".to_string(),
            args: vec!["/c".into(), "start".into(), "".into(), "C:\\My Files\\a.html".into()],
        };
        assert_eq!(command.to_string(), "cmd.exe /c start \"\" \"C:\\My Files\\a.html\"");
    }

    #[test]
    fn escape_for_cmd_prefixes_each_operator() {
        assert_eq!(escape_for_cmd("a&b|c<d>e^f"), "a^&b^|c^<d^>e^^f");
        assert_eq!(escape_for_cmd("plain"), "plain");
    }
}
