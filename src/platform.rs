use std::fmt;

use crate::error::{Result, WebSearchError};

/// Shell-style OS type variable (`darwin23.0`, `linux-gnu`, ...).
pub const OS_TYPE_ENV: &str = "OSTYPE";

/// Substring of the kernel release reported by Linux running on a Windows
/// host (`...-Microsoft` on WSL1, `...-microsoft-standard` on WSL2).
pub const WSL_KERNEL_MARKER: &str = "icrosoft";

/// Host family, as far as opening a URL is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Cygwin,
    Linux,
    /// Linux under Windows interop.
    Wsl,
    Msys,
}

impl Platform {
    /// Maps a shell-style OS type (`darwin23.0`, `linux-gnu`, `cygwin`,
    /// `msys`, `win32`) to a platform. `linux*` is refined to
    /// [`Platform::Wsl`] when `kernel_release` carries the interop marker.
    pub fn detect(os_type: &str, kernel_release: Option<&str>) -> Result<Self> {
        let platform = if os_type.starts_with("darwin") {
            Platform::MacOs
        } else if os_type.starts_with("cygwin") {
            Platform::Cygwin
        } else if os_type.starts_with("linux") {
            match kernel_release {
                Some(release) if release.contains(WSL_KERNEL_MARKER) => Platform::Wsl,
                _ => Platform::Linux,
            }
        } else if os_type.starts_with("msys") || os_type.starts_with("win32") {
            Platform::Msys
        } else {
            return Err(WebSearchError::UnsupportedPlatform {
                os: os_type.to_string(),
            });
        };
        Ok(platform)
    }

    /// Program and leading arguments of the "open with default application"
    /// command. The target is appended as the final argument.
    pub fn opener(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Platform::MacOs => ("open", &[]),
            Platform::Cygwin => ("cygstart", &[]),
            Platform::Linux => ("xdg-open", &[]),
            // The empty argument is the window title `start` would
            // otherwise take from a quoted target.
            Platform::Wsl => ("cmd.exe", &["/c", "start", ""]),
            Platform::Msys => ("cmd", &["/c", "start", ""]),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => write!(f, "macos"),
            Platform::Cygwin => write!(f, "cygwin"),
            Platform::Linux => write!(f, "linux"),
            Platform::Wsl => write!(f, "wsl"),
            Platform::Msys => write!(f, "msys"),
        }
    }
}

/// OS type to assume when `OSTYPE` is not exported, derived from the
/// compilation target.
pub fn default_os_type() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "linux" => "linux-gnu",
        "windows" => "msys",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_family() {
        assert_eq!(Platform::detect("darwin23.0", None).unwrap(), Platform::MacOs);
        assert_eq!(Platform::detect("cygwin", None).unwrap(), Platform::Cygwin);
        assert_eq!(Platform::detect("linux-gnu", Some("6.8.0-generic")).unwrap(), Platform::Linux);
        assert_eq!(Platform::detect("linux-gnu", None).unwrap(), Platform::Linux);
        assert_eq!(Platform::detect("msys", None).unwrap(), Platform::Msys);
        assert_eq!(Platform::detect("win32", None).unwrap(), Platform::Msys);
    }

    #[test]
    fn wsl_is_a_refinement_of_linux() {
        let wsl2 = Platform::detect("linux-gnu", Some("5.15.153.1-microsoft-standard-WSL2")).unwrap();
        let wsl1 = Platform::detect("linux", Some("4.4.0-19041-Microsoft")).unwrap();
        assert_eq!(wsl2, Platform::Wsl);
        assert_eq!(wsl1, Platform::Wsl);

        // The marker only matters on Linux.
        assert_eq!(Platform::detect("darwin", Some("microsoft")).unwrap(), Platform::MacOs);
    }

    #[test]
    fn unknown_os_type_is_named_in_the_error() {
        let err = Platform::detect("haiku", None).unwrap_err();
        assert!(matches!(err, WebSearchError::UnsupportedPlatform { ref os } if os == "haiku"));
        assert!(err.to_string().contains("haiku"));
    }

    #[test]
    fn opener_commands() {
        assert_eq!(Platform::MacOs.opener(), ("open", &[][..]));
        assert_eq!(Platform::Linux.opener().0, "xdg-open");
        assert_eq!(Platform::Wsl.opener(), ("cmd.exe", &["/c", "start", ""][..]));
        assert_eq!(Platform::Msys.opener().0, "cmd");
    }

    #[test]
    fn default_os_type_is_recognised_on_supported_hosts() {
        if cfg!(any(target_os = "macos", target_os = "linux", target_os = "windows")) {
            assert!(Platform::detect(default_os_type(), None).is_ok());
        }
    }
}
