//! Platform paths for chatdeck files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/chatdeck/          # Config directory (platform config dir)
//! ├── config.toml              # Application configuration
//! ├── repl_history.txt         # Line-editor history of `chatdeck repl`
//! └── logs/                    # CLI logs
//!     └── chatdeck.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "chatdeck";
const CONFIG_FILE: &str = "config.toml";
const LOGS_DIR: &str = "logs";
const HISTORY_FILE: &str = "repl_history.txt";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Neither a platform config directory nor a home directory exists.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves where chatdeck keeps its files.
pub struct ChatdeckPaths;

impl ChatdeckPaths {
    /// Returns the chatdeck configuration directory.
    ///
    /// Uses the platform config directory (XDG on Linux), falling back to
    /// `~/.config` when none is reported.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .map(|base| base.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path of `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Returns the directory for rolling log files.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(LOGS_DIR))
    }

    pub fn history_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(HISTORY_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_config_dir() {
        let Ok(dir) = ChatdeckPaths::config_dir() else {
            return;
        };
        assert!(dir.ends_with("chatdeck"));
        assert_eq!(ChatdeckPaths::config_file().unwrap(), dir.join("config.toml"));
        assert_eq!(ChatdeckPaths::logs_dir().unwrap(), dir.join("logs"));
        assert_eq!(
            ChatdeckPaths::history_file().unwrap(),
            dir.join("repl_history.txt")
        );
    }
}
