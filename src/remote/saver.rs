//! Download saver
//!
//! Writes CSV downloads into a directory and hands oversized ones to the
//! platform opener.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::warn;

use crate::core::fetch::FileSaver;

/// [`FileSaver`] writing into a download directory
#[derive(Debug, Clone)]
pub struct DiskSaver {
    dir: PathBuf,
}

impl DiskSaver {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Use `dir` if given, else the user's Downloads directory, else CWD
    pub fn from_option(dir: Option<&Path>) -> Self {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| {
            directories::UserDirs::new()
                .and_then(|u| u.download_dir().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Platform command that opens a URL
    fn opener(url: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", url]);
            cmd
        }
        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        }
        #[cfg(not(any(windows, target_os = "macos")))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

impl FileSaver for DiskSaver {
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.dir.join(filename);
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    fn open_url(&self, url: &str) -> Result<()> {
        match Self::opener(url).status() {
            Ok(status) if status.success() => {}
            Ok(status) => {
                warn!(%status, "URL opener failed");
                println!("Open this URL to download: {}", url);
            }
            Err(e) => {
                warn!(error = %e, "No URL opener available");
                println!("Open this URL to download: {}", url);
            }
        }
        Ok(())
    }
}
