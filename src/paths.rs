use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const APP_ID: &str = "fav-tray";
pub const BUNDLE_ID: &str = "com.favtray.app";

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join(APP_ID))
}

pub fn store_path() -> Result<PathBuf> {
    config_dir().map(|p| p.join("config.json"))
}

/// Location of the per-user "start at login" entry for this platform.
pub fn login_item_path() -> Result<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .context("Could not determine home directory")
            .map(|p| p.join("Library/LaunchAgents").join(format!("{}.plist", BUNDLE_ID)))
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .context("Could not determine config directory")
            .map(|p| p.join("autostart").join(format!("{}.desktop", APP_ID)))
    }
}

pub fn exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

pub fn open_url(url: &str) -> Result<()> {
    open::that(url)?;
    Ok(())
}

pub fn open_path(path: &Path) -> Result<()> {
    open::that(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(())
}

/// Shows `path` in its containing folder, selecting it where the file manager allows.
pub fn reveal_path(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg("-R").arg(path).spawn()?;
        Ok(())
    }

    #[cfg(target_os = "windows")]
    {
        let mut arg = std::ffi::OsString::from("/select,");
        arg.push(path);
        Command::new("explorer").arg(arg).spawn()?;
        Ok(())
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let parent = containing_folder(path);
        let status = Command::new("dbus-send")
            .args([
                "--session",
                "--dest=org.freedesktop.FileManager1",
                "--type=method_call",
                "/org/freedesktop/FileManager1",
                "org.freedesktop.FileManager1.ShowItems",
            ])
            .arg(format!("array:string:file://{}", path.display()))
            .arg("string:")
            .status();

        match status {
            Ok(s) if s.success() => Ok(()),
            _ => {
                log::debug!("FileManager1 unavailable, opening {}", parent.display());
                open_path(&parent)
            }
        }
    }
}

pub fn containing_folder(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"))
}
