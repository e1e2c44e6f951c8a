use crate::paths;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Mirror of the OS-managed "start at login" state.
pub trait LoginItem {
    fn is_enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool) -> Result<()>;
}

/// A LaunchAgent plist on macOS, an XDG autostart entry elsewhere.
pub struct LaunchEntry {
    path: PathBuf,
    executable: PathBuf,
}

impl LaunchEntry {
    pub fn new(path: PathBuf, executable: PathBuf) -> Self {
        Self { path, executable }
    }

    pub fn native() -> Result<Self> {
        let path = paths::login_item_path()?;
        let executable = std::env::current_exe().context("Could not locate own executable")?;
        Ok(Self::new(path, executable))
    }

    fn contents(&self) -> String {
        let exe = self.executable.to_string_lossy();

        #[cfg(target_os = "macos")]
        {
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{}</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
</dict>
</plist>
"#,
                paths::BUNDLE_ID,
                escape_xml(&exe)
            )
        }

        #[cfg(not(target_os = "macos"))]
        {
            format!(
                "[Desktop Entry]\nType=Application\nName=Favourites Tray\nExec=\"{}\"\nX-GNOME-Autostart-enabled=true\n",
                exe.replace('\\', "\\\\").replace('"', "\\\"")
            )
        }
    }
}

impl LoginItem for LaunchEntry {
    fn is_enabled(&self) -> bool {
        self.path.exists()
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if !enabled {
            if self.path.exists() {
                std::fs::remove_file(&self.path)
                    .with_context(|| format!("Failed to remove {}", self.path.display()))?;
            }
            log::info!("Open at login disabled");
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, self.contents())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        log::info!("Open at login enabled via {}", self.path.display());
        Ok(())
    }
}

/// Applies `wanted` only when the OS state disagrees.
pub fn sync(item: &dyn LoginItem, wanted: bool) -> Result<()> {
    if item.is_enabled() == wanted {
        return Ok(());
    }
    item.set_enabled(wanted)
}

#[cfg(target_os = "macos")]
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
