use crate::paths;
use anyhow::Result;
use std::path::Path;

/// Opens favourite targets on behalf of the daemon.
pub trait Launcher {
    fn exists(&self, path: &Path) -> bool;
    fn open(&self, path: &Path) -> Result<()>;
    fn reveal(&self, path: &Path) -> Result<()>;
    fn open_url(&self, url: &str) -> Result<()>;
}

pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn exists(&self, path: &Path) -> bool {
        paths::exists(path)
    }

    fn open(&self, path: &Path) -> Result<()> {
        paths::open_path(path)
    }

    fn reveal(&self, path: &Path) -> Result<()> {
        paths::reveal_path(path)
    }

    fn open_url(&self, url: &str) -> Result<()> {
        paths::open_url(url)
    }
}
