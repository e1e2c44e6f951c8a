#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
pub use linux::{init, modifier_held, run};

#[cfg(target_os = "windows")]
pub use windows::{init, modifier_held, run};

#[cfg(target_os = "macos")]
pub use macos::{init, modifier_held, run};
