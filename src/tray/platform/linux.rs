use super::super::Shell;
use anyhow::{anyhow, Result};
use gtk::{gdk, glib};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(50);

pub fn init() -> Result<()> {
    gtk::init().map_err(|e| anyhow!("Failed to initialize GTK: {}", e))
}

pub fn run(mut shell: Shell) {
    glib::timeout_add_local(TICK, move || {
        if shell.tick() {
            return glib::ControlFlow::Continue;
        }
        gtk::main_quit();
        glib::ControlFlow::Break
    });
    gtk::main();
}

pub fn modifier_held() -> bool {
    gdk::Display::default()
        .and_then(|display| gdk::Keymap::for_display(&display))
        .map(|keymap| keymap.modifier_state() & gdk::ModifierType::SHIFT_MASK.bits() != 0)
        .unwrap_or(false)
}
