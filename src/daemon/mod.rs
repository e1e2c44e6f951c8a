mod dialogs;
mod events;
mod gate;
mod init;
mod launcher;

pub use dialogs::{DialogReply, DialogRequest, Dialogs, MissingTargetChoice, NativeDialogs};
pub use events::EventBus;
pub use gate::DialogGate;
pub use init::{Daemon, Services};
pub use launcher::{Launcher, SystemLauncher};

use crate::prefs::{PreferenceUpdate, MENU_KEYS};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaemonEvent {
    StoreChanged { key: String },
}

impl DaemonEvent {
    pub fn affects_menu(&self) -> bool {
        match self {
            DaemonEvent::StoreChanged { key } => MENU_KEYS.contains(&key.as_str()),
        }
    }
}

/// A discrete request for the shell thread. Commands are handled one at a time, to completion.
#[derive(Debug, Clone)]
pub enum Command {
    Menu { id: String, modifier: bool },
    AddRequested,
    Drop(Vec<PathBuf>),
    SetPreference(PreferenceUpdate),
    Button(String),
    Dialog(DialogReply),
}

pub type CommandSender = mpsc::UnboundedSender<Command>;
pub type CommandReceiver = mpsc::UnboundedReceiver<Command>;

pub fn command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}

/// What the shell should do after a command was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}
