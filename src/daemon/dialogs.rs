use super::{Command, CommandSender};
use crate::paths;
use rfd::{AsyncFileDialog, AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};
use std::path::PathBuf;

const CHOOSE_PROMPT: &str = "Choose files or applications to add to favourites";
const CHOOSE_REPLACEMENT: &str = "Choose the new location";
const ALREADY_EXISTS: &str = "Already a favourite";
const CLEAR_TITLE: &str = "Remove all favourites?";
const CLEAR_DETAIL: &str = "This cannot be undone.";
const CLEAR: &str = "Clear";
const CANCEL: &str = "Cancel";
const NOT_FOUND_TITLE: &str = "File not found";
const FIND_FILE: &str = "Find File";
const REMOVE: &str = "Remove";

#[derive(Debug, Clone, PartialEq)]
pub enum DialogRequest {
    ChooseFavourites,
    ChooseReplacement { path: PathBuf },
    /// `pending` are the new paths from the same batch, added once the notice is dismissed.
    AlreadyAdded { names: Vec<String>, pending: Vec<PathBuf> },
    ConfirmClear,
    MissingTarget { path: PathBuf, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTargetChoice {
    FindReplacement,
    Remove,
    Dismiss,
}

/// Answers to requests. `None` paths mean the user cancelled.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogReply {
    FavouritesChosen(Option<Vec<PathBuf>>),
    ReplacementChosen { path: PathBuf, replacement: Option<PathBuf> },
    DuplicatesAcknowledged(Vec<PathBuf>),
    ClearConfirmed(bool),
    MissingTarget { path: PathBuf, choice: MissingTargetChoice },
}

pub trait Dialogs {
    /// Shows `request` without blocking. Any answer comes back later as [`Command::Dialog`].
    fn show(&self, request: DialogRequest);
}

pub struct NativeDialogs {
    runtime: tokio::runtime::Handle,
    commands: CommandSender,
}

impl NativeDialogs {
    pub fn new(runtime: tokio::runtime::Handle, commands: CommandSender) -> Self {
        Self { runtime, commands }
    }
}

impl Dialogs for NativeDialogs {
    fn show(&self, request: DialogRequest) {
        log::debug!("Showing dialog: {:?}", request);
        let commands = self.commands.clone();
        self.runtime.spawn(async move {
            if let Some(reply) = run_dialog(request).await {
                let _ = commands.send(Command::Dialog(reply));
            }
        });
    }
}

async fn run_dialog(request: DialogRequest) -> Option<DialogReply> {
    match request {
        DialogRequest::ChooseFavourites => {
            let chosen = AsyncFileDialog::new()
                .set_title(CHOOSE_PROMPT)
                .pick_files()
                .await
                .map(|files| files.iter().map(|f| f.path().to_path_buf()).collect());
            Some(DialogReply::FavouritesChosen(chosen))
        }
        DialogRequest::ChooseReplacement { path } => {
            let replacement = AsyncFileDialog::new()
                .set_title(CHOOSE_REPLACEMENT)
                .set_directory(paths::containing_folder(&path))
                .pick_file()
                .await
                .map(|f| f.path().to_path_buf());
            Some(DialogReply::ReplacementChosen { path, replacement })
        }
        DialogRequest::AlreadyAdded { names, pending } => {
            AsyncMessageDialog::new()
                .set_level(MessageLevel::Info)
                .set_title(ALREADY_EXISTS)
                .set_description(duplicate_detail(&names))
                .set_buttons(MessageButtons::Ok)
                .show()
                .await;
            (!pending.is_empty()).then_some(DialogReply::DuplicatesAcknowledged(pending))
        }
        DialogRequest::ConfirmClear => {
            let result = AsyncMessageDialog::new()
                .set_level(MessageLevel::Warning)
                .set_title(CLEAR_TITLE)
                .set_description(CLEAR_DETAIL)
                .set_buttons(MessageButtons::OkCancelCustom(CLEAR.into(), CANCEL.into()))
                .show()
                .await;
            Some(DialogReply::ClearConfirmed(result == MessageDialogResult::Custom(CLEAR.into())))
        }
        DialogRequest::MissingTarget { path, name } => {
            let result = AsyncMessageDialog::new()
                .set_level(MessageLevel::Warning)
                .set_title(NOT_FOUND_TITLE)
                .set_description(format!("\"{}\" has been moved or deleted.", name))
                .set_buttons(MessageButtons::YesNoCancelCustom(
                    FIND_FILE.into(),
                    REMOVE.into(),
                    CANCEL.into(),
                ))
                .show()
                .await;
            let choice = match result {
                MessageDialogResult::Custom(label) if label == FIND_FILE => MissingTargetChoice::FindReplacement,
                MessageDialogResult::Custom(label) if label == REMOVE => MissingTargetChoice::Remove,
                _ => MissingTargetChoice::Dismiss,
            };
            Some(DialogReply::MissingTarget { path, choice })
        }
    }
}

pub fn duplicate_detail(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [single] => format!("The file \"{}\" is already added", single),
        [rest @ .., last] => format!("The files \"{} and {}\" were already added", rest.join(", "), last),
    }
}
