use super::{
    Command, CommandSender, DaemonEvent, DialogGate, DialogReply, DialogRequest, Dialogs, Flow,
    Launcher, MissingTargetChoice, NativeDialogs, SystemLauncher,
};
use crate::favourites::{Favourite, FavouritesManager, IconCache, ReplaceOutcome};
use crate::login::{self, LaunchEntry, LoginItem};
use crate::menu::{self, FavouriteAction, MenuId, MenuSpec};
use crate::pane;
use crate::prefs::{PreferenceUpdate, Preferences, KEY_OPEN_AT_LOGIN};
use crate::store::JsonStore;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::{self, error::TryRecvError};

const CLEAR_ALL: &str = "clear_all";
const ADD: &str = "add";
const CLOSE_WELCOME: &str = "close_welcome";

/// Side-effecting collaborators, swappable for tests.
pub struct Services {
    pub dialogs: Box<dyn Dialogs>,
    pub launcher: Box<dyn Launcher>,
    pub login: Box<dyn LoginItem>,
}

impl Services {
    pub fn native(runtime: tokio::runtime::Handle, commands: CommandSender) -> Result<Self> {
        Ok(Self {
            dialogs: Box::new(NativeDialogs::new(runtime, commands)),
            launcher: Box::new(SystemLauncher),
            login: Box::new(LaunchEntry::native()?),
        })
    }
}

/// Application state owned by the shell thread. Every mutation of the favourites list
/// goes through here, one command at a time.
pub struct Daemon {
    store: JsonStore,
    favourites: FavouritesManager<JsonStore>,
    icons: IconCache,
    gate: DialogGate,
    services: Services,
    changes: broadcast::Receiver<DaemonEvent>,
}

impl Daemon {
    pub fn new(store: JsonStore, services: Services) -> Self {
        let changes = store.events().subscribe();
        let favourites = FavouritesManager::new(store.clone());
        Self {
            store,
            favourites,
            icons: IconCache::new(),
            gate: DialogGate::new(),
            services,
            changes,
        }
    }

    pub fn favourites(&self) -> &[Favourite] {
        self.favourites.favourites()
    }

    pub fn preferences(&self) -> Preferences {
        self.store.preferences()
    }

    pub fn dialog_open(&self) -> bool {
        self.gate.is_open()
    }

    pub fn menu(&mut self) -> MenuSpec {
        let prefs = self.store.preferences();
        let view = self.favourites.sorted(prefs.sort);
        menu::build(&view, prefs.action, prefs.icon_size, &mut self.icons)
    }

    /// Drains store notifications and returns a fresh menu if any of them affect it.
    pub fn take_menu_update(&mut self) -> Option<MenuSpec> {
        let mut rebuild = false;
        loop {
            match self.changes.try_recv() {
                Ok(event) => {
                    let DaemonEvent::StoreChanged { key } = &event;
                    if key == KEY_OPEN_AT_LOGIN {
                        self.sync_login_item();
                    }
                    rebuild |= event.affects_menu();
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Missed {} store notifications, rebuilding menu", skipped);
                    rebuild = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        rebuild.then(|| self.menu())
    }

    pub fn sync_login_item(&self) {
        let wanted = self.store.preferences().open_at_login;
        if let Err(e) = login::sync(self.services.login.as_ref(), wanted) {
            log::warn!("Failed to update open-at-login: {}", e);
        }
    }

    /// Opens the preferences pane in the browser, with the welcome section when asked.
    pub fn show_preferences(&self, welcome: bool) {
        let url = if welcome {
            format!("{}?welcome", pane::url())
        } else {
            pane::url()
        };
        if let Err(e) = self.services.launcher.open_url(&url) {
            log::error!("Failed to open preferences: {}", e);
        }
    }

    /// Clears the first-launch flag, returning whether this is the first launch.
    pub fn take_first_launch(&mut self) -> Result<bool> {
        if !self.store.preferences().first_launch {
            return Ok(false);
        }
        self.store.apply(PreferenceUpdate::FirstLaunch(false))?;
        Ok(true)
    }

    pub fn handle(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Menu { id, modifier } => return self.handle_menu(&id, modifier),
            Command::AddRequested => self.choose_favourites(),
            Command::Drop(paths) => self.add_paths(paths)?,
            Command::SetPreference(update) => {
                self.store.apply(update)?;
            }
            Command::Button(id) => self.handle_button(&id)?,
            Command::Dialog(reply) => self.handle_reply(reply)?,
        }
        Ok(Flow::Continue)
    }

    fn handle_menu(&mut self, id: &str, modifier: bool) -> Result<Flow> {
        let id = match id.parse::<MenuId>() {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Ignoring menu event: {}", e);
                return Ok(Flow::Continue);
            }
        };

        match id {
            MenuId::Add => self.choose_favourites(),
            MenuId::Preferences => self.show_preferences(false),
            MenuId::Quit => {
                log::info!("Quit requested");
                return Ok(Flow::Quit);
            }
            MenuId::Favourite { index, action } => {
                let action = match action {
                    FavouriteAction::Primary => {
                        menu::resolve_primary(self.store.preferences().action, modifier)
                    }
                    other => other,
                };
                match action {
                    FavouriteAction::Remove => {
                        self.favourites.remove(index)?;
                    }
                    FavouriteAction::Reveal => self.activate(index, true),
                    FavouriteAction::Open | FavouriteAction::Primary => self.activate(index, false),
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn handle_button(&mut self, id: &str) -> Result<()> {
        match id {
            CLEAR_ALL => self.request_clear(),
            ADD => self.choose_favourites(),
            CLOSE_WELCOME => {
                self.store.apply(PreferenceUpdate::FirstLaunch(false))?;
            }
            other => log::warn!("Unknown pane button: {}", other),
        }
        Ok(())
    }

    fn handle_reply(&mut self, reply: DialogReply) -> Result<()> {
        match reply {
            DialogReply::FavouritesChosen(paths) => {
                self.gate.close();
                match paths {
                    Some(paths) => self.add_paths(paths)?,
                    None => log::debug!("Add dialog cancelled"),
                }
            }
            DialogReply::ReplacementChosen { path, replacement } => {
                self.gate.close();
                if let Some(replacement) = replacement {
                    self.replace(&path, replacement)?;
                }
            }
            DialogReply::DuplicatesAcknowledged(pending) => {
                self.favourites.add(pending)?;
            }
            DialogReply::ClearConfirmed(confirmed) => {
                if confirmed {
                    self.favourites.clear()?;
                }
            }
            DialogReply::MissingTarget { path, choice } => match choice {
                MissingTargetChoice::FindReplacement => {
                    if self.gate.try_open() {
                        self.services.dialogs.show(DialogRequest::ChooseReplacement { path });
                    }
                }
                MissingTargetChoice::Remove => {
                    if let Some(index) = self.position(&path) {
                        self.favourites.remove(index)?;
                    }
                }
                MissingTargetChoice::Dismiss => {}
            },
        }
        Ok(())
    }

    fn choose_favourites(&mut self) {
        if !self.gate.try_open() {
            log::debug!("A file dialog is already open, ignoring");
            return;
        }
        self.services.dialogs.show(DialogRequest::ChooseFavourites);
    }

    /// Without duplicates the batch is committed at once. Otherwise the new paths wait
    /// until the duplicate notice is acknowledged.
    fn add_paths(&mut self, paths: Vec<PathBuf>) -> Result<()> {
        let outcome = self.favourites.partition(paths);
        let pending: Vec<PathBuf> = outcome.added.iter().map(|f| f.path.clone()).collect();

        if outcome.rejected.is_empty() {
            self.favourites.add(pending)?;
            return Ok(());
        }

        self.services.dialogs.show(DialogRequest::AlreadyAdded {
            names: outcome.rejected_names(),
            pending,
        });
        Ok(())
    }

    fn replace(&mut self, stale: &Path, replacement: PathBuf) -> Result<()> {
        let Some(index) = self.position(stale) else {
            log::debug!("{} is no longer a favourite, skipping repair", stale.display());
            return Ok(());
        };

        match self.favourites.replace(index, replacement.clone())? {
            ReplaceOutcome::Replaced { .. } => self.icons.invalidate(&replacement),
            ReplaceOutcome::Duplicate => {
                let name = replacement
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.services.dialogs.show(DialogRequest::AlreadyAdded {
                    names: vec![name],
                    pending: Vec::new(),
                });
            }
            ReplaceOutcome::OutOfRange => {}
        }
        Ok(())
    }

    fn request_clear(&mut self) {
        if self.favourites.is_empty() {
            log::debug!("Nothing to clear");
            return;
        }
        self.services.dialogs.show(DialogRequest::ConfirmClear);
    }

    fn activate(&mut self, index: usize, reveal: bool) {
        let Some(favourite) = self.favourites.get(index).cloned() else {
            log::debug!("Ignoring click on stale favourite index {}", index);
            return;
        };

        let launcher = &self.services.launcher;
        if !launcher.exists(&favourite.path) {
            log::info!("Favourite target missing: {}", favourite.path.display());
            self.services.dialogs.show(DialogRequest::MissingTarget {
                path: favourite.path,
                name: favourite.name,
            });
            return;
        }

        let result = if reveal {
            launcher.reveal(&favourite.path)
        } else {
            launcher.open(&favourite.path)
        };
        if let Err(e) = result {
            log::error!("Failed to open {}: {}", favourite.path.display(), e);
        }
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.favourites.favourites().iter().position(|f| f.path == path)
    }
}
