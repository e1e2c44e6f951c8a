pub mod icon;
mod platform;
mod render;

use crate::daemon::{Command, CommandReceiver, Daemon, Flow};
use anyhow::Result;
use tray_icon::{menu::MenuEvent, TrayIcon, TrayIconBuilder};

const TOOLTIP: &str = "Favourites";

/// The main-thread half of the app: owns the tray icon and the daemon, and feeds the
/// daemon one command at a time.
pub struct Shell {
    daemon: Daemon,
    commands: CommandReceiver,
    tray: TrayIcon,
}

impl Shell {
    fn new(mut daemon: Daemon, commands: CommandReceiver) -> Result<Self> {
        let menu = render::menu(&daemon.menu())?;
        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(TOOLTIP)
            .with_icon(icon::create_icon()?)
            .with_icon_as_template(cfg!(target_os = "macos"))
            .build()?;

        Ok(Self { daemon, commands, tray })
    }

    /// Processes everything pending. Returns `false` once the app should exit.
    pub fn tick(&mut self) -> bool {
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            let command = Command::Menu {
                id: event.id.0,
                modifier: platform::modifier_held(),
            };
            if !self.dispatch(command) {
                return false;
            }
        }

        while let Ok(command) = self.commands.try_recv() {
            if !self.dispatch(command) {
                return false;
            }
        }

        if let Some(spec) = self.daemon.take_menu_update() {
            match render::menu(&spec) {
                Ok(menu) => self.tray.set_menu(Some(Box::new(menu))),
                Err(e) => log::error!("Failed to rebuild menu: {}", e),
            }
        }
        true
    }

    fn dispatch(&mut self, command: Command) -> bool {
        log::debug!("Command: {:?}", command);
        match self.daemon.handle(command) {
            Ok(Flow::Continue) => true,
            Ok(Flow::Quit) => {
                log::info!("Quitting application");
                false
            }
            Err(e) => {
                log::error!("Command failed: {:#}", e);
                true
            }
        }
    }
}

/// Creates the tray and runs the platform event loop on the calling thread until Quit.
pub fn run(daemon: Daemon, commands: CommandReceiver) -> Result<()> {
    platform::init()?;
    let shell = Shell::new(daemon, commands)?;
    platform::run(shell);
    Ok(())
}
