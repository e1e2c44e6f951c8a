pub mod daemon;
pub mod favourites;
pub mod login;
pub mod menu;
pub mod pane;
pub mod paths;
pub mod prefs;
pub mod store;
pub mod tray;
