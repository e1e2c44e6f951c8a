use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const KEY_FAVOURITES: &str = "favourites";
pub const KEY_ICON_SIZE: &str = "pref_icon_size";
pub const KEY_SORT: &str = "pref_sort";
pub const KEY_ACTION: &str = "pref_action";
pub const KEY_OPEN_AT_LOGIN: &str = "pref_open_at_login";
pub const KEY_FIRST_LAUNCH: &str = "flag_first_launch";

/// Every preference key the store reads, besides the favourites list.
pub const PREFERENCE_KEYS: &[&str] = &[
    KEY_ICON_SIZE,
    KEY_SORT,
    KEY_ACTION,
    KEY_OPEN_AT_LOGIN,
    KEY_FIRST_LAUNCH,
];

/// Keys whose change requires the tray menu to be rebuilt.
pub const MENU_KEYS: &[&str] = &[KEY_FAVOURITES, KEY_ICON_SIZE, KEY_SORT, KEY_ACTION];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IconSize {
    #[default]
    Small,
    Big,
}

impl IconSize {
    pub fn pixels(self) -> u32 {
        match self {
            IconSize::Small => 16,
            IconSize::Big => 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Type,
    Name,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ActionMode {
    #[default]
    #[serde(rename = "submenu")]
    Submenu,
    #[serde(rename = "open")]
    OpenOnClick,
    #[serde(rename = "finder")]
    RevealOnClick,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(rename = "pref_icon_size", default)]
    pub icon_size: IconSize,
    #[serde(rename = "pref_sort", default)]
    pub sort: SortMode,
    #[serde(rename = "pref_action", default)]
    pub action: ActionMode,
    #[serde(rename = "pref_open_at_login", default)]
    pub open_at_login: bool,
    #[serde(rename = "flag_first_launch", default = "default_true")]
    pub first_launch: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            icon_size: IconSize::default(),
            sort: SortMode::default(),
            action: ActionMode::default(),
            open_at_login: false,
            first_launch: true,
        }
    }
}

/// A single validated `(key, value)` change coming from the preferences pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceUpdate {
    IconSize(IconSize),
    Sort(SortMode),
    Action(ActionMode),
    OpenAtLogin(bool),
    FirstLaunch(bool),
}

impl PreferenceUpdate {
    pub fn parse(key: &str, value: Value) -> Result<Self> {
        let update = match key {
            KEY_ICON_SIZE => Self::IconSize(from_value(key, value)?),
            KEY_SORT => Self::Sort(from_value(key, value)?),
            KEY_ACTION => Self::Action(from_value(key, value)?),
            KEY_OPEN_AT_LOGIN => Self::OpenAtLogin(from_value(key, value)?),
            KEY_FIRST_LAUNCH => Self::FirstLaunch(from_value(key, value)?),
            KEY_FAVOURITES => bail!("{} can only be changed through the favourites list", key),
            other => bail!("Unknown preference: {}", other),
        };
        Ok(update)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::IconSize(_) => KEY_ICON_SIZE,
            Self::Sort(_) => KEY_SORT,
            Self::Action(_) => KEY_ACTION,
            Self::OpenAtLogin(_) => KEY_OPEN_AT_LOGIN,
            Self::FirstLaunch(_) => KEY_FIRST_LAUNCH,
        }
    }

    /// Applies the update, returning whether the value actually changed.
    pub fn apply_to(self, prefs: &mut Preferences) -> bool {
        fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
            if *slot == value {
                return false;
            }
            *slot = value;
            true
        }

        match self {
            Self::IconSize(v) => set(&mut prefs.icon_size, v),
            Self::Sort(v) => set(&mut prefs.sort, v),
            Self::Action(v) => set(&mut prefs.action, v),
            Self::OpenAtLogin(v) => set(&mut prefs.open_at_login, v),
            Self::FirstLaunch(v) => set(&mut prefs.first_launch, v),
        }
    }
}

fn from_value<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).with_context(|| format!("Invalid value for {}", key))
}
