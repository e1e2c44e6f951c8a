use anyhow::{anyhow, bail, Result};
use std::fmt;
use std::str::FromStr;

const ADD: &str = "__add__";
const PREFERENCES: &str = "__preferences__";
const QUIT: &str = "__quit__";
const FAVOURITE_PREFIX: &str = "fav";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FavouriteAction {
    Open,
    Reveal,
    Remove,
    /// Single-click entry in `open`/`finder` mode; resolved against the action mode on click.
    Primary,
}

impl FavouriteAction {
    fn as_str(self) -> &'static str {
        match self {
            FavouriteAction::Open => "open",
            FavouriteAction::Reveal => "reveal",
            FavouriteAction::Remove => "remove",
            FavouriteAction::Primary => "primary",
        }
    }
}

/// Identity of a clickable menu entry, carried through the native menu as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuId {
    Add,
    Preferences,
    Quit,
    Favourite { index: usize, action: FavouriteAction },
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuId::Add => f.write_str(ADD),
            MenuId::Preferences => f.write_str(PREFERENCES),
            MenuId::Quit => f.write_str(QUIT),
            MenuId::Favourite { index, action } => {
                write!(f, "{}::{}::{}", FAVOURITE_PREFIX, index, action.as_str())
            }
        }
    }
}

impl FromStr for MenuId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ADD => return Ok(MenuId::Add),
            PREFERENCES => return Ok(MenuId::Preferences),
            QUIT => return Ok(MenuId::Quit),
            _ => {}
        }

        let parts: Vec<&str> = s.split("::").collect();
        let [FAVOURITE_PREFIX, index, action] = parts.as_slice() else {
            bail!("Invalid menu id: {}", s);
        };

        let index = index
            .parse()
            .map_err(|_| anyhow!("Invalid favourite index in menu id: {}", s))?;
        let action = match *action {
            "open" => FavouriteAction::Open,
            "reveal" => FavouriteAction::Reveal,
            "remove" => FavouriteAction::Remove,
            "primary" => FavouriteAction::Primary,
            other => bail!("Unknown favourite action: {}", other),
        };

        Ok(MenuId::Favourite { index, action })
    }
}
