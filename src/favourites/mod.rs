pub mod icons;
pub mod manager;
pub mod resolver;

pub use icons::{IconCache, IconImage, IconLookup};
pub use manager::{AddOutcome, FavouritesManager, FavouritesStore, ReplaceOutcome};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavouriteKind {
    App,
    Dir,
    File,
}

/// A pinned filesystem reference. `path` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favourite {
    pub path: PathBuf,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FavouriteKind,
}

impl Favourite {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (kind, name) = resolver::classify(&path);
        Self { path, name, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn favourite_serializes_with_type_field() {
        let favourite = Favourite {
            path: "/Applications/Safari.app".into(),
            name: "Safari".into(),
            kind: FavouriteKind::App,
        };

        let json = serde_json::to_value(&favourite).unwrap();

        assert_eq!(json, json!({"path": "/Applications/Safari.app", "name": "Safari", "type": "app"}));
    }

    #[test]
    fn kinds_order_app_before_dir_before_file() {
        assert!(FavouriteKind::App < FavouriteKind::Dir);
        assert!(FavouriteKind::Dir < FavouriteKind::File);
    }
}
