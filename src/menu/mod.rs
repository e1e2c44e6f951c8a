pub mod builder;
pub mod ids;

pub use builder::{build, resolve_primary};
pub use ids::{FavouriteAction, MenuId};

use crate::favourites::IconImage;
use std::sync::Arc;

/// Toolkit-independent description of the tray menu.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MenuSpec {
    pub items: Vec<MenuNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuNode {
    Item {
        id: MenuId,
        label: String,
        accelerator: Option<&'static str>,
        icon: Option<Arc<IconImage>>,
    },
    Submenu {
        label: String,
        icon: Option<Arc<IconImage>>,
        children: Vec<MenuNode>,
    },
    Separator,
}

impl MenuNode {
    pub fn item(id: MenuId, label: impl Into<String>) -> Self {
        MenuNode::Item {
            id,
            label: label.into(),
            accelerator: None,
            icon: None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            MenuNode::Item { label, .. } | MenuNode::Submenu { label, .. } => Some(label),
            MenuNode::Separator => None,
        }
    }

    pub fn id(&self) -> Option<MenuId> {
        match self {
            MenuNode::Item { id, .. } => Some(*id),
            _ => None,
        }
    }
}
