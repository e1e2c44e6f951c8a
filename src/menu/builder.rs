use super::{FavouriteAction, MenuId, MenuNode, MenuSpec};
use crate::favourites::{Favourite, FavouriteKind, IconImage, IconLookup};
use crate::prefs::{ActionMode, IconSize};
use std::sync::Arc;

pub const ADD_LABEL: &str = "Add Favourite…";
pub const PREFERENCES_LABEL: &str = "Preferences…";
pub const QUIT_LABEL: &str = "Quit";
pub const OPEN_LABEL: &str = "Open";
pub const REVEAL_LABEL: &str = "Open in Folder";
pub const REMOVE_LABEL: &str = "Remove";

/// Builds the full tray menu from the display view of the favourites.
///
/// `view` pairs each favourite with its stored index, so ids stay valid whatever the sort order.
pub fn build(
    view: &[(usize, &Favourite)],
    action: ActionMode,
    icon_size: IconSize,
    icons: &mut dyn IconLookup,
) -> MenuSpec {
    let mut items = vec![
        MenuNode::Item {
            id: MenuId::Add,
            label: ADD_LABEL.to_string(),
            accelerator: Some("CmdOrCtrl+N"),
            icon: None,
        },
        MenuNode::Separator,
    ];

    if !view.is_empty() {
        for (index, favourite) in view {
            let icon = icons.icon(favourite, icon_size);
            items.push(favourite_node(*index, favourite, action, icon));
        }
        items.push(MenuNode::Separator);
    }

    items.push(MenuNode::Item {
        id: MenuId::Preferences,
        label: PREFERENCES_LABEL.to_string(),
        accelerator: Some("CmdOrCtrl+,"),
        icon: None,
    });
    items.push(MenuNode::Separator);
    items.push(MenuNode::Item {
        id: MenuId::Quit,
        label: QUIT_LABEL.to_string(),
        accelerator: Some("CmdOrCtrl+Q"),
        icon: None,
    });

    MenuSpec { items }
}

fn favourite_node(
    index: usize,
    favourite: &Favourite,
    action: ActionMode,
    icon: Option<Arc<IconImage>>,
) -> MenuNode {
    match action {
        ActionMode::Submenu => MenuNode::Submenu {
            label: favourite.name.clone(),
            icon,
            children: submenu_children(index, favourite.kind),
        },
        ActionMode::OpenOnClick | ActionMode::RevealOnClick => MenuNode::Item {
            id: MenuId::Favourite {
                index,
                action: FavouriteAction::Primary,
            },
            label: favourite.name.clone(),
            accelerator: None,
            icon,
        },
    }
}

fn submenu_children(index: usize, kind: FavouriteKind) -> Vec<MenuNode> {
    let id = |action| MenuId::Favourite { index, action };
    let mut children = vec![MenuNode::item(id(FavouriteAction::Open), OPEN_LABEL)];
    if kind != FavouriteKind::Dir {
        children.push(MenuNode::item(id(FavouriteAction::Reveal), REVEAL_LABEL));
    }
    children.push(MenuNode::Separator);
    children.push(MenuNode::item(id(FavouriteAction::Remove), REMOVE_LABEL));
    children
}

/// What a single-click entry does; the modifier chord always means remove.
pub fn resolve_primary(mode: ActionMode, modifier: bool) -> FavouriteAction {
    if modifier {
        return FavouriteAction::Remove;
    }
    match mode {
        ActionMode::Submenu | ActionMode::OpenOnClick => FavouriteAction::Open,
        ActionMode::RevealOnClick => FavouriteAction::Reveal,
    }
}
