use crate::favourites::IconImage;
use crate::menu::{MenuNode, MenuSpec};
use anyhow::Result;
use tray_icon::menu::{
    accelerator::Accelerator, Icon, IconMenuItem, IsMenuItem, Menu, MenuItem, PredefinedMenuItem,
    Submenu,
};

/// Turns a menu description into native tray menu items.
pub fn menu(spec: &MenuSpec) -> Result<Menu> {
    let menu = Menu::new();
    for node in &spec.items {
        menu.append(native_item(node)?.as_ref())?;
    }
    Ok(menu)
}

fn native_item(node: &MenuNode) -> Result<Box<dyn IsMenuItem>> {
    let item: Box<dyn IsMenuItem> = match node {
        MenuNode::Separator => Box::new(PredefinedMenuItem::separator()),
        MenuNode::Item { id, label, accelerator, icon } => {
            let accelerator = accelerator.and_then(parse_accelerator);
            match icon.as_deref().and_then(menu_icon) {
                Some(icon) => Box::new(IconMenuItem::with_id(
                    id.to_string(),
                    label,
                    true,
                    Some(icon),
                    accelerator,
                )),
                None => Box::new(MenuItem::with_id(id.to_string(), label, true, accelerator)),
            }
        }
        // Submenu rows carry no icon in tray-icon menus.
        MenuNode::Submenu { label, children, .. } => {
            let submenu = Submenu::new(label, true);
            for child in children {
                submenu.append(native_item(child)?.as_ref())?;
            }
            Box::new(submenu)
        }
    };
    Ok(item)
}

fn parse_accelerator(text: &str) -> Option<Accelerator> {
    match text.parse() {
        Ok(accelerator) => Some(accelerator),
        Err(e) => {
            log::debug!("Unsupported accelerator {}: {}", text, e);
            None
        }
    }
}

fn menu_icon(image: &IconImage) -> Option<Icon> {
    match Icon::from_rgba(image.rgba.clone(), image.width, image.height) {
        Ok(icon) => Some(icon),
        Err(e) => {
            log::debug!("Dropping menu icon: {}", e);
            None
        }
    }
}
