//! System tray icon management.
//!
//! Provides a TrayManager that creates a macOS menu bar icon with a context
//! menu. The icon is a checklist glyph rendered as a template image for
//! proper light/dark mode adaptation.

use anyhow::{Context, Result};
use tray_icon::{
    menu::{
        CheckMenuItem, IconMenuItem, Menu, MenuEvent, MenuEventReceiver, MenuItem, NativeIcon,
        PredefinedMenuItem,
    },
    Icon, TrayIcon, TrayIconBuilder,
};

/// Checklist glyph (32x32, monochrome). Rendered as a template image so
/// macOS colorizes it per menu bar appearance.
const LOGO_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32" fill="currentColor" viewBox="0 0 32 32">
  <path fill="currentColor" d="M4 6a2 2 0 0 1 2-2h4a2 2 0 0 1 2 2v4a2 2 0 0 1-2 2H6a2 2 0 0 1-2-2V6Zm12 1a2 2 0 0 1 2-2h8a2 2 0 1 1 0 4h-8a2 2 0 0 1-2-2ZM4 20a2 2 0 0 1 2-2h4a2 2 0 0 1 2 2v4a2 2 0 0 1-2 2H6a2 2 0 0 1-2-2v-4Zm12 1a2 2 0 0 1 2-2h8a2 2 0 1 1 0 4h-8a2 2 0 0 1-2-2Z"/>
</svg>"#;

/// Menu item identifiers for matching events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayMenuAction {
    ToggleNotch,
    HideCompleted,
    Quit,
}

/// Manages the system tray icon and menu
pub struct TrayManager {
    #[allow(dead_code)]
    tray_icon: TrayIcon,
    toggle_notch_id: String,
    hide_completed_item: CheckMenuItem,
    #[allow(dead_code)]
    version_id: String,
    quit_id: String,
}

impl TrayManager {
    /// Creates a new TrayManager with the checklist icon and menu.
    ///
    /// # Errors
    /// Returns an error if SVG parsing, PNG rendering, or tray icon
    /// creation fails.
    pub fn new(hide_completed: bool) -> Result<Self> {
        let icon = Self::create_icon_from_svg()?;
        let (menu, toggle_notch_id, hide_completed_item, version_id, quit_id) =
            Self::create_menu(hide_completed)?;

        let tray_icon = TrayIconBuilder::new()
            .with_icon(icon)
            .with_tooltip("Notch Tasks")
            .with_menu(Box::new(menu))
            .with_icon_as_template(true) // macOS: adapt to light/dark menu bar
            .build()
            .context("Failed to create tray icon")?;

        Ok(Self {
            tray_icon,
            toggle_notch_id,
            hide_completed_item,
            version_id,
            quit_id,
        })
    }

    /// Converts the embedded SVG logo to a tray icon
    fn create_icon_from_svg() -> Result<Icon> {
        let opts = usvg::Options::default();
        let tree = usvg::Tree::from_str(LOGO_SVG, &opts).context("Failed to parse SVG")?;

        let size = tree.size();
        let width = size.width() as u32;
        let height = size.height() as u32;

        let mut pixmap =
            tiny_skia::Pixmap::new(width, height).context("Failed to create pixmap")?;

        // Template images on macOS use the alpha channel; the system
        // colorizes based on menu bar appearance.
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let rgba = pixmap.take();
        Icon::from_rgba(rgba, width, height).context("Failed to create icon from RGBA data")
    }

    /// Menu structure:
    /// 1. Show Tasks
    /// 2. ---
    /// 3. Hide Completed (checkmark)
    /// 4. Version (disabled)
    /// 5. ---
    /// 6. Quit Notch Tasks
    fn create_menu(
        hide_completed: bool,
    ) -> Result<(Menu, String, CheckMenuItem, String, String)> {
        let menu = Menu::new();

        // Native icons are macOS-only; the items still work elsewhere
        let toggle_item =
            IconMenuItem::with_native_icon("Show Tasks", true, Some(NativeIcon::Home), None);

        let hide_completed_item = CheckMenuItem::new("Hide Completed", true, hide_completed, None);

        let version_item = MenuItem::new(
            format!("Version {}", env!("CARGO_PKG_VERSION")),
            false,
            None,
        );

        let quit_item = IconMenuItem::with_native_icon(
            "Quit Notch Tasks",
            true,
            Some(NativeIcon::Remove),
            None,
        );

        let toggle_notch_id = toggle_item.id().0.clone();
        let version_id = version_item.id().0.clone();
        let quit_id = quit_item.id().0.clone();

        menu.append(&toggle_item)
            .context("Failed to add Show Tasks item")?;
        menu.append(&PredefinedMenuItem::separator())
            .context("Failed to add separator")?;
        menu.append(&hide_completed_item)
            .context("Failed to add Hide Completed item")?;
        menu.append(&version_item)
            .context("Failed to add Version item")?;
        menu.append(&PredefinedMenuItem::separator())
            .context("Failed to add separator")?;
        menu.append(&quit_item).context("Failed to add Quit item")?;

        Ok((menu, toggle_notch_id, hide_completed_item, version_id, quit_id))
    }

    /// Returns the menu event receiver for handling menu clicks
    pub fn menu_event_receiver(&self) -> &MenuEventReceiver {
        MenuEvent::receiver()
    }

    /// Matches a menu event to a TrayMenuAction.
    ///
    /// Returns `Some(action)` if the event matches a known menu item,
    /// or `None` if the event is from an unknown source.
    pub fn match_menu_event(&self, event: &MenuEvent) -> Option<TrayMenuAction> {
        let id = &event.id.0;
        if id == &self.toggle_notch_id {
            Some(TrayMenuAction::ToggleNotch)
        } else if id == &self.hide_completed_item.id().0 {
            Some(TrayMenuAction::HideCompleted)
        } else if id == &self.quit_id {
            Some(TrayMenuAction::Quit)
        } else {
            None
        }
    }

    /// Current state of the Hide Completed checkmark
    pub fn hide_completed_checked(&self) -> bool {
        self.hide_completed_item.is_checked()
    }

    pub fn set_hide_completed_checked(&self, checked: bool) {
        self.hide_completed_item.set_checked(checked);
    }
}
