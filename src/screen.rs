//! Per-screen capability snapshot.
//!
//! The panel never talks to `NSScreen` directly; it receives a `ScreenInfo`
//! snapshot from the platform layer (or a fabricated one in tests) and
//! resolves the effective panel style from it.

use crate::geometry::Rect;

/// What a screen looks like from the panel's point of view: its frame in
/// global top-left coordinates, the physical notch cutout if there is one,
/// and the menubar height used as a sizing fallback on notchless displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenInfo {
    pub frame: Rect,
    pub notch_frame: Option<Rect>,
    pub menubar_height: f64,
}

impl ScreenInfo {
    pub fn has_notch(&self) -> bool {
        self.notch_frame.map(|r| !r.is_empty()).unwrap_or(false)
    }

    /// The notch cutout, or a menubar-height strip at the top center as a
    /// stand-in on displays without one.
    pub fn notch_frame_or_menubar(&self) -> Rect {
        match self.notch_frame {
            Some(r) if !r.is_empty() => r,
            _ => Rect::new(
                self.frame.mid_x() - 100.0,
                self.frame.y,
                200.0,
                self.menubar_height,
            ),
        }
    }
}

/// The window appearance. `Auto` picks per screen at transition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotchStyle {
    Notch,
    Floating,
    #[default]
    Auto,
}

impl NotchStyle {
    /// Resolve `Auto` against the target screen. Notch-styled rendering is
    /// only meaningful when the display actually has a cutout.
    pub fn resolve(self, screen: &ScreenInfo) -> NotchStyle {
        match self {
            NotchStyle::Auto => {
                if screen.has_notch() {
                    NotchStyle::Notch
                } else {
                    NotchStyle::Floating
                }
            }
            other => other,
        }
    }

    pub fn is_floating(self) -> bool {
        matches!(self, NotchStyle::Floating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notched_screen() -> ScreenInfo {
        ScreenInfo {
            frame: Rect::new(0.0, 0.0, 1512.0, 982.0),
            notch_frame: Some(Rect::new(656.0, 0.0, 200.0, 32.0)),
            menubar_height: 32.0,
        }
    }

    fn plain_screen() -> ScreenInfo {
        ScreenInfo {
            frame: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            notch_frame: None,
            menubar_height: 24.0,
        }
    }

    #[test]
    fn auto_resolves_by_capability() {
        assert_eq!(NotchStyle::Auto.resolve(&notched_screen()), NotchStyle::Notch);
        assert_eq!(
            NotchStyle::Auto.resolve(&plain_screen()),
            NotchStyle::Floating
        );
    }

    #[test]
    fn explicit_styles_resolve_to_themselves() {
        assert_eq!(
            NotchStyle::Floating.resolve(&notched_screen()),
            NotchStyle::Floating
        );
        assert_eq!(NotchStyle::Notch.resolve(&plain_screen()), NotchStyle::Notch);
    }

    #[test]
    fn empty_notch_frame_counts_as_no_notch() {
        let screen = ScreenInfo {
            notch_frame: Some(Rect::ZERO),
            ..plain_screen()
        };
        assert!(!screen.has_notch());
        assert_eq!(NotchStyle::Auto.resolve(&screen), NotchStyle::Floating);
    }

    #[test]
    fn menubar_backup_frame_sits_at_top_center() {
        let screen = plain_screen();
        let frame = screen.notch_frame_or_menubar();
        assert_eq!(frame.y, 0.0);
        assert_eq!(frame.height, 24.0);
        assert!((frame.mid_x() - screen.frame.mid_x()).abs() < f64::EPSILON);
    }
}
