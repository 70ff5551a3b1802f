//! Screen-space geometry for trigger and panel zones.
//!
//! Coordinates are in the global top-left-origin space used by the rest of
//! the crate (platform code converts from AppKit's bottom-left origin).
//! Zone computation is pure so the hover/click gating logic can be tested
//! without a display; an empty screen frame yields empty zones, and empty
//! zones contain no points, so all activation checks fail closed.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half-open containment: the right/bottom edges are exclusive, so
    /// adjacent rects never both claim a boundary point.
    pub fn contains(&self, p: Point) -> bool {
        !self.is_empty()
            && p.x >= self.x
            && p.x < self.x + self.width
            && p.y >= self.y
            && p.y < self.y + self.height
    }

    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Dimensions for the two hover zones, top-center anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneDimensions {
    pub trigger_width: f64,
    pub trigger_height: f64,
    pub panel_width: f64,
    pub panel_height: f64,
}

impl Default for ZoneDimensions {
    fn default() -> Self {
        Self {
            trigger_width: 160.0,
            trigger_height: 14.0,
            panel_width: 400.0,
            panel_height: 450.0,
        }
    }
}

/// The thin activation strip at the top-center of the screen, under the
/// notch. Dwelling here while the panel is hidden activates it.
pub fn trigger_zone(screen_frame: Rect, dims: &ZoneDimensions) -> Rect {
    if screen_frame.is_empty() {
        return Rect::ZERO;
    }
    Rect::new(
        screen_frame.x + (screen_frame.width - dims.trigger_width) / 2.0,
        screen_frame.y,
        dims.trigger_width,
        dims.trigger_height,
    )
}

/// The bounds of the expanded panel. Used both for the auto-close hover
/// check and for click-outside detection.
pub fn expanded_zone(screen_frame: Rect, dims: &ZoneDimensions) -> Rect {
    if screen_frame.is_empty() {
        return Rect::ZERO;
    }
    Rect::new(
        screen_frame.x + (screen_frame.width - dims.panel_width) / 2.0,
        screen_frame.y,
        dims.panel_width,
        dims.panel_height,
    )
}
