//! Seams between the core state machine and the operating system.
//!
//! The panel drives a `WindowHost` and the session samples an `InputSource`
//! and a `ScreenSource`. Production wires these to the Cocoa layer in
//! `platform`; tests wire them to the recording/scripted doubles below so
//! every timing property can be exercised deterministically.

use crate::content::ContentSlots;
use crate::geometry::{Point, Rect};
use crate::panel::{Animation, PanelState};
use crate::screen::ScreenInfo;

/// Opaque handle for a host-owned window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowId(pub u64);

/// Platform window operations the panel state machine needs. All calls are
/// fire-and-forget; durations (fades, animations) are tracked by the panel's
/// own deadlines, not by host callbacks.
pub trait WindowHost {
    /// Create a panel window on `screen` covering `frame`, invisible and not
    /// yet ordered front.
    fn create_window(&mut self, screen: &ScreenInfo, frame: Rect) -> WindowId;

    /// Begin animating the window content to `state`. Called before the
    /// window is made visible on cold transitions so the animation is
    /// already in flight on the first presented frame.
    fn apply_state(
        &mut self,
        window: WindowId,
        state: PanelState,
        animation: Animation,
        content: &ContentSlots,
    );

    /// Order the window front starting fully transparent, then fade it in.
    fn show_window(&mut self, window: WindowId);

    /// Order the window front at full opacity (screen rebuilds).
    fn order_front(&mut self, window: WindowId);

    /// Fade the window to transparent, masking the closing animation's last
    /// frame.
    fn fade_out(&mut self, window: WindowId);

    /// Destroy the window.
    fn close_window(&mut self, window: WindowId);

    /// One haptic alignment pulse.
    fn haptic_pulse(&mut self);
}

/// Global pointer sampling. `take_click` returns the location of a mouse-down
/// that happened since the previous call, at most one per call.
pub trait InputSource {
    fn pointer_position(&mut self) -> Option<Point>;
    fn take_click(&mut self) -> Option<Point>;
}

/// Current display configuration. Polled by the session pump; a change in
/// the returned snapshot stands in for the OS screen-parameters notification.
pub trait ScreenSource {
    fn screens(&mut self) -> Vec<ScreenInfo>;
}
