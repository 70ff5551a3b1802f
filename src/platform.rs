//! Cocoa-backed implementations of the host seams.
//!
//! Everything AppKit lives here: the borderless floating panel window, the
//! global pointer/click sampling, and the NSScreen snapshotting. Core code
//! never touches Objective-C; it drives the `WindowHost` / `InputSource` /
//! `ScreenSource` traits and this module wires them to the OS.
//!
//! On non-macOS platforms these types compile as inert stubs so the crate
//! still builds (and the core test suite runs) without AppKit.

#![allow(dead_code)]

use std::collections::HashMap;

use crate::content::ContentSlots;
use crate::geometry::{Point, Rect};
use crate::host::{InputSource, ScreenSource, WindowHost, WindowId};
#[cfg(target_os = "macos")]
use crate::logging;
use crate::panel::{Animation, PanelState};
use crate::screen::ScreenInfo;

#[cfg(target_os = "macos")]
use cocoa::appkit::NSApp;
#[cfg(target_os = "macos")]
use cocoa::base::{id, nil, NO, YES};
#[cfg(target_os = "macos")]
use cocoa::foundation::{NSPoint, NSRect, NSSize, NSString};
#[cfg(target_os = "macos")]
use core_graphics::event::CGEvent;
#[cfg(target_os = "macos")]
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
#[cfg(target_os = "macos")]
use objc::{class, msg_send, sel, sel_impl};

// NSWindow collection behavior flags
#[cfg(target_os = "macos")]
const NS_WINDOW_COLLECTION_BEHAVIOR_CAN_JOIN_ALL_SPACES: u64 = 1 << 0;
#[cfg(target_os = "macos")]
const NS_WINDOW_COLLECTION_BEHAVIOR_FULL_SCREEN_AUXILIARY: u64 = 1 << 8;

// NSStatusWindowLevel keeps the panel above normal windows and the menu bar
#[cfg(target_os = "macos")]
const NS_STATUS_WINDOW_LEVEL: i64 = 25;

/// Assert that the current thread is the main thread.
///
/// AppKit APIs (NSApp, NSWindow, NSScreen, etc.) are NOT thread-safe and
/// must be called from the main thread. Cheap debug assertion, panics in
/// debug builds only.
#[cfg(target_os = "macos")]
fn debug_assert_main_thread() {
    unsafe {
        let is_main: bool = msg_send![class!(NSThread), isMainThread];
        debug_assert!(
            is_main,
            "AppKit calls must run on the main thread. \
             Calling from a background thread can crash or fail silently."
        );
    }
}

/// Configure the app as an "accessory" application.
///
/// Equivalent to `LSUIElement=true` in Info.plist, done at runtime: no Dock
/// icon, no menu bar ownership, windows can still float above other apps.
/// Must be called early in startup, before any windows are shown.
#[cfg(target_os = "macos")]
pub fn configure_as_accessory_app() {
    debug_assert_main_thread();
    unsafe {
        let app: id = NSApp();
        // NSApplicationActivationPolicyAccessory = 1
        let _: () = msg_send![app, setActivationPolicy: 1i64];
        logging::log("PLATFORM", "Configured app as accessory (no Dock icon)");
    }
}

#[cfg(not(target_os = "macos"))]
pub fn configure_as_accessory_app() {}

/// Spin the main run loop for up to `timeout`. Services AppKit events
/// (tray clicks, window animations) between scheduler beats; elsewhere it
/// just sleeps.
#[cfg(target_os = "macos")]
pub fn pump_run_loop(timeout: std::time::Duration) {
    debug_assert_main_thread();
    unsafe {
        let run_loop: id = msg_send![class!(NSRunLoop), currentRunLoop];
        let date: id = msg_send![class!(NSDate), dateWithTimeIntervalSinceNow: timeout.as_secs_f64()];
        let mode = NSString::alloc(nil).init_str("kCFRunLoopDefaultMode");
        let _: bool = msg_send![run_loop, runMode: mode beforeDate: date];
    }
}

#[cfg(not(target_os = "macos"))]
pub fn pump_run_loop(timeout: std::time::Duration) {
    std::thread::sleep(timeout);
}

/// Height of the primary screen in points, for flipping between AppKit's
/// bottom-left coordinates and the crate's top-left global space.
#[cfg(target_os = "macos")]
fn primary_screen_height() -> f64 {
    unsafe {
        let screens: id = msg_send![class!(NSScreen), screens];
        let count: usize = msg_send![screens, count];
        if count == 0 {
            return 0.0;
        }
        let primary: id = msg_send![screens, objectAtIndex: 0usize];
        let frame: NSRect = msg_send![primary, frame];
        frame.size.height
    }
}

#[cfg(target_os = "macos")]
fn flip_rect(rect: NSRect, primary_height: f64) -> Rect {
    Rect::new(
        rect.origin.x,
        primary_height - rect.origin.y - rect.size.height,
        rect.size.width,
        rect.size.height,
    )
}

#[cfg(target_os = "macos")]
fn animate_alpha(window: id, alpha: f64, duration_secs: f64) {
    unsafe {
        let _: () = msg_send![class!(NSAnimationContext), beginGrouping];
        let context: id = msg_send![class!(NSAnimationContext), currentContext];
        let _: () = msg_send![context, setDuration: duration_secs];
        let animator: id = msg_send![window, animator];
        let _: () = msg_send![animator, setAlphaValue: alpha];
        let _: () = msg_send![class!(NSAnimationContext), endGrouping];
    }
}

#[cfg(target_os = "macos")]
fn animation_duration_secs(animation: Animation) -> f64 {
    let ms = match animation {
        Animation::Spring { duration_ms, .. } => duration_ms,
        Animation::EaseInOut { duration_ms } => duration_ms,
    };
    ms as f64 / 1000.0
}

// ============================================================================
// Window host
// ============================================================================

/// Borderless floating NSPanel per window id, with an NSTextField rendering
/// the content slots.
#[cfg(target_os = "macos")]
pub struct CocoaHost {
    next_id: u64,
    windows: HashMap<u64, CocoaWindow>,
}

#[cfg(target_os = "macos")]
struct CocoaWindow {
    panel: id,
    label: id,
}

#[cfg(target_os = "macos")]
impl CocoaHost {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            windows: HashMap::new(),
        }
    }

    fn set_label_text(&self, window: &CocoaWindow, text: &str) {
        unsafe {
            let value = NSString::alloc(nil).init_str(text);
            let _: () = msg_send![window.label, setStringValue: value];
        }
    }
}

#[cfg(target_os = "macos")]
impl Default for CocoaHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "macos")]
impl WindowHost for CocoaHost {
    fn create_window(&mut self, _screen: &ScreenInfo, frame: Rect) -> WindowId {
        debug_assert_main_thread();
        unsafe {
            let primary_height = primary_screen_height();
            // Flip back to AppKit bottom-left coordinates
            let content_rect = NSRect::new(
                NSPoint::new(frame.x, primary_height - frame.y - frame.height),
                NSSize::new(frame.width, frame.height),
            );

            let panel: id = msg_send![class!(NSPanel), alloc];
            // NSWindowStyleMaskBorderless = 0, NSBackingStoreBuffered = 2
            let panel: id = msg_send![panel,
                initWithContentRect: content_rect
                styleMask: 0u64
                backing: 2u64
                defer: NO];
            let _: () = msg_send![panel, setLevel: NS_STATUS_WINDOW_LEVEL];
            let _: () = msg_send![panel, setOpaque: NO];
            let clear: id = msg_send![class!(NSColor), clearColor];
            let _: () = msg_send![panel, setBackgroundColor: clear];
            let _: () = msg_send![panel, setHasShadow: YES];
            let _: () = msg_send![panel, setAlphaValue: 0.0f64];
            // Keep it out of window restoration and Mission Control
            let _: () = msg_send![panel, setRestorable: NO];
            let behavior = NS_WINDOW_COLLECTION_BEHAVIOR_CAN_JOIN_ALL_SPACES
                | NS_WINDOW_COLLECTION_BEHAVIOR_FULL_SCREEN_AUXILIARY;
            let _: () = msg_send![panel, setCollectionBehavior: behavior];
            // The panel map owns the window; AppKit must not release it on
            // close
            let _: () = msg_send![panel, setReleasedWhenClosed: NO];

            // Content label
            let label_frame = NSRect::new(
                NSPoint::new(0.0, 0.0),
                NSSize::new(frame.width, frame.height),
            );
            let label: id = msg_send![class!(NSTextField), alloc];
            let label: id = msg_send![label, initWithFrame: label_frame];
            let _: () = msg_send![label, setBezeled: NO];
            let _: () = msg_send![label, setDrawsBackground: NO];
            let _: () = msg_send![label, setEditable: NO];
            let _: () = msg_send![label, setSelectable: NO];
            let content_view: id = msg_send![panel, contentView];
            let _: () = msg_send![content_view, addSubview: label];

            self.next_id += 1;
            self.windows
                .insert(self.next_id, CocoaWindow { panel, label });
            WindowId(self.next_id)
        }
    }

    fn apply_state(
        &mut self,
        window: WindowId,
        state: PanelState,
        animation: Animation,
        content: &ContentSlots,
    ) {
        debug_assert_main_thread();
        let Some(win) = self.windows.get(&window.0) else {
            return;
        };
        let text = match state {
            PanelState::Expanded => content.expanded.clone().unwrap_or_default(),
            PanelState::Compact => {
                let leading = content.compact_leading.as_deref().unwrap_or("");
                let trailing = content.compact_trailing.as_deref().unwrap_or("");
                format!("{leading}  {trailing}").trim().to_string()
            }
            PanelState::Hidden => String::new(),
        };
        self.set_label_text(win, &text);

        // Content opacity tracks the state; the window's own alpha is
        // managed by show/fade.
        let target_alpha = if state == PanelState::Hidden { 0.0 } else { 1.0 };
        unsafe {
            let _: () = msg_send![class!(NSAnimationContext), beginGrouping];
            let context: id = msg_send![class!(NSAnimationContext), currentContext];
            let duration = animation_duration_secs(animation);
            let _: () = msg_send![context, setDuration: duration];
            let animator: id = msg_send![win.label, animator];
            let _: () = msg_send![animator, setAlphaValue: target_alpha];
            let _: () = msg_send![class!(NSAnimationContext), endGrouping];
        }
    }

    fn show_window(&mut self, window: WindowId) {
        debug_assert_main_thread();
        if let Some(win) = self.windows.get(&window.0) {
            unsafe {
                let _: () = msg_send![win.panel, setAlphaValue: 0.0f64];
                let _: () = msg_send![win.panel, orderFrontRegardless];
            }
            animate_alpha(win.panel, 1.0, crate::panel::FADE_DURATION.as_secs_f64());
        }
    }

    fn order_front(&mut self, window: WindowId) {
        debug_assert_main_thread();
        if let Some(win) = self.windows.get(&window.0) {
            unsafe {
                let _: () = msg_send![win.panel, setAlphaValue: 1.0f64];
                let _: () = msg_send![win.panel, orderFrontRegardless];
            }
        }
    }

    fn fade_out(&mut self, window: WindowId) {
        debug_assert_main_thread();
        if let Some(win) = self.windows.get(&window.0) {
            animate_alpha(win.panel, 0.0, crate::panel::FADE_DURATION.as_secs_f64());
        }
    }

    fn close_window(&mut self, window: WindowId) {
        debug_assert_main_thread();
        if let Some(win) = self.windows.remove(&window.0) {
            unsafe {
                let _: () = msg_send![win.panel, orderOut: nil];
                let _: () = msg_send![win.panel, close];
            }
        }
    }

    fn haptic_pulse(&mut self) {
        debug_assert_main_thread();
        unsafe {
            let performer: id = msg_send![class!(NSHapticFeedbackManager), defaultPerformer];
            // NSHapticFeedbackPatternAlignment = 0, PerformanceTimeNow = 1
            let _: () = msg_send![performer, performFeedbackPattern: 0i64
                                           performanceTime: 1u64];
        }
    }
}

// ============================================================================
// Input source
// ============================================================================

/// Polls `NSEvent` class properties for the pointer and the primary mouse
/// button. Click detection is edge-triggered on `pressedMouseButtons`; no
/// event tap, so no accessibility permission is needed.
#[cfg(target_os = "macos")]
pub struct CocoaInput {
    button_was_down: bool,
}

#[cfg(target_os = "macos")]
impl CocoaInput {
    pub fn new() -> Self {
        Self {
            button_was_down: false,
        }
    }
}

#[cfg(target_os = "macos")]
impl Default for CocoaInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "macos")]
impl InputSource for CocoaInput {
    fn pointer_position(&mut self) -> Option<Point> {
        // CGEvent reports the pointer in global top-left coordinates, no
        // flip needed
        let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState).ok()?;
        let event = CGEvent::new(source).ok()?;
        let location = event.location();
        Some(Point::new(location.x, location.y))
    }

    fn take_click(&mut self) -> Option<Point> {
        debug_assert_main_thread();
        let down = unsafe {
            let buttons: u64 = msg_send![class!(NSEvent), pressedMouseButtons];
            buttons & 1 != 0
        };
        let clicked = down && !self.button_was_down;
        self.button_was_down = down;
        if clicked {
            self.pointer_position()
        } else {
            None
        }
    }
}

// ============================================================================
// Screen source
// ============================================================================

/// Snapshots NSScreen geometry into the crate's top-left global space. The
/// notch is derived from the auxiliary top areas when the OS exposes them.
#[cfg(target_os = "macos")]
pub struct CocoaScreens;

#[cfg(target_os = "macos")]
impl CocoaScreens {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
impl Default for CocoaScreens {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "macos")]
impl ScreenSource for CocoaScreens {
    fn screens(&mut self) -> Vec<ScreenInfo> {
        debug_assert_main_thread();
        unsafe {
            let screens: id = msg_send![class!(NSScreen), screens];
            let count: usize = msg_send![screens, count];
            if count == 0 {
                return Vec::new();
            }
            let primary_height = primary_screen_height();

            let mut out = Vec::with_capacity(count);
            for index in 0..count {
                let screen: id = msg_send![screens, objectAtIndex: index];
                let frame_bl: NSRect = msg_send![screen, frame];
                let visible_bl: NSRect = msg_send![screen, visibleFrame];
                let frame = flip_rect(frame_bl, primary_height);

                // Menu bar height: gap between the screen top and the top
                // of the visible frame
                let menubar_height = (frame_bl.origin.y + frame_bl.size.height)
                    - (visible_bl.origin.y + visible_bl.size.height);

                out.push(ScreenInfo {
                    frame,
                    notch_frame: notch_frame_for(screen, frame),
                    menubar_height,
                });
            }
            out
        }
    }
}

/// Derive the notch rect from the auxiliary top-left/right areas, available
/// on macOS 12+. Older systems and external displays report no notch.
#[cfg(target_os = "macos")]
fn notch_frame_for(screen: id, frame: Rect) -> Option<Rect> {
    unsafe {
        let responds: bool = msg_send![screen, respondsToSelector: sel!(auxiliaryTopLeftArea)];
        if !responds {
            return None;
        }
        let left: NSRect = msg_send![screen, auxiliaryTopLeftArea];
        let right: NSRect = msg_send![screen, auxiliaryTopRightArea];
        if left.size.width <= 0.0 || right.size.width <= 0.0 {
            return None;
        }
        let notch_x = left.origin.x + left.size.width;
        let notch_width = right.origin.x - notch_x;
        let notch_height = left.size.height;
        if notch_width <= 0.0 || notch_height <= 0.0 {
            return None;
        }
        Some(Rect::new(notch_x, frame.y, notch_width, notch_height))
    }
}

// ============================================================================
// Non-macOS stubs
// ============================================================================

#[cfg(not(target_os = "macos"))]
#[derive(Default)]
pub struct CocoaHost {
    next_id: u64,
    live: HashMap<u64, ()>,
}

#[cfg(not(target_os = "macos"))]
impl CocoaHost {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_os = "macos"))]
impl WindowHost for CocoaHost {
    fn create_window(&mut self, _screen: &ScreenInfo, _frame: Rect) -> WindowId {
        self.next_id += 1;
        self.live.insert(self.next_id, ());
        WindowId(self.next_id)
    }

    fn apply_state(
        &mut self,
        _window: WindowId,
        _state: PanelState,
        _animation: Animation,
        _content: &ContentSlots,
    ) {
    }

    fn show_window(&mut self, _window: WindowId) {}

    fn order_front(&mut self, _window: WindowId) {}

    fn fade_out(&mut self, _window: WindowId) {}

    fn close_window(&mut self, window: WindowId) {
        self.live.remove(&window.0);
    }

    fn haptic_pulse(&mut self) {}
}

#[cfg(not(target_os = "macos"))]
#[derive(Default)]
pub struct CocoaInput;

#[cfg(not(target_os = "macos"))]
impl CocoaInput {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_os = "macos"))]
impl InputSource for CocoaInput {
    fn pointer_position(&mut self) -> Option<Point> {
        None
    }

    fn take_click(&mut self) -> Option<Point> {
        None
    }
}

#[cfg(not(target_os = "macos"))]
#[derive(Default)]
pub struct CocoaScreens;

#[cfg(not(target_os = "macos"))]
impl CocoaScreens {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_os = "macos"))]
impl ScreenSource for CocoaScreens {
    fn screens(&mut self) -> Vec<ScreenInfo> {
        Vec::new()
    }
}
