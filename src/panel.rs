//! Notch panel lifecycle state machine.
//!
//! Owns the single platform window and its three-state lifecycle
//! (hidden / compact / expanded). Transitions are choreographed against
//! animation timing: a cold transition creates the window invisible, starts
//! the state animation, and only then presents the window (starting both on
//! the same frame causes a visible stutter); a warm transition reuses the
//! existing window and passes through an intermediate hide with a settle
//! delay, re-checking the state on resume in case a concurrent request moved
//! it elsewhere.
//!
//! There are no opaque sleeps here. Every delay is a deadline stored in a
//! named field (`warm_step`, `deferred_hide`, `pending_close`,
//! `settle_signals`) and driven by `tick(now)` from the session pump;
//! cancelling an operation means dropping or replacing its field. At most
//! one delayed teardown is live per panel, and whichever operation preempts
//! it takes over resolving its completion.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use bitflags::bitflags;

use crate::content::ContentSlots;
use crate::geometry::Rect;
use crate::host::WindowHost;
use crate::logging;
use crate::screen::{NotchStyle, ScreenInfo};

/// Delay before an `expand`/`compact` completion fires, covering the full
/// opening animation.
const SETTLE_SIGNAL_DELAY: Duration = Duration::from_millis(400);

/// Settle delay between the intermediate hide and the forward animation of
/// a warm transition.
const WARM_SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Retry interval for a hide deferred by `KEEP_VISIBLE` hover.
const HIDE_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// How long the closing animation gets before the teardown fade starts.
const CLOSE_SETTLE_DELAY: Duration = Duration::from_millis(350);

/// Window opacity fade duration, both in and out.
pub const FADE_DURATION: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Hidden,
    Compact,
    Expanded,
}

/// Animation descriptor handed to the window host. The panel only cares
/// that each transition has one; hosts map it onto their timing curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    /// Spring with a response duration and a bounce percentage.
    Spring { duration_ms: u64, bounce: u8 },
    EaseInOut { duration_ms: u64 },
}

fn default_opening(style: NotchStyle) -> Animation {
    match style {
        NotchStyle::Notch => Animation::Spring {
            duration_ms: 400,
            bounce: 20,
        },
        _ => Animation::EaseInOut { duration_ms: 300 },
    }
}

fn default_closing(style: NotchStyle) -> Animation {
    match style {
        NotchStyle::Notch => Animation::Spring {
            duration_ms: 300,
            bounce: 0,
        },
        _ => Animation::EaseInOut { duration_ms: 250 },
    }
}

fn default_conversion(style: NotchStyle) -> Animation {
    match style {
        NotchStyle::Notch => Animation::Spring {
            duration_ms: 350,
            bounce: 10,
        },
        _ => Animation::EaseInOut { duration_ms: 250 },
    }
}

/// Per-panel animation overrides. Unset fields fall back to the resolved
/// style's defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionConfig {
    pub opening: Option<Animation>,
    pub closing: Option<Animation>,
    pub conversion: Option<Animation>,
    /// Skip the intermediate hide when converting between compact and
    /// expanded, for a faster direct animation.
    pub skip_intermediate_hides: bool,
}

bitflags! {
    /// How the panel reacts to the pointer entering it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HoverBehavior: u8 {
        /// Defer hide requests while the pointer is over the panel.
        const KEEP_VISIBLE = 1 << 0;
        /// Fire a haptic pulse on hover-enter.
        const HAPTIC_FEEDBACK = 1 << 1;
    }
}

impl Default for HoverBehavior {
    fn default() -> Self {
        HoverBehavior::all()
    }
}

/// Resolves exactly once when the transition that produced it has visually
/// settled. Cloneable so the panel holds one side while the caller holds
/// the other.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    resolutions: Rc<Cell<u32>>,
}

impl Completion {
    fn new() -> Self {
        Self::default()
    }

    fn resolve(&self) {
        self.resolutions.set(self.resolutions.get() + 1);
    }

    pub fn is_resolved(&self) -> bool {
        self.resolutions.get() > 0
    }

    /// Number of times this completion was resolved. Anything other than
    /// one after settling is a bug in the cancellation discipline.
    pub fn resolution_count(&self) -> u32 {
        self.resolutions.get()
    }
}

struct PanelWindow {
    id: crate::host::WindowId,
    screen: ScreenInfo,
}

struct WarmStep {
    target: PanelState,
    resume_at: Instant,
}

enum ClosePhase {
    /// Waiting for the closing animation to mostly finish.
    Settling,
    /// Opacity fading to zero; window is destroyed when this elapses.
    FadingOut,
}

struct PendingClose {
    phase: ClosePhase,
    due: Instant,
    completions: Vec<Completion>,
}

struct DeferredHide {
    retry_at: Instant,
    completions: Vec<Completion>,
}

pub struct NotchPanel<H: WindowHost> {
    host: H,
    style: NotchStyle,
    hover_behavior: HoverBehavior,
    pub transition_config: TransitionConfig,
    content: ContentSlots,
    state: PanelState,
    hovering: bool,
    window: Option<PanelWindow>,
    warm_step: Option<WarmStep>,
    pending_close: Option<PendingClose>,
    deferred_hide: Option<DeferredHide>,
    settle_signals: Vec<(Instant, Completion)>,
}

impl<H: WindowHost> NotchPanel<H> {
    pub fn new(host: H, style: NotchStyle, hover_behavior: HoverBehavior) -> Self {
        Self {
            host,
            style,
            hover_behavior,
            transition_config: TransitionConfig::default(),
            content: ContentSlots::default(),
            state: PanelState::Hidden,
            hovering: false,
            window: None,
            warm_step: None,
            pending_close: None,
            deferred_hide: None,
            settle_signals: Vec::new(),
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Bind the content slots rendered on the next state application.
    pub fn set_content(&mut self, content: ContentSlots) {
        self.content = content;
    }

    fn effective_opening(&self, style: NotchStyle) -> Animation {
        self.transition_config
            .opening
            .unwrap_or_else(|| default_opening(style))
    }

    fn effective_closing(&self, style: NotchStyle) -> Animation {
        self.transition_config
            .closing
            .unwrap_or_else(|| default_closing(style))
    }

    fn effective_conversion(&self, style: NotchStyle) -> Animation {
        self.transition_config
            .conversion
            .unwrap_or_else(|| default_conversion(style))
    }

    /// Expand the panel on `screen`. No-op (resolved immediately) if already
    /// expanded. The completion resolves once the opening animation has had
    /// its full duration.
    pub fn expand(&mut self, screen: &ScreenInfo, now: Instant) -> Completion {
        if self.state == PanelState::Expanded {
            let done = Completion::new();
            done.resolve();
            return done;
        }
        self.transition_to(PanelState::Expanded, screen, now)
    }

    /// Enter the compact state on `screen`. Redirects to `hide` when the
    /// resolved style is floating or both compact slots are disabled; those
    /// configurations have no compact appearance.
    pub fn compact(&mut self, screen: &ScreenInfo, now: Instant) -> Completion {
        if self.state == PanelState::Compact {
            let done = Completion::new();
            done.resolve();
            return done;
        }
        if self.style.resolve(screen).is_floating() || self.content.compact_disabled() {
            return self.hide(now);
        }
        self.transition_to(PanelState::Compact, screen, now)
    }

    fn transition_to(
        &mut self,
        target: PanelState,
        screen: &ScreenInfo,
        now: Instant,
    ) -> Completion {
        self.cancel_pending_close("preempted by transition");

        let style = self.style.resolve(screen);
        let needs_new_window = self.state == PanelState::Hidden
            || self
                .window
                .as_ref()
                .map(|w| w.screen != *screen)
                .unwrap_or(true);

        if needs_new_window {
            // Create the window but keep it invisible until the animation
            // is in flight.
            self.initialize_window(screen, false);
            self.state = target;
            let opening = self.effective_opening(style);
            if let Some(window) = &self.window {
                self.host
                    .apply_state(window.id, target, opening, &self.content);
                self.host.show_window(window.id);
            }
            logging::log("PANEL", &format!("cold transition to {target:?}"));
        } else if self.transition_config.skip_intermediate_hides {
            self.state = target;
            let conversion = self.effective_conversion(style);
            if let Some(window) = &self.window {
                self.host
                    .apply_state(window.id, target, conversion, &self.content);
            }
            logging::log("PANEL", &format!("direct conversion to {target:?}"));
        } else {
            // Warm transition: pass through hidden, settle, then convert.
            // The forward half runs from tick() and re-checks the state.
            self.state = PanelState::Hidden;
            let closing = self.effective_closing(style);
            if let Some(window) = &self.window {
                self.host
                    .apply_state(window.id, PanelState::Hidden, closing, &self.content);
            }
            self.warm_step = Some(WarmStep {
                target,
                resume_at: now + WARM_SETTLE_DELAY,
            });
            logging::log("PANEL", &format!("warm transition to {target:?}"));
        }

        let completion = Completion::new();
        self.settle_signals
            .push((now + SETTLE_SIGNAL_DELAY, completion.clone()));
        completion
    }

    /// Hide the panel. Idempotent; a hide while the pointer is over the
    /// panel under `KEEP_VISIBLE` is deferred and retried until the pointer
    /// leaves. The completion resolves after the window is destroyed (or
    /// sooner, if another transition preempts the teardown).
    pub fn hide(&mut self, now: Instant) -> Completion {
        let completion = Completion::new();
        if self.state == PanelState::Hidden {
            completion.resolve();
            return completion;
        }

        if self.hover_behavior.contains(HoverBehavior::KEEP_VISIBLE) && self.hovering {
            match &mut self.deferred_hide {
                Some(deferred) => deferred.completions.push(completion.clone()),
                None => {
                    self.deferred_hide = Some(DeferredHide {
                        retry_at: now + HIDE_RETRY_INTERVAL,
                        completions: vec![completion.clone()],
                    });
                    logging::log("PANEL", "hide deferred while hovering");
                }
            }
            return completion;
        }

        let mut completions = self
            .deferred_hide
            .take()
            .map(|d| d.completions)
            .unwrap_or_default();
        completions.push(completion.clone());
        self.commit_hide(now, completions);
        completion
    }

    fn commit_hide(&mut self, now: Instant, mut completions: Vec<Completion>) {
        if self.state == PanelState::Hidden {
            for c in completions {
                c.resolve();
            }
            return;
        }

        let style = match &self.window {
            Some(window) => self.style.resolve(&window.screen),
            None => self.style,
        };
        self.state = PanelState::Hidden;
        self.hovering = false;
        let closing = self.effective_closing(style);
        if let Some(window) = &self.window {
            self.host
                .apply_state(window.id, PanelState::Hidden, closing, &self.content);
        }

        // Never two live teardowns: a restart absorbs the old one's
        // completions.
        if let Some(old) = self.pending_close.take() {
            completions.extend(old.completions);
        }
        self.pending_close = Some(PendingClose {
            phase: ClosePhase::Settling,
            due: now + CLOSE_SETTLE_DELAY,
            completions,
        });
        logging::log("PANEL", "hide committed, teardown scheduled");
    }

    fn cancel_pending_close(&mut self, reason: &str) {
        if let Some(pending) = self.pending_close.take() {
            logging::log("PANEL", &format!("pending close cancelled: {reason}"));
            for c in pending.completions {
                c.resolve();
            }
        }
    }

    /// Update the hover flag. Ignored while hidden or when unchanged; a true
    /// hover-enter fires one haptic pulse under `HAPTIC_FEEDBACK`.
    pub fn set_hovering(&mut self, hovering: bool) {
        if self.state == PanelState::Hidden || hovering == self.hovering {
            return;
        }
        self.hovering = hovering;
        if hovering && self.hover_behavior.contains(HoverBehavior::HAPTIC_FEEDBACK) {
            self.host.haptic_pulse();
        }
    }

    /// Screen-parameters-changed: rebuild the window against the first
    /// available screen. With no screens left the panel tears down fully.
    pub fn handle_screens_changed(&mut self, screens: &[ScreenInfo]) {
        if self.window.is_none() {
            return;
        }
        match screens.first() {
            Some(screen) => {
                logging::log("PANEL", "screens changed, rebuilding window");
                self.initialize_window(screen, true);
                let style = self.style.resolve(screen);
                if let Some(window) = &self.window {
                    self.host.apply_state(
                        window.id,
                        self.state,
                        self.effective_conversion(style),
                        &self.content,
                    );
                }
            }
            None => {
                logging::log("PANEL", "no screens available, tearing down");
                self.deinitialize_window();
                self.state = PanelState::Hidden;
                self.hovering = false;
                self.warm_step = None;
                self.cancel_pending_close("no screens");
                if let Some(deferred) = self.deferred_hide.take() {
                    for c in deferred.completions {
                        c.resolve();
                    }
                }
            }
        }
    }

    /// Drive pending deadlines. Called from the session pump; `now` flows in
    /// from the caller so tests control time.
    pub fn tick(&mut self, now: Instant) {
        // Forward half of a warm transition. The state re-check guards
        // against a concurrent request having moved it during the gap.
        if let Some(step) = self.warm_step.take() {
            if now < step.resume_at {
                self.warm_step = Some(step);
            } else if self.state == PanelState::Hidden {
                self.state = step.target;
                let style = match &self.window {
                    Some(window) => self.style.resolve(&window.screen),
                    None => self.style,
                };
                let conversion = self.effective_conversion(style);
                if let Some(window) = &self.window {
                    self.host
                        .apply_state(window.id, step.target, conversion, &self.content);
                }
            } else {
                logging::log("PANEL", "warm transition aborted, state moved");
            }
        }

        // Deferred hide retry: re-check hover each interval.
        if let Some(deferred) = self.deferred_hide.take() {
            if now < deferred.retry_at {
                self.deferred_hide = Some(deferred);
            } else if self.state == PanelState::Hidden {
                for c in deferred.completions {
                    c.resolve();
                }
            } else if self.hover_behavior.contains(HoverBehavior::KEEP_VISIBLE) && self.hovering {
                self.deferred_hide = Some(DeferredHide {
                    retry_at: now + HIDE_RETRY_INTERVAL,
                    completions: deferred.completions,
                });
            } else {
                self.commit_hide(now, deferred.completions);
            }
        }

        // Teardown phases: settle, fade, destroy.
        let due_phase = self
            .pending_close
            .as_ref()
            .filter(|p| now >= p.due)
            .map(|p| matches!(p.phase, ClosePhase::Settling));
        match due_phase {
            Some(true) => {
                if let Some(window) = &self.window {
                    self.host.fade_out(window.id);
                }
                if let Some(pending) = &mut self.pending_close {
                    pending.phase = ClosePhase::FadingOut;
                    pending.due = now + FADE_DURATION;
                }
            }
            Some(false) => {
                if let Some(pending) = self.pending_close.take() {
                    self.deinitialize_window();
                    for c in pending.completions {
                        c.resolve();
                    }
                    logging::log("PANEL", "teardown complete");
                }
            }
            None => {}
        }

        // Settle signals for expand/compact callers.
        self.settle_signals.retain(|(due, completion)| {
            if now >= *due {
                completion.resolve();
                false
            } else {
                true
            }
        });
    }

    fn initialize_window(&mut self, screen: &ScreenInfo, order_front: bool) {
        // One window at a time.
        self.deinitialize_window();

        let size = (screen.frame.width / 2.0, screen.frame.height / 2.0);
        let frame = Rect::new(
            screen.frame.mid_x() - size.0 / 2.0,
            screen.frame.y,
            size.0,
            size.1,
        );
        let id = self.host.create_window(screen, frame);
        self.window = Some(PanelWindow {
            id,
            screen: screen.clone(),
        });
        if order_front {
            self.host.order_front(id);
        }
    }

    fn deinitialize_window(&mut self) {
        if let Some(window) = self.window.take() {
            self.host.close_window(window.id);
        }
    }
}
