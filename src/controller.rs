//! Session orchestration: trigger activation, hover tracking, auto-close.
//!
//! `NotchSession` sits between the raw input sources and the panel state
//! machine. It polls the pointer at a bounded rate, arms a dwell timer when
//! the pointer sits in the trigger strip, re-validates the pointer position
//! when the timer fires, and tears the panel down when the pointer leaves
//! the expanded bounds or a click lands outside them.
//!
//! Everything runs off `pump(now)`. The session holds no background threads
//! and no global state; tests drive it with scripted sources and fabricated
//! timestamps.

use std::time::{Duration, Instant};

use crate::content::ContentSlots;
use crate::geometry::{expanded_zone, trigger_zone, Point, ZoneDimensions};
use crate::host::{InputSource, ScreenSource, WindowHost};
use crate::logging;
use crate::panel::{NotchPanel, PanelState};
use crate::screen::ScreenInfo;

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Minimum gap between pointer samples.
    pub sample_interval: Duration,
    /// How long the pointer must dwell in the trigger strip before the
    /// panel opens.
    pub trigger_dwell: Duration,
    /// Minimum gap between trigger activations.
    pub trigger_cooldown: Duration,
    /// How long the pointer may stay outside the expanded bounds before
    /// the panel closes itself.
    pub auto_close_delay: Duration,
    pub zones: ZoneDimensions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(100),
            trigger_dwell: Duration::from_millis(300),
            trigger_cooldown: Duration::from_millis(1000),
            auto_close_delay: Duration::from_millis(1000),
            zones: ZoneDimensions::default(),
        }
    }
}

pub struct NotchSession<H, I, S>
where
    H: WindowHost,
    I: InputSource,
    S: ScreenSource,
{
    panel: NotchPanel<H>,
    input: I,
    screen_source: S,
    config: SessionConfig,
    content_fn: Box<dyn Fn() -> ContentSlots>,

    monitors_installed: bool,
    /// Click-outside watching; installed on show, removed on hide. The
    /// hover monitor has no equivalent flag because trigger activation
    /// needs pointer samples while the panel is hidden.
    click_monitor: bool,
    last_sample: Option<Instant>,
    /// Deadline for a dwell in progress in the trigger strip.
    trigger_fire_at: Option<Instant>,
    /// When the trigger last fired, for the cooldown gate.
    trigger_last_fired: Option<Instant>,
    /// Deadline for the auto-close while the pointer is outside the
    /// expanded bounds.
    auto_close_at: Option<Instant>,
    screen_snapshot: Vec<ScreenInfo>,
}

impl<H, I, S> NotchSession<H, I, S>
where
    H: WindowHost,
    I: InputSource,
    S: ScreenSource,
{
    pub fn new(
        panel: NotchPanel<H>,
        input: I,
        screen_source: S,
        config: SessionConfig,
        content_fn: Box<dyn Fn() -> ContentSlots>,
    ) -> Self {
        Self {
            panel,
            input,
            screen_source,
            config,
            content_fn,
            monitors_installed: false,
            click_monitor: false,
            last_sample: None,
            trigger_fire_at: None,
            trigger_last_fired: None,
            auto_close_at: None,
            screen_snapshot: Vec::new(),
        }
    }

    pub fn panel(&self) -> &NotchPanel<H> {
        &self.panel
    }

    pub fn state(&self) -> PanelState {
        self.panel.state()
    }

    pub fn is_visible(&self) -> bool {
        self.panel.state() != PanelState::Hidden
    }

    /// Begin watching the pointer. Idempotent; a second call changes
    /// nothing.
    pub fn start_monitors(&mut self) {
        if self.monitors_installed {
            return;
        }
        self.monitors_installed = true;
        self.screen_snapshot = self.screen_source.screens();
        logging::log("SESSION", "monitors installed");
    }

    /// Stop watching entirely. Idempotent. In-flight dwell and auto-close
    /// deadlines are dropped; a panel mid-teardown still completes via
    /// `pump`.
    pub fn stop_monitors(&mut self) {
        if !self.monitors_installed {
            return;
        }
        self.monitors_installed = false;
        self.click_monitor = false;
        self.trigger_fire_at = None;
        self.auto_close_at = None;
        logging::log("SESSION", "monitors removed");
    }

    /// Show the expanded panel on the screen under the pointer. No screens
    /// means no panel; the request is dropped with a warning.
    pub fn show_notch(&mut self, now: Instant) {
        let screens = self.screen_source.screens();
        self.screen_snapshot = screens.clone();
        let Some(screen) = active_screen(&screens, self.input.pointer_position()) else {
            tracing::warn!("show requested with no screens available");
            return;
        };
        let screen = screen.clone();
        self.panel.set_content((self.content_fn)());
        self.panel.expand(&screen, now);
        self.click_monitor = true;
        self.auto_close_at = None;
        self.trigger_fire_at = None;
    }

    /// Hide the panel and remove the click monitor. The hover monitor
    /// stays: the trigger strip needs pointer samples while hidden.
    pub fn hide_notch(&mut self, now: Instant) {
        self.panel.hide(now);
        self.click_monitor = false;
        self.auto_close_at = None;
        self.trigger_fire_at = None;
    }

    pub fn toggle_notch(&mut self, now: Instant) {
        if self.is_visible() {
            self.hide_notch(now);
        } else {
            self.show_notch(now);
        }
    }

    /// One scheduler beat: screen diff, click routing, rate-limited hover
    /// evaluation, deadline checks, then the panel's own tick.
    pub fn pump(&mut self, now: Instant) {
        if self.monitors_installed {
            self.check_screens();
            self.evaluate_pointer(now);
            self.route_clicks(now);
            self.fire_deadlines(now);
        }
        self.panel.tick(now);
    }

    fn check_screens(&mut self) {
        let current = self.screen_source.screens();
        if current == self.screen_snapshot {
            return;
        }
        logging::log("SESSION", "screen configuration changed");
        self.screen_snapshot = current.clone();
        self.panel.handle_screens_changed(&current);
        if current.is_empty() {
            // Panel already tore down; drop session-side state too.
            self.click_monitor = false;
            self.auto_close_at = None;
            self.trigger_fire_at = None;
        }
    }

    fn route_clicks(&mut self, now: Instant) {
        while let Some(click) = self.input.take_click() {
            if !self.click_monitor || !self.is_visible() {
                continue;
            }
            let outside = match self.active_screen_frame(Some(click)) {
                Some(frame) => !expanded_zone(frame, &self.config.zones).contains(click),
                None => true,
            };
            if outside {
                logging::log("SESSION", "click outside panel, hiding");
                self.hide_notch(now);
            }
        }
    }

    fn evaluate_pointer(&mut self, now: Instant) {
        if let Some(last) = self.last_sample {
            if now.duration_since(last) < self.config.sample_interval {
                return;
            }
        }
        self.last_sample = Some(now);

        let pointer = self.input.pointer_position();

        if self.is_visible() {
            self.evaluate_hover(pointer, now);
        } else {
            self.evaluate_trigger(pointer, now);
        }
    }

    fn evaluate_hover(&mut self, pointer: Option<Point>, now: Instant) {
        let in_zone = match (pointer, self.active_screen(pointer)) {
            (Some(p), Some(screen)) => self.panel_zone(&screen).contains(p),
            _ => false,
        };
        self.panel.set_hovering(in_zone);

        if self.panel.state() != PanelState::Expanded {
            self.auto_close_at = None;
            return;
        }
        if in_zone {
            self.auto_close_at = None;
        } else if self.auto_close_at.is_none() {
            self.auto_close_at = Some(now + self.config.auto_close_delay);
        }
    }

    fn evaluate_trigger(&mut self, pointer: Option<Point>, now: Instant) {
        let in_strip = self.pointer_in_trigger_strip(pointer);
        if in_strip {
            if self.trigger_fire_at.is_none() && self.cooldown_elapsed(now) {
                self.trigger_fire_at = Some(now + self.config.trigger_dwell);
                logging::log("SESSION", "trigger dwell started");
            }
        } else {
            self.trigger_fire_at = None;
        }
    }

    fn fire_deadlines(&mut self, now: Instant) {
        if let Some(fire_at) = self.trigger_fire_at {
            if now >= fire_at {
                self.trigger_fire_at = None;
                // Re-validate against a fresh sample: the pointer may have
                // left between the last poll and the deadline.
                let pointer = self.input.pointer_position();
                if self.panel.state() == PanelState::Hidden
                    && self.pointer_in_trigger_strip(pointer)
                {
                    self.trigger_last_fired = Some(now);
                    logging::log("SESSION", "trigger fired");
                    self.show_notch(now);
                } else {
                    logging::log("SESSION", "trigger fire cancelled on re-validation");
                }
            }
        }

        if let Some(close_at) = self.auto_close_at {
            if now >= close_at {
                self.auto_close_at = None;
                logging::log("SESSION", "auto-close elapsed");
                self.hide_notch(now);
            }
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.trigger_last_fired {
            Some(fired) => now.duration_since(fired) >= self.config.trigger_cooldown,
            None => true,
        }
    }

    fn pointer_in_trigger_strip(&self, pointer: Option<Point>) -> bool {
        match (pointer, self.active_screen(pointer)) {
            (Some(p), Some(screen)) => {
                trigger_zone(screen.frame, &self.config.zones).contains(p)
            }
            _ => false,
        }
    }

    /// Hover bounds for the current state: the full expanded footprint when
    /// expanded, the notch (or menubar) sliver when compact.
    fn panel_zone(&self, screen: &ScreenInfo) -> crate::geometry::Rect {
        match self.panel.state() {
            PanelState::Compact => screen.notch_frame_or_menubar(),
            _ => expanded_zone(screen.frame, &self.config.zones),
        }
    }

    fn active_screen(&self, pointer: Option<Point>) -> Option<ScreenInfo> {
        active_screen(&self.screen_snapshot, pointer).cloned()
    }

    fn active_screen_frame(&self, pointer: Option<Point>) -> Option<crate::geometry::Rect> {
        self.active_screen(pointer).map(|s| s.frame)
    }
}

/// The screen under the pointer, falling back to the first screen. `None`
/// only when no screens exist at all.
fn active_screen(screens: &[ScreenInfo], pointer: Option<Point>) -> Option<&ScreenInfo> {
    if let Some(p) = pointer {
        if let Some(screen) = screens.iter().find(|s| s.frame.contains(p)) {
            return Some(screen);
        }
    }
    screens.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::host::mock::{MockHost, ScriptedInput, ScriptedScreens};
    use crate::panel::HoverBehavior;
    use crate::screen::NotchStyle;

    fn notched_screen() -> ScreenInfo {
        ScreenInfo {
            frame: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            notch_frame: Some(Rect::new(860.0, 0.0, 200.0, 32.0)),
            menubar_height: 32.0,
        }
    }

    fn content() -> ContentSlots {
        ContentSlots {
            expanded: Some("tasks".into()),
            compact_leading: Some("3".into()),
            compact_trailing: Some("due".into()),
            badge_count: 3,
        }
    }

    struct Fixture {
        session: NotchSession<MockHost, ScriptedInput, ScriptedScreens>,
        input: ScriptedInput,
        screens: ScriptedScreens,
        t0: Instant,
    }

    fn fixture() -> Fixture {
        let input = ScriptedInput::new();
        let screens = ScriptedScreens::with(vec![notched_screen()]);
        let panel = NotchPanel::new(MockHost::new(), NotchStyle::Auto, HoverBehavior::all());
        let mut session = NotchSession::new(
            panel,
            input.clone(),
            screens.clone(),
            SessionConfig::default(),
            Box::new(content),
        );
        session.start_monitors();
        Fixture {
            session,
            input,
            screens,
            t0: Instant::now(),
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Pump every 50ms from `from` for `total` ms. Takes the session
    /// rather than the fixture so callers can read other fixture fields
    /// while it runs.
    fn pump_through(
        session: &mut NotchSession<MockHost, ScriptedInput, ScriptedScreens>,
        from: Instant,
        total: u64,
    ) {
        let mut t = 0;
        while t <= total {
            session.pump(from + ms(t));
            t += 50;
        }
    }

    // Trigger strip for the 1920-wide screen: x in [880, 1040), y in [0, 14).
    const IN_STRIP: (f64, f64) = (960.0, 5.0);
    // Inside the expanded bounds (x in [760, 1160), y in [0, 450)) but not
    // the strip.
    const IN_PANEL: (f64, f64) = (960.0, 200.0);
    const OUTSIDE: (f64, f64) = (100.0, 800.0);

    #[test]
    fn dwell_in_trigger_strip_opens_panel() {
        let mut f = fixture();
        f.input.move_pointer(IN_STRIP.0, IN_STRIP.1);

        f.session.pump(f.t0);
        assert_eq!(f.session.state(), PanelState::Hidden);

        f.session.pump(f.t0 + ms(150));
        assert_eq!(f.session.state(), PanelState::Hidden);

        f.session.pump(f.t0 + ms(300));
        assert_eq!(f.session.state(), PanelState::Expanded);
    }

    #[test]
    fn brushing_through_strip_does_not_open() {
        let mut f = fixture();
        f.input.move_pointer(IN_STRIP.0, IN_STRIP.1);
        f.session.pump(f.t0);

        // Pointer leaves before the dwell elapses.
        f.input.move_pointer(OUTSIDE.0, OUTSIDE.1);
        f.session.pump(f.t0 + ms(150));

        pump_through(&mut f.session, f.t0 + ms(200), 500);
        assert_eq!(f.session.state(), PanelState::Hidden);
    }

    #[test]
    fn fire_revalidates_pointer_position() {
        let mut f = fixture();
        f.input.move_pointer(IN_STRIP.0, IN_STRIP.1);
        f.session.pump(f.t0);
        f.session.pump(f.t0 + ms(250));

        // Pointer moves out after the last sample; the next pump lands
        // inside the sample interval, so only the fire-time check can see
        // the departure.
        f.input.move_pointer(OUTSIDE.0, OUTSIDE.1);
        f.session.pump(f.t0 + ms(300));
        assert_eq!(f.session.state(), PanelState::Hidden);
    }

    #[test]
    fn cooldown_gates_reactivation() {
        let mut f = fixture();
        f.input.move_pointer(IN_STRIP.0, IN_STRIP.1);
        pump_through(&mut f.session, f.t0, 300);
        assert_eq!(f.session.state(), PanelState::Expanded);
        let fired_at = f.t0 + ms(300);

        // Close it manually; pointer stays parked in the strip.
        let closed_at = fired_at + ms(100);
        f.session.hide_notch(closed_at);
        pump_through(&mut f.session, closed_at, 600);
        assert_eq!(f.session.state(), PanelState::Hidden);

        // Still inside the 1000ms cooldown measured from the fire: pumps
        // here must not re-arm.
        pump_through(&mut f.session, closed_at + ms(650), 200);
        assert_eq!(f.session.state(), PanelState::Hidden);

        // Past the cooldown the dwell re-arms and fires again.
        pump_through(&mut f.session, fired_at + ms(1050), 400);
        assert_eq!(f.session.state(), PanelState::Expanded);
    }

    #[test]
    fn pointer_samples_are_rate_limited() {
        let mut f = fixture();
        f.input.move_pointer(IN_STRIP.0, IN_STRIP.1);
        f.session.pump(f.t0);

        // Pointer leaves, but the next pump lands inside the sample
        // interval so the dwell is not cancelled yet.
        f.input.move_pointer(OUTSIDE.0, OUTSIDE.1);
        f.session.pump(f.t0 + ms(50));

        // Back in the strip before the next real sample: dwell survives
        // and fires on schedule.
        f.input.move_pointer(IN_STRIP.0, IN_STRIP.1);
        f.session.pump(f.t0 + ms(100));
        f.session.pump(f.t0 + ms(300));
        assert_eq!(f.session.state(), PanelState::Expanded);
    }

    #[test]
    fn auto_close_after_pointer_leaves_expanded_bounds() {
        let mut f = fixture();
        f.session.show_notch(f.t0);
        assert_eq!(f.session.state(), PanelState::Expanded);

        f.input.move_pointer(OUTSIDE.0, OUTSIDE.1);
        let left_at = f.t0 + ms(500);
        f.session.pump(left_at);

        // Not yet.
        pump_through(&mut f.session, left_at + ms(100), 700);
        assert_eq!(f.session.state(), PanelState::Expanded);

        pump_through(&mut f.session, left_at + ms(900), 300);
        assert_eq!(f.session.state(), PanelState::Hidden);
    }

    #[test]
    fn auto_close_cancelled_when_pointer_returns() {
        let mut f = fixture();
        f.session.show_notch(f.t0);

        f.input.move_pointer(OUTSIDE.0, OUTSIDE.1);
        f.session.pump(f.t0 + ms(100));

        f.input.move_pointer(IN_PANEL.0, IN_PANEL.1);
        f.session.pump(f.t0 + ms(600));

        pump_through(&mut f.session, f.t0 + ms(700), 2000);
        assert_eq!(f.session.state(), PanelState::Expanded);
    }

    #[test]
    fn hovering_panel_blocks_auto_close_indefinitely() {
        let mut f = fixture();
        f.session.show_notch(f.t0);
        f.input.move_pointer(IN_PANEL.0, IN_PANEL.1);

        pump_through(&mut f.session, f.t0, 5000);
        assert_eq!(f.session.state(), PanelState::Expanded);
        assert!(f.session.panel().is_hovering());
    }

    #[test]
    fn click_outside_hides_panel() {
        let mut f = fixture();
        f.session.show_notch(f.t0);
        f.input.move_pointer(IN_PANEL.0, IN_PANEL.1);
        f.session.pump(f.t0 + ms(100));

        f.input.click(OUTSIDE.0, OUTSIDE.1);
        // The pointer itself moved to the click location, so the hover
        // deferral does not hold the hide back.
        f.input.move_pointer(OUTSIDE.0, OUTSIDE.1);
        let clicked_at = f.t0 + ms(300);
        f.session.pump(clicked_at);
        assert_eq!(f.session.state(), PanelState::Hidden);

        pump_through(&mut f.session, clicked_at + ms(50), 700);
        assert!(f.session.panel().host().live_windows.is_empty());
    }

    #[test]
    fn click_inside_keeps_panel_open() {
        let mut f = fixture();
        f.session.show_notch(f.t0);
        f.input.move_pointer(IN_PANEL.0, IN_PANEL.1);

        f.input.click(IN_PANEL.0, IN_PANEL.1);
        pump_through(&mut f.session, f.t0 + ms(100), 500);
        assert_eq!(f.session.state(), PanelState::Expanded);
    }

    #[test]
    fn clicks_ignored_while_hidden() {
        let mut f = fixture();
        f.input.click(OUTSIDE.0, OUTSIDE.1);
        f.session.pump(f.t0);
        assert_eq!(f.session.state(), PanelState::Hidden);
    }

    #[test]
    fn toggle_cycles_visibility() {
        let mut f = fixture();
        f.session.toggle_notch(f.t0);
        assert_eq!(f.session.state(), PanelState::Expanded);

        let t1 = f.t0 + ms(1000);
        f.session.toggle_notch(t1);
        assert_eq!(f.session.state(), PanelState::Hidden);

        let t2 = t1 + ms(1000);
        f.session.toggle_notch(t2);
        assert_eq!(f.session.state(), PanelState::Expanded);
    }

    #[test]
    fn stop_monitors_halts_activation() {
        let mut f = fixture();
        f.session.stop_monitors();
        f.session.stop_monitors(); // idempotent

        f.input.move_pointer(IN_STRIP.0, IN_STRIP.1);
        pump_through(&mut f.session, f.t0, 1000);
        assert_eq!(f.session.state(), PanelState::Hidden);
    }

    #[test]
    fn stop_monitors_lets_teardown_finish() {
        let mut f = fixture();
        f.session.show_notch(f.t0);
        let t1 = f.t0 + ms(1000);
        f.session.hide_notch(t1);
        f.session.stop_monitors();

        pump_through(&mut f.session, t1, 700);
        assert!(f.session.panel().host().live_windows.is_empty());
    }

    #[test]
    fn show_with_no_screens_is_dropped() {
        let mut f = fixture();
        f.screens.set(vec![]);
        f.session.pump(f.t0);

        f.session.show_notch(f.t0 + ms(100));
        assert_eq!(f.session.state(), PanelState::Hidden);
        assert_eq!(f.session.panel().host().created_count(), 0);
    }

    #[test]
    fn screen_change_rebuilds_panel_window() {
        let mut f = fixture();
        f.session.show_notch(f.t0);
        assert_eq!(f.session.panel().host().created_count(), 1);

        let other = ScreenInfo {
            frame: Rect::new(0.0, 0.0, 2560.0, 1440.0),
            notch_frame: None,
            menubar_height: 24.0,
        };
        f.screens.set(vec![other]);
        f.session.pump(f.t0 + ms(100));

        assert_eq!(f.session.panel().host().created_count(), 2);
        assert_eq!(f.session.state(), PanelState::Expanded);
    }

    #[test]
    fn all_screens_lost_tears_down() {
        let mut f = fixture();
        f.session.show_notch(f.t0);

        f.screens.set(vec![]);
        f.session.pump(f.t0 + ms(100));
        assert_eq!(f.session.state(), PanelState::Hidden);
        assert!(f.session.panel().host().live_windows.is_empty());

        // No activation attempts afterwards.
        f.input.move_pointer(IN_STRIP.0, IN_STRIP.1);
        pump_through(&mut f.session, f.t0 + ms(200), 1000);
        assert_eq!(f.session.state(), PanelState::Hidden);
    }

    #[test]
    fn trigger_ignored_while_visible() {
        let mut f = fixture();
        f.session.show_notch(f.t0);

        f.input.move_pointer(IN_STRIP.0, IN_STRIP.1);
        pump_through(&mut f.session, f.t0, 500);
        // Strip sits inside the expanded bounds, so hover holds it open.
        assert_eq!(f.session.state(), PanelState::Expanded);
        assert_eq!(f.session.panel().host().created_count(), 1);
    }
}
