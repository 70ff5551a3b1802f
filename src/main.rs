use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use notch_tasks::config;
use notch_tasks::content::ContentSource;
use notch_tasks::controller::NotchSession;
use notch_tasks::error::ResultExt;
use notch_tasks::hotkeys::ToggleHotkey;
use notch_tasks::logging;
use notch_tasks::panel::{HoverBehavior, NotchPanel};
use notch_tasks::platform::{self, CocoaHost, CocoaInput, CocoaScreens};
use notch_tasks::tasks::{self, TaskStore};
use notch_tasks::tray::{TrayManager, TrayMenuAction};

/// Scheduler beat. Deadlines inside the session are all coarser than this.
const PUMP_INTERVAL: Duration = Duration::from_millis(50);

fn main() {
    let _guard = logging::init();

    let loaded_config = config::load_config();
    logging::log(
        "APP",
        &format!(
            "Loaded config: hotkey={:?}+{}, style={:?}",
            loaded_config.hotkey.modifiers,
            loaded_config.hotkey.key,
            loaded_config.style
        ),
    );

    platform::configure_as_accessory_app();

    let store = Rc::new(RefCell::new(TaskStore::load(tasks::store_path())));
    logging::log(
        "APP",
        &format!(
            "Task store loaded: {} categories, {} open tasks",
            store.borrow().categories().len(),
            store.borrow().total_incomplete_tasks()
        ),
    );

    // Tray and hotkey are conveniences; the panel works without either
    let tray = TrayManager::new(store.borrow().hide_completed()).warn_on_err();
    let hotkey = ToggleHotkey::register(&loaded_config.hotkey).warn_on_err();

    let panel = NotchPanel::new(
        CocoaHost::new(),
        loaded_config.notch_style(),
        HoverBehavior::all(),
    );
    let content_store = Rc::clone(&store);
    let mut session = NotchSession::new(
        panel,
        CocoaInput::new(),
        CocoaScreens::new(),
        loaded_config.session_config(),
        Box::new(move || content_store.borrow().content_slots()),
    );
    session.start_monitors();
    logging::log("APP", "Session started");

    'run: loop {
        let now = Instant::now();

        if let Some(hotkey) = &hotkey {
            if hotkey.poll_pressed() {
                logging::log("APP", "Toggle hotkey pressed");
                session.toggle_notch(now);
            }
        }

        if let Some(tray) = &tray {
            while let Ok(event) = tray.menu_event_receiver().try_recv() {
                match tray.match_menu_event(&event) {
                    Some(TrayMenuAction::ToggleNotch) => session.toggle_notch(now),
                    Some(TrayMenuAction::HideCompleted) => {
                        let checked = tray.hide_completed_checked();
                        store.borrow_mut().set_hide_completed(checked);
                        logging::log("APP", &format!("Hide completed: {}", checked));
                    }
                    Some(TrayMenuAction::Quit) => break 'run,
                    None => {}
                }
            }
        }

        session.pump(now);
        platform::pump_run_loop(PUMP_INTERVAL);
    }

    // Orderly shutdown: stop activation, finish any teardown in flight
    session.stop_monitors();
    let shutdown_start = Instant::now();
    session.hide_notch(shutdown_start);
    while session.is_visible() || shutdown_start.elapsed() < Duration::from_millis(600) {
        session.pump(Instant::now());
        platform::pump_run_loop(PUMP_INTERVAL);
        if shutdown_start.elapsed() > Duration::from_secs(2) {
            break;
        }
    }

    if let Some(hotkey) = hotkey {
        hotkey.unregister();
    }
    logging::log("APP", "Shutdown complete");
}
