use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};

use crate::config::HotkeyConfig;
use crate::logging;

/// The single global hotkey: toggles the panel.
///
/// Owns the OS registration; dropping the manager unregisters. Must be
/// created on the main thread.
pub struct ToggleHotkey {
    manager: GlobalHotKeyManager,
    hotkey: HotKey,
    hotkey_id: u32,
}

impl ToggleHotkey {
    pub fn register(config: &HotkeyConfig) -> anyhow::Result<Self> {
        let mods = parse_modifiers(&config.modifiers)
            .ok_or_else(|| anyhow::anyhow!("Unknown modifier in {:?}", config.modifiers))?;
        let code = parse_code(&config.key)
            .ok_or_else(|| anyhow::anyhow!("Unknown key code: {}", config.key))?;

        let hotkey = HotKey::new(Some(mods), code);
        let hotkey_id = hotkey.id();

        let manager = GlobalHotKeyManager::new()
            .map_err(|e| anyhow::anyhow!("Failed to create hotkey manager: {}", e))?;

        if let Err(e) = manager.register(hotkey) {
            return Err(match e {
                HotkeyError::AlreadyRegistered(hk) => anyhow::anyhow!(
                    "Hotkey {:?}+{} is already registered by another app (id: {})",
                    config.modifiers,
                    config.key,
                    hk.id()
                ),
                HotkeyError::FailedToRegister(msg) => anyhow::anyhow!(
                    "System rejected hotkey {:?}+{}: {}",
                    config.modifiers,
                    config.key,
                    msg
                ),
                other => anyhow::anyhow!("Failed to register hotkey: {}", other),
            });
        }

        logging::log(
            "HOTKEY",
            &format!(
                "Registered toggle hotkey {:?}+{} (id: {})",
                config.modifiers, config.key, hotkey_id
            ),
        );

        Ok(Self {
            manager,
            hotkey,
            hotkey_id,
        })
    }

    /// Drain pending hotkey events; true when the toggle was pressed.
    /// Release events are ignored.
    pub fn poll_pressed(&self) -> bool {
        let mut pressed = false;
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.id == self.hotkey_id && event.state == HotKeyState::Pressed {
                pressed = true;
            }
        }
        pressed
    }

    pub fn unregister(self) {
        if let Err(e) = self.manager.unregister(self.hotkey) {
            logging::log("HOTKEY", &format!("Failed to unregister hotkey: {}", e));
        }
    }
}

fn parse_modifiers(names: &[String]) -> Option<Modifiers> {
    let mut mods = Modifiers::empty();
    for name in names {
        mods |= match name.to_ascii_lowercase().as_str() {
            "meta" | "cmd" | "super" => Modifiers::META,
            "shift" => Modifiers::SHIFT,
            "alt" | "option" => Modifiers::ALT,
            "ctrl" | "control" => Modifiers::CONTROL,
            _ => return None,
        };
    }
    Some(mods)
}

fn parse_code(name: &str) -> Option<Code> {
    match name {
        "KeyA" => Some(Code::KeyA),
        "KeyB" => Some(Code::KeyB),
        "KeyC" => Some(Code::KeyC),
        "KeyD" => Some(Code::KeyD),
        "KeyE" => Some(Code::KeyE),
        "KeyF" => Some(Code::KeyF),
        "KeyG" => Some(Code::KeyG),
        "KeyH" => Some(Code::KeyH),
        "KeyI" => Some(Code::KeyI),
        "KeyJ" => Some(Code::KeyJ),
        "KeyK" => Some(Code::KeyK),
        "KeyL" => Some(Code::KeyL),
        "KeyM" => Some(Code::KeyM),
        "KeyN" => Some(Code::KeyN),
        "KeyO" => Some(Code::KeyO),
        "KeyP" => Some(Code::KeyP),
        "KeyQ" => Some(Code::KeyQ),
        "KeyR" => Some(Code::KeyR),
        "KeyS" => Some(Code::KeyS),
        "KeyT" => Some(Code::KeyT),
        "KeyU" => Some(Code::KeyU),
        "KeyV" => Some(Code::KeyV),
        "KeyW" => Some(Code::KeyW),
        "KeyX" => Some(Code::KeyX),
        "KeyY" => Some(Code::KeyY),
        "KeyZ" => Some(Code::KeyZ),
        "Space" => Some(Code::Space),
        "Semicolon" => Some(Code::Semicolon),
        "Comma" => Some(Code::Comma),
        "Period" => Some(Code::Period),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_modifier_names() {
        let mods = parse_modifiers(&["meta".into(), "shift".into()]).unwrap();
        assert!(mods.contains(Modifiers::META));
        assert!(mods.contains(Modifiers::SHIFT));
    }

    #[test]
    fn modifier_aliases_resolve() {
        assert_eq!(
            parse_modifiers(&["cmd".into()]),
            parse_modifiers(&["meta".into()])
        );
        assert_eq!(
            parse_modifiers(&["option".into()]),
            parse_modifiers(&["alt".into()])
        );
    }

    #[test]
    fn unknown_modifier_is_rejected() {
        assert!(parse_modifiers(&["hyper".into()]).is_none());
    }

    #[test]
    fn key_codes_parse() {
        assert_eq!(parse_code("KeyT"), Some(Code::KeyT));
        assert_eq!(parse_code("Semicolon"), Some(Code::Semicolon));
        assert_eq!(parse_code("NotAKey"), None);
    }
}
