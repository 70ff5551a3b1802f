//! Opaque panel content.
//!
//! The panel does not know what it is displaying. A `ContentSource` (the
//! task store, in this app) produces a `ContentSlots` snapshot on demand and
//! the window host draws the payloads; the state machine only ever checks
//! which slots are populated.

/// A snapshot of the three content slots plus the badge count shown in the
/// compact state. `None` means the slot is disabled: when both compact
/// slots are disabled the panel refuses to enter the compact state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentSlots {
    pub expanded: Option<String>,
    pub compact_leading: Option<String>,
    pub compact_trailing: Option<String>,
    pub badge_count: usize,
}

impl ContentSlots {
    pub fn compact_disabled(&self) -> bool {
        self.compact_leading.is_none() && self.compact_trailing.is_none()
    }
}

/// Supplies render content for the panel. Owned by the application root;
/// the session holds only a read accessor.
pub trait ContentSource {
    fn content_slots(&self) -> ContentSlots;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_slots_have_compact_disabled() {
        assert!(ContentSlots::default().compact_disabled());
    }

    #[test]
    fn one_populated_compact_slot_enables_compact() {
        let slots = ContentSlots {
            compact_leading: Some("3 tasks".into()),
            ..Default::default()
        };
        assert!(!slots.compact_disabled());
    }
}
