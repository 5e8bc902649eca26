use crate::surface::KeyInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: char,
    pub action: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportAction {
    ScrollDown,
    ScrollUp,
}

pub const VIEWPORT_BINDINGS: [KeyBinding; 2] = [
    KeyBinding {
        key: 's',
        action: "scroll down",
    },
    KeyBinding {
        key: 'w',
        action: "scroll up",
    },
];

/// Only the two scroll commands are recognized; every other key is ignored
/// as a future extension point. Arrow keys mirror the character bindings.
pub fn action_for_key(key: KeyInput) -> Option<ViewportAction> {
    match key {
        KeyInput::Char('s') | KeyInput::Down => Some(ViewportAction::ScrollDown),
        KeyInput::Char('w') | KeyInput::Up => Some(ViewportAction::ScrollUp),
        _ => None,
    }
}

pub fn controls_legend() -> String {
    let parts = VIEWPORT_BINDINGS
        .iter()
        .map(|binding| format!("{} {}", binding.key, binding.action))
        .collect::<Vec<_>>();
    format!("[{}]", parts.join("  "))
}

#[cfg(test)]
mod tests {
    use super::{action_for_key, controls_legend, ViewportAction};
    use crate::surface::KeyInput;

    #[test]
    fn only_scroll_keys_map_to_actions() {
        assert_eq!(
            action_for_key(KeyInput::Char('s')),
            Some(ViewportAction::ScrollDown)
        );
        assert_eq!(
            action_for_key(KeyInput::Down),
            Some(ViewportAction::ScrollDown)
        );
        assert_eq!(
            action_for_key(KeyInput::Char('w')),
            Some(ViewportAction::ScrollUp)
        );
        assert_eq!(action_for_key(KeyInput::Up), Some(ViewportAction::ScrollUp));
        assert_eq!(action_for_key(KeyInput::Char('q')), None);
        assert_eq!(action_for_key(KeyInput::Other), None);
    }

    #[test]
    fn legend_lists_both_bindings() {
        let legend = controls_legend();
        assert_eq!(legend, "[s scroll down  w scroll up]");
    }
}
