use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    ListNavigation,
    LiveFeed,
    SearchInput,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::GoBack);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Device list navigation
        let mut list_nav = HashMap::new();
        list_nav.insert(KeyBinding::new(KeyCode::Char('j')), Action::ListDown);
        list_nav.insert(KeyBinding::new(KeyCode::Down), Action::ListDown);
        list_nav.insert(KeyBinding::new(KeyCode::Char('k')), Action::ListUp);
        list_nav.insert(KeyBinding::new(KeyCode::Up), Action::ListUp);
        list_nav.insert(KeyBinding::new(KeyCode::Enter), Action::ListSelect);
        bindings.insert(KeyContext::ListNavigation, list_nav);

        // Live feed bindings, less-like navigation
        let mut feed = HashMap::new();
        feed.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        feed.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        feed.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        feed.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        feed.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::PageDown);
        feed.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        feed.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        feed.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        feed.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        feed.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        feed.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        feed.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        feed.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        feed.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        feed.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleFollow);
        feed.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        feed.insert(KeyBinding::new(KeyCode::Char('n')), Action::ClearFilter);
        feed.insert(KeyBinding::new(KeyCode::Char('r')), Action::CycleTimeRange);
        feed.insert(
            KeyBinding::shift(KeyCode::Char('R')),
            Action::CycleTimeRangeBack,
        );
        feed.insert(KeyBinding::new(KeyCode::Char('v')), Action::CycleSeverity);
        feed.insert(KeyBinding::new(KeyCode::Char('e')), Action::ExportLogs);
        bindings.insert(KeyContext::LiveFeed, feed);

        // Search input bindings (when search bar is active)
        let mut search = HashMap::new();
        search.insert(KeyBinding::new(KeyCode::Enter), Action::ApplyFilter);
        search.insert(KeyBinding::new(KeyCode::Esc), Action::CloseSearch);
        search.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        search.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        search.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseSearch);
        bindings.insert(KeyContext::SearchInput, search);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(context_bindings) = self.bindings.get(&context) {
            if let Some(action) = context_bindings.get(&binding) {
                return Some(action.clone());
            }
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in search input mode.
    /// Returns Some(Action) for special keys, text input for regular characters.
    pub fn get_search_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(search_bindings) = self.bindings.get(&KeyContext::SearchInput) {
            if let Some(action) = search_bindings.get(&binding) {
                return Some(action.clone());
            }
        }

        if let KeyCode::Char(c) = key.code {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                return Some(Action::SearchInput(c));
            }
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn context_binding_wins_over_global() {
        let bindings = KeyBindings::new();
        // 'q' is global quit, but in search input it is plain text
        assert_eq!(
            bindings.get_action(KeyContext::LiveFeed, &key(KeyCode::Char('q'))),
            Some(Action::Quit)
        );
        assert_eq!(
            bindings.get_search_input_action(&key(KeyCode::Char('q'))),
            Some(Action::SearchInput('q'))
        );
    }

    #[test]
    fn unbound_keys_fall_through() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::ListNavigation, &key(KeyCode::Char('z'))),
            None
        );
    }

    #[test]
    fn search_input_special_keys_are_actions() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_search_input_action(&key(KeyCode::Enter)),
            Some(Action::ApplyFilter)
        );
        assert_eq!(
            bindings.get_search_input_action(&key(KeyCode::Esc)),
            Some(Action::CloseSearch)
        );
    }
}
