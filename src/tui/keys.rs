use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key binding configuration
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub description: String,
}

impl KeyBinding {
    pub fn new(key: KeyCode, modifiers: KeyModifiers, description: &str) -> Self {
        Self {
            key,
            modifiers,
            description: description.to_string(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.code && self.modifiers == event.modifiers
    }

    /// Human readable key label, e.g. `Ctrl+S`
    pub fn label(&self) -> String {
        let key = match self.key {
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            other => format!("{:?}", other),
        };

        if self.modifiers.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", key)
        } else if self.modifiers.contains(KeyModifiers::ALT) {
            format!("Alt+{}", key)
        } else {
            key
        }
    }
}

/// Application key mappings
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Quit application
    pub quit: KeyBinding,

    /// Show help
    pub help: KeyBinding,

    /// Open or close the settings panel
    pub settings: KeyBinding,

    /// Start a fresh conversation
    pub new_session: KeyBinding,

    /// Send the current input
    pub submit: KeyBinding,

    /// Break the line in the input box
    pub newline: KeyBinding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            quit: KeyBinding::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
                "Quit application",
            ),
            help: KeyBinding::new(
                KeyCode::Char('g'),
                KeyModifiers::CONTROL,
                "Show/hide help",
            ),
            settings: KeyBinding::new(
                KeyCode::Char('s'),
                KeyModifiers::CONTROL,
                "Open/close settings",
            ),
            new_session: KeyBinding::new(
                KeyCode::Char('l'),
                KeyModifiers::CONTROL,
                "New conversation",
            ),
            submit: KeyBinding::new(KeyCode::Enter, KeyModifiers::NONE, "Send message"),
            newline: KeyBinding::new(KeyCode::Enter, KeyModifiers::ALT, "Insert line break"),
        }
    }
}

impl KeyMap {
    /// Check if the event should quit the application
    pub fn should_quit(&self, event: &KeyEvent) -> bool {
        self.quit.matches(event)
    }

    /// Check if the event should show help
    pub fn should_show_help(&self, event: &KeyEvent) -> bool {
        self.help.matches(event)
    }

    pub fn should_toggle_settings(&self, event: &KeyEvent) -> bool {
        self.settings.matches(event)
    }

    pub fn should_start_new_session(&self, event: &KeyEvent) -> bool {
        self.new_session.matches(event)
    }

    pub fn should_submit(&self, event: &KeyEvent) -> bool {
        self.submit.matches(event)
    }

    pub fn should_insert_newline(&self, event: &KeyEvent) -> bool {
        self.newline.matches(event)
    }

    /// Help lines for all key bindings
    pub fn help_lines(&self) -> Vec<(String, String)> {
        let mut lines: Vec<(String, String)> = [
            &self.submit,
            &self.newline,
            &self.new_session,
            &self.settings,
            &self.help,
            &self.quit,
        ]
        .iter()
        .map(|binding| (binding.label(), binding.description.clone()))
        .collect();

        lines.push(("Up/Down PgUp/PgDn".to_string(), "Scroll conversation".to_string()));
        lines.push(("Esc".to_string(), "Apply settings / close help".to_string()));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_match_exact_modifiers() {
        let keys = KeyMap::default();
        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let plain_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE);

        assert!(keys.should_toggle_settings(&ctrl_s));
        assert!(!keys.should_toggle_settings(&plain_s));
        assert!(keys.should_submit(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(!keys.should_submit(&KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT)));
        assert!(!keys.should_submit(&KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT)));
        assert!(keys.should_insert_newline(&KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT)));
    }

    #[test]
    fn test_labels() {
        let keys = KeyMap::default();
        assert_eq!(keys.quit.label(), "Ctrl+C");
        assert_eq!(keys.submit.label(), "Enter");
        assert_eq!(keys.newline.label(), "Alt+Enter");
        assert_eq!(keys.help_lines().len(), 8);
    }
}
