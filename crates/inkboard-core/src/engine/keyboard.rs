//! Keyboard commands.

use super::Engine;
use crate::input::{Key, KeyEvent};
use crate::tools::ToolKind;
use log::debug;

/// What the host should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    /// Ctrl/Cmd+S: the host performs the (async) save.
    SaveRequested,
    Ignored,
}

impl Engine {
    /// Handle a key press.
    ///
    /// `text_input_focused` is true when focus sits in a host text field, in
    /// which case board shortcuts are not dispatched. While a text box is
    /// pending only Escape is processed.
    pub fn handle_key(&mut self, event: KeyEvent, text_input_focused: bool) -> KeyOutcome {
        if self.text_entry.is_some() {
            if event.key == Key::Escape {
                self.cancel_text();
                self.selection.clear();
                return KeyOutcome::Handled;
            }
            return KeyOutcome::Ignored;
        }
        if text_input_focused {
            return KeyOutcome::Ignored;
        }

        let mods = event.modifiers;
        match event.key {
            Key::Delete | Key::Backspace => {
                self.delete_selection();
                KeyOutcome::Handled
            }
            Key::Escape => {
                self.cancel_gesture();
                self.selection.clear();
                KeyOutcome::Handled
            }
            Key::Char(c) if mods.command() => match c.to_ascii_lowercase() {
                'z' if mods.shift => {
                    self.redo();
                    KeyOutcome::Handled
                }
                'z' => {
                    self.undo();
                    KeyOutcome::Handled
                }
                'y' => {
                    self.redo();
                    KeyOutcome::Handled
                }
                's' => KeyOutcome::SaveRequested,
                'a' => {
                    self.select_all();
                    KeyOutcome::Handled
                }
                _ => KeyOutcome::Ignored,
            },
            Key::Char(c) if !mods.alt => match ToolKind::from_shortcut(c) {
                Some(tool) => {
                    debug!("shortcut `{c}` selects {tool:?}");
                    self.set_tool(tool);
                    KeyOutcome::Handled
                }
                None => KeyOutcome::Ignored,
            },
            Key::Char(_) | Key::Enter | Key::Other => KeyOutcome::Ignored,
        }
    }
}
