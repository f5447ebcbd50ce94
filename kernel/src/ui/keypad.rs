// Keypad input device.
//
// The translator reports a level every poll (Pressed(key) while held,
// Released(..) otherwise). Widgets want edges, so this turns the level
// stream into Press/Release events. A release carries the key that was
// pressed, whatever key the released report names.

use crate::drivers::input::{Key, KeyEvent, KeyState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Press(Key),
    Release(Key),
}

#[derive(Debug, Default)]
pub struct KeypadIndev {
    held: Option<Key>,
}

impl KeypadIndev {
    pub const fn new() -> Self {
        Self { held: None }
    }

    pub fn held(&self) -> Option<Key> {
        self.held
    }

    pub fn feed(&mut self, event: KeyEvent) -> Option<KeyEdge> {
        match (event.state, self.held) {
            (KeyState::Pressed, None) => {
                self.held = Some(event.key);
                Some(KeyEdge::Press(event.key))
            }
            (KeyState::Released, Some(key)) => {
                self.held = None;
                Some(KeyEdge::Release(key))
            }
            _ => None,
        }
    }
}
