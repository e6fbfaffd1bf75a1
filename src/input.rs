//! Semantic input events and native translation.
//!
//! Callers describe keyboard and mouse input with toolkit-independent
//! [`KeyEvent`] and [`MouseEvent`] values. A [`KeyMap`] built once per
//! session translates them into the toolkit's native encoding and back;
//! the translation is loss-free in both directions, so a semantic event
//! round-tripped through its native form reproduces the original value.
//!
//! # Example
//!
//! ```
//! use webview_automation::input::{KeyAction, KeyCode, KeyEvent, KeyMap, Modifiers};
//!
//! let key_map = KeyMap::new();
//! let event = KeyEvent::new(KeyAction::Down, KeyCode::Char('A'), Modifiers::SHIFT);
//! let native = key_map.to_native_event(&event);
//! let back = key_map.from_native_event(&native).unwrap();
//! assert_eq!(event, back);
//! ```

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Point;

// ============================================================================
// Native encoding constants
// ============================================================================

/// Native modifier bit: shift.
const NATIVE_SHIFT: u32 = 0x0200_0000;
/// Native modifier bit: control.
const NATIVE_CONTROL: u32 = 0x0400_0000;
/// Native modifier bit: alt.
const NATIVE_ALT: u32 = 0x0800_0000;
/// Native modifier bit: meta.
const NATIVE_META: u32 = 0x1000_0000;

/// Native mouse button bit: left.
const NATIVE_BUTTON_LEFT: u32 = 0x1;
/// Native mouse button bit: right.
const NATIVE_BUTTON_RIGHT: u32 = 0x2;
/// Native mouse button bit: middle.
const NATIVE_BUTTON_MIDDLE: u32 = 0x4;

/// Non-printable native key codes start here; printable keys use their
/// Unicode code point, which is always below this bound.
const NATIVE_SPECIAL_BASE: u32 = 0x0100_0000;

// ============================================================================
// KeyCode
// ============================================================================

/// Semantic key code, independent of any native key representation.
///
/// Printable keys are carried as [`KeyCode::Char`]; control and navigation
/// keys have dedicated variants translated through the session key map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// A printable character key.
    Char(char),
    /// Escape key.
    Escape,
    /// Tab key.
    Tab,
    /// Backspace key.
    Backspace,
    /// Enter/Return key.
    Enter,
    /// Insert key.
    Insert,
    /// Delete key.
    Delete,
    /// Pause key.
    Pause,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Arrow left.
    Left,
    /// Arrow up.
    Up,
    /// Arrow right.
    Right,
    /// Arrow down.
    Down,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Shift key.
    Shift,
    /// Control key.
    Control,
    /// Meta key.
    Meta,
    /// Alt key.
    Alt,
    /// Function key F1.
    F1,
    /// Function key F2.
    F2,
    /// Function key F3.
    F3,
    /// Function key F4.
    F4,
    /// Function key F5.
    F5,
    /// Function key F6.
    F6,
    /// Function key F7.
    F7,
    /// Function key F8.
    F8,
    /// Function key F9.
    F9,
    /// Function key F10.
    F10,
    /// Function key F11.
    F11,
    /// Function key F12.
    F12,
}

/// Fixed generic-code to native-code table for non-printable keys.
///
/// Printable keys are handled arithmetically: their native code is the
/// Unicode code point, which never collides with this range.
const SPECIAL_KEYS: &[(KeyCode, u32)] = &[
    (KeyCode::Escape, 0x0100_0000),
    (KeyCode::Tab, 0x0100_0001),
    (KeyCode::Backspace, 0x0100_0003),
    (KeyCode::Enter, 0x0100_0004),
    (KeyCode::Insert, 0x0100_0006),
    (KeyCode::Delete, 0x0100_0007),
    (KeyCode::Pause, 0x0100_0008),
    (KeyCode::Home, 0x0100_0010),
    (KeyCode::End, 0x0100_0011),
    (KeyCode::Left, 0x0100_0012),
    (KeyCode::Up, 0x0100_0013),
    (KeyCode::Right, 0x0100_0014),
    (KeyCode::Down, 0x0100_0015),
    (KeyCode::PageUp, 0x0100_0016),
    (KeyCode::PageDown, 0x0100_0017),
    (KeyCode::Shift, 0x0100_0020),
    (KeyCode::Control, 0x0100_0021),
    (KeyCode::Meta, 0x0100_0022),
    (KeyCode::Alt, 0x0100_0023),
    (KeyCode::F1, 0x0100_0030),
    (KeyCode::F2, 0x0100_0031),
    (KeyCode::F3, 0x0100_0032),
    (KeyCode::F4, 0x0100_0033),
    (KeyCode::F5, 0x0100_0034),
    (KeyCode::F6, 0x0100_0035),
    (KeyCode::F7, 0x0100_0036),
    (KeyCode::F8, 0x0100_0037),
    (KeyCode::F9, 0x0100_0038),
    (KeyCode::F10, 0x0100_0039),
    (KeyCode::F11, 0x0100_003a),
    (KeyCode::F12, 0x0100_003b),
];

impl KeyCode {
    /// Returns the printable text this key produces, if any.
    #[must_use]
    pub fn text(self) -> String {
        match self {
            Self::Char(c) => c.to_string(),
            Self::Enter => "\n".to_string(),
            Self::Tab => "\t".to_string(),
            _ => String::new(),
        }
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// Modifier key set attached to an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    /// Shift held.
    pub shift: bool,
    /// Control held.
    pub control: bool,
    /// Alt held.
    pub alt: bool,
    /// Meta held.
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control only.
    pub const CONTROL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Returns the native bit encoding.
    #[must_use]
    pub const fn to_native(self) -> u32 {
        let mut bits = 0;
        if self.shift {
            bits |= NATIVE_SHIFT;
        }
        if self.control {
            bits |= NATIVE_CONTROL;
        }
        if self.alt {
            bits |= NATIVE_ALT;
        }
        if self.meta {
            bits |= NATIVE_META;
        }
        bits
    }

    /// Decodes the native bit encoding.
    #[must_use]
    pub const fn from_native(bits: u32) -> Self {
        Self {
            shift: bits & NATIVE_SHIFT != 0,
            control: bits & NATIVE_CONTROL != 0,
            alt: bits & NATIVE_ALT != 0,
            meta: bits & NATIVE_META != 0,
        }
    }

    /// Returns `true` if no modifier is held.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.shift && !self.control && !self.alt && !self.meta
    }
}

// ============================================================================
// Key Events
// ============================================================================

/// Key event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    /// Key pressed.
    Down,
    /// Key released.
    Up,
    /// Character produced.
    Char,
}

/// Semantic key event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Event phase.
    pub action: KeyAction,
    /// Semantic key code.
    pub code: KeyCode,
    /// Modifier set.
    pub modifiers: Modifiers,
    /// Text produced by the key, for character events.
    pub text: String,
}

impl KeyEvent {
    /// Creates a key event with text derived from the key code.
    #[must_use]
    pub fn new(action: KeyAction, code: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            action,
            code,
            modifiers,
            text: code.text(),
        }
    }

    /// Creates a key-down event.
    #[inline]
    #[must_use]
    pub fn down(code: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(KeyAction::Down, code, modifiers)
    }

    /// Creates a key-up event.
    #[inline]
    #[must_use]
    pub fn up(code: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(KeyAction::Up, code, modifiers)
    }
}

/// Key event in the toolkit's native encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeKeyEvent {
    /// Event phase.
    pub action: KeyAction,
    /// Native key code.
    pub key: u32,
    /// Native modifier bits.
    pub modifiers: u32,
    /// Text produced by the key.
    pub text: String,
}

// ============================================================================
// Mouse Events
// ============================================================================

/// Mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// No button (move events).
    None,
    /// Left button.
    Left,
    /// Middle button.
    Middle,
    /// Right button.
    Right,
}

impl MouseButton {
    /// Returns the native bit encoding.
    #[must_use]
    pub const fn to_native(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Left => NATIVE_BUTTON_LEFT,
            Self::Right => NATIVE_BUTTON_RIGHT,
            Self::Middle => NATIVE_BUTTON_MIDDLE,
        }
    }

    /// Decodes the native bit encoding.
    #[must_use]
    pub const fn from_native(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Self::None),
            NATIVE_BUTTON_LEFT => Some(Self::Left),
            NATIVE_BUTTON_RIGHT => Some(Self::Right),
            NATIVE_BUTTON_MIDDLE => Some(Self::Middle),
            _ => None,
        }
    }
}

/// Mouse event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseAction {
    /// Pointer moved.
    Move,
    /// Button pressed.
    Down,
    /// Button released.
    Up,
    /// Double click.
    DoubleClick,
}

/// Semantic mouse event with view-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseEvent {
    /// Event phase.
    pub action: MouseAction,
    /// Button involved.
    pub button: MouseButton,
    /// Pointer position, view-relative.
    pub position: Point,
    /// Modifier set.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Creates a mouse event.
    #[inline]
    #[must_use]
    pub const fn new(
        action: MouseAction,
        button: MouseButton,
        position: Point,
        modifiers: Modifiers,
    ) -> Self {
        Self {
            action,
            button,
            position,
            modifiers,
        }
    }

    /// Creates a left-button press.
    #[inline]
    #[must_use]
    pub const fn left_down(position: Point) -> Self {
        Self::new(
            MouseAction::Down,
            MouseButton::Left,
            position,
            Modifiers::NONE,
        )
    }

    /// Creates a left-button release.
    #[inline]
    #[must_use]
    pub const fn left_up(position: Point) -> Self {
        Self::new(
            MouseAction::Up,
            MouseButton::Left,
            position,
            Modifiers::NONE,
        )
    }

    /// Creates a pointer move.
    #[inline]
    #[must_use]
    pub const fn moved(position: Point) -> Self {
        Self::new(
            MouseAction::Move,
            MouseButton::None,
            position,
            Modifiers::NONE,
        )
    }
}

/// Mouse event in the toolkit's native encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeMouseEvent {
    /// Event phase.
    pub action: MouseAction,
    /// Native button bits.
    pub buttons: u32,
    /// Horizontal position, view-relative.
    pub x: i32,
    /// Vertical position, view-relative.
    pub y: i32,
    /// Native modifier bits.
    pub modifiers: u32,
}

// ============================================================================
// KeyMap
// ============================================================================

/// Fixed semantic-to-native key translation table, built once per session.
#[derive(Debug)]
pub struct KeyMap {
    /// Non-printable key to native code.
    to_native: FxHashMap<KeyCode, u32>,
    /// Native code to non-printable key.
    from_native: FxHashMap<u32, KeyCode>,
}

impl KeyMap {
    /// Builds the translation table.
    #[must_use]
    pub fn new() -> Self {
        let mut to_native = FxHashMap::default();
        let mut from_native = FxHashMap::default();
        for &(code, native) in SPECIAL_KEYS {
            to_native.insert(code, native);
            from_native.insert(native, code);
        }
        Self {
            to_native,
            from_native,
        }
    }

    /// Translates a semantic key code to its native code.
    #[must_use]
    pub fn to_native(&self, code: KeyCode) -> u32 {
        match code {
            KeyCode::Char(c) => c as u32,
            other => self.to_native[&other],
        }
    }

    /// Translates a native code back to a semantic key code.
    ///
    /// Returns `None` for native codes with no semantic counterpart.
    #[must_use]
    pub fn from_native(&self, native: u32) -> Option<KeyCode> {
        if native >= NATIVE_SPECIAL_BASE {
            self.from_native.get(&native).copied()
        } else {
            char::from_u32(native).map(KeyCode::Char)
        }
    }

    /// Translates a semantic key event to the native encoding.
    #[must_use]
    pub fn to_native_event(&self, event: &KeyEvent) -> NativeKeyEvent {
        NativeKeyEvent {
            action: event.action,
            key: self.to_native(event.code),
            modifiers: event.modifiers.to_native(),
            text: event.text.clone(),
        }
    }

    /// Translates a native key event back to the semantic form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the native code is unknown.
    pub fn from_native_event(&self, event: &NativeKeyEvent) -> Result<KeyEvent> {
        let code = self
            .from_native(event.key)
            .ok_or_else(|| Error::invalid_argument(format!("unknown native key {:#x}", event.key)))?;
        Ok(KeyEvent {
            action: event.action,
            code,
            modifiers: Modifiers::from_native(event.modifiers),
            text: event.text.clone(),
        })
    }

    /// Translates a semantic mouse event to the native encoding.
    #[must_use]
    pub fn to_native_mouse(&self, event: &MouseEvent) -> NativeMouseEvent {
        NativeMouseEvent {
            action: event.action,
            buttons: event.button.to_native(),
            x: event.position.x,
            y: event.position.y,
            modifiers: event.modifiers.to_native(),
        }
    }

    /// Translates a native mouse event back to the semantic form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the button bits are unknown.
    pub fn from_native_mouse(&self, event: &NativeMouseEvent) -> Result<MouseEvent> {
        let button = MouseButton::from_native(event.buttons).ok_or_else(|| {
            Error::invalid_argument(format!("unknown native button bits {:#x}", event.buttons))
        })?;
        Ok(MouseEvent {
            action: event.action,
            button,
            position: Point::new(event.x, event.y),
            modifiers: Modifiers::from_native(event.modifiers),
        })
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_special_key_roundtrip() {
        let map = KeyMap::new();
        for &(code, _) in SPECIAL_KEYS {
            let native = map.to_native(code);
            assert_eq!(map.from_native(native), Some(code));
        }
    }

    #[test]
    fn test_shifted_letter_roundtrip() {
        let map = KeyMap::new();
        let down = KeyEvent::down(KeyCode::Char('A'), Modifiers::SHIFT);
        let up = KeyEvent::up(KeyCode::Char('A'), Modifiers::SHIFT);

        for event in [down, up] {
            let native = map.to_native_event(&event);
            let back = map.from_native_event(&native).unwrap();
            assert_eq!(event, back);
        }
    }

    #[test]
    fn test_modifier_bits_roundtrip() {
        let all = Modifiers {
            shift: true,
            control: true,
            alt: true,
            meta: true,
        };
        assert_eq!(Modifiers::from_native(all.to_native()), all);
        assert_eq!(Modifiers::from_native(0), Modifiers::NONE);
    }

    #[test]
    fn test_mouse_event_roundtrip() {
        let map = KeyMap::new();
        let event = MouseEvent::new(
            MouseAction::Down,
            MouseButton::Right,
            Point::new(44, 91),
            Modifiers::CONTROL,
        );
        let native = map.to_native_mouse(&event);
        let back = map.from_native_mouse(&native).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_unknown_native_key_is_rejected() {
        let map = KeyMap::new();
        let event = NativeKeyEvent {
            action: KeyAction::Down,
            key: 0x01FF_FFFF,
            modifiers: 0,
            text: String::new(),
        };
        assert!(map.from_native_event(&event).is_err());
    }

    #[test]
    fn test_key_text() {
        assert_eq!(KeyCode::Char('x').text(), "x");
        assert_eq!(KeyCode::Enter.text(), "\n");
        assert_eq!(KeyCode::Shift.text(), "");
    }

    proptest! {
        #[test]
        fn prop_char_key_roundtrip(c in proptest::char::any(), shift: bool, control: bool) {
            let map = KeyMap::new();
            let event = KeyEvent::down(
                KeyCode::Char(c),
                Modifiers { shift, control, alt: false, meta: false },
            );
            let native = map.to_native_event(&event);
            let back = map.from_native_event(&native).unwrap();
            prop_assert_eq!(event, back);
        }
    }
}
