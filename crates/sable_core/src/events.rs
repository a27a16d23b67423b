//! Normalized input events
//!
//! Platform backends translate raw window-system callbacks into [`InputEvent`]
//! records: a set of type flags, a key code, an optional character and a
//! location. Consumers receive them through an [`EventSink`].

use std::ops::{BitOr, BitOrAssign};

use crate::geometry::{Point, Vec2};

// ─────────────────────────────────────────────────────────────────────────────
// Event type flags
// ─────────────────────────────────────────────────────────────────────────────

/// Bit set describing what happened in an [`InputEvent`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventType(u16);

impl EventType {
    pub const NONE: EventType = EventType(0);

    // Mouse events
    pub const LMB_DOWN: EventType = EventType(1 << 0);
    pub const LMB_UP: EventType = EventType(1 << 1);
    pub const MMB_DOWN: EventType = EventType(1 << 2);
    pub const MMB_UP: EventType = EventType(1 << 3);
    pub const RMB_DOWN: EventType = EventType(1 << 4);
    pub const RMB_UP: EventType = EventType(1 << 5);
    pub const MOUSE_MOVE: EventType = EventType(1 << 6);
    /// Pointer moved while a button is held
    pub const MOUSE_DRAG: EventType = EventType(1 << 7);
    pub const MOUSE_SCROLL: EventType = EventType(1 << 8);
    pub const ANY_MOUSE: EventType = EventType(0x0FFF);

    // Key events
    pub const KEY_DOWN: EventType = EventType(1 << 12);
    pub const KEY_UP: EventType = EventType(1 << 13);
    pub const KEY_REPEAT: EventType = EventType(1 << 14);
    /// Character produced by the keyboard (see [`InputEvent::character`])
    pub const KEY_TYPED: EventType = EventType(1 << 15);
    pub const ANY_KEY: EventType = EventType(0xF000);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// True if any flag in `other` is set
    pub const fn intersects(self, other: EventType) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for EventType {
    type Output = EventType;

    fn bitor(self, rhs: EventType) -> EventType {
        EventType(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventType {
    fn bitor_assign(&mut self, rhs: EventType) {
        self.0 |= rhs.0;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Modifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Keyboard modifier flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    bits: u8,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { bits: 0 };
    pub const SHIFT: u8 = 0x01;
    pub const CONTROL: u8 = 0x02;
    pub const ALT: u8 = 0x04;
    pub const SUPER: u8 = 0x08; // Cmd on macOS, Win on Windows
    pub const CAPS: u8 = 0x10;
    pub const NUM: u8 = 0x20;

    pub const fn from_bits(bits: u8) -> Self {
        Self { bits }
    }

    pub const fn bits(&self) -> u8 {
        self.bits
    }

    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.bits |= flag;
        } else {
            self.bits &= !flag;
        }
    }

    pub const fn shift(&self) -> bool {
        self.bits & Self::SHIFT != 0
    }

    pub const fn control(&self) -> bool {
        self.bits & Self::CONTROL != 0
    }

    pub const fn alt(&self) -> bool {
        self.bits & Self::ALT != 0
    }

    pub const fn super_key(&self) -> bool {
        self.bits & Self::SUPER != 0
    }

    pub const fn caps(&self) -> bool {
        self.bits & Self::CAPS != 0
    }

    pub const fn num(&self) -> bool {
        self.bits & Self::NUM != 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Key codes
// ─────────────────────────────────────────────────────────────────────────────

/// Platform-agnostic key code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const UNKNOWN: KeyCode = KeyCode(0);

    // Printable keys
    pub const SPACE: KeyCode = KeyCode(32);
    pub const APOSTROPHE: KeyCode = KeyCode(39);
    pub const COMMA: KeyCode = KeyCode(44);
    pub const MINUS: KeyCode = KeyCode(45);
    pub const PERIOD: KeyCode = KeyCode(46);
    pub const SLASH: KeyCode = KeyCode(47);
    pub const KEY_0: KeyCode = KeyCode(48);
    pub const KEY_1: KeyCode = KeyCode(49);
    pub const KEY_2: KeyCode = KeyCode(50);
    pub const KEY_3: KeyCode = KeyCode(51);
    pub const KEY_4: KeyCode = KeyCode(52);
    pub const KEY_5: KeyCode = KeyCode(53);
    pub const KEY_6: KeyCode = KeyCode(54);
    pub const KEY_7: KeyCode = KeyCode(55);
    pub const KEY_8: KeyCode = KeyCode(56);
    pub const KEY_9: KeyCode = KeyCode(57);
    pub const SEMICOLON: KeyCode = KeyCode(59);
    pub const EQUAL: KeyCode = KeyCode(61);
    pub const A: KeyCode = KeyCode(65);
    pub const B: KeyCode = KeyCode(66);
    pub const C: KeyCode = KeyCode(67);
    pub const D: KeyCode = KeyCode(68);
    pub const E: KeyCode = KeyCode(69);
    pub const F: KeyCode = KeyCode(70);
    pub const G: KeyCode = KeyCode(71);
    pub const H: KeyCode = KeyCode(72);
    pub const I: KeyCode = KeyCode(73);
    pub const J: KeyCode = KeyCode(74);
    pub const K: KeyCode = KeyCode(75);
    pub const L: KeyCode = KeyCode(76);
    pub const M: KeyCode = KeyCode(77);
    pub const N: KeyCode = KeyCode(78);
    pub const O: KeyCode = KeyCode(79);
    pub const P: KeyCode = KeyCode(80);
    pub const Q: KeyCode = KeyCode(81);
    pub const R: KeyCode = KeyCode(82);
    pub const S: KeyCode = KeyCode(83);
    pub const T: KeyCode = KeyCode(84);
    pub const U: KeyCode = KeyCode(85);
    pub const V: KeyCode = KeyCode(86);
    pub const W: KeyCode = KeyCode(87);
    pub const X: KeyCode = KeyCode(88);
    pub const Y: KeyCode = KeyCode(89);
    pub const Z: KeyCode = KeyCode(90);
    pub const LEFT_BRACKET: KeyCode = KeyCode(91);
    pub const BACKSLASH: KeyCode = KeyCode(92);
    pub const RIGHT_BRACKET: KeyCode = KeyCode(93);
    pub const GRAVE_ACCENT: KeyCode = KeyCode(96);

    // Editing and navigation
    pub const ESCAPE: KeyCode = KeyCode(256);
    pub const ENTER: KeyCode = KeyCode(257);
    pub const TAB: KeyCode = KeyCode(258);
    pub const BACKSPACE: KeyCode = KeyCode(259);
    pub const INSERT: KeyCode = KeyCode(260);
    pub const DELETE: KeyCode = KeyCode(261);
    pub const RIGHT: KeyCode = KeyCode(262);
    pub const LEFT: KeyCode = KeyCode(263);
    pub const DOWN: KeyCode = KeyCode(264);
    pub const UP: KeyCode = KeyCode(265);
    pub const PAGE_UP: KeyCode = KeyCode(266);
    pub const PAGE_DOWN: KeyCode = KeyCode(267);
    pub const HOME: KeyCode = KeyCode(268);
    pub const END: KeyCode = KeyCode(269);
    pub const CAPS_LOCK: KeyCode = KeyCode(280);
    pub const SCROLL_LOCK: KeyCode = KeyCode(281);
    pub const NUM_LOCK: KeyCode = KeyCode(282);
    pub const PRINT_SCREEN: KeyCode = KeyCode(283);
    pub const PAUSE: KeyCode = KeyCode(284);

    // Function keys
    pub const F1: KeyCode = KeyCode(290);
    pub const F2: KeyCode = KeyCode(291);
    pub const F3: KeyCode = KeyCode(292);
    pub const F4: KeyCode = KeyCode(293);
    pub const F5: KeyCode = KeyCode(294);
    pub const F6: KeyCode = KeyCode(295);
    pub const F7: KeyCode = KeyCode(296);
    pub const F8: KeyCode = KeyCode(297);
    pub const F9: KeyCode = KeyCode(298);
    pub const F10: KeyCode = KeyCode(299);
    pub const F11: KeyCode = KeyCode(300);
    pub const F12: KeyCode = KeyCode(301);

    // Keypad
    pub const KP_0: KeyCode = KeyCode(320);
    pub const KP_1: KeyCode = KeyCode(321);
    pub const KP_2: KeyCode = KeyCode(322);
    pub const KP_3: KeyCode = KeyCode(323);
    pub const KP_4: KeyCode = KeyCode(324);
    pub const KP_5: KeyCode = KeyCode(325);
    pub const KP_6: KeyCode = KeyCode(326);
    pub const KP_7: KeyCode = KeyCode(327);
    pub const KP_8: KeyCode = KeyCode(328);
    pub const KP_9: KeyCode = KeyCode(329);
    pub const KP_DECIMAL: KeyCode = KeyCode(330);
    pub const KP_DIVIDE: KeyCode = KeyCode(331);
    pub const KP_MULTIPLY: KeyCode = KeyCode(332);
    pub const KP_SUBTRACT: KeyCode = KeyCode(333);
    pub const KP_ADD: KeyCode = KeyCode(334);
    pub const KP_ENTER: KeyCode = KeyCode(335);
    pub const KP_EQUAL: KeyCode = KeyCode(336);

    // Modifier keys
    pub const LEFT_SHIFT: KeyCode = KeyCode(340);
    pub const LEFT_CONTROL: KeyCode = KeyCode(341);
    pub const LEFT_ALT: KeyCode = KeyCode(342);
    pub const LEFT_SUPER: KeyCode = KeyCode(343);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(344);
    pub const RIGHT_CONTROL: KeyCode = KeyCode(345);
    pub const RIGHT_ALT: KeyCode = KeyCode(346);
    pub const RIGHT_SUPER: KeyCode = KeyCode(347);
    pub const MENU: KeyCode = KeyCode(348);

    /// Key code for an ASCII letter or digit, ignoring case
    pub fn from_char(c: char) -> Option<KeyCode> {
        match c.to_ascii_uppercase() {
            c @ ('A'..='Z' | '0'..='9') => Some(KeyCode(c as u16)),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input event
// ─────────────────────────────────────────────────────────────────────────────

/// A normalized input event
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputEvent {
    pub event_type: EventType,
    pub key: KeyCode,
    /// Character for `KEY_TYPED` events
    pub character: Option<char>,
    /// Pointer location in logical window coordinates
    pub location: Point,
    pub modifiers: Modifiers,
    /// Scroll delta for `MOUSE_SCROLL` events
    pub scroll: Vec2,
}

impl InputEvent {
    pub fn mouse(event_type: EventType, location: Point) -> Self {
        Self {
            event_type,
            location,
            ..Default::default()
        }
    }

    pub fn key(event_type: EventType, key: KeyCode, character: Option<char>) -> Self {
        Self {
            event_type,
            key,
            character,
            ..Default::default()
        }
    }

    pub fn scroll(location: Point, delta: Vec2) -> Self {
        Self {
            event_type: EventType::MOUSE_SCROLL,
            location,
            scroll: delta,
            ..Default::default()
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn has(&self, event_type: EventType) -> bool {
        self.event_type.intersects(event_type)
    }

    pub fn is_mouse_event(&self) -> bool {
        self.has(EventType::ANY_MOUSE)
    }

    pub fn is_key_event(&self) -> bool {
        self.has(EventType::ANY_KEY)
    }

    /// Same event at a different location (e.g. translated into a child's space)
    pub fn relocated(&self, location: Point) -> Self {
        Self { location, ..*self }
    }
}

/// Receiver for normalized input events
pub trait EventSink: Send {
    fn handle(&mut self, event: &InputEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&InputEvent) + Send,
{
    fn handle(&mut self, event: &InputEvent) {
        self(event)
    }
}
