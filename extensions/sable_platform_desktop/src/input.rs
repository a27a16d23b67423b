//! Desktop input translation
//!
//! Converts winit mouse and keyboard input into normalized
//! [`InputEvent`]s. Pointer locations are reported in logical coordinates.

use sable_core::{EventType, InputEvent, KeyCode, Modifiers, Point, Vec2};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode as WinitKey, ModifiersState, PhysicalKey};

/// Pixel scroll deltas are divided by this to approximate line deltas
const PIXELS_PER_LINE: f32 = 10.0;

const LEFT: u8 = 0x01;
const MIDDLE: u8 = 0x02;
const RIGHT: u8 = 0x04;

/// Stateful translator from winit input to [`InputEvent`]
///
/// Tracks held mouse buttons (for drag detection), the cursor location, the
/// modifier state and the display scale factor.
#[derive(Debug)]
pub struct InputTranslator {
    buttons: u8,
    cursor: Point,
    modifiers: Modifiers,
    scale_factor: f64,
}

impl Default for InputTranslator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl InputTranslator {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            buttons: 0,
            cursor: Point::ZERO,
            modifiers: Modifiers::NONE,
            scale_factor: sanitize_scale(scale_factor),
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = sanitize_scale(scale_factor);
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn set_modifiers(&mut self, state: ModifiersState) {
        self.modifiers.set(Modifiers::SHIFT, state.shift_key());
        self.modifiers.set(Modifiers::CONTROL, state.control_key());
        self.modifiers.set(Modifiers::ALT, state.alt_key());
        self.modifiers.set(Modifiers::SUPER, state.super_key());
    }

    /// Cursor moved to a physical position
    pub fn cursor_moved(&mut self, x: f64, y: f64) -> InputEvent {
        self.cursor = Point::new(
            (x / self.scale_factor) as f32,
            (y / self.scale_factor) as f32,
        );
        let mut event_type = EventType::MOUSE_MOVE;
        if self.buttons != 0 {
            event_type |= EventType::MOUSE_DRAG;
        }
        InputEvent::mouse(event_type, self.cursor).with_modifiers(self.modifiers)
    }

    /// Button press or release; `None` for buttons without a flag
    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState) -> Option<InputEvent> {
        let pressed = state == ElementState::Pressed;
        let (bit, event_type) = match (button, pressed) {
            (MouseButton::Left, true) => (LEFT, EventType::LMB_DOWN),
            (MouseButton::Left, false) => (LEFT, EventType::LMB_UP),
            (MouseButton::Middle, true) => (MIDDLE, EventType::MMB_DOWN),
            (MouseButton::Middle, false) => (MIDDLE, EventType::MMB_UP),
            (MouseButton::Right, true) => (RIGHT, EventType::RMB_DOWN),
            (MouseButton::Right, false) => (RIGHT, EventType::RMB_UP),
            _ => return None,
        };
        if pressed {
            self.buttons |= bit;
        } else {
            self.buttons &= !bit;
        }
        Some(InputEvent::mouse(event_type, self.cursor).with_modifiers(self.modifiers))
    }

    pub fn scroll(&self, delta: MouseScrollDelta) -> InputEvent {
        let delta = match delta {
            MouseScrollDelta::LineDelta(x, y) => Vec2::new(x, y),
            MouseScrollDelta::PixelDelta(pos) => Vec2::new(
                pos.x as f32 / PIXELS_PER_LINE,
                pos.y as f32 / PIXELS_PER_LINE,
            ),
        };
        InputEvent::scroll(self.cursor, delta).with_modifiers(self.modifiers)
    }

    /// Key press, repeat or release, followed by one `KEY_TYPED` event per
    /// printable character of `text`
    pub fn key(
        &mut self,
        physical: PhysicalKey,
        state: ElementState,
        repeat: bool,
        text: Option<&str>,
    ) -> Vec<InputEvent> {
        let key = match physical {
            PhysicalKey::Code(code) => key_code(code),
            PhysicalKey::Unidentified(_) => KeyCode::UNKNOWN,
        };

        let event_type = match (state, repeat) {
            (ElementState::Released, _) => EventType::KEY_UP,
            (ElementState::Pressed, true) => EventType::KEY_REPEAT,
            (ElementState::Pressed, false) => EventType::KEY_DOWN,
        };

        if event_type == EventType::KEY_DOWN {
            if key == KeyCode::CAPS_LOCK {
                self.modifiers.set(Modifiers::CAPS, !self.modifiers.caps());
            } else if key == KeyCode::NUM_LOCK {
                self.modifiers.set(Modifiers::NUM, !self.modifiers.num());
            }
        }

        let mut events = vec![InputEvent::key(event_type, key, None).with_modifiers(self.modifiers)];
        if state == ElementState::Pressed {
            let typed = text
                .into_iter()
                .flat_map(str::chars)
                .filter(|c| !c.is_control())
                .map(|c| {
                    InputEvent::key(EventType::KEY_TYPED, key, Some(c))
                        .with_modifiers(self.modifiers)
                });
            events.extend(typed);
        }
        for event in &mut events {
            event.location = self.cursor;
        }
        events
    }
}

fn sanitize_scale(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}

/// Map a physical winit key to a [`KeyCode`]
pub fn key_code(code: WinitKey) -> KeyCode {
    match code {
        WinitKey::KeyA => KeyCode::A,
        WinitKey::KeyB => KeyCode::B,
        WinitKey::KeyC => KeyCode::C,
        WinitKey::KeyD => KeyCode::D,
        WinitKey::KeyE => KeyCode::E,
        WinitKey::KeyF => KeyCode::F,
        WinitKey::KeyG => KeyCode::G,
        WinitKey::KeyH => KeyCode::H,
        WinitKey::KeyI => KeyCode::I,
        WinitKey::KeyJ => KeyCode::J,
        WinitKey::KeyK => KeyCode::K,
        WinitKey::KeyL => KeyCode::L,
        WinitKey::KeyM => KeyCode::M,
        WinitKey::KeyN => KeyCode::N,
        WinitKey::KeyO => KeyCode::O,
        WinitKey::KeyP => KeyCode::P,
        WinitKey::KeyQ => KeyCode::Q,
        WinitKey::KeyR => KeyCode::R,
        WinitKey::KeyS => KeyCode::S,
        WinitKey::KeyT => KeyCode::T,
        WinitKey::KeyU => KeyCode::U,
        WinitKey::KeyV => KeyCode::V,
        WinitKey::KeyW => KeyCode::W,
        WinitKey::KeyX => KeyCode::X,
        WinitKey::KeyY => KeyCode::Y,
        WinitKey::KeyZ => KeyCode::Z,

        WinitKey::Digit0 => KeyCode::KEY_0,
        WinitKey::Digit1 => KeyCode::KEY_1,
        WinitKey::Digit2 => KeyCode::KEY_2,
        WinitKey::Digit3 => KeyCode::KEY_3,
        WinitKey::Digit4 => KeyCode::KEY_4,
        WinitKey::Digit5 => KeyCode::KEY_5,
        WinitKey::Digit6 => KeyCode::KEY_6,
        WinitKey::Digit7 => KeyCode::KEY_7,
        WinitKey::Digit8 => KeyCode::KEY_8,
        WinitKey::Digit9 => KeyCode::KEY_9,

        WinitKey::Numpad0 => KeyCode::KP_0,
        WinitKey::Numpad1 => KeyCode::KP_1,
        WinitKey::Numpad2 => KeyCode::KP_2,
        WinitKey::Numpad3 => KeyCode::KP_3,
        WinitKey::Numpad4 => KeyCode::KP_4,
        WinitKey::Numpad5 => KeyCode::KP_5,
        WinitKey::Numpad6 => KeyCode::KP_6,
        WinitKey::Numpad7 => KeyCode::KP_7,
        WinitKey::Numpad8 => KeyCode::KP_8,
        WinitKey::Numpad9 => KeyCode::KP_9,
        WinitKey::NumpadDecimal => KeyCode::KP_DECIMAL,
        WinitKey::NumpadDivide => KeyCode::KP_DIVIDE,
        WinitKey::NumpadMultiply => KeyCode::KP_MULTIPLY,
        WinitKey::NumpadSubtract => KeyCode::KP_SUBTRACT,
        WinitKey::NumpadAdd => KeyCode::KP_ADD,
        WinitKey::NumpadEnter => KeyCode::KP_ENTER,
        WinitKey::NumpadEqual => KeyCode::KP_EQUAL,

        WinitKey::F1 => KeyCode::F1,
        WinitKey::F2 => KeyCode::F2,
        WinitKey::F3 => KeyCode::F3,
        WinitKey::F4 => KeyCode::F4,
        WinitKey::F5 => KeyCode::F5,
        WinitKey::F6 => KeyCode::F6,
        WinitKey::F7 => KeyCode::F7,
        WinitKey::F8 => KeyCode::F8,
        WinitKey::F9 => KeyCode::F9,
        WinitKey::F10 => KeyCode::F10,
        WinitKey::F11 => KeyCode::F11,
        WinitKey::F12 => KeyCode::F12,

        WinitKey::ArrowUp => KeyCode::UP,
        WinitKey::ArrowDown => KeyCode::DOWN,
        WinitKey::ArrowLeft => KeyCode::LEFT,
        WinitKey::ArrowRight => KeyCode::RIGHT,
        WinitKey::Home => KeyCode::HOME,
        WinitKey::End => KeyCode::END,
        WinitKey::PageUp => KeyCode::PAGE_UP,
        WinitKey::PageDown => KeyCode::PAGE_DOWN,
        WinitKey::Insert => KeyCode::INSERT,
        WinitKey::Delete => KeyCode::DELETE,

        WinitKey::Escape => KeyCode::ESCAPE,
        WinitKey::Enter => KeyCode::ENTER,
        WinitKey::Backspace => KeyCode::BACKSPACE,
        WinitKey::Tab => KeyCode::TAB,
        WinitKey::Space => KeyCode::SPACE,

        WinitKey::Quote => KeyCode::APOSTROPHE,
        WinitKey::Comma => KeyCode::COMMA,
        WinitKey::Minus => KeyCode::MINUS,
        WinitKey::Period => KeyCode::PERIOD,
        WinitKey::Slash => KeyCode::SLASH,
        WinitKey::Semicolon => KeyCode::SEMICOLON,
        WinitKey::Equal => KeyCode::EQUAL,
        WinitKey::BracketLeft => KeyCode::LEFT_BRACKET,
        WinitKey::Backslash => KeyCode::BACKSLASH,
        WinitKey::BracketRight => KeyCode::RIGHT_BRACKET,
        WinitKey::Backquote => KeyCode::GRAVE_ACCENT,

        WinitKey::CapsLock => KeyCode::CAPS_LOCK,
        WinitKey::ScrollLock => KeyCode::SCROLL_LOCK,
        WinitKey::NumLock => KeyCode::NUM_LOCK,
        WinitKey::PrintScreen => KeyCode::PRINT_SCREEN,
        WinitKey::Pause => KeyCode::PAUSE,

        WinitKey::ShiftLeft => KeyCode::LEFT_SHIFT,
        WinitKey::ControlLeft => KeyCode::LEFT_CONTROL,
        WinitKey::AltLeft => KeyCode::LEFT_ALT,
        WinitKey::SuperLeft => KeyCode::LEFT_SUPER,
        WinitKey::ShiftRight => KeyCode::RIGHT_SHIFT,
        WinitKey::ControlRight => KeyCode::RIGHT_CONTROL,
        WinitKey::AltRight => KeyCode::RIGHT_ALT,
        WinitKey::SuperRight => KeyCode::RIGHT_SUPER,
        WinitKey::ContextMenu => KeyCode::MENU,

        _ => KeyCode::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn maps_letters_digits_and_keypad() {
        assert_eq!(key_code(WinitKey::KeyA), KeyCode::A);
        assert_eq!(key_code(WinitKey::KeyZ), KeyCode::Z);
        assert_eq!(key_code(WinitKey::Digit7), KeyCode::KEY_7);
        assert_eq!(key_code(WinitKey::Numpad3), KeyCode::KP_3);
        assert_eq!(key_code(WinitKey::F12), KeyCode::F12);
        assert_eq!(key_code(WinitKey::ArrowLeft), KeyCode::LEFT);
        assert_eq!(key_code(WinitKey::SuperRight), KeyCode::RIGHT_SUPER);
        assert_eq!(key_code(WinitKey::MediaPlayPause), KeyCode::UNKNOWN);
    }

    #[test]
    fn move_with_held_button_is_a_drag() {
        let mut input = InputTranslator::new(2.0);
        let plain = input.cursor_moved(20.0, 40.0);
        assert_eq!(plain.event_type, EventType::MOUSE_MOVE);
        assert_eq!(plain.location, Point::new(10.0, 20.0));

        let down = input
            .mouse_button(MouseButton::Left, ElementState::Pressed)
            .unwrap();
        assert_eq!(down.event_type, EventType::LMB_DOWN);
        assert_eq!(down.location, Point::new(10.0, 20.0));

        let drag = input.cursor_moved(30.0, 40.0);
        assert!(drag.has(EventType::MOUSE_MOVE));
        assert!(drag.has(EventType::MOUSE_DRAG));

        let up = input
            .mouse_button(MouseButton::Left, ElementState::Released)
            .unwrap();
        assert_eq!(up.event_type, EventType::LMB_UP);
        assert!(!input.cursor_moved(32.0, 40.0).has(EventType::MOUSE_DRAG));
    }

    #[test]
    fn unflagged_buttons_are_ignored() {
        let mut input = InputTranslator::default();
        assert!(input
            .mouse_button(MouseButton::Back, ElementState::Pressed)
            .is_none());
        assert!(!input.cursor_moved(1.0, 1.0).has(EventType::MOUSE_DRAG));
    }

    #[test]
    fn scroll_deltas() {
        let input = InputTranslator::default();
        let lines = input.scroll(MouseScrollDelta::LineDelta(0.0, -3.0));
        assert_eq!(lines.event_type, EventType::MOUSE_SCROLL);
        assert_eq!(lines.scroll, Vec2::new(0.0, -3.0));

        let pixels = input.scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(20.0, 5.0)));
        assert_eq!(pixels.scroll, Vec2::new(2.0, 0.5));
    }

    #[test]
    fn key_press_emits_typed_character() {
        let mut input = InputTranslator::default();
        input.set_modifiers(ModifiersState::SHIFT);
        let events = input.key(
            PhysicalKey::Code(WinitKey::KeyA),
            ElementState::Pressed,
            false,
            Some("A"),
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::KEY_DOWN);
        assert_eq!(events[0].key, KeyCode::A);
        assert!(events[0].modifiers.shift());
        assert_eq!(events[1].event_type, EventType::KEY_TYPED);
        assert_eq!(events[1].character, Some('A'));
    }

    #[test]
    fn repeat_release_and_control_text() {
        let mut input = InputTranslator::default();
        let repeat = input.key(
            PhysicalKey::Code(WinitKey::Backspace),
            ElementState::Pressed,
            true,
            Some("\u{8}"),
        );
        assert_eq!(repeat.len(), 1);
        assert_eq!(repeat[0].event_type, EventType::KEY_REPEAT);

        let up = input.key(
            PhysicalKey::Code(WinitKey::KeyQ),
            ElementState::Released,
            false,
            Some("q"),
        );
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].event_type, EventType::KEY_UP);
    }

    #[test]
    fn caps_lock_toggles_modifier() {
        let mut input = InputTranslator::default();
        let caps = PhysicalKey::Code(WinitKey::CapsLock);
        input.key(caps, ElementState::Pressed, false, None);
        assert!(input.modifiers().caps());
        input.key(caps, ElementState::Released, false, None);
        assert!(input.modifiers().caps());
        input.key(caps, ElementState::Pressed, false, None);
        assert!(!input.modifiers().caps());
    }
}
