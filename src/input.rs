use std::collections::HashSet;
use winit::event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent};

/// Keyboard state as seen by a single update step.
#[derive(Debug, Default)]
pub struct Keyboard {
    held: HashSet<VirtualKeyCode>,
    pressed: HashSet<VirtualKeyCode>,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                input: KeyboardInput {
                    virtual_keycode: Some(key),
                    state,
                    ..
                },
                ..
            } => match state {
                ElementState::Pressed => self.press(*key),
                ElementState::Released => self.release(*key),
            },
            // releases that happen while unfocused are never delivered
            WindowEvent::Focused(false) => self.reset(),
            _ => {}
        }
    }

    pub fn press(&mut self, key: VirtualKeyCode) {
        // auto-repeat arrives as another Pressed while the key is held
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn release(&mut self, key: VirtualKeyCode) {
        self.held.remove(&key);
    }

    pub fn reset(&mut self) {
        self.held.clear();
        self.pressed.clear();
    }

    /// True only during the frame in which `key` went down.
    pub fn is_pressed(&self, key: VirtualKeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }
}

#[cfg(test)]
pub(crate) fn key_event(key: VirtualKeyCode, state: ElementState) -> WindowEvent<'static> {
    #[allow(deprecated)]
    let input = KeyboardInput {
        scancode: 0,
        state,
        virtual_keycode: Some(key),
        modifiers: winit::event::ModifiersState::empty(),
    };
    WindowEvent::KeyboardInput {
        device_id: unsafe { winit::event::DeviceId::dummy() },
        input,
        is_synthetic: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_down(keyboard: &Keyboard, key: VirtualKeyCode) -> bool {
        keyboard.held.contains(&key)
    }

    #[test]
    fn press_lasts_one_frame() {
        let mut keyboard = Keyboard::new();
        keyboard.press(VirtualKeyCode::A);
        assert!(keyboard.is_pressed(VirtualKeyCode::A));
        assert!(is_down(&keyboard, VirtualKeyCode::A));
        assert!(!keyboard.is_pressed(VirtualKeyCode::D));

        keyboard.end_frame();
        assert!(!keyboard.is_pressed(VirtualKeyCode::A));
        assert!(is_down(&keyboard, VirtualKeyCode::A));
    }

    #[test]
    fn repeat_is_not_a_new_press() {
        let mut keyboard = Keyboard::new();
        keyboard.press(VirtualKeyCode::D);
        keyboard.end_frame();
        keyboard.press(VirtualKeyCode::D);
        assert!(!keyboard.is_pressed(VirtualKeyCode::D));

        keyboard.release(VirtualKeyCode::D);
        assert!(!is_down(&keyboard, VirtualKeyCode::D));
        keyboard.press(VirtualKeyCode::D);
        assert!(keyboard.is_pressed(VirtualKeyCode::D));
    }

    #[test]
    fn release_within_frame_still_counts() {
        let mut keyboard = Keyboard::new();
        keyboard.press(VirtualKeyCode::A);
        keyboard.release(VirtualKeyCode::A);
        assert!(keyboard.is_pressed(VirtualKeyCode::A));
        assert!(!is_down(&keyboard, VirtualKeyCode::A));
    }

    #[test]
    fn window_events_drive_state() {
        let mut keyboard = Keyboard::new();
        keyboard.handle_event(&key_event(VirtualKeyCode::A, ElementState::Pressed));
        assert!(keyboard.is_pressed(VirtualKeyCode::A));
        keyboard.end_frame();
        keyboard.handle_event(&key_event(VirtualKeyCode::A, ElementState::Released));
        assert!(!is_down(&keyboard, VirtualKeyCode::A));
    }

    #[test]
    fn press_after_refocus_is_fresh() {
        let mut keyboard = Keyboard::new();
        keyboard.handle_event(&key_event(VirtualKeyCode::A, ElementState::Pressed));
        keyboard.end_frame();
        // key let go while unfocused: no Released arrives
        keyboard.handle_event(&WindowEvent::Focused(false));
        assert!(!is_down(&keyboard, VirtualKeyCode::A));
        keyboard.handle_event(&WindowEvent::Focused(true));
        keyboard.handle_event(&key_event(VirtualKeyCode::A, ElementState::Pressed));
        assert!(keyboard.is_pressed(VirtualKeyCode::A));
    }
}
