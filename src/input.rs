//! Keyboard and pointer state, sampled once per frame.
//!
//! Scenes read edges (`key_pressed`, `mouse_pressed`) and levels
//! (`mouse_held`, `mouse_inside`) from [`Input`] during their update:
//!
//! ```ignore
//! if ctx.input.key_pressed(KeyCode::S) {
//!     spawner::add_spawner(&mut self.world, Vec2::ZERO, Spawner::default());
//! }
//!
//! if ctx.input.mouse_pressed(MouseButton::Left) {
//!     let at = ctx.input.world_position(ctx.view_scale);
//!     // ...
//! }
//! ```

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// The keys the experiments react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Key1,
    Key2,
    Key3,
    Key4,
    M,
    R,
    S,
    X,
    Y,
    Space,
    Escape,
    Tab,
    Backspace,
    Delete,
    Other,
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::Digit1 => KeyCode::Key1,
            WinitKeyCode::Digit2 => KeyCode::Key2,
            WinitKeyCode::Digit3 => KeyCode::Key3,
            WinitKeyCode::Digit4 => KeyCode::Key4,
            WinitKeyCode::KeyM => KeyCode::M,
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyX => KeyCode::X,
            WinitKeyCode::KeyY => KeyCode::Y,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::Tab => KeyCode::Tab,
            WinitKeyCode::Backspace => KeyCode::Backspace,
            WinitKeyCode::Delete => KeyCode::Delete,
            _ => KeyCode::Other,
        }
    }
}

/// Input state tracking for keyboard and mouse.
#[derive(Debug)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    mouse_held: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,
    mouse_released: HashSet<MouseButton>,

    mouse_position: Vec2,
    mouse_ndc: Vec2,
    mouse_inside: bool,

    window_size: (u32, u32),
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    pub fn new() -> Self {
        Self {
            keys_held: HashSet::new(),
            keys_pressed: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_pressed: HashSet::new(),
            mouse_released: HashSet::new(),
            mouse_position: Vec2::ZERO,
            mouse_ndc: Vec2::ZERO,
            mouse_inside: false,
            window_size: (800, 800),
        }
    }

    /// Key went down this frame. Auto-repeat does not count.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_released.contains(&button)
    }

    /// Whether the pointer is over the window.
    pub fn mouse_inside(&self) -> bool {
        self.mouse_inside
    }

    /// Pointer position in window pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Pointer in normalized device coordinates (-1 to 1), Y up.
    pub fn mouse_ndc(&self) -> Vec2 {
        self.mouse_ndc
    }

    /// Pointer in simulation coordinates.
    ///
    /// Renderers multiply world positions by `view_scale` to get clip space,
    /// so this divides it back out.
    pub fn world_position(&self, view_scale: Vec2) -> Vec2 {
        let scale = view_scale.max(Vec2::splat(f32::EPSILON));
        self.mouse_ndc / scale
    }

    /// Clear per-frame edges. Called after the frame's update ran.
    pub(crate) fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.mouse_released.clear();
    }

    pub(crate) fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.recompute_ndc();
    }

    /// Route a window event, some of which a panel may have claimed.
    ///
    /// Claimed events are dropped except those that end a held state, so a
    /// button released over a panel still counts as released.
    pub(crate) fn handle_window_event(&mut self, event: &WindowEvent, claimed: bool) {
        if !claimed || ends_hold(event) {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    let key = KeyCode::from(keycode);
                    match event.state {
                        ElementState::Pressed => self.press_key(key),
                        ElementState::Released => self.release_key(key),
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let btn = MouseButton::from(*button);
                match state {
                    ElementState::Pressed => self.press_button(btn),
                    ElementState::Released => self.release_button(btn),
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorEntered { .. } => self.mouse_inside = true,

            WindowEvent::CursorLeft { .. } => {
                self.mouse_inside = false;
                self.mouse_held.clear();
            }

            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.mouse_held.clear();
            }

            _ => {}
        }
    }

    fn press_key(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    fn press_button(&mut self, button: MouseButton) {
        self.mouse_pressed.insert(button);
        self.mouse_held.insert(button);
    }

    fn release_button(&mut self, button: MouseButton) {
        self.mouse_held.remove(&button);
        self.mouse_released.insert(button);
    }

    fn move_cursor(&mut self, position: Vec2) {
        self.mouse_position = position;
        self.mouse_inside = true;
        self.recompute_ndc();
    }

    fn recompute_ndc(&mut self) {
        let (w, h) = self.window_size;
        if w > 0 && h > 0 {
            self.mouse_ndc = Vec2::new(
                (self.mouse_position.x / w as f32) * 2.0 - 1.0,
                1.0 - (self.mouse_position.y / h as f32) * 2.0,
            );
        }
    }
}

fn ends_hold(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::MouseInput { state, .. } => *state == ElementState::Released,
        WindowEvent::KeyboardInput { event, .. } => event.state == ElementState::Released,
        WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::DeviceId;

    fn mouse(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput {
            device_id: unsafe { DeviceId::dummy() },
            state,
            button: WinitMouseButton::Left,
        }
    }

    #[test]
    fn test_key_state() {
        let mut input = Input::new();

        assert!(!input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));

        input.press_key(KeyCode::Space);
        assert!(input.key_held(KeyCode::Space));
        assert!(input.key_pressed(KeyCode::Space));

        // After begin_frame, pressed is cleared but held remains
        input.begin_frame();
        assert!(input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));

        // Repeat while held is not a new press
        input.press_key(KeyCode::Space);
        assert!(!input.key_pressed(KeyCode::Space));
    }

    #[test]
    fn test_mouse_ndc_flips_y() {
        let mut input = Input::new();
        input.set_window_size(800, 600);

        input.move_cursor(Vec2::new(400.0, 300.0));
        assert!(input.mouse_ndc().length() < 1e-6);

        input.move_cursor(Vec2::new(800.0, 0.0));
        assert_eq!(input.mouse_ndc(), Vec2::new(1.0, 1.0));
        assert!(input.mouse_inside());
    }

    #[test]
    fn test_world_position_undoes_view_scale() {
        let mut input = Input::new();
        input.set_window_size(1600, 800);
        input.move_cursor(Vec2::new(1600.0, 400.0));

        // Wide window: x is squeezed by h/w
        let world = input.world_position(Vec2::new(0.5, 1.0));
        assert!((world.x - 2.0).abs() < 1e-6);
        assert!(world.y.abs() < 1e-6);
    }

    #[test]
    fn test_button_edges() {
        let mut input = Input::new();
        input.press_button(MouseButton::Left);
        assert!(input.mouse_pressed(MouseButton::Left));
        assert!(input.mouse_held(MouseButton::Left));

        input.begin_frame();
        input.release_button(MouseButton::Left);
        assert!(!input.mouse_held(MouseButton::Left));
        assert!(input.mouse_released(MouseButton::Left));
    }

    #[test]
    fn test_release_over_panel_still_releases() {
        let mut input = Input::new();
        input.handle_window_event(&mouse(ElementState::Pressed), false);
        assert!(input.mouse_held(MouseButton::Left));

        input.handle_window_event(&mouse(ElementState::Released), true);
        assert!(!input.mouse_held(MouseButton::Left));
        assert!(input.mouse_released(MouseButton::Left));
    }

    #[test]
    fn test_claimed_press_is_ignored() {
        let mut input = Input::new();
        input.handle_window_event(&mouse(ElementState::Pressed), true);
        assert!(!input.mouse_held(MouseButton::Left));
        assert!(!input.mouse_pressed(MouseButton::Left));
    }

    #[test]
    fn test_claimed_cursor_left_clears_hold() {
        let mut input = Input::new();
        input.handle_window_event(&mouse(ElementState::Pressed), false);
        let left = WindowEvent::CursorLeft {
            device_id: unsafe { DeviceId::dummy() },
        };
        input.handle_window_event(&left, true);
        assert!(!input.mouse_inside());
        assert!(!input.mouse_held(MouseButton::Left));
    }
}
