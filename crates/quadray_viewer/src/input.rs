//! Keyboard and mouse state.

use glam::Vec3;
use winit::keyboard::KeyCode;

pub const MOVEMENT_SPEED: f32 = 4.0;
pub const MOUSE_SENSITIVITY: f32 = 0.005;

/// Held-key and mouse-drag state, polled once per frame.
#[derive(Default)]
pub struct InputState {
    keys: std::collections::HashSet<KeyCode>,
    rotating: bool,
    last_cursor: Option<(f64, f64)>,
}

impl InputState {
    pub fn key_pressed(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn key_released(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn set_rotating(&mut self, rotating: bool) {
        self.rotating = rotating;
        if !rotating {
            self.last_cursor = None;
        }
    }

    /// Cursor delta while the rotate button is held, in window pixels.
    pub fn cursor_moved(&mut self, position: (f64, f64)) -> Option<(f32, f32)> {
        if !self.rotating {
            return None;
        }
        let delta = self
            .last_cursor
            .map(|last| ((position.0 - last.0) as f32, (position.1 - last.1) as f32));
        self.last_cursor = Some(position);
        delta
    }

    /// Normalized `[right, up, forward]` movement intent from the held
    /// WASDQE keys. Zero when nothing is held; normalized so diagonal
    /// movement is no faster than axial.
    pub fn movement(&self) -> Vec3 {
        let axis = |positive: KeyCode, negative: KeyCode| -> f32 {
            let mut v = 0.0;
            if self.keys.contains(&positive) {
                v += 1.0;
            }
            if self.keys.contains(&negative) {
                v -= 1.0;
            }
            v
        };

        let movement = Vec3::new(
            axis(KeyCode::KeyD, KeyCode::KeyA),
            axis(KeyCode::KeyE, KeyCode::KeyQ),
            axis(KeyCode::KeyW, KeyCode::KeyS),
        );
        movement.normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_is_normalized() {
        let mut input = InputState::default();
        input.key_pressed(KeyCode::KeyW);
        input.key_pressed(KeyCode::KeyD);
        let m = input.movement();
        assert!((m.length() - 1.0).abs() < 1e-6);
        assert!(m.x > 0.0 && m.z > 0.0);
    }

    #[test]
    fn test_opposed_keys_cancel() {
        let mut input = InputState::default();
        input.key_pressed(KeyCode::KeyW);
        input.key_pressed(KeyCode::KeyS);
        assert_eq!(input.movement(), Vec3::ZERO);
    }

    #[test]
    fn test_cursor_delta_requires_rotation() {
        let mut input = InputState::default();
        assert!(input.cursor_moved((10.0, 10.0)).is_none());

        input.set_rotating(true);
        // First sample only establishes the reference position.
        assert!(input.cursor_moved((10.0, 10.0)).is_none());
        assert_eq!(input.cursor_moved((13.0, 8.0)), Some((3.0, -2.0)));

        input.set_rotating(false);
        assert!(input.cursor_moved((20.0, 20.0)).is_none());
    }
}
