use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec2, Vec3};

use crate::input::{InputEvent, KeyState, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent};

use super::perspective::PerspectiveCamera;

/// Keeps the polar angle away from the poles.
const POLE_EPS: f32 = 1e-6;
/// Minimum camera movement reported as a change.
const CHANGE_EPS: f32 = 1e-6;
/// Pixel deltas per wheel line.
const PIXELS_PER_LINE: f32 = 100.0;

/// Orbit constraints and speeds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitSettings {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle range in radians, measured from +Y.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Pixels panned per arrow key press.
    pub key_pan_speed: f32,
    pub auto_rotate: bool,
    /// 1.0 completes one orbit in 60 seconds at 60 updates per second.
    pub auto_rotate_speed: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            min_distance: 1.0,
            max_distance: 100.0,
            min_polar_angle: 0.0,
            max_polar_angle: PI / 2.0,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            key_pan_speed: 7.0,
            auto_rotate: false,
            auto_rotate_speed: 1.0,
        }
    }
}

/// Radius / polar / azimuth around +Y.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self { radius, phi: 0.0, theta: 0.0 };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_r = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_r * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_r * self.theta.cos(),
        )
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum DragMode {
    None,
    Rotate,
    Pan,
    Dolly,
}

/// Orbit interaction around a target point.
///
/// Input is accumulated as it arrives; [`OrbitController::update`] applies
/// it to the camera once per frame and enforces the distance and polar
/// constraints.
#[derive(Debug, Clone)]
pub struct OrbitController {
    settings: OrbitSettings,
    enabled: bool,

    viewport_height: f32,
    drag: DragMode,
    last_pointer: Option<Vec2>,

    /// Pending azimuth/polar change, radians.
    delta_theta: f32,
    delta_phi: f32,
    /// Pending dolly factor (1 = none).
    scale: f32,
    /// Pending pan in pixels, resolved against the camera in `update`.
    pending_pan_px: Vec2,
    /// Pending target offset in world units.
    pan_offset: Vec3,
}

impl OrbitController {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            settings,
            enabled: true,
            viewport_height: 1.0,
            drag: DragMode::None,
            last_pointer: None,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pending_pan_px: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
        }
    }

    pub fn settings(&self) -> &OrbitSettings {
        &self.settings
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.drag = DragMode::None;
        }
    }

    /// Viewport size in logical pixels; drag sensitivity scales with height.
    pub fn set_viewport(&mut self, _width: f32, height: f32) {
        if height > 0.0 {
            self.viewport_height = height;
        }
    }

    /// Feeds one input event. Returns `true` if the event was consumed.
    pub fn handle_input(&mut self, ev: &InputEvent) -> bool {
        if !self.enabled {
            return false;
        }

        match ev {
            InputEvent::PointerButton(PointerButtonEvent { button, state, x, y, modifiers }) => match state {
                MouseButtonState::Pressed => {
                    self.drag = match button {
                        MouseButton::Left if modifiers.pans() => DragMode::Pan,
                        MouseButton::Left => DragMode::Rotate,
                        MouseButton::Right => DragMode::Pan,
                        MouseButton::Middle => DragMode::Dolly,
                        _ => return false,
                    };
                    self.last_pointer = Some(Vec2::new(*x, *y));
                    true
                }
                MouseButtonState::Released => {
                    let was_dragging = self.drag != DragMode::None;
                    self.drag = DragMode::None;
                    was_dragging
                }
            },

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                let pos = Vec2::new(*x, *y);
                let last = self.last_pointer.replace(pos);
                let (Some(last), true) = (last, self.drag != DragMode::None) else {
                    return false;
                };
                self.drag_by(pos - last);
                true
            }

            InputEvent::MouseWheel { delta, .. } => {
                let lines = delta.lines_y(PIXELS_PER_LINE);
                if lines > 0.0 {
                    self.dolly_in(self.zoom_scale());
                } else if lines < 0.0 {
                    self.dolly_out(self.zoom_scale());
                }
                lines != 0.0
            }

            InputEvent::Key { key, state: KeyState::Pressed, .. } => {
                let Some((dx, dy)) = key.arrow_direction() else { return false };
                // Same sign convention as a drag: the view follows the content.
                self.pending_pan_px += Vec2::new(-dx, dy) * self.settings.key_pan_speed;
                true
            }

            InputEvent::Focused(false) | InputEvent::PointerLeft => {
                self.drag = DragMode::None;
                self.last_pointer = None;
                false
            }

            _ => false,
        }
    }

    fn drag_by(&mut self, d: Vec2) {
        match self.drag {
            DragMode::Rotate => {
                let d = d * self.settings.rotate_speed;
                self.rotate_left(TAU * d.x / self.viewport_height);
                self.rotate_up(TAU * d.y / self.viewport_height);
            }
            DragMode::Pan => {
                self.pending_pan_px += d * self.settings.pan_speed;
            }
            DragMode::Dolly => {
                if d.y > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if d.y < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
            }
            DragMode::None => {}
        }
    }

    fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.settings.zoom_speed)
    }

    fn dolly_in(&mut self, factor: f32) {
        self.scale *= factor;
    }

    fn dolly_out(&mut self, factor: f32) {
        self.scale /= factor;
    }

    fn auto_rotation_angle(&self) -> f32 {
        TAU / 60.0 / 60.0 * self.settings.auto_rotate_speed
    }

    /// Converts pending pixel pans into a world-space target offset.
    fn resolve_pan(&mut self, camera: &PerspectiveCamera) {
        if self.pending_pan_px == Vec2::ZERO {
            return;
        }
        let px = std::mem::take(&mut self.pending_pan_px);

        let distance = (camera.position - camera.target).length();
        let half_fov = (camera.fov_y_deg() * 0.5).to_radians();
        let target_distance = distance * half_fov.tan();
        let (right, up) = camera.basis();

        self.pan_offset += right * (-2.0 * px.x * target_distance / self.viewport_height);
        self.pan_offset += up * (2.0 * px.y * target_distance / self.viewport_height);
    }

    /// Applies accumulated input to `camera`. Returns `true` if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let s = self.settings;
        self.resolve_pan(camera);

        let to_y_up = Quat::from_rotation_arc(camera.up.try_normalize().unwrap_or(Vec3::Y), Vec3::Y);
        let offset = to_y_up * (camera.position - camera.target);
        let mut sph = Spherical::from_offset(offset);

        if s.auto_rotate && self.drag == DragMode::None {
            self.rotate_left(self.auto_rotation_angle());
        }

        if s.enable_damping {
            sph.theta += self.delta_theta * s.damping_factor;
            sph.phi += self.delta_phi * s.damping_factor;
        } else {
            sph.theta += self.delta_theta;
            sph.phi += self.delta_phi;
        }

        // max/min chains instead of clamp: misconfigured ranges must not panic.
        sph.phi = sph.phi.max(s.min_polar_angle).min(s.max_polar_angle);
        sph.phi = sph.phi.max(POLE_EPS).min(PI - POLE_EPS);

        sph.radius = (sph.radius * self.scale).max(s.min_distance).min(s.max_distance);

        let previous = camera.position;
        let previous_target = camera.target;
        if s.enable_damping {
            camera.target += self.pan_offset * s.damping_factor;
        } else {
            camera.target += self.pan_offset;
        }

        let offset = to_y_up.inverse() * sph.to_offset();
        camera.position = camera.target + offset;

        if s.enable_damping {
            let keep = 1.0 - s.damping_factor;
            self.delta_theta *= keep;
            self.delta_phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        previous.distance_squared(camera.position) > CHANGE_EPS
            || previous_target.distance_squared(camera.target) > CHANGE_EPS
    }
}

/// Polar angle of the camera around its target, radians from +Y.
pub fn polar_angle(camera: &PerspectiveCamera) -> f32 {
    Spherical::from_offset(camera.position - camera.target).phi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, Modifiers, MouseWheelDelta};
    use approx::assert_relative_eq;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(50.0, 16.0 / 9.0, 0.01, 1000.0)
            .unwrap()
            .with_position(Vec3::new(4.0, 2.0, 2.0))
    }

    fn controller() -> OrbitController {
        let mut c = OrbitController::new(OrbitSettings::default());
        c.set_viewport(1280.0, 720.0);
        c
    }

    fn press(c: &mut OrbitController, button: MouseButton, modifiers: Modifiers, x: f32, y: f32) {
        c.handle_input(&InputEvent::PointerButton(PointerButtonEvent {
            button,
            state: MouseButtonState::Pressed,
            x,
            y,
            modifiers,
        }));
    }

    fn release(c: &mut OrbitController, button: MouseButton) {
        c.handle_input(&InputEvent::PointerButton(PointerButtonEvent {
            button,
            state: MouseButtonState::Released,
            x: 0.0,
            y: 0.0,
            modifiers: Modifiers::default(),
        }));
    }

    fn drag(c: &mut OrbitController, button: MouseButton, modifiers: Modifiers, dx: f32, dy: f32) {
        press(c, button, modifiers, 100.0, 100.0);
        c.handle_input(&InputEvent::PointerMoved(PointerMoveEvent {
            x: 100.0 + dx,
            y: 100.0 + dy,
        }));
        release(c, button);
    }

    fn wheel(c: &mut OrbitController, y: f32) {
        c.handle_input(&InputEvent::MouseWheel {
            delta: MouseWheelDelta::Line { x: 0.0, y },
            modifiers: Modifiers::default(),
        });
    }

    #[test]
    fn spherical_round_trip() {
        let v = Vec3::new(4.0, 2.0, 2.0);
        let back = Spherical::from_offset(v).to_offset();
        assert!((back - v).length() < 1e-5);
    }

    #[test]
    fn update_without_input_clamps_polar_only() {
        let mut cam = camera();
        let mut c = controller();
        assert!(!c.update(&mut cam));
        assert!((cam.position - Vec3::new(4.0, 2.0, 2.0)).length() < 1e-4);
    }

    #[test]
    fn polar_angle_never_exceeds_max_after_any_drag() {
        let mut cam = camera();
        let mut c = controller();

        for dy in [-5000.0, 3000.0, -200.0, 10_000.0, -10_000.0] {
            drag(&mut c, MouseButton::Left, Modifiers::default(), 37.0, dy);
            c.update(&mut cam);
            let phi = polar_angle(&cam);
            assert!(phi <= PI / 2.0 + 1e-5, "phi = {phi}");
            assert!(phi >= 0.0);
        }
    }

    #[test]
    fn dragging_down_past_horizon_stops_at_horizon() {
        let mut cam = camera();
        let mut c = controller();
        drag(&mut c, MouseButton::Left, Modifiers::default(), 0.0, -5000.0);
        c.update(&mut cam);
        assert_relative_eq!(polar_angle(&cam), PI / 2.0, epsilon = 1e-4);
        assert!(cam.position.y.abs() < 1e-3);
    }

    #[test]
    fn rotation_keeps_distance() {
        let mut cam = camera();
        let before = cam.position.length();
        let mut c = controller();
        drag(&mut c, MouseButton::Left, Modifiers::default(), 120.0, 40.0);
        assert!(c.update(&mut cam));
        assert_relative_eq!(cam.position.length(), before, epsilon = 1e-4);
    }

    #[test]
    fn wheel_dolly_respects_distance_limits() {
        let mut cam = camera();
        let mut c = controller();

        for _ in 0..200 {
            wheel(&mut c, 1.0);
            c.update(&mut cam);
        }
        assert_relative_eq!(cam.position.length(), 1.0, epsilon = 1e-4);

        for _ in 0..500 {
            wheel(&mut c, -1.0);
            c.update(&mut cam);
        }
        assert_relative_eq!(cam.position.length(), 100.0, epsilon = 1e-2);
    }

    #[test]
    fn right_drag_pans_target() {
        let mut cam = camera();
        let mut c = controller();
        drag(&mut c, MouseButton::Right, Modifiers::default(), 50.0, 0.0);
        c.update(&mut cam);

        let (right, _) = camera().basis();
        assert!(cam.target.dot(right) < 0.0, "dragging right moves the target left");
        assert!((cam.position - cam.target - Vec3::new(4.0, 2.0, 2.0)).length() < 1e-3);
    }

    #[test]
    fn shift_left_drag_pans() {
        let mut cam = camera();
        let mut c = controller();
        let shift = Modifiers { shift: true, ..Default::default() };
        drag(&mut c, MouseButton::Left, shift, 0.0, 30.0);
        c.update(&mut cam);
        assert!(cam.target.length() > 0.0);
    }

    #[test]
    fn arrow_keys_pan() {
        let mut cam = camera();
        let mut c = controller();
        assert!(c.handle_input(&InputEvent::Key {
            key: Key::ArrowUp,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat: false,
        }));
        c.update(&mut cam);
        assert!(cam.target.length() > 0.0);
    }

    #[test]
    fn auto_rotate_advances_azimuth() {
        let mut cam = camera();
        let mut c = OrbitController::new(OrbitSettings {
            auto_rotate: true,
            ..Default::default()
        });
        let before = Spherical::from_offset(cam.position).theta;
        c.update(&mut cam);
        let after = Spherical::from_offset(cam.position).theta;
        assert_relative_eq!(before - after, TAU / 3600.0, epsilon = 1e-5);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut cam = camera();
        let mut c = OrbitController::new(OrbitSettings {
            enable_damping: true,
            ..Default::default()
        });
        c.set_viewport(1280.0, 720.0);
        drag(&mut c, MouseButton::Left, Modifiers::default(), 100.0, 0.0);

        assert!(c.update(&mut cam));
        let first = cam.position;
        assert!(c.update(&mut cam));
        assert!(first.distance(cam.position) > 0.0);
    }

    #[test]
    fn disabled_controller_ignores_input() {
        let mut cam = camera();
        let mut c = controller();
        c.set_enabled(false);
        wheel(&mut c, 1.0);
        assert!(!c.update(&mut cam));
    }

    #[test]
    fn inverted_polar_range_does_not_panic() {
        let mut cam = camera();
        let mut c = OrbitController::new(OrbitSettings {
            min_polar_angle: 2.0,
            max_polar_angle: 1.0,
            ..Default::default()
        });
        c.update(&mut cam);
        assert!(polar_angle(&cam) <= 1.0 + 1e-5);
    }
}
