use glam::{Mat4, Vec3};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum CameraError {
    #[error("near plane ({near}) must be positive and less than far plane ({far})")]
    InvalidClipPlanes { near: f32, far: f32 },

    #[error("vertical field of view must be in (0, 180) degrees, got {0}")]
    InvalidFov(f32),
}

/// Perspective camera looking at a target point.
///
/// Projection parameters are validated at construction: `0 < near < far`
/// and `0 < fov < 180`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,

    fov_y_deg: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Result<Self, CameraError> {
        if !(fov_y_deg > 0.0 && fov_y_deg < 180.0) {
            return Err(CameraError::InvalidFov(fov_y_deg));
        }
        if !(near > 0.0 && near < far) {
            return Err(CameraError::InvalidClipPlanes { near, far });
        }

        Ok(Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg,
            aspect: sanitize_aspect(aspect),
            near,
            far,
        })
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn fov_y_deg(&self) -> f32 {
        self.fov_y_deg
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Updates the aspect ratio from a viewport size. Zero-sized viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    /// Unit vector from the camera towards its target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    /// Camera-space right and up axes expressed in world space.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = self.forward();
        let right = forward.cross(self.up).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        (right, up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let up = if self.forward().cross(self.up).length_squared() < 1e-12 {
            // Looking straight along `up`; pick any orthogonal axis.
            Vec3::Z
        } else {
            self.up
        };
        Mat4::look_at_rh(self.position, self.target, up)
    }

    /// Right-handed projection with `[0, 1]` depth.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 }
}
