use glam::{Mat4, Vec3};

use super::asset::Aabb;

/// Directional light shining from `position` towards `target`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
    /// Linear RGB.
    pub color: [f32; 3],
    pub intensity: f32,
    pub cast_shadow: bool,
    /// PCF filter radius in shadow-map texels.
    pub shadow_radius: f32,
    pub shadow_bias: f32,
    pub shadow_map_size: u32,
}

impl DirectionalLight {
    /// Unit vector pointing from the lit surface towards the light.
    pub fn direction_to_light(&self) -> Vec3 {
        (self.position - self.target).try_normalize().unwrap_or(Vec3::Y)
    }

    /// Orthographic light view-projection enclosing `bounds`.
    ///
    /// The frustum is fitted around the bounding sphere so it stays stable
    /// while the model animates within it.
    pub fn shadow_view_proj(&self, bounds: Option<Aabb>) -> Mat4 {
        let (center, radius) = match bounds {
            Some(b) => (b.center(), b.radius().max(0.5)),
            None => (Vec3::ZERO, 1.0),
        };

        let dir = self.direction_to_light();
        let eye = center + dir * radius * 2.0;
        let up = if dir.abs_diff_eq(Vec3::Y, 1e-3) || dir.abs_diff_eq(Vec3::NEG_Y, 1e-3) {
            Vec3::Z
        } else {
            Vec3::Y
        };

        let view = Mat4::look_at_rh(eye, center, up);
        let proj = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.01, radius * 4.0);
        proj * view
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl AmbientLight {
    /// Color premultiplied by intensity.
    pub fn radiance(&self) -> [f32; 3] {
        self.color.map(|c| c * self.intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> DirectionalLight {
        DirectionalLight {
            position: Vec3::new(7.0, 10.0, -2.0),
            target: Vec3::ZERO,
            color: [1.0; 3],
            intensity: 0.3,
            cast_shadow: true,
            shadow_radius: 3.0,
            shadow_bias: 0.002,
            shadow_map_size: 2048,
        }
    }

    #[test]
    fn direction_points_at_light() {
        let d = light().direction_to_light();
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert!(d.y > 0.0 && d.x > 0.0 && d.z < 0.0);
    }

    #[test]
    fn shadow_frustum_contains_bounds() {
        let bounds = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let m = light().shadow_view_proj(Some(bounds));
        for p in [bounds.min, bounds.max, Vec3::ZERO] {
            let clip = m.project_point3(p);
            assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0, "{clip:?}");
            assert!((0.0..=1.0).contains(&clip.z), "{clip:?}");
        }
    }

    #[test]
    fn ambient_radiance_scales_color() {
        let a = AmbientLight {
            color: [1.0, 0.5, 0.0],
            intensity: 0.9,
        };
        assert_eq!(a.radiance(), [0.9, 0.45, 0.0]);
    }
}
