//! Static scene lighting: one ambient term and one directional light

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// A directional light shining from `position` toward the origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
}

impl DirectionalLight {
    /// Unit vector pointing from the surface toward the light
    pub fn to_light(&self) -> Vec3 {
        Vec3::from(self.position).normalize_or(Vec3::Y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: [1.0, 1.0, 1.0],
                intensity: 1.2,
            },
            directional: DirectionalLight {
                color: [1.0, 1.0, 1.0],
                intensity: 0.8,
                position: [1.0, 2.0, 3.0],
            },
        }
    }
}

impl Lighting {
    /// Pre-multiplied ambient color
    pub fn ambient_radiance(&self) -> Vec3 {
        Vec3::from(self.ambient.color) * self.ambient.intensity
    }

    /// Pre-multiplied directional color
    pub fn directional_radiance(&self) -> Vec3 {
        Vec3::from(self.directional.color) * self.directional.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_light_direction() {
        let lighting = Lighting::default();
        let dir = lighting.directional.to_light();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!(dir.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0).normalize(), 1e-6));
        assert_eq!(lighting.ambient_radiance(), Vec3::splat(1.2));
    }

    #[test]
    fn test_light_at_origin_points_up() {
        let light = DirectionalLight {
            color: [1.0; 3],
            intensity: 1.0,
            position: [0.0; 3],
        };
        assert_eq!(light.to_light(), Vec3::Y);
    }
}
