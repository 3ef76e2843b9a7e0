//! Surface pose - where a detected flat surface sits in the tracking space

use glam::{Mat4, Quat, Vec3};

/// A 4x4 rigid transform of a detected surface in the floor reference space
///
/// Has no identity beyond "the most recent hit": the tracker overwrites it
/// every frame and placement copies it by value at gesture time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePose(Mat4);

impl SurfacePose {
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self(matrix)
    }

    /// Build from 16 column-major values (the layout of `XRRigidTransform.matrix`)
    ///
    /// Returns `None` for the wrong length or non-finite entries.
    pub fn from_cols_slice(values: &[f32]) -> Option<Self> {
        if values.len() != 16 || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(Self(Mat4::from_cols_slice(values)))
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self(Mat4::from_translation(translation))
    }

    pub fn matrix(&self) -> Mat4 {
        self.0
    }

    pub fn to_cols_array(&self) -> [f32; 16] {
        self.0.to_cols_array()
    }

    pub fn position(&self) -> Vec3 {
        self.0.w_axis.truncate()
    }

    pub fn rotation(&self) -> Quat {
        let (_, rotation, _) = self.0.to_scale_rotation_translation();
        rotation
    }
}

impl From<Mat4> for SurfacePose {
    fn from(matrix: Mat4) -> Self {
        Self(matrix)
    }
}
