//! Math utilities and types
//!
//! Matrix helpers follow OpenGL conventions: column-major storage, right-handed
//! view space, clip-space depth in `[-1, 1]`.

pub use nalgebra::{Matrix3, Matrix4, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with the transforms the camera needs
pub trait Mat4Ext {
    /// GL perspective projection, field of view given in degrees
    fn perspective_gl(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Rotation of `angle_degrees` about `axis`, which does not need to be normalized
    ///
    /// Returns `None` for a zero-length axis.
    fn rotation_degrees(angle_degrees: f32, axis: &Vec3) -> Option<Mat4>;

    /// Rotation about an arbitrary pivot point: `T(pivot) * R * T(-pivot)`
    fn rotation_about(rotation: &Mat4, pivot: &Vec3) -> Mat4;

    /// Upper-left 3x3 block with every column scaled to unit length, embedded in identity
    ///
    /// Equals the inverse-transpose only when the block has uniform scale and no skew.
    fn normal_matrix_approx(&self) -> Mat4;

    /// Upper-left 3x3 block
    fn upper_left_3x3(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn perspective_gl(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (utils::deg_to_rad(fov_y_degrees) * 0.5).tan();
        let range_inv = 1.0 / (near - far);

        let mut result = Mat4::zeros();
        result[(0, 0)] = f / aspect;
        result[(1, 1)] = f;
        result[(2, 2)] = (far + near) * range_inv;
        result[(2, 3)] = 2.0 * far * near * range_inv;
        result[(3, 2)] = -1.0;
        result
    }

    fn rotation_degrees(angle_degrees: f32, axis: &Vec3) -> Option<Mat4> {
        let axis = Unit::try_new(*axis, f32::EPSILON)?;
        Some(Mat4::from_axis_angle(&axis, utils::deg_to_rad(angle_degrees)))
    }

    fn rotation_about(rotation: &Mat4, pivot: &Vec3) -> Mat4 {
        Mat4::new_translation(pivot) * rotation * Mat4::new_translation(&-pivot)
    }

    fn normal_matrix_approx(&self) -> Mat4 {
        let mut result = Mat4::identity();
        for column in 0..3 {
            let basis = self.fixed_view::<3, 1>(0, column);
            let length = basis.norm();
            if length > 0.0 {
                result.fixed_view_mut::<3, 1>(0, column).copy_from(&(basis / length));
            }
        }
        result
    }

    fn upper_left_3x3(&self) -> Mat3 {
        self.fixed_view::<3, 3>(0, 0).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perspective_matches_gl_layout() {
        let m = Mat4::perspective_gl(90.0, 2.0, 1.0, 3.0);

        assert_relative_eq!(m[(0, 0)], 0.5, epsilon = 1e-6);
        assert_relative_eq!(m[(1, 1)], 1.0, epsilon = 1e-6);
        assert_relative_eq!(m[(2, 2)], -2.0, epsilon = 1e-6);
        assert_relative_eq!(m[(2, 3)], -3.0, epsilon = 1e-6);
        assert_relative_eq!(m[(3, 2)], -1.0, epsilon = 1e-6);
        assert_relative_eq!(m[(3, 3)], 0.0, epsilon = 1e-6);
        // column-major slice puts -1 at index 11
        assert_relative_eq!(m.as_slice()[11], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_rejects_zero_axis() {
        assert!(Mat4::rotation_degrees(45.0, &Vec3::zeros()).is_none());
    }

    #[test]
    fn test_rotation_about_pivot_keeps_pivot_fixed() {
        let rotation = Mat4::rotation_degrees(90.0, &Vec3::new(0.0, 1.0, 0.0)).unwrap();
        let pivot = Vec3::new(1.0, 2.0, 3.0);
        let m = Mat4::rotation_about(&rotation, &pivot);

        let moved = m.transform_point(&pivot.into());
        assert_relative_eq!(moved.coords, pivot, epsilon = 1e-5);
    }

    #[test]
    fn test_normal_matrix_normalizes_columns() {
        let scaled = Mat4::new_scaling(3.0) * Mat4::rotation_degrees(30.0, &Vec3::z()).unwrap();
        let normal = scaled.normal_matrix_approx();

        for column in 0..3 {
            assert_relative_eq!(normal.fixed_view::<3, 1>(0, column).norm(), 1.0, epsilon = 1e-5);
        }
        assert_relative_eq!(normal[(3, 3)], 1.0);
        assert_relative_eq!(normal[(0, 3)], 0.0);
    }
}
