use glam::{Mat4, Quat, Vec3, Vec4};
use openxr as xr;

/// Off-axis perspective projection from per-eye FoV angles (radians),
/// right handed with a 0..1 depth range.
pub fn projection_from_fov(fov: &xr::Fovf, near: f32, far: f32) -> Mat4 {
    let left = f32::tan(fov.angle_left);
    let right = f32::tan(fov.angle_right);
    let up = f32::tan(fov.angle_up);
    let down = f32::tan(fov.angle_down);

    let width = right - left;
    let height = up - down;

    let x = 2.0 / width;
    let y = 2.0 / height;

    let a = (right + left) / width;
    let b = (up + down) / height;

    let c = far / (near - far);
    let d = near * far / (near - far);

    Mat4::from_cols(
        Vec4::new(x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, y, 0.0, 0.0),
        Vec4::new(a, b, c, -1.0),
        Vec4::new(0.0, 0.0, d, 0.0),
    )
}

/// Symmetric field of view used when the runtime has not located any views yet.
pub fn default_fov() -> xr::Fovf {
    let half = std::f32::consts::FRAC_PI_4;
    xr::Fovf {
        angle_left: -half,
        angle_right: half,
        angle_up: half,
        angle_down: -half,
    }
}

pub fn view_matrix(pose: &xr::Posef) -> Mat4 {
    let position = Vec3::new(pose.position.x, pose.position.y, pose.position.z);

    let orientation = Quat::from_xyzw(
        pose.orientation.x,
        pose.orientation.y,
        pose.orientation.z,
        pose.orientation.w,
    );

    Mat4::from_rotation_translation(orientation, position).inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_symmetric_fov_matches_perspective() {
        let fov = default_fov();
        let mat = projection_from_fov(&fov, 0.1, 1024.0);
        let expected = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 1024.0);

        for (a, b) in mat.to_cols_array().iter().zip(expected.to_cols_array().iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_depth_range_maps_near_and_far() {
        let fov = xr::Fovf {
            angle_left: -0.7,
            angle_right: 0.6,
            angle_up: 0.65,
            angle_down: -0.8,
        };
        let mat = projection_from_fov(&fov, 0.1, 1024.0);

        let near = mat.project_point3(Vec3::new(0.0, 0.0, -0.1));
        let far = mat.project_point3(Vec3::new(0.0, 0.0, -1024.0));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-4);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-4);

        // Asymmetric FoV shifts the optical center.
        assert!(mat.z_axis.x != 0.0);
        assert!(mat.z_axis.y != 0.0);
    }

    #[test]
    fn test_view_matrix() {
        let pose = xr::Posef {
            orientation: xr::Quaternionf {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                w: 1.0,
            },
            position: xr::Vector3f {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            },
        };

        let view_mat = view_matrix(&pose);

        assert!((view_mat.col(3)[0] + 1.0).abs() < 1e-6);
        assert!((view_mat.col(3)[1] + 2.0).abs() < 1e-6);
        assert!((view_mat.col(3)[2] + 3.0).abs() < 1e-6);
    }
}
