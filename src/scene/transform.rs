use glam::{Mat4, Quat, Vec3};

/// Placement of one hero cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// `count` cubes evenly spaced on a horizontal ring around the origin. The
/// ring turns about Y and every cube spins about its own X axis as `t`
/// (milliseconds) advances.
pub fn hero_ring(count: usize, radius: f32, scale: f32, t: f64) -> Vec<Transform> {
    let seconds = (t / 1000.0) as f32;
    let ring_angle = seconds * 0.5;
    let spin = Quat::from_rotation_x(seconds);

    (0..count)
        .map(|i| {
            let angle = ring_angle + i as f32 * std::f32::consts::TAU / count as f32;
            Transform {
                position: Vec3::new(angle.sin() * radius, 0.0, -angle.cos() * radius),
                rotation: Quat::from_rotation_y(-angle) * spin,
                scale: Vec3::splat(scale),
            }
        })
        .collect()
}
