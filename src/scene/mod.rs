pub mod cube_sea;
pub mod transform;

pub use cube_sea::{build_cube_grid, CubeSea, CubeVertex};
pub use transform::{hero_ring, Transform};
