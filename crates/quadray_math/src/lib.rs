// Re-export glam for convenience
pub use glam::*;

mod quadric;
mod transform;

pub use quadric::{
    ellipsoid, everywhere, hyperboloid, quadric_form, unit_cylinder, unit_hyperboloid, unit_plane,
    unit_sphere, QuadricMatrix,
};
pub use transform::{
    perspective_projection, pitch_rotation, roll_rotation, rotation, scaling, translation,
    yaw_rotation,
};
