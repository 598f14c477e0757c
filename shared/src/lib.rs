//! Types shared between the Hyperbol simulation and anything that consumes it:
//! vector math, the kinematic helpers, tuning configuration and snapshot wire
//! types.

pub mod config;
pub mod curve;
pub mod kinematics;
pub mod protocol;
pub mod team;
pub mod vec3;
