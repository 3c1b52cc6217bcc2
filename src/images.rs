/*! The device-facing component of handles_and_slots */

pub mod device;
pub mod index_algorithms;
pub mod shader;
pub mod vertex_layout;

pub use device::BoundDevice;
