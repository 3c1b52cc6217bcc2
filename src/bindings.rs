/*! Defines binding types */

pub mod bind_point;
pub mod buffer;
pub mod image;
pub mod resource;
pub mod sampler;
pub mod software;
pub mod texture;
pub mod vertex_array;
pub mod visible_to;

pub use bind_point::{BindSlot, ResourceKind};
