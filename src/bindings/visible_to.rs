//! Resource visibility and usage declarations.
//!
//! When creating device resources, declaring how they will be accessed lets
//! the driver make placement and synchronization decisions. This module
//! provides two declarations:
//!
//! - [`GPUBufferUsage`] - what role a buffer plays on the device
//! - [`ImageAccess`] - how shaders may access a storage image
//!
//! # Examples
//!
//! ```no_run
//! use handles_and_slots::bindings::visible_to::{GPUBufferUsage, ImageAccess};
//!
//! // A buffer containing vertex attribute data
//! let buffer_usage = GPUBufferUsage::VertexBuffer;
//!
//! // A storage image shaders both read and write
//! let access = ImageAccess::ReadWrite;
//! ```

/// Describes how a buffer resource will be used on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GPUBufferUsage {
    /// The buffer contains vertex attribute data.
    ///
    /// Its contents are interpreted according to the attribute layout of the
    /// vertex array it is attached to.
    VertexBuffer,

    /// The buffer contains index data for indexed drawing.
    Index,

    /// The buffer backs a named uniform block.
    UniformBlock,
}

/// Declares how shaders may access a storage image.
///
/// The access mode is fixed at image creation, the way the underlying device
/// API fixes it when the image is bound to an image unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAccess {
    /// Shaders may only load from the image.
    ReadOnly,
    /// Shaders may only store to the image.
    WriteOnly,
    /// Shaders may load and store.
    ReadWrite,
}
