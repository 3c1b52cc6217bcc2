// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Binding-point vocabulary: resource kinds and slot indices.
//!
//! The device context keeps one table mapping `(kind, slot)` to the handle
//! currently bound there. Binding is an immediate state mutation, not a
//! deferred description:
//!
//! - Binding to an occupied slot silently replaces the previous occupant.
//!   Callers must not assume earlier bindings persist.
//! - Unbinding clears the slot; it never destroys the resource.
//! - The table is scoped to the device context and is reset to "nothing
//!   bound" when the context is torn down.
//!
//! Each kind has its own slot namespace: texture unit 0 and image unit 0 are
//! different slots. Vertex arrays and vertex/index buffers use a single slot
//! (slot 0) per the input-assembly model.

/// The kinds of device resources that can occupy binding points.
///
/// A kind names both an allocation category and a binding namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ResourceKind {
    /// Sampled textures (texture units).
    Texture,
    /// Storage images with explicit read/write access (image units).
    Image,
    /// Vertex attribute data.
    VertexBuffer,
    /// Index data for indexed drawing.
    IndexBuffer,
    /// Named-block uniform storage (indexed block binding points).
    UniformBuffer,
    /// Input-assembly state objects. Singleton binding: only one vertex
    /// array is current device-wide at a time.
    VertexArray,
}

/// A slot index within one kind's binding namespace.
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::bind_point::BindSlot;
///
/// let unit_zero = BindSlot::new(0);
/// assert_eq!(unit_zero, BindSlot::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindSlot(u32);

impl BindSlot {
    /// Slot 0, the default binding point.
    pub const ZERO: BindSlot = BindSlot(0);

    pub const fn new(slot: u32) -> Self {
        BindSlot(slot)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}
