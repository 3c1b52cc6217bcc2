// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The generic ownership wrapper around device resource handles.

Driver handles are integers with no copy semantics of their own: copying the
integer merely aliases the same device storage, and nothing frees it when the
last copy goes away. [`RawResource`] is the one place in the crate that turns
a handle into a value:

- Exactly one `RawResource` owns a given live handle. Dropping it releases
  the handle; releasing is idempotent and a no-op for an empty wrapper.
- Duplication ([`RawResource::try_duplicate`]) never copies the handle value.
  It allocates a fresh device resource with identical metadata and performs a
  device-side content copy, so mutating the duplicate can never affect the
  original. Duplication is atomic: on failure nothing is leaked and no
  half-populated resource exists.
- Moving out ([`RawResource::take`]) transfers the handle and leaves the
  source observably empty. Operations on an empty wrapper fail with
  [`InvalidStateError`]; destroying one is a no-op.

Public resource types (images, textures, buffers, vertex arrays) each embed a
`RawResource` parameterized by a sealed kind marker, and expose `try_clone`
rather than `Clone`: device duplication allocates and can fail, and this crate
surfaces failures as errors, never panics. The pattern follows
`std::fs::File::try_clone`, the standard library's own fallible duplicate of
an OS handle. Copy-assignment is spelled `a = b.try_clone()?`, which is
strongly safe by construction: the old value is dropped only after a fully
constructed duplicate exists.
*/

use crate::bindings::bind_point::BindSlot;
use crate::images::device::BoundDevice;
use crate::imp::RawHandle;
use std::marker::PhantomData;
use std::sync::Arc;

/// Sealed kind markers tying a [`RawResource`] to its binding namespace.
pub(crate) mod kinds {
    use crate::bindings::bind_point::ResourceKind;

    /// Implemented by the zero-sized kind markers below; not implementable
    /// outside the crate.
    pub trait KindMarker: 'static {
        const KIND: ResourceKind;
    }

    macro_rules! kind_marker {
        ($name:ident, $kind:ident) => {
            #[derive(Debug)]
            pub struct $name;
            impl KindMarker for $name {
                const KIND: ResourceKind = ResourceKind::$kind;
            }
        };
    }

    kind_marker!(TextureKind, Texture);
    kind_marker!(ImageKind, Image);
    kind_marker!(VertexBufferKind, VertexBuffer);
    kind_marker!(IndexBufferKind, IndexBuffer);
    kind_marker!(UniformBufferKind, UniformBuffer);
    kind_marker!(VertexArrayKind, VertexArray);
}

/// The device refused to create a resource.
///
/// Not retried automatically; none of these are transient.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("zero-sized allocations are rejected by the device")]
    ZeroSized,
    #[error("dimension {requested} exceeds the device limit of {limit}")]
    DimensionTooLarge { requested: u32, limit: u32 },
    #[error("allocation of {bytes} bytes exceeds remaining device memory")]
    OutOfDeviceMemory { bytes: u64 },
}

/// A device-side content copy failed.
///
/// The destination is left either fully valid or not constructed at all;
/// never half-written.
#[derive(Debug, thiserror::Error)]
#[error("device-side duplicate failed: {0}")]
pub struct CopyError(#[from] AllocationError);

/// A requested pixel or byte region exceeds resource bounds, or the two
/// sides of a region copy disagree about layout.
///
/// Always detected before the device call is issued; no partial copy is
/// attempted.
#[derive(Debug, thiserror::Error)]
pub enum OutOfBoundsError {
    #[error("byte range {offset}..{end} exceeds the resource size of {size} bytes")]
    ByteRange {
        offset: usize,
        end: usize,
        size: usize,
    },
    #[error(
        "pixel region of {width}x{height} at ({x}, {y}) exceeds the resource bounds of {bound_width}x{bound_height}"
    )]
    PixelRegion {
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        bound_width: u16,
        bound_height: u16,
    },
    #[error("pixel layouts differ between the source and destination of a region copy")]
    LayoutMismatch,
    #[error("attribute bytes end at {required}, beyond the vertex stride of {stride}")]
    StrideExceeded { required: u32, stride: u32 },
}

/// An operation was invoked on an empty (moved-from) resource.
#[derive(Debug, thiserror::Error)]
#[error("resource is empty (moved from); the operation requires a live device handle")]
pub struct InvalidStateError;

/// Ownership wrapper for one device handle of kind `Kind`.
///
/// Holds either a live handle or nothing (the empty, moved-from state).
#[derive(Debug)]
pub(crate) struct RawResource<Kind: kinds::KindMarker> {
    handle: Option<RawHandle>,
    device: Arc<BoundDevice>,
    debug_name: String,
    kind: PhantomData<Kind>,
}

impl<Kind: kinds::KindMarker> RawResource<Kind> {
    /// Wraps a freshly allocated handle. The wrapper now owns it.
    pub fn from_handle(device: Arc<BoundDevice>, handle: RawHandle, debug_name: String) -> Self {
        Self {
            handle: Some(handle),
            device,
            debug_name,
            kind: PhantomData,
        }
    }

    /// An empty wrapper owning nothing. Produced by duplicating an empty
    /// resource, and by `take`.
    pub fn empty(device: Arc<BoundDevice>, debug_name: String) -> Self {
        Self {
            handle: None,
            device,
            debug_name,
            kind: PhantomData,
        }
    }

    pub fn device(&self) -> &Arc<BoundDevice> {
        &self.device
    }

    /// The live handle, or [`InvalidStateError`] if this wrapper is empty.
    pub fn handle(&self) -> Result<RawHandle, InvalidStateError> {
        self.handle.ok_or(InvalidStateError)
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    /// Moves the handle out, leaving this wrapper empty.
    ///
    /// The empty source stays safe to drop (release is a no-op) and safe to
    /// overwrite by assignment.
    pub fn take(&mut self) -> Self {
        Self {
            handle: self.handle.take(),
            device: self.device.clone(),
            debug_name: self.debug_name.clone(),
            kind: PhantomData,
        }
    }

    /// Allocates a new handle with identical metadata and device-copies the
    /// contents into it.
    ///
    /// Duplicating an empty wrapper yields an empty wrapper. On failure the
    /// original is untouched and nothing is leaked.
    pub fn try_duplicate(&self) -> Result<Self, CopyError> {
        match self.handle {
            None => Ok(Self::empty(self.device.clone(), self.debug_name.clone())),
            Some(handle) => {
                let duplicate = self.device.0.duplicate(handle)?;
                Ok(Self::from_handle(
                    self.device.clone(),
                    duplicate,
                    self.debug_name.clone(),
                ))
            }
        }
    }

    /// Makes this resource current at `(Kind, slot)`.
    ///
    /// Replaces whatever was bound there. Ownership does not move: binding a
    /// resource and dropping it are independent events (though the driver
    /// clears slots that point at a released handle).
    pub fn bind(&self, slot: BindSlot) -> Result<(), InvalidStateError> {
        let handle = self.handle()?;
        self.device.0.bind(Kind::KIND, slot.index(), handle);
        Ok(())
    }

    /// Clears `(Kind, slot)` unconditionally.
    pub fn unbind(&self, slot: BindSlot) -> Result<(), InvalidStateError> {
        //an empty resource has no business unbinding anything
        self.handle()?;
        self.device.0.unbind(Kind::KIND, slot.index());
        Ok(())
    }

    /// Whether this resource's handle currently occupies `(Kind, slot)`.
    pub fn is_bound(&self, slot: BindSlot) -> bool {
        match self.handle {
            None => false,
            Some(handle) => self.device.0.is_bound(Kind::KIND, slot.index(), handle),
        }
    }
}

impl<Kind: kinds::KindMarker> Drop for RawResource<Kind> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.0.release(handle);
        }
    }
}
