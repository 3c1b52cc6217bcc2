// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Buffer resources: vertex, index, and uniform.

Vertex and index buffers are immutable-length byte blobs plus an element
count; they are populated at construction and afterward change only through
whole-resource duplication ([`VertexBuffer::try_clone`] and friends). Uniform
buffers add named-block resolution against a shader's reflection data, plus
whole-block and partial (per-member) updates that write device-side directly,
with no host shadow copy.
*/

use crate::bindings::bind_point::{BindSlot, ResourceKind};
use crate::bindings::resource::kinds;
use crate::bindings::resource::{
    AllocationError, CopyError, InvalidStateError, OutOfBoundsError, RawResource,
};
use crate::bindings::visible_to::GPUBufferUsage;
use crate::images::device::BoundDevice;
use crate::images::shader::{BlockNotFoundError, Shader, UniformBlockLayout};
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::sync::Arc;

/// Sealed scalar types an index buffer can hold.
pub(crate) mod sealed {
    /// Implemented for `u16` and `u32`; not implementable outside the crate.
    pub trait IndexElement: Copy + 'static {
        const BYTE_SIZE: usize;
        fn to_u32(self) -> u32;
        fn from_device_bytes(bytes: &[u8]) -> Self;
    }

    impl IndexElement for u16 {
        const BYTE_SIZE: usize = 2;
        fn to_u32(self) -> u32 {
            self as u32
        }
        fn from_device_bytes(bytes: &[u8]) -> Self {
            u16::from_ne_bytes([bytes[0], bytes[1]])
        }
    }

    impl IndexElement for u32 {
        const BYTE_SIZE: usize = 4;
        fn to_u32(self) -> u32 {
            self
        }
        fn from_device_bytes(bytes: &[u8]) -> Self {
            u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        }
    }
}

/// Materializes `element_count` elements into a byte vector.
///
/// The caller's initializer produces each element in place; the bytes come
/// back as an ordinary `Vec<u8>` ready for upload. `Element` should be a
/// `repr(C)` type without padding, the same contract vertex records have with
/// the attribute layout that will read them.
pub(crate) fn initialize_byte_vec_with<Element, I: Fn(usize) -> Element>(
    element_count: usize,
    initializer: I,
) -> Vec<u8> {
    let byte_size = element_count * std::mem::size_of::<Element>();
    let mut bytes: Vec<MaybeUninit<u8>> = vec![MaybeUninit::uninit(); byte_size];
    //transmute to element type
    let as_elements: &mut [MaybeUninit<Element>] = unsafe {
        std::slice::from_raw_parts_mut(
            bytes.as_mut_ptr() as *mut MaybeUninit<Element>,
            element_count,
        )
    };
    for (i, element) in as_elements.iter_mut().enumerate() {
        *element = MaybeUninit::new(initializer(i));
    }
    //every byte was written through the element view above
    unsafe { std::mem::transmute::<Vec<MaybeUninit<u8>>, Vec<u8>>(bytes) }
}

/// A buffer of vertex records.
///
/// The element type fixes the stride: one `Element` is one vertex record.
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::buffer::VertexBuffer;
/// use handles_and_slots::images::device::{BoundDevice, UnboundDevice};
/// use std::sync::Arc;
///
/// #[repr(C)]
/// #[derive(Clone, Copy)]
/// struct Vertex {
///     position: [f32; 3],
///     uv: [f32; 2],
/// }
///
/// let device = Arc::new(BoundDevice::bind(UnboundDevice::pick()?)?);
/// let buffer = VertexBuffer::<Vertex>::new(&device, 4, "quad", |index| Vertex {
///     position: [index as f32, 0.0, 0.0],
///     uv: [0.0, 0.0],
/// })?;
/// assert_eq!(buffer.len(), 4);
/// assert_eq!(buffer.stride(), 20);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct VertexBuffer<Element> {
    raw: RawResource<kinds::VertexBufferKind>,
    count: usize,
    element: PhantomData<Element>,
}

impl<Element> VertexBuffer<Element> {
    /// Allocates a buffer of `count` vertex records, each produced by
    /// `initialize_with`.
    pub fn new(
        device: &Arc<BoundDevice>,
        count: usize,
        debug_name: &str,
        initialize_with: impl Fn(usize) -> Element,
    ) -> Result<Self, AllocationError> {
        let bytes = initialize_byte_vec_with(count, initialize_with);
        let handle = device.0.allocate_buffer(
            ResourceKind::VertexBuffer,
            GPUBufferUsage::VertexBuffer,
            bytes,
            debug_name,
        )?;
        Ok(Self {
            raw: RawResource::from_handle(device.clone(), handle, debug_name.to_string()),
            count,
            element: PhantomData,
        })
    }

    /// Number of vertex records.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Bytes per vertex record.
    #[inline]
    pub fn stride(&self) -> usize {
        std::mem::size_of::<Element>()
    }

    /// Whether this buffer has been moved from.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Makes this buffer the current vertex buffer (a singleton binding).
    pub fn bind(&self) -> Result<(), InvalidStateError> {
        self.raw.bind(BindSlot::ZERO)
    }

    /// Clears the vertex buffer binding.
    pub fn unbind(&self) -> Result<(), InvalidStateError> {
        self.raw.unbind(BindSlot::ZERO)
    }

    /// Whether this buffer is the current vertex buffer.
    pub fn is_bound(&self) -> bool {
        self.raw.is_bound(BindSlot::ZERO)
    }

    /// Moves the underlying resource out, leaving this buffer empty.
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            count: self.count,
            element: PhantomData,
        }
    }

    /// Duplicates the buffer device-side; the copy is fully independent.
    pub fn try_clone(&self) -> Result<Self, CopyError> {
        Ok(Self {
            raw: self.raw.try_duplicate()?,
            count: self.count,
            element: PhantomData,
        })
    }

    /// Reads the buffer contents back to the host. Diagnostic surface.
    pub fn read_back(&self) -> Result<Vec<u8>, InvalidStateError> {
        let handle = self.raw.handle()?;
        Ok(self.raw.device().0.read_all(handle))
    }

    pub(crate) fn raw(&self) -> &RawResource<kinds::VertexBufferKind> {
        &self.raw
    }
}

/// A buffer of draw indices.
///
/// `I` is `u16` or `u32`; the element size is what the draw-call boundary
/// needs for indexed drawing.
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::buffer::IndexBuffer;
/// use handles_and_slots::images::device::{BoundDevice, UnboundDevice};
/// use std::sync::Arc;
///
/// let device = Arc::new(BoundDevice::bind(UnboundDevice::pick()?)?);
/// let quad = [0u16, 1, 2, 2, 3, 0];
/// let buffer = IndexBuffer::<u16>::new(&device, quad.len(), "quad indices", |i| quad[i])?;
/// assert_eq!(buffer.len(), 6);
/// assert_eq!(buffer.element_size(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct IndexBuffer<I: sealed::IndexElement> {
    raw: RawResource<kinds::IndexBufferKind>,
    count: usize,
    element: PhantomData<I>,
}

impl<I: sealed::IndexElement> IndexBuffer<I> {
    /// Allocates a buffer of `count` indices, each produced by
    /// `initialize_with`.
    pub fn new(
        device: &Arc<BoundDevice>,
        count: usize,
        debug_name: &str,
        initialize_with: impl Fn(usize) -> I,
    ) -> Result<Self, AllocationError> {
        let bytes = initialize_byte_vec_with(count, initialize_with);
        let handle = device.0.allocate_buffer(
            ResourceKind::IndexBuffer,
            GPUBufferUsage::Index,
            bytes,
            debug_name,
        )?;
        Ok(Self {
            raw: RawResource::from_handle(device.clone(), handle, debug_name.to_string()),
            count,
            element: PhantomData,
        })
    }

    /// Number of indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Bytes per index element, for draw-call sizing.
    #[inline]
    pub fn element_size(&self) -> usize {
        I::BYTE_SIZE
    }

    /// Whether this buffer has been moved from.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Makes this buffer the current index buffer (a singleton binding).
    pub fn bind(&self) -> Result<(), InvalidStateError> {
        self.raw.bind(BindSlot::ZERO)
    }

    /// Clears the index buffer binding.
    pub fn unbind(&self) -> Result<(), InvalidStateError> {
        self.raw.unbind(BindSlot::ZERO)
    }

    /// Whether this buffer is the current index buffer.
    pub fn is_bound(&self) -> bool {
        self.raw.is_bound(BindSlot::ZERO)
    }

    /// Moves the underlying resource out, leaving this buffer empty.
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            count: self.count,
            element: PhantomData,
        }
    }

    /// Duplicates the buffer device-side; the copy is fully independent.
    pub fn try_clone(&self) -> Result<Self, CopyError> {
        Ok(Self {
            raw: self.raw.try_duplicate()?,
            count: self.count,
            element: PhantomData,
        })
    }

    /// Reads the indices back to the host as integers. Diagnostic surface;
    /// also what lets a draw loop validate that every index stays within the
    /// vertex range it is about to draw.
    pub fn read_back_indices(&self) -> Result<Vec<u32>, InvalidStateError> {
        let handle = self.raw.handle()?;
        let bytes = self.raw.device().0.read_all(handle);
        Ok(bytes
            .chunks_exact(I::BYTE_SIZE)
            .map(|chunk| I::from_device_bytes(chunk).to_u32())
            .collect())
    }

    pub(crate) fn raw(&self) -> &RawResource<kinds::IndexBufferKind> {
        &self.raw
    }
}

/// A whole-block or partial uniform update failed.
#[derive(Debug, thiserror::Error)]
pub enum UniformWriteError {
    #[error("no uniform block has been resolved for this buffer")]
    NoBlockResolved,
    #[error("whole-block update of {provided} bytes does not match the buffer size of {expected} bytes")]
    SizeMismatch { provided: usize, expected: usize },
    #[error(transparent)]
    BlockNotFound(#[from] BlockNotFoundError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBoundsError),
}

/// Resolving a named uniform block failed.
#[derive(Debug, thiserror::Error)]
pub enum SetBlockError {
    #[error(transparent)]
    BlockNotFound(#[from] BlockNotFoundError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error("buffer of {buffer} bytes cannot back a block of {block} bytes")]
    BufferTooSmall { buffer: usize, block: u32 },
}

/// A buffer backing a named uniform block.
///
/// Created at a fixed byte size (typically the size of the host structure
/// mirroring the block), then pointed at a block by name via a shader's
/// reflection data. Resolution records the block's member-offset table and
/// binds the buffer at the block's driver-assigned binding index.
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::buffer::UniformBuffer;
/// use handles_and_slots::images::device::{BoundDevice, UnboundDevice};
/// use handles_and_slots::images::shader::Shader;
/// use std::sync::Arc;
///
/// let device = Arc::new(BoundDevice::bind(UnboundDevice::pick()?)?);
/// let mut shader = Shader::new(String::new(), String::new());
/// shader.declare_block("Matrices", 96);
/// shader.declare_member("Matrices", "worldView", 0, 64)?;
///
/// let mut buffer = UniformBuffer::new(&device, 96, "matrices")?;
/// buffer.set_uniform_block(&shader, "Matrices")?;
/// buffer.set_partial_block_data("worldView", &[0u8; 64])?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct UniformBuffer {
    raw: RawResource<kinds::UniformBufferKind>,
    byte_size: usize,
    block: Option<UniformBlockLayout>,
}

impl UniformBuffer {
    /// Allocates `byte_size` bytes of zero-initialized uniform storage.
    pub fn new(
        device: &Arc<BoundDevice>,
        byte_size: usize,
        debug_name: &str,
    ) -> Result<Self, AllocationError> {
        if byte_size == 0 {
            return Err(AllocationError::ZeroSized);
        }
        let handle = device.0.allocate_buffer(
            ResourceKind::UniformBuffer,
            GPUBufferUsage::UniformBlock,
            vec![0u8; byte_size],
            debug_name,
        )?;
        Ok(Self {
            raw: RawResource::from_handle(device.clone(), handle, debug_name.to_string()),
            byte_size,
            block: None,
        })
    }

    /// Allocates uniform storage sized for a host structure `T`.
    pub fn sized_for<T>(device: &Arc<BoundDevice>, debug_name: &str) -> Result<Self, AllocationError> {
        Self::new(device, std::mem::size_of::<T>(), debug_name)
    }

    /// Size of the buffer in bytes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Whether this buffer has been moved from.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Resolves the named uniform block in `shader`, records its layout, and
    /// binds this buffer at the block's driver-assigned binding index.
    ///
    /// Fails with [`BlockNotFoundError`] if the shader declares no such
    /// block; the buffer's previous resolution (if any) is kept in that case.
    pub fn set_uniform_block(
        &mut self,
        shader: &Shader,
        name: &str,
    ) -> Result<(), SetBlockError> {
        let layout = shader.block(name)?;
        if (layout.byte_size() as usize) > self.byte_size {
            return Err(SetBlockError::BufferTooSmall {
                buffer: self.byte_size,
                block: layout.byte_size(),
            });
        }
        self.raw.bind(BindSlot::new(layout.binding()))?;
        self.block = Some(layout.clone());
        Ok(())
    }

    /// The binding index of the resolved block, if one is resolved.
    pub fn block_binding(&self) -> Option<u32> {
        self.block.as_ref().map(UniformBlockLayout::binding)
    }

    /// Replaces the entire block contents.
    ///
    /// `data` must be exactly the buffer's size; the write goes straight to
    /// the device.
    pub fn set_block_data(&mut self, data: &[u8]) -> Result<(), UniformWriteError> {
        if data.len() != self.byte_size {
            return Err(UniformWriteError::SizeMismatch {
                provided: data.len(),
                expected: self.byte_size,
            });
        }
        let handle = self.raw.handle()?;
        self.raw.device().0.write_bytes(handle, 0, data)?;
        Ok(())
    }

    /// Updates one named member of the resolved block.
    ///
    /// The member's byte offset comes from the shader reflection recorded at
    /// [`set_uniform_block`](Self::set_uniform_block). The write is a direct
    /// device write at that offset; bytes outside the member are untouched.
    /// `data` must fit within the member's reflected size.
    pub fn set_partial_block_data(
        &mut self,
        member_name: &str,
        data: &[u8],
    ) -> Result<(), UniformWriteError> {
        let handle = self.raw.handle()?;
        let block = self
            .block
            .as_ref()
            .ok_or(UniformWriteError::NoBlockResolved)?;
        let member = block.member(member_name)?;
        if data.len() > member.size() as usize {
            return Err(UniformWriteError::OutOfBounds(OutOfBoundsError::ByteRange {
                offset: member.offset() as usize,
                end: member.offset() as usize + data.len(),
                size: member.offset() as usize + member.size() as usize,
            }));
        }
        self.raw
            .device()
            .0
            .write_bytes(handle, member.offset() as usize, data)?;
        Ok(())
    }

    /// Moves the underlying resource out, leaving this buffer empty.
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            byte_size: self.byte_size,
            block: self.block.take(),
        }
    }

    /// Duplicates the buffer device-side; the copy is fully independent and
    /// keeps the resolved block layout, but is not bound anywhere until
    /// rebound explicitly.
    pub fn try_clone(&self) -> Result<Self, CopyError> {
        Ok(Self {
            raw: self.raw.try_duplicate()?,
            byte_size: self.byte_size,
            block: self.block.clone(),
        })
    }

    /// Reads the buffer contents back to the host. Diagnostic surface.
    pub fn read_back(&self) -> Result<Vec<u8>, InvalidStateError> {
        let handle = self.raw.handle()?;
        Ok(self.raw.device().0.read_all(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> Arc<BoundDevice> {
        Arc::new(
            BoundDevice::bind(
                crate::images::device::UnboundDevice::pick().expect("pick"),
            )
            .expect("bind"),
        )
    }

    #[test]
    fn vertex_bytes_land_in_declaration_order() {
        #[repr(C)]
        #[derive(Clone, Copy)]
        struct V {
            a: u8,
            b: u8,
        }
        let device = device();
        let buffer =
            VertexBuffer::<V>::new(&device, 2, "pairs", |i| V { a: i as u8, b: 10 + i as u8 })
                .unwrap();
        assert_eq!(buffer.read_back().unwrap(), vec![0, 10, 1, 11]);
    }

    #[test]
    fn index_read_back_converts_elements() {
        let device = device();
        let indices = [0u16, 1, 2, 2, 3, 0];
        let buffer =
            IndexBuffer::<u16>::new(&device, indices.len(), "quad", |i| indices[i]).unwrap();
        assert_eq!(buffer.read_back_indices().unwrap(), vec![0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn unresolved_partial_write_is_rejected() {
        let device = device();
        let mut buffer = UniformBuffer::new(&device, 16, "unresolved").unwrap();
        match buffer.set_partial_block_data("anything", &[0u8; 4]) {
            Err(UniformWriteError::NoBlockResolved) => {}
            other => panic!("expected a resolution error, got {other:?}"),
        }
    }

    #[test]
    fn whole_block_update_requires_exact_size() {
        let device = device();
        let mut buffer = UniformBuffer::new(&device, 16, "sized").unwrap();
        assert!(matches!(
            buffer.set_block_data(&[0u8; 12]),
            Err(UniformWriteError::SizeMismatch { .. })
        ));
        buffer.set_block_data(&[7u8; 16]).unwrap();
        assert_eq!(buffer.read_back().unwrap(), vec![7u8; 16]);
    }

    #[test]
    fn too_small_buffer_cannot_back_a_block() {
        let device = device();
        let mut shader = Shader::new(String::new(), String::new());
        shader.declare_block("Big", 128);
        let mut buffer = UniformBuffer::new(&device, 64, "small").unwrap();
        assert!(matches!(
            buffer.set_uniform_block(&shader, "Big"),
            Err(SetBlockError::BufferTooSmall { .. })
        ));
    }
}
