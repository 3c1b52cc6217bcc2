// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Vertex arrays: complete input-assembly state in one bindable object.

A [`VertexArray`] ties together one vertex buffer, zero or one index buffer,
and an ordered list of [attribute descriptors](crate::images::vertex_layout)
describing how to reinterpret the vertex buffer's bytes. A single
[`bind`](VertexArray::bind) then establishes everything a draw call needs.

Attribute indices are sequential and positional: the first attribute added is
index 0, the next index 1, and so on. **This order must match the attribute
indices the active shader expects.** The array does not (and cannot) validate
that correspondence; it is a caller contract, exactly as it is in the
underlying device API.

The vertex-array binding is a singleton: only one vertex array is current
device-wide at a time.
*/

use crate::bindings::bind_point::BindSlot;
use crate::bindings::buffer::sealed::IndexElement;
use crate::bindings::buffer::{IndexBuffer, VertexBuffer};
use crate::bindings::resource::kinds;
use crate::bindings::resource::{
    AllocationError, CopyError, InvalidStateError, OutOfBoundsError, RawResource,
};
use crate::images::device::BoundDevice;
use crate::images::vertex_layout::{ComponentType, VertexAttribute};
use std::sync::Arc;

/// `removeLastAttribute` on an array with no attributes.
#[derive(Debug, thiserror::Error)]
#[error("the vertex array has no attributes to remove")]
pub struct EmptyAttributeListError;

/// A vertex-array operation failed.
#[derive(Debug, thiserror::Error)]
pub enum VertexArrayError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBoundsError),
    #[error(transparent)]
    EmptyAttributeList(#[from] EmptyAttributeListError),
}

#[derive(Debug, Clone, Copy)]
struct VertexBinding {
    stride: u32,
    count: u32,
}

#[derive(Debug, Clone, Copy)]
struct IndexBinding {
    count: u32,
    element_size: u32,
}

/// Composed input-assembly state: vertex buffer, optional index buffer, and
/// an ordered attribute layout.
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::buffer::{IndexBuffer, VertexBuffer};
/// use handles_and_slots::bindings::vertex_array::VertexArray;
/// use handles_and_slots::images::device::{BoundDevice, UnboundDevice};
/// use handles_and_slots::images::vertex_layout::ComponentType;
/// use std::sync::Arc;
///
/// #[repr(C)]
/// #[derive(Clone, Copy)]
/// struct Vertex {
///     position: [f32; 3],
///     normal: [f32; 3],
///     uv: [f32; 2],
/// }
///
/// let device = Arc::new(BoundDevice::bind(UnboundDevice::pick()?)?);
/// let vertices = VertexBuffer::<Vertex>::new(&device, 4, "quad", |_| Vertex {
///     position: [0.0; 3],
///     normal: [0.0; 3],
///     uv: [0.0; 2],
/// })?;
/// let indices = [0u16, 1, 2, 2, 3, 0];
/// let index_buffer = IndexBuffer::<u16>::new(&device, 6, "quad", |i| indices[i])?;
///
/// let mut array = VertexArray::with_buffers(&device, &vertices, &index_buffer, "quad")?;
/// array.add_attribute(3, ComponentType::F32, 0, false)?;  // position
/// array.add_attribute(3, ComponentType::F32, 12, false)?; // normal
/// array.add_attribute(2, ComponentType::F32, 24, false)?; // uv
/// array.bind()?;
/// assert_eq!(array.index_count(), Some(6));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct VertexArray {
    raw: RawResource<kinds::VertexArrayKind>,
    attributes: Vec<VertexAttribute>,
    vertex: Option<VertexBinding>,
    index: Option<IndexBinding>,
}

impl VertexArray {
    /// Allocates an empty vertex array: no buffers, no attributes.
    pub fn new(device: &Arc<BoundDevice>, debug_name: &str) -> Result<Self, AllocationError> {
        let handle = device.0.allocate_vertex_array(debug_name)?;
        Ok(Self {
            raw: RawResource::from_handle(device.clone(), handle, debug_name.to_string()),
            attributes: Vec::new(),
            vertex: None,
            index: None,
        })
    }

    /// Allocates a vertex array with its vertex buffer already attached.
    pub fn with_buffer<Element>(
        device: &Arc<BoundDevice>,
        vertex_buffer: &VertexBuffer<Element>,
        debug_name: &str,
    ) -> Result<Self, VertexArrayError> {
        let mut array = Self::new(device, debug_name)?;
        array.set_buffer(vertex_buffer)?;
        Ok(array)
    }

    /// Allocates a vertex array with vertex and index buffers attached.
    pub fn with_buffers<Element, I: IndexElement>(
        device: &Arc<BoundDevice>,
        vertex_buffer: &VertexBuffer<Element>,
        index_buffer: &IndexBuffer<I>,
        debug_name: &str,
    ) -> Result<Self, VertexArrayError> {
        let mut array = Self::with_buffer(device, vertex_buffer, debug_name)?;
        array.set_index_buffer(index_buffer)?;
        Ok(array)
    }

    /// Attaches a vertex buffer. Its stride becomes the vertex record size
    /// the attribute layout is validated against.
    ///
    /// May be called before or after attributes are added; offsets are only
    /// meaningful once a buffer with a known stride is attached, and any
    /// already-added attribute that overruns the new stride fails the call.
    ///
    /// Attachment does not transfer ownership: the caller keeps the buffer
    /// alive for as long as draws may reference it.
    pub fn set_buffer<Element>(
        &mut self,
        vertex_buffer: &VertexBuffer<Element>,
    ) -> Result<(), VertexArrayError> {
        let array_handle = self.raw.handle()?;
        let buffer_handle = vertex_buffer.raw().handle()?;
        let stride = vertex_buffer.stride() as u32;
        for attribute in &self.attributes {
            if attribute.byte_end() > stride {
                return Err(OutOfBoundsError::StrideExceeded {
                    required: attribute.byte_end(),
                    stride,
                }
                .into());
            }
        }
        self.raw
            .device()
            .0
            .va_set_vertex_buffer(array_handle, buffer_handle, stride);
        self.vertex = Some(VertexBinding {
            stride,
            count: vertex_buffer.len() as u32,
        });
        Ok(())
    }

    /// Attaches an index buffer for indexed drawing.
    pub fn set_index_buffer<I: IndexElement>(
        &mut self,
        index_buffer: &IndexBuffer<I>,
    ) -> Result<(), VertexArrayError> {
        let array_handle = self.raw.handle()?;
        let buffer_handle = index_buffer.raw().handle()?;
        self.raw
            .device()
            .0
            .va_set_index_buffer(array_handle, buffer_handle);
        self.index = Some(IndexBinding {
            count: index_buffer.len() as u32,
            element_size: index_buffer.element_size() as u32,
        });
        Ok(())
    }

    /// Appends one attribute and enables it at the next sequential index,
    /// which is returned.
    ///
    /// Attributes must be added in the order the shader's attribute indices
    /// expect: index 0 first. If a vertex buffer is attached, the attribute
    /// must fit within its stride.
    ///
    /// # Panics
    ///
    /// Panics if `components` is not between 1 and 4.
    pub fn add_attribute(
        &mut self,
        components: u8,
        component_type: ComponentType,
        byte_offset: u32,
        normalize: bool,
    ) -> Result<u32, VertexArrayError> {
        assert!(
            (1..=4).contains(&components),
            "attributes have 1 through 4 components"
        );
        let handle = self.raw.handle()?;
        let attribute = VertexAttribute {
            components,
            component_type,
            byte_offset,
            normalize,
        };
        if let Some(vertex) = &self.vertex {
            if attribute.byte_end() > vertex.stride {
                return Err(OutOfBoundsError::StrideExceeded {
                    required: attribute.byte_end(),
                    stride: vertex.stride,
                }
                .into());
            }
        }
        let index = self.attributes.len() as u32;
        self.raw.device().0.va_push_attribute(handle, attribute);
        self.attributes.push(attribute);
        Ok(index)
    }

    /// Disables and removes the most recently added attribute, returning the
    /// index that was disabled.
    pub fn remove_last_attribute(&mut self) -> Result<u32, VertexArrayError> {
        let handle = self.raw.handle()?;
        if self.attributes.is_empty() {
            return Err(EmptyAttributeListError.into());
        }
        self.attributes.pop();
        self.raw.device().0.va_pop_attribute(handle);
        Ok(self.attributes.len() as u32)
    }

    /// Number of enabled attributes.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// The enabled attributes, in index order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Vertex record count of the attached vertex buffer, if one is attached.
    pub fn vertex_count(&self) -> Option<u32> {
        self.vertex.map(|vertex| vertex.count)
    }

    /// Index count of the attached index buffer, if one is attached.
    pub fn index_count(&self) -> Option<u32> {
        self.index.map(|index| index.count)
    }

    /// Index element size in bytes, if an index buffer is attached.
    pub fn index_element_size(&self) -> Option<u32> {
        self.index.map(|index| index.element_size)
    }

    /// Whether this array has been moved from.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Makes this array the active input-assembly state.
    ///
    /// A singleton binding: whatever array was current before is replaced.
    /// The array does not validate that a vertex buffer is attached; drawing
    /// without one is the caller's contract to avoid.
    pub fn bind(&self) -> Result<(), InvalidStateError> {
        self.raw.bind(BindSlot::ZERO)
    }

    /// Clears the active input-assembly state.
    pub fn unbind(&self) -> Result<(), InvalidStateError> {
        self.raw.unbind(BindSlot::ZERO)
    }

    /// Whether this array is the active input-assembly state.
    pub fn is_bound(&self) -> bool {
        self.raw.is_bound(BindSlot::ZERO)
    }

    /// Moves the underlying resource out, leaving this array empty.
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            attributes: std::mem::take(&mut self.attributes),
            vertex: self.vertex,
            index: self.index,
        }
    }

    /// Duplicates the array: fresh device state object carrying the same
    /// buffer attachments and attribute list.
    ///
    /// The duplicate references the same attached buffers; the buffers
    /// themselves are not copied.
    pub fn try_clone(&self) -> Result<Self, CopyError> {
        Ok(Self {
            raw: self.raw.try_duplicate()?,
            attributes: self.attributes.clone(),
            vertex: self.vertex,
            index: self.index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::device::UnboundDevice;

    fn device() -> Arc<BoundDevice> {
        Arc::new(BoundDevice::bind(UnboundDevice::pick().expect("pick")).expect("bind"))
    }

    #[repr(C)]
    #[derive(Clone, Copy)]
    struct Vertex {
        position: [f32; 3],
        normal: [f32; 3],
        uv: [f32; 2],
    }

    fn zero_vertex(_: usize) -> Vertex {
        Vertex {
            position: [0.0; 3],
            normal: [0.0; 3],
            uv: [0.0; 2],
        }
    }

    #[test]
    fn attribute_indices_are_sequential_and_pop_in_reverse() {
        let device = device();
        let vertices = VertexBuffer::<Vertex>::new(&device, 4, "quad", zero_vertex).unwrap();
        let mut array = VertexArray::with_buffer(&device, &vertices, "quad").unwrap();

        assert_eq!(array.add_attribute(3, ComponentType::F32, 0, false).unwrap(), 0);
        assert_eq!(array.add_attribute(3, ComponentType::F32, 12, false).unwrap(), 1);
        assert_eq!(array.add_attribute(2, ComponentType::F32, 24, false).unwrap(), 2);
        assert_eq!(array.attribute_count(), 3);

        assert_eq!(array.remove_last_attribute().unwrap(), 2);
        assert_eq!(array.remove_last_attribute().unwrap(), 1);
        assert_eq!(array.remove_last_attribute().unwrap(), 0);
        assert_eq!(array.attribute_count(), 0);
        assert!(matches!(
            array.remove_last_attribute(),
            Err(VertexArrayError::EmptyAttributeList(_))
        ));
    }

    #[test]
    fn attributes_must_fit_the_vertex_stride() {
        let device = device();
        let vertices = VertexBuffer::<Vertex>::new(&device, 4, "quad", zero_vertex).unwrap();
        let mut array = VertexArray::with_buffer(&device, &vertices, "quad").unwrap();
        //a 4-float attribute at offset 28 would end at byte 44 of a
        //32-byte record
        assert!(matches!(
            array.add_attribute(4, ComponentType::F32, 28, false),
            Err(VertexArrayError::OutOfBounds(
                OutOfBoundsError::StrideExceeded { .. }
            ))
        ));
    }

    #[test]
    fn late_buffer_attachment_validates_existing_attributes() {
        #[repr(C)]
        #[derive(Clone, Copy)]
        struct Narrow {
            position: [f32; 2],
        }
        let device = device();
        let mut array = VertexArray::new(&device, "detached").unwrap();
        //legal while no stride is known
        array.add_attribute(3, ComponentType::F32, 0, false).unwrap();
        let narrow =
            VertexBuffer::<Narrow>::new(&device, 4, "narrow", |_| Narrow { position: [0.0; 2] })
                .unwrap();
        assert!(matches!(
            array.set_buffer(&narrow),
            Err(VertexArrayError::OutOfBounds(
                OutOfBoundsError::StrideExceeded { .. }
            ))
        ));
    }

    #[test]
    fn binding_is_a_singleton() {
        let device = device();
        let first = VertexArray::new(&device, "first").unwrap();
        let second = VertexArray::new(&device, "second").unwrap();
        first.bind().unwrap();
        second.bind().unwrap();
        assert!(!first.is_bound());
        assert!(second.is_bound());
    }
}
