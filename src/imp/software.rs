// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The software reference driver.

Implements the driver boundary entirely in host memory: an allocation table
keyed by monotonically increasing handles, plus the binding-point table for
the context. Contents are real bytes, so copies, blits, and partial writes
behave exactly as a hardware driver's would, and tests can observe them.

Driver-level semantics implemented here:

- Handle values come from a single counter shared by every resource kind and
  are never reused, so a live handle is unique across kinds by construction.
- Rebinding an occupied slot silently replaces the occupant.
- Releasing a handle clears any slots still pointing at it (the deletion
  semantics of the underlying device API).
- Region copies are validated entirely before any byte moves; a failed copy
  leaves the destination untouched.

The driver serializes access through a mutex so the types stay `Send + Sync`,
but the API contract above this layer remains one owning thread per context.
*/

use crate::bindings::bind_point::ResourceKind;
use crate::bindings::resource::{AllocationError, OutOfBoundsError};
use crate::bindings::sampler::SamplerType;
use crate::bindings::software::texture::{Extent, Texel};
use crate::bindings::visible_to::{GPUBufferUsage, ImageAccess};
use crate::images::vertex_layout::VertexAttribute;
use crate::imp::RawHandle;
use crate::pixel_formats::PixelLayout;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Mutex;

/// Largest width or height the driver accepts for a pixel allocation.
const MAX_PIXEL_DIMENSION: u32 = 16384;

/// Total bytes of device memory the reference driver simulates.
const DEVICE_MEMORY_BYTES: u64 = 256 * 1024 * 1024;

/// The picked but not yet bound driver.
///
/// Picking and binding are separate steps so that a future hardware driver
/// can report adapter-level failures before a context exists.
#[derive(Debug)]
pub(crate) struct UnboundDevice;

impl UnboundDevice {
    pub fn pick() -> UnboundDevice {
        UnboundDevice
    }
}

#[derive(Debug)]
enum Contents {
    Pixels {
        width: u16,
        height: u16,
        layout: PixelLayout,
        //storage images carry an access mode; sampled textures a sampler
        access: Option<ImageAccess>,
        sampler: Option<SamplerType>,
        bytes: Vec<u8>,
    },
    Buffer {
        usage: GPUBufferUsage,
        bytes: Vec<u8>,
    },
    VertexArray(VertexArrayInfo),
}

/// Device-side input-assembly state for one vertex array.
#[derive(Debug, Default, Clone)]
struct VertexArrayInfo {
    /// Attached vertex buffer handle and its stride in bytes.
    #[allow(dead_code)] //recorded; the software driver issues no draws
    vertex_buffer: Option<(u32, u32)>,
    #[allow(dead_code)] //recorded; the software driver issues no draws
    index_buffer: Option<u32>,
    attributes: Vec<VertexAttribute>,
}

#[derive(Debug)]
struct Allocation {
    kind: ResourceKind,
    contents: Contents,
    debug_name: String,
}

impl Allocation {
    fn byte_cost(&self) -> u64 {
        match &self.contents {
            Contents::Pixels { bytes, .. } => bytes.len() as u64,
            Contents::Buffer { bytes, .. } => bytes.len() as u64,
            Contents::VertexArray(_) => 0,
        }
    }

    fn bytes(&self) -> &[u8] {
        match &self.contents {
            Contents::Pixels { bytes, .. } => bytes,
            Contents::Buffer { bytes, .. } => bytes,
            Contents::VertexArray(_) => {
                panic!("vertex arrays have no byte storage")
            }
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.contents {
            Contents::Pixels { bytes, .. } => bytes,
            Contents::Buffer { bytes, .. } => bytes,
            Contents::VertexArray(_) => {
                panic!("vertex arrays have no byte storage")
            }
        }
    }

    fn duplicate_contents(&self) -> Contents {
        match &self.contents {
            Contents::Pixels {
                width,
                height,
                layout,
                access,
                sampler,
                bytes,
            } => Contents::Pixels {
                width: *width,
                height: *height,
                layout: *layout,
                access: *access,
                sampler: *sampler,
                bytes: bytes.clone(),
            },
            Contents::Buffer { usage, bytes } => Contents::Buffer {
                usage: *usage,
                bytes: bytes.clone(),
            },
            Contents::VertexArray(info) => Contents::VertexArray(info.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct DeviceState {
    next_handle: u32,
    used_bytes: u64,
    allocations: HashMap<u32, Allocation>,
    bindings: HashMap<(ResourceKind, u32), u32>,
}

impl DeviceState {
    fn fresh_handle(&mut self) -> RawHandle {
        self.next_handle += 1;
        //the counter starts at zero, so the first handle is 1 and the
        //NonZero constructor cannot fail
        RawHandle(NonZeroU32::new(self.next_handle).expect("handle counter wrapped"))
    }

    fn charge(&mut self, bytes: u64) -> Result<(), AllocationError> {
        let proposed = self.used_bytes.saturating_add(bytes);
        if proposed > DEVICE_MEMORY_BYTES {
            return Err(AllocationError::OutOfDeviceMemory { bytes });
        }
        self.used_bytes = proposed;
        Ok(())
    }

    fn insert(&mut self, allocation: Allocation) -> Result<RawHandle, AllocationError> {
        self.charge(allocation.byte_cost())?;
        let handle = self.fresh_handle();
        logwise::trace_sync!(
            "software driver: allocated handle {handle}",
            handle = handle.index()
        );
        self.allocations.insert(handle.index(), allocation);
        Ok(handle)
    }

    fn allocation(&self, handle: RawHandle) -> &Allocation {
        self.allocations
            .get(&handle.index())
            .expect("operation on a released handle")
    }

    fn allocation_mut(&mut self, handle: RawHandle) -> &mut Allocation {
        self.allocations
            .get_mut(&handle.index())
            .expect("operation on a released handle")
    }

    fn vertex_array_mut(&mut self, handle: RawHandle) -> &mut VertexArrayInfo {
        match &mut self.allocation_mut(handle).contents {
            Contents::VertexArray(info) => info,
            _ => panic!("handle does not name a vertex array"),
        }
    }
}

/// The bound device context: allocation table plus binding-point table.
#[derive(Debug)]
pub(crate) struct Device {
    state: Mutex<DeviceState>,
}

impl Device {
    pub fn bind_context(_unbound: UnboundDevice) -> Device {
        logwise::info_sync!("software driver: context bound");
        Device {
            state: Mutex::new(DeviceState::default()),
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        //a panic mid-operation leaves no useful table to salvage
        self.state.lock().expect("device state poisoned")
    }

    /// Allocates pixel storage. Zero-filled unless `contents` is supplied,
    /// in which case `contents` must be exactly `width * height` pixels.
    pub fn allocate_pixels(
        &self,
        kind: ResourceKind,
        width: u16,
        height: u16,
        layout: PixelLayout,
        access: Option<ImageAccess>,
        contents: Option<&[u8]>,
        debug_name: &str,
    ) -> Result<RawHandle, AllocationError> {
        if width == 0 || height == 0 {
            return Err(AllocationError::ZeroSized);
        }
        for dimension in [width as u32, height as u32] {
            if dimension > MAX_PIXEL_DIMENSION {
                return Err(AllocationError::DimensionTooLarge {
                    requested: dimension,
                    limit: MAX_PIXEL_DIMENSION,
                });
            }
        }
        let byte_len =
            width as usize * height as usize * layout.bytes_per_pixel() as usize;
        let bytes = match contents {
            None => vec![0u8; byte_len],
            Some(contents) => {
                assert_eq!(contents.len(), byte_len, "initial contents sized wrong");
                contents.to_vec()
            }
        };
        self.locked().insert(Allocation {
            kind,
            contents: Contents::Pixels {
                width,
                height,
                layout,
                access,
                sampler: None,
                bytes,
            },
            debug_name: debug_name.to_string(),
        })
    }

    /// Allocates buffer storage populated with `contents`.
    pub fn allocate_buffer(
        &self,
        kind: ResourceKind,
        usage: GPUBufferUsage,
        contents: Vec<u8>,
        debug_name: &str,
    ) -> Result<RawHandle, AllocationError> {
        if contents.is_empty() {
            return Err(AllocationError::ZeroSized);
        }
        self.locked().insert(Allocation {
            kind,
            contents: Contents::Buffer {
                usage,
                bytes: contents,
            },
            debug_name: debug_name.to_string(),
        })
    }

    /// Allocates an input-assembly state object.
    pub fn allocate_vertex_array(&self, debug_name: &str) -> Result<RawHandle, AllocationError> {
        self.locked().insert(Allocation {
            kind: ResourceKind::VertexArray,
            contents: Contents::VertexArray(VertexArrayInfo::default()),
            debug_name: debug_name.to_string(),
        })
    }

    /// Allocates a fresh handle with identical metadata and copies the
    /// contents device-side.
    ///
    /// Built fully before it is published, so a failure leaves no
    /// half-populated resource behind.
    pub fn duplicate(&self, handle: RawHandle) -> Result<RawHandle, AllocationError> {
        let mut state = self.locked();
        let source = state.allocation(handle);
        let duplicate = Allocation {
            kind: source.kind,
            contents: source.duplicate_contents(),
            debug_name: source.debug_name.clone(),
        };
        state.insert(duplicate)
    }

    /// Releases a handle. Idempotent: releasing an already released handle
    /// is a no-op. Any binding points still holding the handle are cleared.
    pub fn release(&self, handle: RawHandle) {
        let mut state = self.locked();
        if let Some(allocation) = state.allocations.remove(&handle.index()) {
            state.used_bytes -= allocation.byte_cost();
            state.bindings.retain(|_, bound| *bound != handle.index());
            logwise::trace_sync!(
                "software driver: released handle {handle}",
                handle = handle.index()
            );
        }
    }

    /// Makes `handle` current at `(kind, slot)`, replacing any previous
    /// occupant silently.
    pub fn bind(&self, kind: ResourceKind, slot: u32, handle: RawHandle) {
        let mut state = self.locked();
        debug_assert_eq!(state.allocation(handle).kind, kind);
        state.bindings.insert((kind, slot), handle.index());
    }

    /// Clears `(kind, slot)`.
    pub fn unbind(&self, kind: ResourceKind, slot: u32) {
        self.locked().bindings.remove(&(kind, slot));
    }

    pub fn is_bound(&self, kind: ResourceKind, slot: u32, handle: RawHandle) -> bool {
        self.locked().bindings.get(&(kind, slot)) == Some(&handle.index())
    }

    pub fn slot_occupied(&self, kind: ResourceKind, slot: u32) -> bool {
        self.locked().bindings.contains_key(&(kind, slot))
    }

    /// Clears every binding point. The context teardown path; also useful
    /// when a caller wants a known-clean input-assembly state.
    pub fn reset_bindings(&self) {
        logwise::info_sync!("software driver: binding points reset");
        self.locked().bindings.clear();
    }

    /// Writes `data` into the handle's storage at `offset`.
    ///
    /// Bounds are validated before anything is written.
    pub fn write_bytes(
        &self,
        handle: RawHandle,
        offset: usize,
        data: &[u8],
    ) -> Result<(), OutOfBoundsError> {
        let mut state = self.locked();
        let bytes = state.allocation_mut(handle).bytes_mut();
        let end = offset.saturating_add(data.len());
        if end > bytes.len() {
            return Err(OutOfBoundsError::ByteRange {
                offset,
                end,
                size: bytes.len(),
            });
        }
        bytes[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Reads the handle's entire storage back to the host.
    pub fn read_all(&self, handle: RawHandle) -> Vec<u8> {
        self.locked().allocation(handle).bytes().to_vec()
    }

    /// Copies a `size` region from `src` at `src_origin` to `dst` at
    /// `dst_origin`, entirely device-side.
    ///
    /// Both handles must be pixel allocations of the same layout, and both
    /// regions must lie within bounds; violations are reported before any
    /// byte moves, so the destination is never partially written.
    pub fn blit_pixels(
        &self,
        src: RawHandle,
        dst: RawHandle,
        size: Extent,
        src_origin: Texel,
        dst_origin: Texel,
    ) -> Result<(), OutOfBoundsError> {
        let interval = logwise::perfwarn_begin!("software driver blit");
        let mut state = self.locked();

        let (src_width, src_height, src_layout) = pixel_dimensions(state.allocation(src));
        let (dst_width, dst_height, dst_layout) = pixel_dimensions(state.allocation(dst));
        if src_layout != dst_layout {
            return Err(OutOfBoundsError::LayoutMismatch);
        }
        check_region(src_origin, size, src_width, src_height)?;
        check_region(dst_origin, size, dst_width, dst_height)?;

        let bpp = src_layout.bytes_per_pixel() as usize;
        let row_len = size.width as usize * bpp;

        //gather the source region first; this also makes copies where src
        //and dst are the same allocation well defined
        let mut region = vec![0u8; row_len * size.height as usize];
        {
            let src_bytes = state.allocation(src).bytes();
            for row in 0..size.height as usize {
                let src_row = (src_origin.y as usize + row) * src_width as usize
                    + src_origin.x as usize;
                let from = src_row * bpp;
                region[row * row_len..(row + 1) * row_len]
                    .copy_from_slice(&src_bytes[from..from + row_len]);
            }
        }
        let dst_bytes = state.allocation_mut(dst).bytes_mut();
        for row in 0..size.height as usize {
            let dst_row =
                (dst_origin.y as usize + row) * dst_width as usize + dst_origin.x as usize;
            let to = dst_row * bpp;
            dst_bytes[to..to + row_len].copy_from_slice(&region[row * row_len..(row + 1) * row_len]);
        }
        drop(interval);
        Ok(())
    }

    /// Records the sampler a texture will use from its next bind onward.
    pub fn update_sampler(&self, handle: RawHandle, sampler: SamplerType) {
        let mut state = self.locked();
        match &mut state.allocation_mut(handle).contents {
            Contents::Pixels {
                sampler: slot_sampler,
                ..
            } => *slot_sampler = Some(sampler),
            _ => panic!("samplers apply to pixel resources only"),
        }
    }

    #[cfg(test)]
    pub fn effective_sampler(&self, handle: RawHandle) -> Option<SamplerType> {
        let state = self.locked();
        match &state.allocation(handle).contents {
            Contents::Pixels { sampler, .. } => *sampler,
            _ => None,
        }
    }

    pub fn va_set_vertex_buffer(&self, va: RawHandle, vertex_buffer: RawHandle, stride: u32) {
        self.locked().vertex_array_mut(va).vertex_buffer =
            Some((vertex_buffer.index(), stride));
    }

    pub fn va_set_index_buffer(&self, va: RawHandle, index_buffer: RawHandle) {
        self.locked().vertex_array_mut(va).index_buffer = Some(index_buffer.index());
    }

    /// Appends one attribute; the new attribute's index is its position.
    pub fn va_push_attribute(&self, va: RawHandle, attribute: VertexAttribute) {
        self.locked().vertex_array_mut(va).attributes.push(attribute);
    }

    /// Disables and removes the highest-index attribute.
    pub fn va_pop_attribute(&self, va: RawHandle) {
        let popped = self.locked().vertex_array_mut(va).attributes.pop();
        debug_assert!(popped.is_some(), "no attribute to disable");
    }

    #[cfg(test)]
    pub fn va_attribute_count(&self, va: RawHandle) -> usize {
        self.locked().vertex_array_mut(va).attributes.len()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        //context teardown: nothing stays bound past the context's lifetime
        if let Ok(state) = self.state.get_mut() {
            state.bindings.clear();
        }
    }
}

fn pixel_dimensions(allocation: &Allocation) -> (u16, u16, PixelLayout) {
    match &allocation.contents {
        Contents::Pixels {
            width,
            height,
            layout,
            ..
        } => (*width, *height, *layout),
        _ => panic!("handle does not name a pixel resource"),
    }
}

fn check_region(
    origin: Texel,
    size: Extent,
    bound_width: u16,
    bound_height: u16,
) -> Result<(), OutOfBoundsError> {
    let x_end = origin.x as u32 + size.width as u32;
    let y_end = origin.y as u32 + size.height as u32;
    if x_end > bound_width as u32 || y_end > bound_height as u32 {
        return Err(OutOfBoundsError::PixelRegion {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            bound_width,
            bound_height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> Device {
        Device::bind_context(UnboundDevice::pick())
    }

    fn pixels(device: &Device, kind: ResourceKind, width: u16, height: u16) -> RawHandle {
        device
            .allocate_pixels(
                kind,
                width,
                height,
                PixelLayout::R8UNorm,
                None,
                None,
                "test pixels",
            )
            .unwrap()
    }

    #[test]
    fn handles_are_unique_across_kinds() {
        let device = device();
        let a = pixels(&device, ResourceKind::Texture, 2, 2);
        let b = pixels(&device, ResourceKind::Image, 2, 2);
        let c = device
            .allocate_buffer(
                ResourceKind::VertexBuffer,
                GPUBufferUsage::VertexBuffer,
                vec![0; 16],
                "test buffer",
            )
            .unwrap();
        let d = device.allocate_vertex_array("test va").unwrap();
        let mut indices = [a, b, c, d].map(RawHandle::index);
        indices.sort_unstable();
        indices.windows(2).for_each(|w| assert_ne!(w[0], w[1]));
    }

    #[test]
    fn release_is_idempotent_and_unbinds() {
        let device = device();
        let texture = pixels(&device, ResourceKind::Texture, 2, 2);
        device.bind(ResourceKind::Texture, 3, texture);
        assert!(device.is_bound(ResourceKind::Texture, 3, texture));
        device.release(texture);
        assert!(!device.slot_occupied(ResourceKind::Texture, 3));
        //second release of the same handle is a no-op
        device.release(texture);
    }

    #[test]
    fn rebinding_silently_replaces() {
        let device = device();
        let first = pixels(&device, ResourceKind::Texture, 2, 2);
        let second = pixels(&device, ResourceKind::Texture, 2, 2);
        device.bind(ResourceKind::Texture, 0, first);
        device.bind(ResourceKind::Texture, 0, second);
        assert!(!device.is_bound(ResourceKind::Texture, 0, first));
        assert!(device.is_bound(ResourceKind::Texture, 0, second));
    }

    #[test]
    fn reset_clears_every_slot() {
        let device = device();
        let texture = pixels(&device, ResourceKind::Texture, 2, 2);
        let image = pixels(&device, ResourceKind::Image, 2, 2);
        device.bind(ResourceKind::Texture, 0, texture);
        device.bind(ResourceKind::Image, 1, image);
        device.reset_bindings();
        assert!(!device.slot_occupied(ResourceKind::Texture, 0));
        assert!(!device.slot_occupied(ResourceKind::Image, 1));
    }

    #[test]
    fn duplicate_contents_are_independent() {
        let device = device();
        let original = pixels(&device, ResourceKind::Texture, 2, 1);
        device.write_bytes(original, 0, &[7, 9]).unwrap();
        let duplicate = device.duplicate(original).unwrap();
        assert_ne!(original.index(), duplicate.index());
        device.write_bytes(duplicate, 0, &[1, 2]).unwrap();
        assert_eq!(device.read_all(original), vec![7, 9]);
        assert_eq!(device.read_all(duplicate), vec![1, 2]);
    }

    #[test]
    fn zero_sized_allocations_are_rejected() {
        let device = device();
        match device.allocate_pixels(
            ResourceKind::Texture,
            0,
            4,
            PixelLayout::RGBA8UNorm,
            None,
            None,
            "degenerate",
        ) {
            Err(AllocationError::ZeroSized) => {}
            other => panic!("expected a zero-size rejection, got {other:?}"),
        }
        match device.allocate_buffer(
            ResourceKind::VertexBuffer,
            GPUBufferUsage::VertexBuffer,
            Vec::new(),
            "degenerate",
        ) {
            Err(AllocationError::ZeroSized) => {}
            other => panic!("expected a zero-size rejection, got {other:?}"),
        }
    }

    #[test]
    fn memory_accounting_enforces_the_limit() {
        let device = device();
        //RGBA32Float is 16 bytes per pixel; 16k x 1k x 16 = 256 MiB exactly,
        //so a second allocation must fail
        let big = device
            .allocate_pixels(
                ResourceKind::Texture,
                16384,
                1024,
                PixelLayout::RGBA32Float,
                None,
                None,
                "big",
            )
            .unwrap();
        match device.allocate_pixels(
            ResourceKind::Texture,
            1,
            1,
            PixelLayout::R8UNorm,
            None,
            None,
            "straw",
        ) {
            Err(AllocationError::OutOfDeviceMemory { .. }) => {}
            other => panic!("expected device memory exhaustion, got {other:?}"),
        }
        //release returns the memory
        device.release(big);
        pixels(&device, ResourceKind::Texture, 1, 1);
    }

    #[test]
    fn blit_rejects_layout_mismatch() {
        let device = device();
        let src = pixels(&device, ResourceKind::Texture, 2, 2);
        let dst = device
            .allocate_pixels(
                ResourceKind::Image,
                2,
                2,
                PixelLayout::RGBA8UNorm,
                Some(ImageAccess::ReadWrite),
                None,
                "dst",
            )
            .unwrap();
        let size = Extent {
            width: 1,
            height: 1,
        };
        match device.blit_pixels(src, dst, size, Texel::ZERO, Texel::ZERO) {
            Err(OutOfBoundsError::LayoutMismatch) => {}
            other => panic!("expected a layout mismatch, got {other:?}"),
        }
    }

    #[test]
    fn blit_bounds_are_checked_before_copying() {
        let device = device();
        let src = pixels(&device, ResourceKind::Texture, 4, 4);
        let dst = pixels(&device, ResourceKind::Image, 4, 4);
        device.write_bytes(dst, 0, &[9; 16]).unwrap();
        let size = Extent {
            width: 3,
            height: 3,
        };
        let result = device.blit_pixels(src, dst, size, Texel { x: 2, y: 2 }, Texel::ZERO);
        assert!(matches!(
            result,
            Err(OutOfBoundsError::PixelRegion { .. })
        ));
        //destination bytes unchanged after the failed copy
        assert_eq!(device.read_all(dst), vec![9; 16]);
    }

    #[test]
    fn sampler_updates_are_recorded_per_resource() {
        let device = device();
        let texture = pixels(&device, ResourceKind::Texture, 2, 2);
        assert_eq!(device.effective_sampler(texture), None);
        let sampler = SamplerType::default();
        device.update_sampler(texture, sampler);
        assert_eq!(device.effective_sampler(texture), Some(sampler));
    }

    #[test]
    fn vertex_array_state_tracks_pushes_and_pops() {
        use crate::images::vertex_layout::ComponentType;
        let device = device();
        let va = device.allocate_vertex_array("va").unwrap();
        let attribute = VertexAttribute {
            components: 3,
            component_type: ComponentType::F32,
            byte_offset: 0,
            normalize: false,
        };
        device.va_push_attribute(va, attribute);
        assert_eq!(device.va_attribute_count(va), 1);
        device.va_pop_attribute(va);
        assert_eq!(device.va_attribute_count(va), 0);
    }
}
