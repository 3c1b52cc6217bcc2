// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Storage images: pixel resources with explicit shader access modes.

An [`Image`] is device pixel storage bound to image units for direct load and
store access, as opposed to a [`Texture`](crate::bindings::texture::Texture),
which is sampled. Both are pixel resources, and pixel regions copy freely
between them: image to image, texture to image, texture to texture. The copy
runs device-side, never round-tripping through host memory.

Region copies are bounds-checked before the device call is issued. A region
that exceeds either resource fails with [`OutOfBoundsError`] and the
destination is untouched; there is no partial copy.
*/

use crate::bindings::bind_point::BindSlot;
use crate::bindings::resource::kinds;
use crate::bindings::resource::{
    AllocationError, CopyError, InvalidStateError, OutOfBoundsError, RawResource,
};
use crate::bindings::software::texture::{Extent, Texel};
use crate::bindings::visible_to::ImageAccess;
use crate::images::device::BoundDevice;
use crate::imp::RawHandle;
use crate::pixel_formats::sealed::PixelFormat;
use crate::pixel_formats::PixelLayout;
use std::marker::PhantomData;
use std::sync::Arc;

/// Sealed access to the driver side of a pixel resource.
pub(crate) mod sealed {
    use crate::bindings::resource::InvalidStateError;
    use crate::imp::RawHandle;

    pub trait PixelSourceSealed {
        fn raw_handle(&self) -> Result<RawHandle, InvalidStateError>;
    }
}

/// Any device pixel resource a region copy can read from.
///
/// Implemented by [`Image`] and [`Texture`](crate::bindings::texture::Texture)
/// with the same `Format`; the shared format parameter is what makes source
/// and destination compatible by construction.
pub trait PixelSource<Format: PixelFormat>: sealed::PixelSourceSealed {
    /// Width of the resource in pixels.
    fn width(&self) -> u16;
    /// Height of the resource in pixels.
    fn height(&self) -> u16;
}

/// A region copy failed.
#[derive(Debug, thiserror::Error)]
pub enum CopyRegionError {
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBoundsError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
}

/// Device pixel storage with an explicit shader access mode.
///
/// Storage is zero-initialized at creation; content arrives through region
/// copies from other pixel resources (or shader stores, outside this layer).
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::image::Image;
/// use handles_and_slots::bindings::visible_to::ImageAccess;
/// use handles_and_slots::images::device::{BoundDevice, UnboundDevice};
/// use handles_and_slots::pixel_formats::RGBA8UNorm;
/// use std::sync::Arc;
///
/// let device = Arc::new(BoundDevice::bind(UnboundDevice::pick()?)?);
/// let image = Image::<RGBA8UNorm>::new(&device, 128, 128, ImageAccess::ReadWrite, "scratch")?;
/// assert_eq!(image.width(), 128);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Image<Format: PixelFormat> {
    raw: RawResource<kinds::ImageKind>,
    width: u16,
    height: u16,
    access: ImageAccess,
    format: PhantomData<Format>,
}

impl<Format: PixelFormat> Image<Format> {
    /// Allocates zero-filled image storage of `width` x `height`.
    ///
    /// Both dimensions must be nonzero and within the device limit, or the
    /// device rejects the request with [`AllocationError`].
    pub fn new(
        device: &Arc<BoundDevice>,
        width: u16,
        height: u16,
        access: ImageAccess,
        debug_name: &str,
    ) -> Result<Self, AllocationError> {
        let handle = device.0.allocate_pixels(
            crate::bindings::bind_point::ResourceKind::Image,
            width,
            height,
            Format::LAYOUT,
            Some(access),
            None,
            debug_name,
        )?;
        Ok(Self {
            raw: RawResource::from_handle(device.clone(), handle, debug_name.to_string()),
            width,
            height,
            access,
            format: PhantomData,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Dimensions as an [`Extent`].
    pub fn extent(&self) -> Extent {
        Extent {
            width: self.width,
            height: self.height,
        }
    }

    /// The shader access mode fixed at creation.
    pub fn access(&self) -> ImageAccess {
        self.access
    }

    /// The runtime tag of this image's pixel format.
    pub fn layout(&self) -> PixelLayout {
        Format::LAYOUT
    }

    /// Whether this image has been moved from.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Makes this image current at the given image unit.
    ///
    /// Replaces the unit's previous occupant silently. Binding an empty
    /// image is a programming error and fails with [`InvalidStateError`].
    pub fn bind(&self, slot: BindSlot) -> Result<(), InvalidStateError> {
        self.raw.bind(slot)
    }

    /// Clears the given image unit. Never destroys the image.
    pub fn unbind(&self, slot: BindSlot) -> Result<(), InvalidStateError> {
        self.raw.unbind(slot)
    }

    /// Whether this image currently occupies the given image unit.
    pub fn is_bound(&self, slot: BindSlot) -> bool {
        self.raw.is_bound(slot)
    }

    /// Moves the underlying resource out, leaving this image empty.
    ///
    /// The empty source remains safe to drop and to assign into; every other
    /// operation on it fails with [`InvalidStateError`].
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            width: self.width,
            height: self.height,
            access: self.access,
            format: PhantomData,
        }
    }

    /// Duplicates this image: fresh device storage, identical metadata, and a
    /// device-side copy of the contents.
    ///
    /// Mutating the duplicate never affects the original and vice versa.
    /// Duplicating an empty image yields an empty image. On failure the
    /// original is untouched.
    pub fn try_clone(&self) -> Result<Self, CopyError> {
        Ok(Self {
            raw: self.raw.try_duplicate()?,
            width: self.width,
            height: self.height,
            access: self.access,
            format: PhantomData,
        })
    }

    /// Copies a `size` region from `source` (at `src_origin`) into this image
    /// (at `dst_origin`), device-side.
    ///
    /// Preconditions, checked before any byte moves:
    /// `src_origin + size` within the source bounds, `dst_origin + size`
    /// within this image's bounds. Violations fail with
    /// [`OutOfBoundsError`]; no partial copy happens.
    pub fn copy_pixel_region(
        &mut self,
        source: &impl PixelSource<Format>,
        size: Extent,
        src_origin: Texel,
        dst_origin: Texel,
    ) -> Result<(), CopyRegionError> {
        let src = source.raw_handle()?;
        let dst = self.raw.handle()?;
        self.raw
            .device()
            .0
            .blit_pixels(src, dst, size, src_origin, dst_origin)?;
        Ok(())
    }

    /// Reads the image contents back to the host as raw bytes, row-major.
    ///
    /// Diagnostic surface, for tools and tests.
    pub fn read_back(&self) -> Result<Vec<u8>, InvalidStateError> {
        let handle = self.raw.handle()?;
        Ok(self.raw.device().0.read_all(handle))
    }
}

impl<Format: PixelFormat> sealed::PixelSourceSealed for Image<Format> {
    fn raw_handle(&self) -> Result<RawHandle, InvalidStateError> {
        self.raw.handle()
    }
}

impl<Format: PixelFormat> PixelSource<Format> for Image<Format> {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }
}
