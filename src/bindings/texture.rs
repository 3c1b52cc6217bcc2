// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Sampled textures.

A [`Texture`] is device pixel storage bound to texture units and read through
a sampler. Content arrives at construction: from a per-texel initializer, from
a [software texture](crate::bindings::software::texture::Texture), or from a
PNG file. After construction the only way content changes is a device-side
region copy; there is no per-texel host write path.

Sampler configuration (filtering, wrapping) belongs to the texture and is
applied when the texture is next bound, consistent with the stateless-slot
binding model.
*/

use crate::bindings::bind_point::{BindSlot, ResourceKind};
use crate::bindings::image::{sealed, CopyRegionError, PixelSource};
use crate::bindings::resource::kinds;
use crate::bindings::resource::{AllocationError, CopyError, InvalidStateError, RawResource};
use crate::bindings::sampler::SamplerType;
use crate::bindings::software;
use crate::bindings::software::texture::{DecodeError, Extent, Texel};
use crate::images::device::BoundDevice;
use crate::imp::RawHandle;
use crate::pixel_formats::pixel_as_bytes;
use crate::pixel_formats::png_support::PngPixelFormat;
use crate::pixel_formats::sealed::PixelFormat;
use crate::pixel_formats::PixelLayout;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

/// Loading a texture from a file failed.
#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// A sampled device texture.
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::sampler::SamplerType;
/// use handles_and_slots::bindings::texture::Texture;
/// use handles_and_slots::images::device::{BoundDevice, UnboundDevice};
/// use handles_and_slots::pixel_formats::{RGBA8UNorm, Unorm4};
/// use std::sync::Arc;
///
/// let device = Arc::new(BoundDevice::bind(UnboundDevice::pick()?)?);
/// // A 2x2 orange texture
/// let texture = Texture::<RGBA8UNorm>::new(
///     &device,
///     2,
///     2,
///     SamplerType::default(),
///     "orange",
///     |_| Unorm4 { r: 255, g: 128, b: 0, a: 255 },
/// )?;
/// assert_eq!(texture.height(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Texture<Format: PixelFormat> {
    raw: RawResource<kinds::TextureKind>,
    width: u16,
    height: u16,
    sampler: SamplerType,
    format: PhantomData<Format>,
}

impl<Format: PixelFormat> Texture<Format> {
    /// Allocates a texture and populates it from a per-texel initializer.
    pub fn new<Initializer: Fn(Texel) -> Format::CPixel>(
        device: &Arc<BoundDevice>,
        width: u16,
        height: u16,
        sampler: SamplerType,
        debug_name: &str,
        initialize_with: Initializer,
    ) -> Result<Self, AllocationError> {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(initialize_with(Texel { x, y }));
            }
        }
        let handle = device.0.allocate_pixels(
            ResourceKind::Texture,
            width,
            height,
            Format::LAYOUT,
            None,
            Some(pixel_as_bytes(&pixels)),
            debug_name,
        )?;
        Ok(Self {
            raw: RawResource::from_handle(device.clone(), handle, debug_name.to_string()),
            width,
            height,
            sampler,
            format: PhantomData,
        })
    }

    /// Creates a texture by uploading a software texture's pixels.
    pub fn from_software(
        device: &Arc<BoundDevice>,
        texture: &software::texture::Texture<Format>,
        sampler: SamplerType,
        debug_name: &str,
    ) -> Result<Self, AllocationError> {
        let handle = device.0.allocate_pixels(
            ResourceKind::Texture,
            texture.width(),
            texture.height(),
            Format::LAYOUT,
            None,
            Some(texture.as_bytes()),
            debug_name,
        )?;
        Ok(Self {
            raw: RawResource::from_handle(device.clone(), handle, debug_name.to_string()),
            width: texture.width(),
            height: texture.height(),
            sampler,
            format: PhantomData,
        })
    }

    /// Loads a texture from a PNG file.
    ///
    /// Decoding happens host-side (the file loader boundary); this type only
    /// consumes the decoded pixels and dimensions.
    pub fn new_from_path(
        device: &Arc<BoundDevice>,
        path: &Path,
        sampler: SamplerType,
        debug_name: &str,
    ) -> Result<Self, TextureLoadError>
    where
        Format: PngPixelFormat,
    {
        let soft = software::texture::Texture::<Format>::new_from_path(path)?;
        Ok(Self::from_software(device, &soft, sampler, debug_name)?)
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

    /// The runtime tag of this texture's pixel format.
    pub fn layout(&self) -> PixelLayout {
        Format::LAYOUT
    }

    /// The sampling configuration that will apply from the next bind onward.
    pub fn sampler(&self) -> SamplerType {
        self.sampler
    }

    /// Replaces the sampling configuration.
    ///
    /// Takes effect the next time the texture is bound; a unit the texture is
    /// already bound to keeps sampling with the old configuration.
    pub fn set_sampler(&mut self, sampler: SamplerType) {
        self.sampler = sampler;
    }

    /// Whether this texture has been moved from.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Makes this texture current at the given texture unit, carrying its
    /// sampler configuration along.
    ///
    /// Replaces the unit's previous occupant silently. Binding an empty
    /// texture fails with [`InvalidStateError`].
    pub fn bind(&self, slot: BindSlot) -> Result<(), InvalidStateError> {
        let handle = self.raw.handle()?;
        self.raw.device().0.update_sampler(handle, self.sampler);
        self.raw.bind(slot)
    }

    /// Clears the given texture unit. Never destroys the texture.
    pub fn unbind(&self, slot: BindSlot) -> Result<(), InvalidStateError> {
        self.raw.unbind(slot)
    }

    /// Whether this texture currently occupies the given texture unit.
    pub fn is_bound(&self, slot: BindSlot) -> bool {
        self.raw.is_bound(slot)
    }

    /// Moves the underlying resource out, leaving this texture empty.
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            width: self.width,
            height: self.height,
            sampler: self.sampler,
            format: PhantomData,
        }
    }

    /// Duplicates this texture: fresh device storage, identical metadata,
    /// device-side content copy.
    ///
    /// The duplicate and the original are fully independent afterward.
    pub fn try_clone(&self) -> Result<Self, CopyError> {
        Ok(Self {
            raw: self.raw.try_duplicate()?,
            width: self.width,
            height: self.height,
            sampler: self.sampler,
            format: PhantomData,
        })
    }

    /// Copies a `size` region from `source` (at `src_origin`) into this
    /// texture (at `dst_origin`), device-side.
    ///
    /// Same contract as
    /// [`Image::copy_pixel_region`](crate::bindings::image::Image::copy_pixel_region):
    /// bounds are validated first and a violation copies nothing.
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

    /// Reads the texture contents back to the host as raw bytes, row-major.
    ///
    /// Diagnostic surface, for tools and tests.
    pub fn read_back(&self) -> Result<Vec<u8>, InvalidStateError> {
        let handle = self.raw.handle()?;
        Ok(self.raw.device().0.read_all(handle))
    }
}

impl<Format: PixelFormat> sealed::PixelSourceSealed for Texture<Format> {
    fn raw_handle(&self) -> Result<RawHandle, InvalidStateError> {
        self.raw.handle()
    }
}

impl<Format: PixelFormat> PixelSource<Format> for Texture<Format> {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }
}
