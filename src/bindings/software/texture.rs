// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Software texture implementation for CPU-side pixel staging.

This module provides a texture that runs entirely on the CPU. It is the
staging half of texture upload: build or decode pixels here, then copy them
into a device texture.

# Key types

- [`Texture`] - the software texture type, a 2D pixel array
- [`Texel`] - integer texture coordinates (x, y)
- [`Extent`] - a width/height pair, used to describe copy regions

# Coordinate system

Origin (0, 0) is at the top-left; X increases to the right, Y increases
downward. Pixel data is stored row-major (Y-major, X-minor), the layout device
uploads expect.

# Example

```
use handles_and_slots::bindings::software::texture::{Texture, Texel};
use handles_and_slots::pixel_formats::R8UNorm;

// Create a 4x4 grayscale texture
let mut texture = Texture::<R8UNorm>::new(4, 4, 128u8);

// Write a value at specific coordinates
texture[Texel { x: 1, y: 2 }] = 255u8;

// Read the value back
assert_eq!(texture[Texel { x: 1, y: 2 }], 255u8);
```
*/

use crate::pixel_formats::png_support::PngPixelFormat;
use crate::pixel_formats::sealed::PixelFormat;
use crate::pixel_formats::{pixel_as_bytes, pixel_from_bytes};
use std::ops::{Index, IndexMut};
use std::path::Path;

/// Integer texture coordinates naming one pixel.
///
/// Coordinates are 16-bit, supporting textures up to 65535x65535. The origin
/// (0, 0) is the top-left corner.
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::software::texture::Texel;
///
/// let texel = Texel { x: 10, y: 20 };
/// let origin = Texel::ZERO;
/// assert_eq!(origin.x, 0);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Texel {
    /// X coordinate (horizontal position)
    pub x: u16,
    /// Y coordinate (vertical position)
    pub y: u16,
}

impl Texel {
    /// The origin texel at coordinates (0, 0).
    pub const ZERO: Texel = Texel { x: 0, y: 0 };

    /// Converts texel coordinates to a linear array index.
    const fn vec_offset(&self, width: u16) -> usize {
        width as usize * self.y as usize + self.x as usize
    }
}

/// A width/height pair describing the size of a pixel region.
///
/// Used both for texture dimensions and for the size argument of region
/// copies.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Extent {
    pub width: u16,
    pub height: u16,
}

impl Extent {
    /// Total number of pixels covered.
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Errors arising while decoding an image file into a software texture.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Png(#[from] png::DecodingError),
    #[error("png color type {actual:?} does not match the requested pixel format ({expected:?})")]
    ColorType {
        actual: png::ColorType,
        expected: png::ColorType,
    },
    #[error("png bit depth {actual:?} does not match the requested pixel format ({expected:?})")]
    BitDepth {
        actual: png::BitDepth,
        expected: png::BitDepth,
    },
    #[error("decoded image is {width}x{height}, which exceeds the 16-bit dimension limit")]
    Oversize { width: u32, height: u32 },
}

/// A software texture: a 2D pixel array with texture-like operations.
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::software::texture::{Texture, Texel};
/// use handles_and_slots::pixel_formats::R8UNorm;
///
/// // Create a gradient texture
/// let texture = Texture::<R8UNorm>::new_with(256, 256, |texel| texel.x as u8);
/// assert_eq!(texture[Texel { x: 9, y: 0 }], 9);
/// ```
#[derive(Debug)]
pub struct Texture<Format: PixelFormat> {
    data: Vec<Format::CPixel>,
    width: u16,
    height: u16,
}

impl<Format: PixelFormat> Texture<Format> {
    /// Creates a new texture with all pixels initialized to the same value.
    ///
    /// # Examples
    ///
    /// ```
    /// use handles_and_slots::bindings::software::texture::Texture;
    /// use handles_and_slots::pixel_formats::R8UNorm;
    ///
    /// let texture = Texture::<R8UNorm>::new(64, 64, 128u8);
    /// assert_eq!(texture.width(), 64);
    /// assert_eq!(texture.height(), 64);
    /// ```
    pub fn new(width: u16, height: u16, initialize_element: Format::CPixel) -> Self {
        let mut vec = Vec::with_capacity(width as usize * height as usize);
        for _ in 0..(width as u32 * height as u32) {
            vec.push(initialize_element.clone());
        }
        Self {
            width,
            height,
            data: vec,
        }
    }

    /// Creates a new texture with pixels computed by a function.
    ///
    /// # Examples
    ///
    /// ```
    /// use handles_and_slots::bindings::software::texture::Texture;
    /// use handles_and_slots::pixel_formats::R8UNorm;
    ///
    /// // Checkerboard
    /// let texture = Texture::<R8UNorm>::new_with(64, 64, |texel| {
    ///     if (texel.x / 8 + texel.y / 8) % 2 == 0 { 255u8 } else { 0u8 }
    /// });
    /// ```
    pub fn new_with<F: Fn(Texel) -> Format::CPixel>(
        width: u16,
        height: u16,
        initialize_with: F,
    ) -> Self {
        let mut vec = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                vec.push(initialize_with(Texel { x, y }));
            }
        }
        Self {
            width,
            height,
            data: vec,
        }
    }

    /// Loads a texture from a PNG file.
    ///
    /// The pixel format must support PNG loading; the file's color type and
    /// bit depth must match the format or decoding fails with a typed error.
    pub fn new_from_path(path: &Path) -> Result<Self, DecodeError>
    where
        Format: PngPixelFormat,
    {
        let data = std::fs::read(path)?;
        Self::new_from_png_bytes(&data)
    }

    /// Decodes a texture from in-memory PNG data.
    pub fn new_from_png_bytes(data: &[u8]) -> Result<Self, DecodeError>
    where
        Format: PngPixelFormat,
    {
        let decoder = png::Decoder::new(data);
        let mut reader = decoder.read_info()?;
        let color_type = reader.info().color_type;
        if color_type != Format::png_color_type() {
            return Err(DecodeError::ColorType {
                actual: color_type,
                expected: Format::png_color_type(),
            });
        }
        let bit_depth = reader.info().bit_depth;
        if bit_depth != Format::png_bit_depth() {
            return Err(DecodeError::BitDepth {
                actual: bit_depth,
                expected: Format::png_bit_depth(),
            });
        }
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        let (width, height): (u16, u16) =
            match (info.width.try_into(), info.height.try_into()) {
                (Ok(w), Ok(h)) => (w, h),
                _ => {
                    return Err(DecodeError::Oversize {
                        width: info.width,
                        height: info.height,
                    });
                }
            };
        buf.truncate(info.buffer_size());

        let bpp = Format::BYTES_PER_PIXEL as usize;
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for chunk in buf.chunks_exact(bpp) {
            pixels.push(pixel_from_bytes::<Format::CPixel>(chunk));
        }
        Ok(Self {
            data: pixels,
            width,
            height,
        })
    }

    /// Returns the width of the texture in pixels.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Returns the height of the texture in pixels.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The texture's dimensions as an [`Extent`].
    #[inline]
    pub fn extent(&self) -> Extent {
        Extent {
            width: self.width,
            height: self.height,
        }
    }

    /// Returns the raw pixel data in upload-friendly layout.
    ///
    /// Row-major order: Y=0 is the top row, X=0 the leftmost column.
    #[inline]
    pub(crate) fn texture_data(&self) -> &[Format::CPixel] {
        &self.data
    }

    /// The pixel data viewed as raw bytes.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        pixel_as_bytes(self.texture_data())
    }
}

impl<Format: PixelFormat> Index<Texel> for Texture<Format> {
    type Output = Format::CPixel;

    fn index(&self, index: Texel) -> &Self::Output {
        assert!(index.x < self.width && index.y < self.height);
        &self.data[index.vec_offset(self.width)]
    }
}

impl<Format: PixelFormat> IndexMut<Texel> for Texture<Format> {
    fn index_mut(&mut self, index: Texel) -> &mut Self::Output {
        assert!(index.x < self.width && index.y < self.height);
        let offset = index.vec_offset(self.width);
        &mut self.data[offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::R8UNorm;

    #[test]
    fn row_major_layout() {
        let texture = Texture::<R8UNorm>::new_with(3, 2, |t| (t.y * 3 + t.x) as u8);
        assert_eq!(texture.as_bytes(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    #[should_panic]
    fn out_of_range_index_panics() {
        let texture = Texture::<R8UNorm>::new(2, 2, 0u8);
        let _ = texture[Texel { x: 2, y: 0 }];
    }

    #[test]
    fn png_round_trip() {
        //encode a tiny grayscale png, then decode it back
        let pixels: &[u8] = &[10, 20, 30, 40, 50, 60];
        let mut encoded = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut encoded, 3, 2);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(pixels).unwrap();
        }
        let texture = Texture::<R8UNorm>::new_from_png_bytes(&encoded).unwrap();
        assert_eq!(texture.width(), 3);
        assert_eq!(texture.height(), 2);
        assert_eq!(texture.as_bytes(), pixels);
    }

    #[test]
    fn png_color_type_mismatch_is_reported() {
        let mut encoded = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut encoded, 1, 1);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[1, 2, 3, 4]).unwrap();
        }
        match Texture::<R8UNorm>::new_from_png_bytes(&encoded) {
            Err(DecodeError::ColorType { .. }) => {}
            other => panic!("expected a color type error, got {other:?}"),
        }
    }
}
