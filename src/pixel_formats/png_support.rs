use crate::pixel_formats::{R8UNorm, RGBA8UnormSRGB};
use png::{BitDepth, ColorType};

/// Maps a pixel format onto the PNG color model it decodes from.
///
/// # Safety
///
/// Implementations promise that a decoded PNG frame of the declared color type
/// and bit depth is byte-for-byte a valid `[CPixel]` for the format.
pub unsafe trait PngPixelFormat {
    fn png_color_type() -> png::ColorType;
    fn png_bit_depth() -> png::BitDepth;
}

unsafe impl PngPixelFormat for RGBA8UnormSRGB {
    fn png_color_type() -> ColorType {
        ColorType::Rgba
    }

    fn png_bit_depth() -> BitDepth {
        BitDepth::Eight
    }
}

unsafe impl PngPixelFormat for R8UNorm {
    fn png_color_type() -> ColorType {
        ColorType::Grayscale
    }

    fn png_bit_depth() -> BitDepth {
        BitDepth::Eight
    }
}
