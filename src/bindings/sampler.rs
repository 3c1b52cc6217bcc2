//! Sampler configuration for sampled textures.
//!
//! Filtering and wrapping are resource-level configuration: set once (or
//! changed rarely) on the texture, and applied the next time the texture is
//! bound. This matches the stateless-slot binding model, where a slot holds a
//! handle and the handle carries its own sampling state.

/// How texel values are filtered when the sample point falls between texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Take the nearest texel. Crisp, blocky under magnification.
    Nearest,
    /// Interpolate between neighboring texels.
    Linear,
}

/// How coordinates outside [0, 1] are mapped back into the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Tile the texture.
    Repeat,
    /// Tile the texture, mirroring every other repetition.
    MirroredRepeat,
    /// Clamp to the edge texel.
    ClampToEdge,
}

/// A texture's complete sampling configuration.
///
/// # Examples
///
/// ```
/// use handles_and_slots::bindings::sampler::{FilterMode, SamplerType, WrapMode};
///
/// // Tiled, smooth sampling: the default
/// assert_eq!(SamplerType::default().min_filter, FilterMode::Linear);
///
/// // Pixel-art sampling
/// let crisp = SamplerType {
///     min_filter: FilterMode::Nearest,
///     mag_filter: FilterMode::Nearest,
///     wrap_x: WrapMode::ClampToEdge,
///     wrap_y: WrapMode::ClampToEdge,
/// };
/// # _ = crisp;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerType {
    /// Filter applied when the texture is minified.
    pub min_filter: FilterMode,
    /// Filter applied when the texture is magnified.
    pub mag_filter: FilterMode,
    /// Wrapping along the X axis.
    pub wrap_x: WrapMode,
    /// Wrapping along the Y axis.
    pub wrap_y: WrapMode,
}

impl Default for SamplerType {
    /// Linear filtering and repeat wrapping on both axes.
    fn default() -> Self {
        Self {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            wrap_x: WrapMode::Repeat,
            wrap_y: WrapMode::Repeat,
        }
    }
}
