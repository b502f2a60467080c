//! Decoded texture images, ready for upload.

use std::path::Path;

use crate::TextureLoadError;

/// Texel layout of a decoded image, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    /// The layout matching what the decoder produced. Never guessed from the
    /// file extension.
    #[must_use]
    pub const fn from_channel_count(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::R8),
            2 => Some(Self::Rg8),
            3 => Some(Self::Rgb8),
            4 => Some(Self::Rgba8),
            _ => None,
        }
    }

    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rg8 => 2,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Returns `None` if `pixels` does not hold exactly `width * height` texels.
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * format.channels();
        (pixels.len() == expected && width > 0 && height > 0).then_some(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of levels in a full mip chain down to 1x1.
    #[must_use]
    pub const fn mip_levels(&self) -> u32 {
        let largest = if self.width > self.height {
            self.width
        } else {
            self.height
        };
        u32::BITS - largest.leading_zeros()
    }

    /// Same texels with an opaque alpha channel appended, for APIs that cannot
    /// sample three-channel images. Other layouts are returned unchanged.
    #[must_use]
    pub fn to_rgba8(&self) -> std::borrow::Cow<'_, [u8]> {
        match self.format {
            PixelFormat::Rgb8 => self
                .pixels
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
                .collect::<Vec<_>>()
                .into(),
            _ => self.pixels.as_slice().into(),
        }
    }
}

/// Turns a texture file into texels.
pub trait TextureLoader {
    fn load(&mut self, path: &Path) -> Result<DecodedImage, TextureLoadError>;
}

/// Decodes image files from disk with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTextureLoader;

impl TextureLoader for FileTextureLoader {
    fn load(&mut self, path: &Path) -> Result<DecodedImage, TextureLoadError> {
        let start = std::time::Instant::now();

        let image = image::open(path).map_err(|source| TextureLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let channels = image.color().channel_count();
        let format = PixelFormat::from_channel_count(channels).ok_or_else(|| {
            TextureLoadError::UnsupportedChannels {
                path: path.to_path_buf(),
                channels,
            }
        })?;

        let (width, height) = (image.width(), image.height());
        let pixels = match format {
            PixelFormat::R8 => image.into_luma8().into_raw(),
            PixelFormat::Rg8 => image.into_luma_alpha8().into_raw(),
            PixelFormat::Rgb8 => image.into_rgb8().into_raw(),
            PixelFormat::Rgba8 => image.into_rgba8().into_raw(),
        };

        tracing::trace!(
            "Decoded {} ({width}x{height}, {format:?}) in {:?}",
            path.display(),
            start.elapsed()
        );

        DecodedImage::new(width, height, format, pixels).ok_or_else(|| {
            TextureLoadError::UnsupportedChannels {
                path: path.to_path_buf(),
                channels,
            }
        })
    }
}
