//! Colour maps, render attachments and the 1x1 fallback texture.

use anyhow::Result;
use image::{GenericImageView, ImageFormat, imageops::FilterType, load_from_memory_with_format};

/// Per-texture upload settings.
///
/// Mirrors the knobs applied to the page textures of the card once they are
/// decoded: vertical orientation, mip chain and anisotropic filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureOptions {
    /// Flip the image vertically before uploading. glTF texture coordinates already
    /// have their origin in the top-left corner, so this is `false` for model textures.
    pub flip_y: bool,
    pub generate_mipmaps: bool,
    /// Anisotropic filtering level, `1` disables it.
    pub anisotropy: u16,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_y: false,
            generate_mipmaps: true,
            anisotropy: 1,
        }
    }
}

/// Number of mip levels of a full chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Decoded levels of a colour map, largest first.
///
/// Decoding and downsampling are CPU work only, so a chain can be built away from
/// the thread owning the GPU queue and uploaded with [`Texture::from_mips`] later.
#[derive(Clone, Debug)]
pub struct MipChain {
    levels: Vec<image::RgbaImage>,
}

impl MipChain {
    /// Decodes an encoded image file. `format` is an extension hint such as `"png"`,
    /// without it the format is guessed from the bytes.
    pub fn decode(bytes: &[u8], format: Option<&str>, options: TextureOptions) -> Result<Self> {
        let img = match format.and_then(ImageFormat::from_extension) {
            Some(fmt) => load_from_memory_with_format(bytes, fmt)?,
            None => image::load_from_memory(bytes)?,
        };
        Ok(Self::from_image(&img, options))
    }

    pub fn from_image(img: &image::DynamicImage, options: TextureOptions) -> Self {
        let img = if options.flip_y {
            img.flipv()
        } else {
            img.clone()
        };
        let (width, height) = img.dimensions();
        let count = if options.generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };
        // Every level is downsampled from the full image, there is no blit pass for it.
        let levels = (0..count)
            .map(|level| {
                if level == 0 {
                    img.to_rgba8()
                } else {
                    img.resize_exact((width >> level).max(1), (height >> level).max(1), FilterType::Triangle)
                        .to_rgba8()
                }
            })
            .collect();
        Self { levels }
    }

    pub fn levels(&self) -> &[image::RgbaImage] {
        &self.levels
    }

    /// Size of the base level.
    pub fn dimensions(&self) -> (u32, u32) {
        self.levels
            .first()
            .map_or((1, 1), image::RgbaImage::dimensions)
    }
}

/// Texture plus the view and sampler the shaders bind.
///
/// Colour maps carry the sampler configured by their [`TextureOptions`], render
/// attachments have none.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a render target of `size` `[width, height]` pixels that is never sampled.
    pub fn create_attachment(
        device: &wgpu::Device,
        size: [u32; 2],
        format: wgpu::TextureFormat,
        sample_count: u32,
        label: &str,
    ) -> Self {
        let [width, height] = size.map(|side| side.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Create the depth attachment of the render pass. Its `sample_count` has to
    /// match the colour target's.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        size: [u32; 2],
        sample_count: u32,
        label: &str,
    ) -> Self {
        Self::create_attachment(device, size, Self::DEPTH_FORMAT, sample_count, label)
    }

    /// Create a 1x1 texture of a single colour.
    ///
    /// Bound in place of a colour map for materials that have none, so the
    /// same pipeline and shader serve textured and untextured materials.
    pub fn create_solid(
        rgba: [u8; 4],
        label: &str,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Texture {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba(rgba),
        ));
        let options = TextureOptions {
            generate_mipmaps: false,
            ..Default::default()
        };
        Self::from_image(device, queue, &img, Some(label), options)
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        options: TextureOptions,
    ) -> Self {
        let mips = MipChain::from_image(img, options);
        Self::from_mips(device, queue, &mips, label, options.anisotropy)
    }

    /// Uploads every level of `mips`.
    pub fn from_mips(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mips: &MipChain,
        label: Option<&str>,
        anisotropy: u16,
    ) -> Self {
        let (width, height) = mips.dimensions();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mips.levels().len().max(1) as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, rgba) in mips.levels().iter().enumerate() {
            let (level_width, level_height) = rgba.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(repeat_sampler(device, anisotropy));

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Trilinear sampler repeating in every direction, the wrap mode glTF defaults to.
///
/// Anisotropic filtering is only valid with linear filters, which all of these are.
pub fn repeat_sampler(device: &wgpu::Device, anisotropy: u16) -> wgpu::Sampler {
    let linear = wgpu::FilterMode::Linear;
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("repeat sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: linear,
        min_filter: linear,
        mipmap_filter: linear,
        anisotropy_clamp: anisotropy.max(1),
        ..Default::default()
    })
}
