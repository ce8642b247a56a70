use crate::error::{Error, Result};
use crate::sector::{Raster, SectorRecord};

/// Largest texture the default factory will realize, in texels.
pub const DEFAULT_TEXEL_BUDGET: usize = 4096 * 4096;

/// Sampling side of a realized texture.
pub trait Texture: Send + Sync {
    /// Intensity at normalized `radius` in `[0, 1]` and angular `fraction`
    /// in `[0, 1]`, where fraction 0 is the last scanline and 1 the first.
    fn sample(&self, radius: f32, fraction: f32) -> u8;
}

/// Creates textures from rasters. Creation is the expensive step of a frame.
pub trait TextureFactory {
    type Texture: Texture;

    fn create(&mut self, raster: &Raster) -> Result<Self::Texture>;
}

/// Make sure `record` has a texture, creating it at most once.
///
/// Returns `Ok(true)` if a texture was created by this call. On error the slot
/// stays empty and the next call tries again.
pub fn ensure_texture<F: TextureFactory>(
    record: &mut SectorRecord<F::Texture>,
    factory: &mut F,
) -> Result<bool> {
    if record.has_texture() {
        return Ok(false);
    }
    let texture = factory.create(&record.raster)?;
    *record.texture_slot() = Some(texture);
    Ok(true)
}

/// CPU-resident copy of a raster, sampled nearest-texel.
#[derive(Clone, Debug)]
pub struct PolarTexture {
    width: usize,
    height: usize,
    texels: Vec<u8>,
}

impl Texture for PolarTexture {
    #[inline]
    fn sample(&self, radius: f32, fraction: f32) -> u8 {
        let col = ((radius * self.width as f32) as usize).min(self.width - 1);
        let row_f = (1.0 - fraction.clamp(0.0, 1.0)) * self.height as f32;
        let row = (row_f as usize).min(self.height - 1);
        self.texels[row * self.width + col]
    }
}

/// Uploads rasters verbatim into [`PolarTexture`]s.
pub struct CpuTextureFactory {
    texel_budget: usize,
    created: u64,
}

impl CpuTextureFactory {
    pub fn new(texel_budget: usize) -> Self {
        Self {
            texel_budget,
            created: 0,
        }
    }
}

impl Default for CpuTextureFactory {
    fn default() -> Self {
        Self::new(DEFAULT_TEXEL_BUDGET)
    }
}

impl TextureFactory for CpuTextureFactory {
    type Texture = PolarTexture;

    fn create(&mut self, raster: &Raster) -> Result<PolarTexture> {
        let texels = raster.width() * raster.height();
        if texels == 0 {
            return Err(Error::EmptyRaster {
                width: raster.width(),
                height: raster.height(),
            });
        }
        if texels > self.texel_budget {
            return Err(Error::TextureTooLarge {
                texels,
                budget: self.texel_budget,
            });
        }
        self.created += 1;
        log::debug!(
            "Created texture #{} ({}x{})",
            self.created,
            raster.width(),
            raster.height()
        );
        Ok(PolarTexture {
            width: raster.width(),
            height: raster.height(),
            texels: raster.samples().to_vec(),
        })
    }
}
