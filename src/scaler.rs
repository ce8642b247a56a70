use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Precomputed mapping from window pixels to frame neighbours + weights
pub struct ScaleLut {
    src_w: usize,
    src_h: usize,
    x0: Vec<usize>,
    x1: Vec<usize>,
    wx: Vec<u16>,
    y0: Vec<usize>,
    y1: Vec<usize>,
    wy: Vec<u16>,
}

/// Source index pair and 8.8 fixed-point weight for each destination index.
fn axis(dst: usize, src: usize) -> (Vec<usize>, Vec<usize>, Vec<u16>) {
    let mut i0 = vec![0; dst];
    let mut i1 = vec![0; dst];
    let mut w = vec![0; dst];
    if src == 0 {
        return (i0, i1, w);
    }

    let s = src as f32 / dst as f32;
    let last = src as isize - 1;
    for d in 0..dst {
        // sample at pixel centres
        let f = ((d as f32 + 0.5) * s - 0.5).max(0.0);
        let a = (f.floor() as isize).min(last);
        let b = (a + 1).min(last);
        i0[d] = a as usize;
        i1[d] = b as usize;
        w[d] = ((f - a as f32).clamp(0.0, 1.0) * 256.0).round() as u16;
    }
    (i0, i1, w)
}

impl ScaleLut {
    pub fn new(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> Self {
        let (x0, x1, wx) = axis(dst_w, src_w);
        let (y0, y1, wy) = axis(dst_h, src_h);
        Self {
            src_w,
            src_h,
            x0,
            x1,
            wx,
            y0,
            y1,
            wy,
        }
    }

    pub fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// True if this table was built for these sizes.
    pub fn fits(&self, dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> bool {
        self.x0.len() == dst_w && self.y0.len() == dst_h && self.src_w == src_w && self.src_h == src_h
    }

    /// Parallel bilinear stretch of `src` into `dst`.
    /// Rows are processed in parallel for cache friendly writes
    pub fn blit(&self, dst: &mut [u32], src: &[u32]) {
        let dw = self.x0.len();
        if dw == 0 || self.src_w == 0 || self.src_h == 0 {
            return;
        }
        let sw = self.src_w;
        dst.par_chunks_mut(dw).enumerate().for_each(|(y, dst_row)| {
            let Some(&y0) = self.y0.get(y) else {
                return;
            };
            let y1 = self.y1[y];
            let wy = self.wy[y] as u32;
            let row0 = y0 * sw;
            let row1 = y1 * sw;

            for (x, out) in dst_row.iter_mut().enumerate() {
                let x0 = self.x0[x];
                let x1 = self.x1[x];
                let wx = self.wx[x] as u32;

                let top = lerp_color_u32(src[row0 + x0], src[row0 + x1], wx);
                let bot = lerp_color_u32(src[row1 + x0], src[row1 + x1], wx);
                *out = lerp_color_u32(top, bot, wy);
            }
        });
    }
}

#[inline]
fn lerp_color_u32(a: u32, b: u32, w256: u32) -> u32 {
    // w256 in [0, 256]; inv = 256 - w256
    let inv = 256 - w256;
    // Interpolate R and B together (00RR00BB), with mask 0x00FF00FF,
    let rb = ((a & 0x00FF00FF) * inv + (b & 0x00FF00FF) * w256) >> 8 & 0x00FF00FF;
    // Interpolate G separately (0000GG00), with mask 0x0000FF00
    let g = ((a & 0x0000FF00) * inv + (b & 0x0000FF00) * w256) >> 8 & 0x0000FF00;
    rb | g // alpha stays 0
}
