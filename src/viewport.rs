/// Maps internal frame pixels onto the unit disc.
///
/// The disc is fitted to the shorter side of the frame and centred, so it
/// stays round whatever the window aspect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub cx: f32,    // disc centre, pixels
    pub cy: f32,
    pub scale: f32, // pixels per unit radius
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        let mut vp = Self {
            cx: 0.0,
            cy: 0.0,
            scale: 1.0,
        };
        vp.set_size(width as f32, height as f32);
        vp
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.cx = 0.5 * width;
        self.cy = 0.5 * height;
        self.scale = (0.5 * width.min(height)).max(f32::EPSILON);
    }

    /// Disc-frame position of the centre of pixel `(px, py)`, y up.
    #[inline]
    pub fn to_disc(&self, px: usize, py: usize) -> (f32, f32) {
        let x = (px as f32 + 0.5 - self.cx) / self.scale;
        let y = (self.cy - (py as f32 + 0.5)) / self.scale;
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_pixel_is_near_origin() {
        let vp = Viewport::new(100, 100);
        let (x, y) = vp.to_disc(50, 50);
        assert!(x.abs() < 0.02 && y.abs() < 0.02);
    }

    #[test]
    fn disc_fits_shorter_side() {
        let vp = Viewport::new(200, 100);
        let (x, _) = vp.to_disc(199, 50);
        assert!(x > 1.9);
        let (_, y) = vp.to_disc(100, 0);
        assert!((y - 0.99).abs() < 1e-3);
    }

    #[test]
    fn y_points_up() {
        let vp = Viewport::new(10, 10);
        assert!(vp.to_disc(5, 0).1 > 0.0);
        assert!(vp.to_disc(5, 9).1 < 0.0);
    }
}
