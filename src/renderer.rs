use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::angle::AngleConvention;
use crate::compositor::DrawCommand;
use crate::texture::Texture;
use crate::viewport::Viewport;

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
    // Alpha at 0
}

/// Colour applied to intensity samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Tint {
    pub const PHOSPHOR: Tint = Tint {
        r: 0.35,
        g: 1.0,
        b: 0.45,
    };
    pub const GRAY: Tint = Tint {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    #[inline]
    fn shade(&self, intensity: u8, opacity: f32) -> u32 {
        let k = intensity as f32 * opacity;
        pack_rgb(
            (self.r * k) as u8,
            (self.g * k) as u8,
            (self.b * k) as u8,
        )
    }
}

impl Default for Tint {
    fn default() -> Self {
        Tint::PHOSPHOR
    }
}

/// Internal frame the sectors are composited into before presentation.
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }
}

/// Paint `commands` through the polar mask.
///
/// Each pixel inside the unit disc takes the colour of the last command whose
/// angular window contains it, which is the same as painting the commands in
/// order with later ones on top. Pixels no command covers stay background.
pub fn render_sectors<T: Texture>(
    frame: &mut Frame,
    viewport: &Viewport,
    commands: &[DrawCommand<'_, T>],
    convention: AngleConvention,
    tint: Tint,
) {
    let width = frame.width;
    if width == 0 {
        return;
    }
    let outside = pack_rgb(0, 0, 0);
    let scope = pack_rgb(0, 10, 4);

    // Rows are independent
    frame
        .pixels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(py, row)| {
            for (px, out) in row.iter_mut().enumerate() {
                let (x, y) = viewport.to_disc(px, py);
                let radius = (x * x + y * y).sqrt();
                if radius > 1.0 {
                    *out = outside;
                    continue;
                }

                let theta = convention.theta(x, y);
                *out = commands
                    .iter()
                    .rev()
                    .find_map(|cmd| {
                        let wrapped = cmd.bounds.wrap(theta)?;
                        let fraction = cmd.bounds.fraction(wrapped);
                        let sample = cmd.texture.sample(radius, fraction);
                        Some(tint.shade(sample, cmd.opacity))
                    })
                    .unwrap_or(scope);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::SweepInterval;

    struct Flat(u8);

    impl Texture for Flat {
        fn sample(&self, _radius: f32, _fraction: f32) -> u8 {
            self.0
        }
    }

    fn quadrant(start_deg: f64, end_deg: f64) -> crate::angle::MaskBounds {
        SweepInterval::normalize(start_deg.to_radians(), end_deg.to_radians(), 64).mask_bounds()
    }

    fn draw(commands: &[DrawCommand<'_, Flat>], convention: AngleConvention) -> Frame {
        let mut frame = Frame::new(64, 64);
        let vp = Viewport::new(64, 64);
        render_sectors(&mut frame, &vp, commands, convention, Tint::GRAY);
        frame
    }

    #[test]
    fn first_quadrant_lights_upper_right_only() {
        let tex = Flat(200);
        let cmds = [DrawCommand {
            texture: &tex,
            bounds: quadrant(90.0, 0.0),
            opacity: 1.0,
        }];
        let frame = draw(&cmds, AngleConvention::MathCcw);
        assert_eq!(frame.get(48, 16), pack_rgb(200, 200, 200));
        assert_ne!(frame.get(16, 16), pack_rgb(200, 200, 200));
        assert_ne!(frame.get(48, 48), pack_rgb(200, 200, 200));
        // corner is outside the disc
        assert_eq!(frame.get(0, 0), 0);
    }

    #[test]
    fn north_convention_rotates_quadrant() {
        let tex = Flat(200);
        let cmds = [DrawCommand {
            texture: &tex,
            bounds: quadrant(90.0, 0.0),
            opacity: 1.0,
        }];
        let frame = draw(&cmds, AngleConvention::NorthCcw);
        // zero is up, ninety is left: upper left quadrant
        assert_eq!(frame.get(16, 16), pack_rgb(200, 200, 200));
        assert_ne!(frame.get(48, 16), pack_rgb(200, 200, 200));
    }

    #[test]
    fn sector_across_zero_covers_both_sides() {
        let tex = Flat(100);
        let cmds = [DrawCommand {
            texture: &tex,
            bounds: quadrant(30.0, 330.0),
            opacity: 1.0,
        }];
        let frame = draw(&cmds, AngleConvention::MathCcw);
        // just above and just below the +x axis
        assert_eq!(frame.get(56, 30), pack_rgb(100, 100, 100));
        assert_eq!(frame.get(56, 34), pack_rgb(100, 100, 100));
        assert_ne!(frame.get(8, 32), pack_rgb(100, 100, 100));
    }

    #[test]
    fn newer_command_paints_over_older() {
        let old = Flat(50);
        let new = Flat(250);
        let cmds = [
            DrawCommand {
                texture: &old,
                bounds: quadrant(90.0, 0.0),
                opacity: 1.0,
            },
            DrawCommand {
                texture: &new,
                bounds: quadrant(90.0, 0.0),
                opacity: 1.0,
            },
        ];
        let frame = draw(&cmds, AngleConvention::MathCcw);
        assert_eq!(frame.get(48, 16), pack_rgb(250, 250, 250));
    }

    #[test]
    fn opacity_scales_colour() {
        let tex = Flat(200);
        let cmds = [DrawCommand {
            texture: &tex,
            bounds: quadrant(90.0, 0.0),
            opacity: 0.5,
        }];
        let frame = draw(&cmds, AngleConvention::MathCcw);
        assert_eq!(frame.get(48, 16), pack_rgb(100, 100, 100));
    }
}
