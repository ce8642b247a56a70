use crate::angle::AngleConvention;
use crate::buffer::{EvictionPolicy, SectorBuffer};
use crate::clock::{Clock, age_secs};
use crate::compositor::{FrameStats, plan_frame};
use crate::config::DisplayConfig;
use crate::diagnostics::StaleDataWarning;
use crate::error::Result;
use crate::fade::FadeControl;
use crate::feed::SectorReceiver;
use crate::renderer::{Frame, Tint, render_sectors};
use crate::sector::{SectorData, SectorRecord};
use crate::target::RenderTarget;
use crate::texture::TextureFactory;
use crate::viewport::Viewport;

/// Owns buffered sectors, their textures and the internal frame.
/// Lives on the render thread only.
pub struct RadarDisplay<F: TextureFactory, C: Clock> {
    buffer: SectorBuffer<F::Texture>,
    factory: F,
    clock: C,
    fade: FadeControl,
    policy: EvictionPolicy,
    convention: AngleConvention,
    tint: Tint,
    stale: StaleDataWarning,

    // Internal frame; height fixed, width follows the window aspect
    frame: Frame,
    internal_height: usize,
    viewport: Viewport,
}

impl<F: TextureFactory, C: Clock> RadarDisplay<F, C> {
    pub fn new(config: &DisplayConfig, fade: FadeControl, factory: F, clock: C) -> Self {
        let h = config.internal_height.max(1);
        Self {
            buffer: SectorBuffer::new(),
            factory,
            clock,
            fade,
            policy: config.policy,
            convention: config.convention,
            tint: config.tint,
            stale: StaleDataWarning::new(config.stale_warn_interval),
            frame: Frame::new(h, h),
            internal_height: h,
            viewport: Viewport::new(h, h),
        }
    }

    /// Accept one sector. Returns false if it carried no data.
    ///
    /// Sectors already older than the fade time are still kept; they raise a
    /// rate-limited warning since that usually means the clocks disagree.
    pub fn add_sector(&mut self, data: SectorData) -> bool {
        let now = self.clock.now();
        let age = age_secs(now, data.timestamp);
        let Some(record) = SectorRecord::from_data(data, now) else {
            return false;
        };
        log::trace!(
            "Sector {:.3}..{:.3} rad ({:.3} rad wide) to {:.0} m, {:.2} s old",
            record.interval.end,
            record.interval.start,
            record.interval.span(),
            record.max_range,
            age
        );
        self.stale.check(now, age, self.fade.get());
        self.buffer.push(record);
        true
    }

    /// Move everything queued on `rx` into the buffer.
    pub fn drain(&mut self, rx: &SectorReceiver) -> usize {
        let mut added = 0;
        for data in rx.drain() {
            if self.add_sector(data) {
                added += 1;
            }
        }
        added
    }

    /// Rebuild the internal frame for a new window size.
    pub fn resize(&mut self, dst_w: usize, dst_h: usize) {
        let target_h = self.internal_height;
        let aspect = if dst_h > 0 {
            dst_w as f32 / dst_h as f32
        } else {
            1.0
        };

        // Width follows the window aspect so the scaler stretches both axes alike
        let mut target_w = ((target_h as f32 * aspect).round() as usize).max(2);
        if target_w % 2 != 0 {
            target_w += 1;
        }

        if target_w != self.frame.width || target_h != self.frame.height {
            log::info!(
                "Internal frame {}x{} for window {}x{}",
                target_w,
                target_h,
                dst_w,
                dst_h
            );
            self.frame = Frame::new(target_w, target_h);
            self.viewport = Viewport::new(target_w, target_h);
        }
    }

    /// Composite the current buffer into the internal frame.
    pub fn render(&mut self) -> FrameStats {
        let now = self.clock.now();
        let fade_secs = self.fade.get();
        let (commands, stats) = plan_frame(
            &mut self.buffer,
            &mut self.factory,
            self.policy,
            now,
            fade_secs,
        );
        render_sectors(
            &mut self.frame,
            &self.viewport,
            &commands,
            self.convention,
            self.tint,
        );
        stats
    }

    /// Render and present one frame on `target`.
    pub fn draw_frame(&mut self, target: &mut impl RenderTarget) -> Result<FrameStats> {
        let stats = self.render();
        target.present(&self.frame)?;
        Ok(stats)
    }

    /// Drop every buffered sector and its texture.
    pub fn clear(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let n = self.buffer.len();
        self.buffer.clear();
        log::debug!("Cleared {} sectors", n);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn fade(&self) -> &FadeControl {
        &self.fade
    }

    #[cfg(test)]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}
