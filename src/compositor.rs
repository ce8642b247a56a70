use std::time::SystemTime;

use crate::angle::MaskBounds;
use crate::buffer::{EvictionPolicy, SectorBuffer};
use crate::clock::age_secs;
use crate::error::Error;
use crate::fade::opacity;
use crate::sector::SectorRecord;
use crate::texture::{TextureFactory, ensure_texture};

/// One textured quad to paint through the polar mask.
pub struct DrawCommand<'a, T> {
    pub texture: &'a T,
    pub bounds: MaskBounds,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Records painted this frame.
    pub drawn: usize,
    /// Records whose texture could not be realized; retried next frame.
    pub skipped: usize,
    /// Records fully faded but still buffered (count-based policy).
    pub faded: usize,
    /// Records evicted at the start of this frame.
    pub evicted: usize,
    /// Textures created this frame.
    pub created: usize,
}

/// Level to report the `attempt`th failed texture creation of one record at.
/// Only the first failure is reported; retries stay quiet.
fn failure_level(err: &Error, attempt: u32) -> Option<log::Level> {
    if attempt > 1 {
        None
    } else if err.is_per_record() {
        Some(log::Level::Warn)
    } else {
        Some(log::Level::Error)
    }
}

/// Age the fade is computed from.
///
/// The count policy makes no assumption about the sender's clock, so it fades
/// by time since arrival on the display's clock instead of capture time.
fn fade_age<T>(record: &SectorRecord<T>, policy: EvictionPolicy, now: SystemTime) -> f64 {
    match policy {
        EvictionPolicy::MaxAge => age_secs(now, record.timestamp),
        EvictionPolicy::MaxCount(_) => age_secs(now, record.arrived),
    }
}

/// Build the frame's draw list, oldest record first so newer sectors end up
/// on top.
///
/// A record whose texture cannot be created is left out of this frame only.
/// Fully transparent records contribute nothing and are left out as well.
pub fn plan_frame<'a, F: TextureFactory>(
    buffer: &'a mut SectorBuffer<F::Texture>,
    factory: &mut F,
    policy: EvictionPolicy,
    now: SystemTime,
    fade_secs: f64,
) -> (Vec<DrawCommand<'a, F::Texture>>, FrameStats) {
    let mut stats = FrameStats {
        evicted: buffer.evict(policy, now, fade_secs),
        ..FrameStats::default()
    };

    for record in buffer.iter_mut() {
        match ensure_texture(record, factory) {
            Ok(true) => stats.created += 1,
            Ok(false) => {}
            Err(e) => {
                stats.skipped += 1;
                let attempt = record.note_texture_failure();
                match failure_level(&e, attempt) {
                    Some(level) => log::log!(level, "Cannot create sector texture: {}", e),
                    None => log::trace!("Texture retry {} failed: {}", attempt, e),
                }
            }
        }
    }

    let buffer: &'a SectorBuffer<F::Texture> = buffer;
    let mut commands = Vec::with_capacity(buffer.len());
    for record in buffer.iter() {
        let Some(texture) = record.texture() else {
            continue;
        };
        let opacity = opacity(fade_age(record, policy, now), fade_secs);
        if opacity <= 0.0 {
            stats.faded += 1;
            continue;
        }
        commands.push(DrawCommand {
            texture,
            bounds: record.interval.mask_bounds(),
            opacity,
        });
    }
    stats.drawn = commands.len();

    (commands, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sector::{Raster, SectorData};
    use crate::texture::testing::CountingFactory;
    use std::time::Duration;

    fn t(secs: f64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs_f64(secs)
    }

    fn push_received<T>(buf: &mut SectorBuffer<T>, value: u8, at: SystemTime, arrived: SystemTime) {
        let data = SectorData {
            angle_start: std::f64::consts::FRAC_PI_2,
            angle_end: 0.0,
            max_range: 1.0,
            raster: Raster::new(1, 1, vec![value]).unwrap(),
            timestamp: at,
        };
        buf.push(SectorRecord::from_data(data, arrived).unwrap());
    }

    fn push<T>(buf: &mut SectorBuffer<T>, value: u8, at: SystemTime) {
        push_received(buf, value, at, at);
    }

    fn order(cmds: &[DrawCommand<'_, crate::texture::testing::CountedTexture>]) -> Vec<u8> {
        cmds.iter().map(|c| c.texture.value).collect()
    }

    #[test]
    fn draws_oldest_first_and_deterministically() {
        let mut buf = SectorBuffer::new();
        let mut factory = CountingFactory::default();
        for v in 1..=4 {
            push(&mut buf, v, t(v as f64 * 0.1));
        }
        let first = {
            let (cmds, _) = plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxAge, t(1.0), 3.0);
            order(&cmds)
        };
        let second = {
            let (cmds, _) = plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxAge, t(1.0), 3.0);
            order(&cmds)
        };
        assert_eq!(first, vec![1, 2, 3, 4]);
        assert_eq!(first, second);
        assert_eq!(factory.creates.get(), 4);
    }

    #[test]
    fn sector_fades_and_is_evicted() {
        let mut buf = SectorBuffer::new();
        let mut factory = CountingFactory::default();
        push(&mut buf, 7, t(0.0));

        {
            let (cmds, stats) = plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxAge, t(1.5), 3.0);
            assert_eq!(stats.drawn, 1);
            assert!((cmds[0].opacity - 0.5).abs() < 1e-6);
        }

        let (cmds, stats) = plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxAge, t(3.0), 3.0);
        assert!(cmds.is_empty());
        assert_eq!(stats.evicted, 1);
        assert_eq!(factory.drops(), 1);
    }

    #[test]
    fn texture_failure_skips_only_that_record() {
        let mut buf = SectorBuffer::new();
        let mut factory = CountingFactory::default();
        push(&mut buf, 1, t(0.0));
        push(&mut buf, 2, t(0.0));
        factory.fail_next.set(1);

        {
            let (cmds, stats) = plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxAge, t(0.5), 3.0);
            assert_eq!(order(&cmds), vec![2]);
            assert_eq!(stats.skipped, 1);
        }

        let (cmds, stats) = plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxAge, t(0.6), 3.0);
        assert_eq!(order(&cmds), vec![1, 2]);
        assert_eq!(stats.created, 1);
    }

    #[test]
    fn count_policy_draws_sectors_from_a_lagging_sender() {
        let mut buf = SectorBuffer::new();
        let mut factory = CountingFactory::default();
        // sender clock 10 s behind, fade 3 s
        for v in 1..=10 {
            push_received(&mut buf, v, t(0.0), t(10.0));
        }
        let (cmds, stats) =
            plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxCount(75), t(10.0), 3.0);
        assert_eq!(stats.drawn, 10);
        assert_eq!(stats.faded, 0);
        assert!(cmds.iter().all(|c| c.opacity == 1.0));
    }

    #[test]
    fn age_policy_fades_by_capture_time() {
        let mut buf = SectorBuffer::new();
        let mut factory = CountingFactory::default();
        push_received(&mut buf, 1, t(8.5), t(10.0));
        let (cmds, _) = plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxAge, t(10.0), 3.0);
        assert!((cmds[0].opacity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn repeated_texture_failure_is_reported_once() {
        let mut buf = SectorBuffer::new();
        let mut factory = CountingFactory::default();
        push(&mut buf, 1, t(0.0));
        factory.fail_next.set(3);
        for _ in 0..3 {
            let (_, stats) =
                plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxCount(75), t(0.1), 3.0);
            assert_eq!(stats.skipped, 1);
        }
        let record = buf.iter_mut().next().unwrap();
        assert_eq!(record.note_texture_failure(), 4);

        let too_large = Error::TextureTooLarge { texels: 4, budget: 1 };
        assert_eq!(failure_level(&too_large, 1), Some(log::Level::Warn));
        assert_eq!(failure_level(&too_large, 2), None);
        let surface = Error::Surface("lost".into());
        assert_eq!(failure_level(&surface, 1), Some(log::Level::Error));
    }

    #[test]
    fn count_policy_keeps_faded_records_but_does_not_draw_them() {
        let mut buf = SectorBuffer::new();
        let mut factory = CountingFactory::default();
        push(&mut buf, 1, t(0.0));
        push(&mut buf, 2, t(9.0));
        let (cmds, stats) =
            plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxCount(75), t(10.0), 3.0);
        assert_eq!(order(&cmds), vec![2]);
        assert_eq!(stats.faded, 1);
        assert_eq!(stats.evicted, 0);
    }

    #[test]
    fn fade_change_applies_to_existing_records() {
        let mut buf = SectorBuffer::new();
        let mut factory = CountingFactory::default();
        push(&mut buf, 1, t(0.0));
        {
            let (cmds, _) = plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxAge, t(1.0), 2.0);
            assert!((cmds[0].opacity - 0.5).abs() < 1e-6);
        }
        let (cmds, _) = plan_frame(&mut buf, &mut factory, EvictionPolicy::MaxAge, t(1.0), 4.0);
        assert!((cmds[0].opacity - 0.75).abs() < 1e-6);
    }
}
