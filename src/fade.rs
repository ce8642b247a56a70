use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// Default fade time in seconds.
pub const DEFAULT_FADE_SECS: f64 = 3.0;

/// Opacity of a record that is `age_secs` old when it fades over `fade_secs`.
///
/// Decays linearly from 1 at age 0 to 0 at `age >= fade_secs`.
#[inline]
pub fn opacity(age_secs: f64, fade_secs: f64) -> f32 {
    (1.0 - age_secs / fade_secs).clamp(0.0, 1.0) as f32
}

/// Runtime-adjustable fade duration.
///
/// Clones share one value. Writers replace it atomically; the render thread
/// reads it fresh every frame.
#[derive(Clone, Debug)]
pub struct FadeControl {
    bits: Arc<AtomicU64>,
}

impl FadeControl {
    pub fn new(fade_secs: f64) -> Result<Self> {
        validate(fade_secs)?;
        Ok(Self {
            bits: Arc::new(AtomicU64::new(fade_secs.to_bits())),
        })
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Replace the fade duration. Invalid values leave the old one in place.
    pub fn set(&self, fade_secs: f64) -> Result<()> {
        validate(fade_secs)?;
        self.bits.store(fade_secs.to_bits(), Ordering::Relaxed);
        log::info!("Fade duration set to {:.2} s", fade_secs);
        Ok(())
    }
}

impl Default for FadeControl {
    fn default() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(DEFAULT_FADE_SECS.to_bits())),
        }
    }
}

fn validate(fade_secs: f64) -> Result<()> {
    if fade_secs.is_finite() && fade_secs > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidFadeDuration(fade_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_opaque() {
        assert_eq!(opacity(0.0, 3.0), 1.0);
    }

    #[test]
    fn halfway_is_half() {
        assert!((opacity(1.5, 3.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn reaches_zero_at_fade_and_stays() {
        assert_eq!(opacity(3.0, 3.0), 0.0);
        assert_eq!(opacity(30.0, 3.0), 0.0);
    }

    #[test]
    fn never_increases_with_age() {
        let mut prev = opacity(0.0, 2.0);
        for i in 1..400 {
            let o = opacity(i as f64 * 0.01, 2.0);
            assert!(o <= prev);
            assert!((0.0..=1.0).contains(&o));
            prev = o;
        }
    }

    #[test]
    fn control_rejects_bad_values_and_keeps_old() {
        let fade = FadeControl::new(3.0).unwrap();
        assert!(fade.set(0.0).is_err());
        assert!(fade.set(-1.0).is_err());
        assert!(fade.set(f64::NAN).is_err());
        assert!(fade.set(f64::INFINITY).is_err());
        assert_eq!(fade.get(), 3.0);
        assert!(FadeControl::new(0.0).is_err());
    }

    #[test]
    fn clones_see_updates() {
        let fade = FadeControl::default();
        let remote = fade.clone();
        remote.set(7.5).unwrap();
        assert_eq!(fade.get(), 7.5);
    }
}
