use std::time::Duration;

use clap::Parser;

use crate::angle::AngleConvention;
use crate::buffer::{DEFAULT_CAPACITY, EvictionPolicy};
use crate::diagnostics::DEFAULT_STALE_WARN_INTERVAL;
use crate::error::{Error, Result};
use crate::fade::DEFAULT_FADE_SECS;
use crate::renderer::Tint;
use crate::sweep_sim::SweepConfig;
use crate::texture::DEFAULT_TEXEL_BUDGET;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TintChoice {
    #[default]
    Phosphor,
    Gray,
}

impl From<TintChoice> for Tint {
    fn from(choice: TintChoice) -> Self {
        match choice {
            TintChoice::Phosphor => Tint::PHOSPHOR,
            TintChoice::Gray => Tint::GRAY,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ppi-sweep", about = "Fading radar sweep display")]
pub struct Args {
    /// Seconds for a sector to fade out completely
    #[arg(long, default_value_t = DEFAULT_FADE_SECS)]
    pub fade_secs: f64,

    /// Evict by sector count instead of by age
    #[arg(long)]
    pub count_policy: bool,

    /// Sectors kept under the count policy
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Screen-to-polar axis convention
    #[arg(long, value_enum, default_value_t = AngleConvention::MathCcw)]
    pub convention: AngleConvention,

    /// Periodic redraw interval in milliseconds
    #[arg(long, default_value_t = 33)]
    pub redraw_ms: u64,

    /// Minimum seconds between two stale-data warnings
    #[arg(long, default_value_t = DEFAULT_STALE_WARN_INTERVAL.as_secs_f64())]
    pub stale_warn_secs: f64,

    /// Height of the internal frame in pixels
    #[arg(long, default_value_t = 600)]
    pub internal_height: usize,

    /// Largest sector texture accepted, in texels
    #[arg(long, default_value_t = DEFAULT_TEXEL_BUDGET)]
    pub texel_budget: usize,

    #[arg(long, value_enum, default_value_t = TintChoice::Phosphor)]
    pub tint: TintChoice,

    /// Antenna revolutions per minute of the synthetic feed
    #[arg(long, default_value_t = 24.0)]
    pub rpm: f64,

    /// Sectors per antenna revolution
    #[arg(long, default_value_t = 32)]
    pub sectors_per_rev: usize,

    /// Scanlines per sector
    #[arg(long, default_value_t = 16)]
    pub scanlines: usize,

    /// Range samples per scanline
    #[arg(long, default_value_t = 256)]
    pub samples: usize,

    /// Maximum range in meters
    #[arg(long, default_value_t = 3704.0)]
    pub max_range: f64,

    /// Shift feed timestamps into the past by this many milliseconds
    #[arg(long, default_value_t = 0)]
    pub clock_skew_ms: u64,

    /// Seed for echo placement and speckle
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}

/// Settings the display core runs with.
#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub fade_secs: f64,
    pub policy: EvictionPolicy,
    pub convention: AngleConvention,
    pub tint: Tint,
    pub redraw_period: Duration,
    pub stale_warn_interval: Duration,
    pub internal_height: usize,
    pub texel_budget: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fade_secs: DEFAULT_FADE_SECS,
            policy: EvictionPolicy::MaxAge,
            convention: AngleConvention::default(),
            tint: Tint::default(),
            redraw_period: Duration::from_millis(33),
            stale_warn_interval: DEFAULT_STALE_WARN_INTERVAL,
            internal_height: 600,
            texel_budget: DEFAULT_TEXEL_BUDGET,
        }
    }
}

impl Args {
    pub fn display_config(&self) -> Result<DisplayConfig> {
        if !(self.fade_secs.is_finite() && self.fade_secs > 0.0) {
            return Err(Error::InvalidFadeDuration(self.fade_secs));
        }
        let policy = if self.count_policy {
            EvictionPolicy::max_count(self.capacity)?
        } else {
            EvictionPolicy::MaxAge
        };
        Ok(DisplayConfig {
            fade_secs: self.fade_secs,
            policy,
            convention: self.convention,
            tint: self.tint.into(),
            redraw_period: Duration::from_millis(self.redraw_ms.max(1)),
            stale_warn_interval: Duration::from_secs_f64(self.stale_warn_secs.max(0.0)),
            internal_height: self.internal_height.max(16),
            texel_budget: self.texel_budget,
        })
    }

    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            rpm: self.rpm,
            sectors_per_rev: self.sectors_per_rev.max(1),
            scanlines: self.scanlines,
            samples: self.samples,
            max_range: self.max_range,
            clock_skew: Duration::from_millis(self.clock_skew_ms),
            seed: self.seed,
        }
    }
}
