use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, SystemTime};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::feed::SectorFeed;
use crate::sector::{Scanline, SectorData};

#[derive(Clone, Debug)]
pub struct SweepConfig {
    pub rpm: f64,
    pub sectors_per_rev: usize,
    pub scanlines: usize,
    pub samples: usize,
    pub max_range: f64,
    /// Subtracted from every timestamp to mimic a sender clock running behind.
    pub clock_skew: Duration,
    pub seed: u64,
}

impl SweepConfig {
    /// Time between two sectors.
    pub fn sector_period(&self) -> Duration {
        let revs_per_sec = (self.rpm / 60.0).max(1e-3);
        Duration::from_secs_f64(1.0 / (revs_per_sec * self.sectors_per_rev as f64))
    }

    fn sector_span(&self) -> f64 {
        TAU / self.sectors_per_rev as f64
    }
}

/// A moving point target.
struct Echo {
    bearing: f64,
    range: f64, // fraction of max range
    size: f64,  // angular radius, radians
    drift: f64, // radians per revolution
}

/// Synthetic rotating antenna. It turns clockwise, so scanline angles
/// decrease from the first scanline of a sector to the last.
pub struct SweepSimulator {
    cfg: SweepConfig,
    rng: StdRng,
    echoes: Vec<Echo>,
    index: usize,
}

const RING_LEVEL: u8 = 3;
const MAX_NIBBLE: f64 = 15.0;

impl SweepSimulator {
    pub fn new(cfg: SweepConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let echoes = (0..6)
            .map(|_| Echo {
                bearing: rng.gen_range(0.0..TAU),
                range: rng.gen_range(0.2..0.95),
                size: rng.gen_range(0.01..0.05),
                drift: rng.gen_range(-0.02..0.02),
            })
            .collect();
        Self {
            cfg,
            rng,
            echoes,
            index: 0,
        }
    }

    /// Angle of the first scanline of the next sector.
    pub fn next_start_angle(&self) -> f64 {
        (-(self.index as f64) * self.cfg.sector_span()).rem_euclid(TAU)
    }

    /// Produce the next sector, stamped `captured_at` minus the configured skew.
    pub fn next_sector(&mut self, captured_at: SystemTime) -> Option<SectorData> {
        let start = self.next_start_angle();
        let step = self.cfg.sector_span() / self.cfg.scanlines.max(1) as f64;

        let scanlines: Vec<Scanline> = (0..self.cfg.scanlines)
            .map(|i| {
                let angle = (start - i as f64 * step).rem_euclid(TAU);
                Scanline {
                    angle,
                    range: self.cfg.max_range,
                    intensities: self.scanline(angle),
                }
            })
            .collect();

        self.index += 1;
        if self.index % self.cfg.sectors_per_rev == 0 {
            for echo in &mut self.echoes {
                echo.bearing = (echo.bearing + echo.drift).rem_euclid(TAU);
            }
        }

        let timestamp = captured_at.checked_sub(self.cfg.clock_skew).unwrap_or(captured_at);
        SectorData::from_scanlines(&scanlines, timestamp)
    }

    fn scanline(&mut self, angle: f64) -> Vec<u8> {
        let n = self.cfg.samples;
        let mut out = Vec::with_capacity(n);
        for j in 0..n {
            let r = (j as f64 + 0.5) / n as f64;

            // sea clutter near the antenna
            let mut level = 6.0 * (-r * 12.0).exp();

            for echo in &self.echoes {
                let da = wrapped_diff(angle, echo.bearing) / echo.size;
                let dr = (r - echo.range) / 0.015;
                level += MAX_NIBBLE * (-(da * da + dr * dr)).exp();
            }

            level += self.rng.gen_range(0.0..1.5);

            let mut nibble = level.min(MAX_NIBBLE) as u8;
            if is_ring(j, n) {
                nibble = nibble.max(RING_LEVEL);
            }
            out.push(nibble);
        }
        out
    }
}

/// Range rings at quarters of the maximum range.
fn is_ring(sample: usize, samples: usize) -> bool {
    samples >= 8 && (1..4).any(|q| sample == q * samples / 4)
}

/// Signed smallest difference `a - b`, in `(-pi, pi]`.
fn wrapped_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    if d > TAU / 2.0 { d - TAU } else { d }
}

/// Produce sectors in real time until `running` is cleared or the display
/// goes away.
pub fn run(cfg: SweepConfig, feed: SectorFeed, running: Arc<AtomicBool>) {
    let period = cfg.sector_period();
    log::info!(
        "Synthetic sweep: {:.1} rpm, {} sectors/rev, {}x{} samples, one sector every {:.1} ms",
        cfg.rpm,
        cfg.sectors_per_rev,
        cfg.scanlines,
        cfg.samples,
        period.as_secs_f64() * 1000.0
    );
    let mut sim = SweepSimulator::new(cfg);

    while running.load(Ordering::Relaxed) {
        if let Some(d) = sim.next_sector(SystemTime::now()) {
            let sent = feed.add_sector(d.angle_start, d.angle_end, d.max_range, d.raster, d.timestamp);
            if let Err(e) = sent {
                log::error!("Stopping synthetic sweep: {}", e);
                break;
            }
        }
        thread::sleep(period);
    }
    log::debug!("Synthetic sweep stopped");
}
