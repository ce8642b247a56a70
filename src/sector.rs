use std::time::SystemTime;

use crate::angle::SweepInterval;
use crate::error::{Error, Result};

/// Grid of 8-bit intensity samples.
///
/// Rows are scanlines (angular bins, first row = first scanline), columns are
/// range bins from the antenna outwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

impl Raster {
    pub fn new(width: usize, height: usize, samples: Vec<u8>) -> Result<Self> {
        let expected = width * height;
        if samples.len() != expected {
            return Err(Error::RasterShape {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build from 4-bit intensities, expanded to 8 bits by x16.
    pub fn from_nibbles(width: usize, height: usize, nibbles: &[u8]) -> Result<Self> {
        let samples = nibbles.iter().map(|&n| (n & 0x0F) * 16).collect();
        Self::new(width, height, samples)
    }

    /// Samples per scanline.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of scanlines.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }
}

/// One scanline as handed over by a decoder.
#[derive(Clone, Debug)]
pub struct Scanline {
    /// Beam angle in radians.
    pub angle: f64,
    /// Range of the last sample.
    pub range: f64,
    /// 4-bit intensities, one per range bin.
    pub intensities: Vec<u8>,
}

/// Payload of one `add_sector` call, before normalization.
#[derive(Clone, Debug)]
pub struct SectorData {
    pub angle_start: f64,
    pub angle_end: f64,
    pub max_range: f64,
    pub raster: Raster,
    pub timestamp: SystemTime,
}

impl SectorData {
    /// Assemble a sector from consecutive scanlines.
    ///
    /// The first scanline gives the start angle, the range and the raster
    /// width; the last gives the end angle. Scanlines of a different length
    /// are zero-padded or truncated to that width. Returns `None` when there
    /// is nothing to draw.
    pub fn from_scanlines(scanlines: &[Scanline], timestamp: SystemTime) -> Option<Self> {
        let first = scanlines.first()?;
        let last = scanlines.last()?;
        let width = first.intensities.len();
        if width == 0 {
            return None;
        }

        let mut nibbles = Vec::with_capacity(width * scanlines.len());
        for line in scanlines {
            nibbles.extend(line.intensities.iter().take(width));
            nibbles.extend(std::iter::repeat_n(0, width.saturating_sub(line.intensities.len())));
        }

        let raster = Raster::from_nibbles(width, scanlines.len(), &nibbles).ok()?;
        Some(Self {
            angle_start: first.angle,
            angle_end: last.angle,
            max_range: first.range,
            raster,
            timestamp,
        })
    }
}

/// A buffered sector. Immutable once inserted except for its texture slot.
#[derive(Debug)]
pub struct SectorRecord<T> {
    pub interval: SweepInterval,
    pub max_range: f64,
    pub raster: Raster,
    /// Capture time from the sender's clock.
    pub timestamp: SystemTime,
    /// Receive time from the display's own clock.
    pub arrived: SystemTime,
    texture: Option<T>,
    texture_failures: u32,
}

impl<T> SectorRecord<T> {
    /// Normalize a sector payload received at `arrived` into a record.
    /// Empty rasters produce no record.
    pub fn from_data(data: SectorData, arrived: SystemTime) -> Option<Self> {
        if data.raster.is_empty() {
            return None;
        }
        let interval =
            SweepInterval::normalize(data.angle_start, data.angle_end, data.raster.height());
        Some(Self {
            interval,
            max_range: data.max_range,
            raster: data.raster,
            timestamp: data.timestamp,
            arrived,
            texture: None,
            texture_failures: 0,
        })
    }

    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    pub(crate) fn texture_slot(&mut self) -> &mut Option<T> {
        &mut self.texture
    }

    /// Count a failed texture creation, returning the total so far.
    pub(crate) fn note_texture_failure(&mut self) -> u32 {
        self.texture_failures = self.texture_failures.saturating_add(1);
        self.texture_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(angle: f64, intensities: Vec<u8>) -> Scanline {
        Scanline {
            angle,
            range: 1852.0,
            intensities,
        }
    }

    #[test]
    fn raster_rejects_wrong_sample_count() {
        let err = Raster::new(3, 2, vec![0; 5]).unwrap_err();
        assert!(matches!(err, Error::RasterShape { expected: 6, actual: 5, .. }));
    }

    #[test]
    fn nibbles_expand_by_sixteen() {
        let r = Raster::from_nibbles(2, 1, &[1, 15]).unwrap();
        assert_eq!(r.samples(), &[16, 240]);
    }

    #[test]
    fn scanlines_give_angles_range_and_shape() {
        let lines = vec![line(0.5, vec![1, 2, 3]), line(0.4, vec![4, 5, 6]), line(0.3, vec![7, 8, 9])];
        let data = SectorData::from_scanlines(&lines, SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(data.angle_start, 0.5);
        assert_eq!(data.angle_end, 0.3);
        assert_eq!(data.max_range, 1852.0);
        assert_eq!(data.raster.width(), 3);
        assert_eq!(data.raster.height(), 3);
        assert_eq!(data.raster.samples()[3], 64);
    }

    #[test]
    fn ragged_scanlines_are_padded_to_first_width() {
        let lines = vec![line(0.2, vec![1, 1]), line(0.1, vec![2])];
        let data = SectorData::from_scanlines(&lines, SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(data.raster.samples(), &[16, 16, 32, 0]);
    }

    #[test]
    fn no_scanlines_no_sector() {
        assert!(SectorData::from_scanlines(&[], SystemTime::UNIX_EPOCH).is_none());
        assert!(SectorData::from_scanlines(&[line(0.0, vec![])], SystemTime::UNIX_EPOCH).is_none());
    }

    #[test]
    fn empty_raster_makes_no_record() {
        let data = SectorData {
            angle_start: 0.0,
            angle_end: 0.0,
            max_range: 1.0,
            raster: Raster::new(0, 4, vec![]).unwrap(),
            timestamp: SystemTime::UNIX_EPOCH,
        };
        assert!(SectorRecord::<()>::from_data(data, SystemTime::UNIX_EPOCH).is_none());
    }

    #[test]
    fn record_starts_without_texture() {
        let data = SectorData {
            angle_start: 0.0,
            angle_end: std::f64::consts::FRAC_PI_2,
            max_range: 1.0,
            raster: Raster::new(2, 2, vec![0; 4]).unwrap(),
            timestamp: SystemTime::UNIX_EPOCH,
        };
        let rec = SectorRecord::<u32>::from_data(data, SystemTime::UNIX_EPOCH).unwrap();
        assert!(!rec.has_texture());
        assert!(rec.interval.start >= rec.interval.end);
    }
}
