use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::fade::FadeControl;
use crate::sector::{Raster, SectorData};

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Producer side. Cheap to clone, usable from any thread.
#[derive(Clone)]
pub struct SectorFeed {
    tx: Sender<SectorData>,
    wake: Waker,
    fade: FadeControl,
}

/// Render-thread side.
pub struct SectorReceiver {
    rx: Receiver<SectorData>,
}

/// Create a connected feed. `wake` is called after every enqueued sector so
/// the host can schedule a redraw.
///
/// Producers only enqueue; the buffer and every texture stay with the thread
/// that drains the receiver.
pub fn channel(fade: FadeControl, wake: impl Fn() + Send + Sync + 'static) -> (SectorFeed, SectorReceiver) {
    let (tx, rx) = mpsc::channel();
    (
        SectorFeed {
            tx,
            wake: Arc::new(wake),
            fade,
        },
        SectorReceiver { rx },
    )
}

impl SectorFeed {
    /// Queue a sector for display. Empty rasters are dropped silently.
    pub fn add_sector(
        &self,
        angle_start: f64,
        angle_end: f64,
        max_range: f64,
        raster: Raster,
        timestamp: SystemTime,
    ) -> Result<()> {
        self.send(SectorData {
            angle_start,
            angle_end,
            max_range,
            raster,
            timestamp,
        })
    }

    /// Queue an already assembled sector.
    pub fn send(&self, data: SectorData) -> Result<()> {
        if data.raster.is_empty() {
            return Ok(());
        }
        self.tx.send(data).map_err(|_| Error::FeedDisconnected)?;
        (self.wake)();
        Ok(())
    }

    /// Change the fade time; takes effect on the next frame.
    pub fn set_fade_duration(&self, seconds: f64) -> Result<()> {
        self.fade.set(seconds)
    }
}

impl SectorReceiver {
    /// Everything queued so far, in arrival order, without blocking.
    pub fn drain(&self) -> impl Iterator<Item = SectorData> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn raster(w: usize, h: usize) -> Raster {
        Raster::new(w, h, vec![1; w * h]).unwrap()
    }

    #[test]
    fn sectors_cross_threads_in_order_and_wake() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let (feed, rx) = channel(FadeControl::default(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let producer = thread::spawn(move || {
            for i in 0..5 {
                feed.add_sector(i as f64, 0.0, 10.0, raster(2, 2), SystemTime::UNIX_EPOCH)
                    .unwrap();
            }
        });
        producer.join().unwrap();

        let starts: Vec<f64> = rx.drain().map(|d| d.angle_start).collect();
        assert_eq!(starts, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(wakes.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn empty_raster_is_not_queued() {
        let (feed, rx) = channel(FadeControl::default(), || {});
        feed.add_sector(0.0, 0.0, 1.0, raster(0, 3), SystemTime::UNIX_EPOCH)
            .unwrap();
        feed.add_sector(0.0, 0.0, 1.0, raster(3, 0), SystemTime::UNIX_EPOCH)
            .unwrap();
        assert_eq!(rx.drain().count(), 0);
    }

    #[test]
    fn dropped_receiver_reports_disconnect() {
        let (feed, rx) = channel(FadeControl::default(), || {});
        drop(rx);
        let err = feed
            .add_sector(0.0, 0.0, 1.0, raster(1, 1), SystemTime::UNIX_EPOCH)
            .unwrap_err();
        assert!(matches!(err, Error::FeedDisconnected));
    }

    #[test]
    fn fade_changes_reach_shared_control() {
        let fade = FadeControl::default();
        let (feed, _rx) = channel(fade.clone(), || {});
        feed.set_fade_duration(9.0).unwrap();
        assert_eq!(fade.get(), 9.0);
        assert!(feed.set_fade_duration(-1.0).is_err());
    }
}
