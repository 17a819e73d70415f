//! Frame sampling.
//!
//! Face detection is far more expensive than frame capture, so the pipeline
//! forwards only one frame in every `interval` to the detector. This bounds
//! the detector call rate independently of the camera frame rate.

use anyhow::{anyhow, Result};

/// Default number of camera frames per detector invocation.
pub const DEFAULT_SAMPLING_INTERVAL: u32 = 30;

/// Decides, per incoming frame, whether it goes to the detector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplingScheduler {
    interval: u32,
    counter: u32,
    frames_seen: u64,
}

impl SamplingScheduler {
    pub fn new(interval: u32) -> Result<Self> {
        if interval == 0 {
            return Err(anyhow!("sampling interval must be >= 1"));
        }
        Ok(Self {
            interval,
            counter: 0,
            frames_seen: 0,
        })
    }

    /// Count one frame. Returns true when this frame should be processed.
    pub fn on_frame(&mut self) -> bool {
        self.frames_seen += 1;
        self.counter += 1;
        if self.counter >= self.interval {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Frames counted since the last processed frame.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Total frames counted since creation.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl Default for SamplingScheduler {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLING_INTERVAL,
            counter: 0,
            frames_seen: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        assert!(SamplingScheduler::new(0).is_err());
    }

    #[test]
    fn fires_exactly_once_per_interval() -> Result<()> {
        for interval in [1u32, 2, 3, 7, 30] {
            let mut scheduler = SamplingScheduler::new(interval)?;
            let calls = interval * 5;
            let mut fired = Vec::new();
            for call in 1..=calls {
                if scheduler.on_frame() {
                    fired.push(call);
                }
                assert!(scheduler.counter() < interval);
            }
            let expected: Vec<u32> = (1..=5).map(|n| n * interval).collect();
            assert_eq!(fired, expected, "interval {}", interval);
            assert_eq!(scheduler.frames_seen(), u64::from(calls));
        }
        Ok(())
    }

    #[test]
    fn interval_of_one_processes_every_frame() -> Result<()> {
        let mut scheduler = SamplingScheduler::new(1)?;
        assert!((0..10).all(|_| scheduler.on_frame()));
        Ok(())
    }

    #[test]
    fn default_samples_every_thirtieth_frame() {
        let mut scheduler = SamplingScheduler::default();
        let fired = (0..90).filter(|_| scheduler.on_frame()).count();
        assert_eq!(fired, 3);
        assert_eq!(scheduler.interval(), DEFAULT_SAMPLING_INTERVAL);
    }
}
