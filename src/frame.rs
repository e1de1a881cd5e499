//! Explicit frame loop bookkeeping.
//!
//! Whether the loop keeps going is decided here rather than by whoever
//! happens to schedule the next redraw, so the display driver and the
//! headless runner stop under the same conditions.

use std::num::NonZeroU64;
use web_time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Termination {
    /// Run until the host closes the window
    #[default]
    Never,
    /// Stop once this many frames were rendered
    AfterFrames(NonZeroU64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameLoop {
    termination: Termination,
    frames: u64,
    terminated: bool,
}

impl FrameLoop {
    pub fn new(termination: Termination) -> Self {
        Self {
            termination,
            frames: 0,
            terminated: false,
        }
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Frames completed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Stops the loop regardless of the termination policy
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Records a finished frame and decides whether another one follows
    pub fn advance(&mut self) -> LoopControl {
        if self.terminated {
            return LoopControl::Exit;
        }

        self.frames += 1;

        if let Termination::AfterFrames(limit) = self.termination {
            if self.frames >= limit.get() {
                self.terminated = true;
            }
        }

        if self.terminated {
            LoopControl::Exit
        } else {
            LoopControl::Continue
        }
    }

    /// `while !terminated { render_frame() }`
    /// Stops early on the first error. Returns the number of frames rendered.
    pub fn run<E>(&mut self, mut render_frame: impl FnMut(u64) -> Result<(), E>) -> Result<u64, E> {
        while !self.is_terminated() {
            render_frame(self.frames)?;
            self.advance();
        }

        Ok(self.frames)
    }
}

/// Frame rate bookkeeping for periodic log output
#[derive(Clone, Debug)]
pub struct FrameStats {
    window_start: Instant,
    window_frames: u64,
    report_every: Duration,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl FrameStats {
    pub fn new(report_every: Duration) -> Self {
        Self {
            window_start: Instant::now(),
            window_frames: 0,
            report_every,
        }
    }

    /// Counts a frame; returns the average frames per second once per reporting window
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        self.window_frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.report_every {
            return None;
        }

        let fps = self.window_frames as f64 / elapsed.as_secs_f64();
        self.window_start = now;
        self.window_frames = 0;
        Some(fps)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn limit(frames: u64) -> Termination {
        Termination::AfterFrames(NonZeroU64::new(frames).unwrap())
    }

    #[test]
    fn never_keeps_going() {
        let mut frame_loop = FrameLoop::new(Termination::Never);
        for _ in 0..1000 {
            assert_eq!(LoopControl::Continue, frame_loop.advance());
        }
        assert_eq!(1000, frame_loop.frames());
        assert!(!frame_loop.is_terminated());
    }

    #[test]
    fn stops_after_limit() {
        let mut frame_loop = FrameLoop::new(limit(3));
        assert_eq!(LoopControl::Continue, frame_loop.advance());
        assert_eq!(LoopControl::Continue, frame_loop.advance());
        assert_eq!(LoopControl::Exit, frame_loop.advance());
        assert!(frame_loop.is_terminated());

        // further frames are not counted
        assert_eq!(LoopControl::Exit, frame_loop.advance());
        assert_eq!(3, frame_loop.frames());
    }

    #[test]
    fn terminate_overrides_policy() {
        let mut frame_loop = FrameLoop::new(Termination::Never);
        frame_loop.advance();
        frame_loop.terminate();
        assert_eq!(LoopControl::Exit, frame_loop.advance());
        assert_eq!(1, frame_loop.frames());
    }

    #[test]
    fn run_renders_exactly_limit_frames() {
        let mut frame_loop = FrameLoop::new(limit(5));
        let mut seen = vec![];

        let frames = frame_loop
            .run(|frame| {
                seen.push(frame);
                Ok::<(), ()>(())
            })
            .unwrap();

        assert_eq!(5, frames);
        assert_eq!(vec![0, 1, 2, 3, 4], seen);
    }

    #[test]
    fn run_stops_on_error() {
        let mut frame_loop = FrameLoop::new(Termination::Never);

        let result = frame_loop.run(|frame| if frame == 2 { Err(frame) } else { Ok(()) });

        assert_eq!(Err(2), result);
        assert_eq!(2, frame_loop.frames());
    }

    #[test]
    fn stats_report_once_per_window() {
        let start = Instant::now();
        let mut stats = FrameStats {
            window_start: start,
            window_frames: 0,
            report_every: Duration::from_secs(1),
        };

        assert_eq!(None, stats.record(start + Duration::from_millis(500)));
        let fps = stats.record(start + Duration::from_secs(2)).unwrap();
        assert!((fps - 1.0).abs() < 1e-9);
        assert_eq!(None, stats.record(start + Duration::from_millis(2100)));
    }
}
