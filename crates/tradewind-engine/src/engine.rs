//! The frame scheduler.
//!
//! [`EngineLoop::frame`] is called once per display callback. Each call:
//!
//! 1. Asks the [`TimeAccumulator`] how many ticks are owed.
//! 2. Runs that many simulation ticks, each with `delta = tick_length`.
//!    There is no cap: a long stall is followed by a burst of catch-up ticks.
//! 3. Runs exactly one presentation pass with `delta = lag`.
//! 4. Re-projects the overlay if the menu stack changed during the frame.
//! 5. In debug mode, feeds the frame time into [`FrameStats`].
//!
//! Simulation and presentation never interleave. Stopping the loop means no
//! longer calling `frame`; a tick that has started always runs to completion.

use tradewind_core::world::World;

use crate::collaborators::OverlayProjector;
use crate::diagnostics::FrameStats;
use crate::time::{Speed, TimeAccumulator};
use crate::EngineError;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Configuration for an [`EngineLoop`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineConfig {
    /// Initial game speed.
    pub speed: Speed,
    /// Enables the rolling frame counter.
    pub debug: bool,
}

// ---------------------------------------------------------------------------
// FrameReport
// ---------------------------------------------------------------------------

/// What happened during one [`EngineLoop::frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Simulation ticks run this frame.
    pub ticks_run: u64,
    /// Lag handed to the presentation pass.
    pub lag_ms: f64,
    /// Whether the overlay was re-projected.
    pub overlay_rebuilt: bool,
    /// Components deactivated by this frame's updates.
    pub deactivated: usize,
    /// Frame rate, on frames that close a debug measuring window.
    pub fps: Option<f64>,
}

// ---------------------------------------------------------------------------
// EngineLoop
// ---------------------------------------------------------------------------

/// Drives a [`World`] from wall-clock timestamps.
pub struct EngineLoop {
    world: World,
    clock: TimeAccumulator,
    projector: Box<dyn OverlayProjector>,
    /// Present only in debug mode.
    stats: Option<FrameStats>,
    frames: u64,
    last_report: FrameReport,
}

impl EngineLoop {
    /// Create a loop whose clock starts at `now_ms`.
    ///
    /// The world's context is switched to the configured tick length and
    /// debug flag.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] for an invalid speed.
    pub fn new(
        mut world: World,
        config: EngineConfig,
        projector: Box<dyn OverlayProjector>,
        now_ms: f64,
    ) -> Result<Self, EngineError> {
        let clock = TimeAccumulator::new(config.speed, now_ms)?;
        let ctx = world.context_mut();
        ctx.set_tick_length(clock.tick_length_ms());
        ctx.set_debug(config.debug);

        Ok(Self {
            world,
            clock,
            projector,
            stats: config.debug.then(FrameStats::new),
            frames: 0,
            last_report: FrameReport::default(),
        })
    }

    /// Run one frame for the display callback at `now_ms`.
    ///
    /// # Errors
    ///
    /// A component failure under [`FailurePolicy::Halt`] is returned as
    /// [`EngineError::Core`]. Ticks owed but not yet run when the failure
    /// happened are dropped, since the clock has already consumed them; the
    /// caller decides whether to keep calling `frame`.
    ///
    /// [`FailurePolicy::Halt`]: tradewind_core::component::FailurePolicy::Halt
    pub fn frame(&mut self, now_ms: f64) -> Result<FrameReport, EngineError> {
        let frame_ms = now_ms - self.clock.previous_ms();
        let outcome = self.clock.tick(now_ms);
        let tick_length = self.clock.tick_length_ms();

        let mut deactivated = 0;
        for _ in 0..outcome.ticks {
            deactivated += self.world.run_simulation_tick(tick_length)?.deactivated;
        }
        deactivated += self.world.run_presentation(outcome.lag_ms)?.deactivated;

        let overlay_rebuilt = self.world.context_mut().menus_mut().consume_dirty();
        if overlay_rebuilt {
            let open = self.world.context().menus().entries();
            self.projector.project(open, self.world.components());
        }

        let fps = self.stats.as_mut().and_then(|s| s.record(frame_ms));
        self.frames += 1;

        let report = FrameReport {
            ticks_run: outcome.ticks,
            lag_ms: outcome.lag_ms,
            overlay_rebuilt,
            deactivated,
            fps,
        };
        tracing::trace!(
            frame = self.frames,
            ticks = report.ticks_run,
            lag_ms = report.lag_ms,
            overlay_rebuilt,
            "frame"
        );
        self.last_report = report;
        Ok(report)
    }

    /// Run a frame for each timestamp, stopping at the first error.
    pub fn run_frames<I>(&mut self, timestamps: I) -> Result<Vec<FrameReport>, EngineError>
    where
        I: IntoIterator<Item = f64>,
    {
        timestamps.into_iter().map(|t| self.frame(t)).collect()
    }

    /// Change the game speed. The current lag carries over.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] for an invalid speed; nothing changes.
    pub fn set_speed(&mut self, speed: Speed) -> Result<(), EngineError> {
        self.clock.set_speed(speed)?;
        self.world
            .context_mut()
            .set_tick_length(self.clock.tick_length_ms());
        tracing::debug!(?speed, tick_length_ms = self.clock.tick_length_ms(), "speed changed");
        Ok(())
    }

    /// Stop simulation time. Frames keep running presentation.
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Resume simulation time.
    pub fn resume(&mut self) {
        self.clock.resume();
    }

    // -- accessors ----------------------------------------------------------

    /// The world being driven.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world, for host-side input between frames.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Consume the loop and return its world.
    pub fn into_world(self) -> World {
        self.world
    }

    /// The time accumulator.
    pub fn clock(&self) -> &TimeAccumulator {
        &self.clock
    }

    /// Frame statistics, in debug mode.
    pub fn stats(&self) -> Option<&FrameStats> {
        self.stats.as_ref()
    }

    /// Number of frames completed.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Report of the last completed frame.
    pub fn last_report(&self) -> FrameReport {
        self.last_report
    }
}

impl std::fmt::Debug for EngineLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLoop")
            .field("world", &self.world)
            .field("clock", &self.clock)
            .field("stats", &self.stats)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
