//! # Simulation Time and Volume Heuristics
//!
//! kkit files carry explicit step sizes, a run time and a default volume.
//! Models rarely specify all of them, so the writer derives what is missing.
//!
//! The clock is an explicit value (`SimClock`) handed to the estimator, not
//! a process-wide singleton.

use crate::graph::ModelGraph;
use crate::primitives::{
    DEFAULT_RUN_TIME, DEFAULT_SIM_DT, FALLBACK_VOLUME, KINETICS_COMPARTMENT, NUM_TICKS,
    PLOT_DT_TICK, PLOT_POINTS_PER_RUN, SIM_DT_TICK, SIM_STEPS_PER_PLOT,
};
use crate::{EntityId, KkitError};
use serde::{Deserialize, Serialize};

// =============================================================================
// SIMULATION CLOCK
// =============================================================================

/// Simulation-control settings: run time plus one step size per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    pub run_time: f64,
    pub dts: [f64; NUM_TICKS],
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            run_time: 0.0,
            dts: [0.0; NUM_TICKS],
        }
    }
}

impl SimClock {
    /// Clock with the given run time and all ticks unset.
    #[must_use]
    pub fn new(run_time: f64) -> Self {
        Self {
            run_time,
            ..Self::default()
        }
    }

    /// Set one tick's step size. Out-of-range ticks are ignored.
    #[must_use]
    pub fn with_tick(mut self, tick: usize, dt: f64) -> Self {
        if let Some(slot) = self.dts.get_mut(tick) {
            *slot = dt;
        }
        self
    }

    /// Set the chemical simulation step (tick 16).
    #[must_use]
    pub fn with_sim_dt(self, dt: f64) -> Self {
        self.with_tick(SIM_DT_TICK, dt)
    }

    /// Set the plot step (tick 18).
    #[must_use]
    pub fn with_plot_dt(self, dt: f64) -> Self {
        self.with_tick(PLOT_DT_TICK, dt)
    }

    #[must_use]
    pub fn sim_dt(&self) -> f64 {
        self.dts[SIM_DT_TICK]
    }

    #[must_use]
    pub fn plot_dt(&self) -> f64 {
        self.dts[PLOT_DT_TICK]
    }
}

/// Step sizes and run time the header is written with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimTimes {
    pub run_time: f64,
    pub sim_dt: f64,
    pub plot_dt: f64,
}

// =============================================================================
// ESTIMATORS
// =============================================================================

/// Derive run time, simulation step and plot step from the clock.
///
/// The checks run in a fixed order and each one sees the result of the
/// previous ones:
/// 1. non-positive run time becomes 100
/// 2. non-positive plot step becomes `run_time / 200`
/// 3. zero simulation step becomes 0.01
/// 4. a simulation step above the plot step becomes `plot_dt / 100`
#[must_use]
pub fn estimate_sim_times(clock: &SimClock) -> SimTimes {
    let mut run_time = clock.run_time;
    if run_time <= 0.0 {
        run_time = DEFAULT_RUN_TIME;
    }

    let mut sim_dt = clock.sim_dt();
    let mut plot_dt = clock.plot_dt();
    if plot_dt <= 0.0 {
        plot_dt = run_time / PLOT_POINTS_PER_RUN;
    }
    if sim_dt == 0.0 {
        sim_dt = DEFAULT_SIM_DT;
    }
    if sim_dt > plot_dt {
        sim_dt = plot_dt / SIM_STEPS_PER_PLOT;
    }

    SimTimes {
        run_time,
        sim_dt,
        plot_dt,
    }
}

/// Estimate the model's default volume from its direct compartment children.
///
/// A child named `kinetics` wins outright; otherwise the largest volume is
/// used, and a model without a positive compartment volume falls back to
/// `1e-15`.
pub fn estimate_default_volume<G: ModelGraph + ?Sized>(
    graph: &G,
    model: EntityId,
) -> Result<f64, KkitError> {
    let mut max_vol = 0.0_f64;
    for child in graph.children(model)? {
        if !graph.kind(child)?.is_compartment() {
            continue;
        }
        let vol = graph.get_f64(child, "volume")?;
        if graph.name(child)? == KINETICS_COMPARTMENT {
            return Ok(vol);
        }
        if max_vol < vol {
            max_vol = vol;
        }
    }
    if max_vol > 0.0 {
        Ok(max_vol)
    } else {
        Ok(FALLBACK_VOLUME)
    }
}

// =============================================================================
// TESTS
// =============================================================================
