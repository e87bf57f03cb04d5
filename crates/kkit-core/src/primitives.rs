//! # Writer Primitives
//!
//! Fixed constants of the kkit dump format and of the defaulting
//! heuristics. These are compiled in; nothing in the model overrides them.

/// Avogadro's number, as used for the `kpool` volume-scale column.
pub const AVOGADRO: f64 = 6.022_140_857e23;

/// Number of clock ticks in `SimClock::dts`.
pub const NUM_TICKS: usize = 20;

/// Tick carrying the chemical simulation step.
pub const SIM_DT_TICK: usize = 16;

/// Tick carrying the plot (recording) step.
pub const PLOT_DT_TICK: usize = 18;

/// Run time used when the clock does not carry a positive one.
pub const DEFAULT_RUN_TIME: f64 = 100.0;

/// Simulation step used when the clock carries none.
pub const DEFAULT_SIM_DT: f64 = 0.01;

/// Plot steps per run when the plot step is derived from the run time.
pub const PLOT_POINTS_PER_RUN: f64 = 200.0;

/// Minimum number of simulation steps per plot step.
pub const SIM_STEPS_PER_PLOT: f64 = 100.0;

/// Default volume when the model has no compartment children.
pub const FALLBACK_VOLUME: f64 = 1.0e-15;

/// Compartment name that always defines the default volume.
pub const KINETICS_COMPARTMENT: &str = "kinetics";

/// Path segments a recorder must sit under to be written, in search order.
pub const GRAPH_NAMESPACES: [&str; 2] = ["graphs", "moregraphs"];

/// Sub-path of an entity's annotation.
pub const ANNOTATION_NAME: &str = "info";

/// Annotation colors and position used when an entity has none.
pub const DEFAULT_COLOR: &str = "cyan";
pub const DEFAULT_TEXT_COLOR: &str = "black";
