#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Bias-locking engine (hardware-agnostic).
//!
//! All hardware access goes through `bias_traits::Sensor` and
//! `bias_traits::Actuator`.
//!
//! ## Flow
//!
//! - **Sweep** (`sweep`): full-range scan at the configured resolution.
//! - **Detect** (`detect`): peak, noise-gated null, quadrature target.
//! - **Acquire** (`acquire`): coarse walk into the target's basin, with a
//!   slope-debounced crossing check for quadrature.
//! - **Track** (`tracking`): signed bang-bang law for quadrature, slope check and
//!   debounced hill-climb for peak/null.
//! - **Saturation** (`saturation`): re-anchor from the rails.
//! - **Scheduler** (`runner`): control cycles, drift re-checks, flags.
//!
//! Steps are a range-checked `Step` newtype; no step arithmetic wraps.

pub mod acquire;
pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod detect;
pub mod error;
pub mod flags;
pub mod hw_error;
pub mod mocks;
pub mod plant;
pub mod runner;
pub mod saturation;
pub mod state;
pub mod status;
pub mod step;
pub mod sweep;
pub mod target;
pub mod tracking;

pub use acquire::AcquireReport;
pub use builder::BiasControllerBuilder;
pub use config::{SweepSettings, TrackingSettings};
pub use controller::BiasController;
pub use detect::{Detection, NOISE_FLOOR_V, detect};
pub use error::{AcquisitionError, BuildError, DetectionError, LockError, Result};
pub use flags::ControlFlags;
pub use runner::{RunParams, RunSummary, run};
pub use state::ControllerRuntimeState;
pub use status::{LockStatus, Phase};
pub use step::{Rail, STEP_MAX, STEP_MIN, Step};
pub use sweep::{Sample, SweepCurve};
pub use target::{Direction, LockMode, LockTarget};
