//! # Resistance DAQ Core Library
//!
//! This crate is the core library for the `resistance_daq` application: a
//! measurement session controller for a Keithley 2450 resistance bench. The
//! actual instrument control lives in an external worker process; this crate
//! supervises that process, consumes its line-oriented output protocol, and
//! accumulates the resulting samples into plottable series. Keeping the logic
//! in a library lets the headless CLI (`main.rs`) and any future display
//! frontend share the same session core.
//!
//! ## Crate Structure
//!
//! - **`config`**: Loads application settings (worker paths, parameter
//!   defaults) from TOML files. See `config::Settings`.
//! - **`console`**: A bounded, timestamped buffer of worker output lines for
//!   display collaborators.
//! - **`error`**: The central `MeasurementError` enum used across the crate.
//! - **`import`**: Historical CSV import into the series store
//!   (all-or-nothing per file).
//! - **`protocol`**: The worker output line codec — classifies each line as
//!   a structured `Sample` or free-form log text.
//! - **`series`**: Named, ordered, append-only `(x, y)` series and the
//!   thread-safe `SeriesStore` shared between the session reader and the
//!   display layer.
//! - **`session`**: The session state machine (`Idle`/`Running`/`Stopping`),
//!   the output drain loop, and the `SessionEvent` notification channel.
//! - **`validation`**: Pre-start validation of the output folder and file
//!   name, applied before any process is spawned.
//! - **`worker`**: Worker process supervision — argument vector, spawn,
//!   stdin control writes, stdout/stderr line streams.

pub mod config;
pub mod console;
pub mod error;
pub mod import;
pub mod protocol;
pub mod series;
pub mod session;
pub mod validation;
pub mod worker;
