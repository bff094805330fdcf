//! Measurement session control.
//!
//! One session is one run of the measurement, from `start` to termination.
//! The controller validates the output target, spawns the worker, creates
//! the live series, and launches the reader task that drains worker output
//! until the stream closes. Stopping is cooperative: a stop token is written
//! to the worker's stdin and the worker exits on its own; the controller
//! never kills it.
//!
//! Display collaborators do not couple to the controller directly. They
//! receive [`SessionEvent`] notifications over an unbounded channel and read
//! the shared [`SeriesStore`]; commands (`start`, `stop_requested`, `clear`)
//! flow the other way from a single control context. The controller is not
//! reentrant.

use crate::config::WorkerSettings;
use crate::error::{AppResult, MeasurementError};
use crate::protocol::{self, WorkerLine};
use crate::series::{PlotPoint, SeriesStore};
use crate::validation::validate_output_target;
use crate::worker::{WorkerCommand, WorkerInput, WorkerProcess};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc;

/// Lifecycle state of the measurement session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No worker running.
    Idle,
    /// Worker spawned, reader task draining its output.
    Running,
    /// Stop token sent; waiting for the worker to exit on its own.
    Stopping,
}

/// Notifications emitted to display collaborators.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// A non-blank worker output line, verbatim. Sample lines are included:
    /// the console shows everything the worker prints.
    Log(String),
    /// A point was appended to the live series.
    SampleAppended {
        /// Name of the series the point landed in.
        series: String,
        /// The appended `(time, resistance)` point.
        point: PlotPoint,
    },
    /// The worker's output stream closed and the session returned to
    /// [`SessionState::Idle`], whether or not a stop was requested.
    Ended,
}

/// Measurement parameters and output target for one run.
///
/// Values are uninterpreted strings handed to the worker as positional
/// arguments; `AUTO` is valid for sample interval and current range.
#[derive(Clone, Debug)]
pub struct StartParams {
    /// Applied voltage in volts.
    pub voltage: String,
    /// Application time in seconds.
    pub time_s: String,
    /// Sample interval in seconds, or `AUTO`.
    pub sample_interval: String,
    /// Current range in amperes, or `AUTO`.
    pub current_range: String,
    /// Integration time in power line cycles.
    pub nplc: String,
    /// Compliance current in amperes.
    pub compliance_current: String,
    /// Folder the worker writes its output files into.
    pub output_folder: String,
    /// Base name (no extension) for the worker's output files.
    pub output_base_name: String,
}

/// The session state machine.
///
/// Owned by a single control context; `start`, `stop_requested` and `clear`
/// must not race each other. The reader task runs concurrently and is the
/// only writer of the live series while a session is active.
pub struct SessionController {
    store: SeriesStore,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: Arc<Mutex<SessionState>>,
    // Shared with the reader task so the handle is released on EOF, not
    // only on the next start.
    input: Arc<Mutex<Option<WorkerInput>>>,
    live_series: Option<String>,
    run_counter: u32,
}

impl SessionController {
    /// Creates a controller over `store` and returns the notification
    /// receiver for the display collaborator.
    pub fn new(store: SeriesStore) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (
            Self {
                store,
                events,
                state: Arc::new(Mutex::new(SessionState::Idle)),
                input: Arc::new(Mutex::new(None)),
                live_series: None,
                run_counter: 0,
            },
            receiver,
        )
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// The shared series store.
    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// Name of the live series of the most recent run, if any.
    pub fn live_series(&self) -> Option<&str> {
        self.live_series.as_deref()
    }

    /// True while the controller still holds the worker's control input.
    /// The handle is released when the session ends.
    pub fn worker_attached(&self) -> bool {
        self.input.lock().unwrap().is_some()
    }

    /// Starts a measurement run: validates the output target, spawns the
    /// worker, creates a fresh live series and launches the reader task.
    /// Returns the output path the worker will write to.
    ///
    /// Series from previous runs and loads are cleared once the new worker
    /// is up; on any failure the store is left untouched and no process
    /// remains.
    ///
    /// # Errors
    ///
    /// [`MeasurementError::SessionActive`] when not idle,
    /// [`MeasurementError::Validation`] for a failed output-target rule, or
    /// [`MeasurementError::Spawn`] when the worker cannot be launched. All
    /// are reported synchronously with no state change.
    pub fn start(
        &mut self,
        worker: &WorkerSettings,
        params: &StartParams,
    ) -> AppResult<PathBuf> {
        if self.state() != SessionState::Idle {
            return Err(MeasurementError::SessionActive);
        }
        let output_path =
            validate_output_target(&params.output_folder, &params.output_base_name)?;

        let command = WorkerCommand {
            executable: worker.executable.clone(),
            script: worker.script.clone(),
            voltage: params.voltage.clone(),
            time_s: params.time_s.clone(),
            sample_interval: params.sample_interval.clone(),
            current_range: params.current_range.clone(),
            nplc: params.nplc.clone(),
            compliance_current: params.compliance_current.clone(),
            output_folder: params.output_folder.trim().to_string(),
            output_base_name: params.output_base_name.trim().to_string(),
        };
        let mut process = WorkerProcess::spawn(&command).map_err(MeasurementError::Spawn)?;

        // A new run owns the chart: previous series leave with it.
        self.store.clear();
        self.run_counter = 1;
        let series_name = format!("Run {}", self.run_counter);
        self.store.create(&series_name)?;

        *self.input.lock().unwrap() = process.take_input();
        let stdout = process.take_stdout_lines();
        let stderr = process.take_stderr_lines();
        self.live_series = Some(series_name.clone());
        *self.state.lock().unwrap() = SessionState::Running;

        if let Some(lines) = stderr {
            let events = self.events.clone();
            tokio::spawn(async move {
                forward_stderr(lines, &events).await;
            });
        }

        let events = self.events.clone();
        let store = self.store.clone();
        let state = Arc::clone(&self.state);
        let input = Arc::clone(&self.input);
        tokio::spawn(async move {
            if let Some(lines) = stdout {
                drain_worker_output(lines, &store, &series_name, &events).await;
            }
            match process.wait().await {
                Ok(status) => tracing::info!(%status, "worker exited"),
                Err(err) => tracing::warn!(%err, "could not collect worker exit status"),
            }
            *state.lock().unwrap() = SessionState::Idle;
            // Release the control input before announcing the end.
            input.lock().unwrap().take();
            let _ = events.send(SessionEvent::Ended);
        });

        tracing::info!(output = %output_path.display(), "measurement session started");
        Ok(output_path)
    }

    /// Requests a graceful stop: writes the stop token to the worker's
    /// stdin and flushes, without waiting for exit. A write failure means
    /// the worker already exited and is treated as a successful stop.
    ///
    /// # Errors
    ///
    /// [`MeasurementError::NotRunning`] when the session is idle.
    pub async fn stop_requested(&mut self) -> AppResult<()> {
        {
            // Single lock scope so an EOF transition cannot interleave and
            // leave the state stuck in Stopping.
            let mut state = self.state.lock().unwrap();
            if *state == SessionState::Idle {
                return Err(MeasurementError::NotRunning);
            }
            *state = SessionState::Stopping;
        }
        // Take the handle out of the slot so the lock is not held across
        // the await.
        let taken = self.input.lock().unwrap().take();
        match taken {
            Some(mut input) => {
                if let Err(err) = input.send_stop().await {
                    tracing::warn!(%err, "stop token write failed; worker is already terminating");
                }
                // Hand the input back unless the session ended meanwhile.
                // The state check happens under the slot lock: the reader
                // task sets Idle before it empties the slot, so a handle
                // re-inserted here is still seen by its cleanup.
                let mut slot = self.input.lock().unwrap();
                if *self.state.lock().unwrap() != SessionState::Idle {
                    *slot = Some(input);
                }
            }
            None => {
                tracing::warn!("worker stdin unavailable; treating session as already stopping");
            }
        }
        Ok(())
    }

    /// Removes every series from the store and resets the run counter.
    /// A no-op when the store is already empty.
    pub fn clear(&mut self) {
        self.store.clear();
        self.run_counter = 0;
        self.live_series = None;
        tracing::debug!("series store cleared");
    }
}

/// The session reader loop: drains worker output lines until EOF or a
/// stream error, forwarding every non-blank line to the log sink and
/// appending sample lines to the live series in arrival order.
///
/// Generic over the line source so tests can feed it from memory; the
/// controller runs it over the worker's stdout.
pub async fn drain_worker_output<R>(
    mut lines: Lines<R>,
    store: &SeriesStore,
    series: &str,
    events: &mpsc::UnboundedSender<SessionEvent>,
) where
    R: AsyncBufRead + Unpin,
{
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = events.send(SessionEvent::Log(line.to_string()));
                if let WorkerLine::Sample(sample) = protocol::classify(line) {
                    let point = PlotPoint::new(sample.time_s, sample.resistance_ohm);
                    if store.append(series, point) {
                        let _ = events.send(SessionEvent::SampleAppended {
                            series: series.to_string(),
                            point,
                        });
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                // Same termination path as a clean EOF, surfaced as log text.
                let _ = events.send(SessionEvent::Log(format!(
                    "Measurement finished or error: {err}"
                )));
                break;
            }
        }
    }
}

/// Forwards worker stderr lines to the log sink. Stderr never carries
/// samples.
async fn forward_stderr<R>(mut lines: Lines<R>, events: &mpsc::UnboundedSender<SessionEvent>)
where
    R: AsyncBufRead + Unpin,
{
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = events.send(SessionEvent::Log(line.to_string()));
    }
}
