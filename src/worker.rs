//! Worker process supervision.
//!
//! The measurement worker is an external executable (a Python script in the
//! reference deployment) invoked with ten positional string arguments, fixed
//! order, no flags. The supervisor owns the child's standard streams: stdout
//! carries the line protocol, stdin accepts the stop token, stderr is drained
//! as log text. Exit is observed passively — the worker is expected to leave
//! on its own after a stop token or after finishing its program; there is no
//! kill escalation.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

/// The literal line written to the worker's stdin to request a graceful stop.
pub const STOP_TOKEN: &str = "STOP";

/// Invocation of the measurement worker.
///
/// All measurement values are passed through as uninterpreted strings: the
/// worker itself resolves `AUTO` for sample interval and current range.
#[derive(Clone, Debug)]
pub struct WorkerCommand {
    /// Worker interpreter or binary.
    pub executable: PathBuf,
    /// Measurement script path, first positional argument.
    pub script: PathBuf,
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

impl WorkerCommand {
    /// The positional argument vector after the executable, in wire order.
    pub fn argv(&self) -> Vec<String> {
        vec![
            self.script.display().to_string(),
            self.voltage.clone(),
            self.time_s.clone(),
            self.sample_interval.clone(),
            self.current_range.clone(),
            self.nplc.clone(),
            self.compliance_current.clone(),
            self.output_folder.clone(),
            self.output_base_name.clone(),
        ]
    }
}

/// The worker's stdin, kept by the controller for the stop token.
pub struct WorkerInput(ChildStdin);

impl WorkerInput {
    /// Writes one text line followed by a newline, then flushes.
    ///
    /// # Errors
    ///
    /// Propagates the underlying pipe error; a `BrokenPipe` here means the
    /// worker already exited, which callers treat as already-stopping.
    pub async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.0.write_all(line.as_bytes()).await?;
        self.0.write_all(b"\n").await?;
        self.0.flush().await
    }

    /// Writes the stop token line and flushes.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write_line`](Self::write_line).
    pub async fn send_stop(&mut self) -> io::Result<()> {
        self.write_line(STOP_TOKEN).await
    }
}

/// A spawned worker process with its standard streams.
#[derive(Debug)]
pub struct WorkerProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl WorkerProcess {
    /// Spawns the worker with the command's argument vector and piped stdio.
    ///
    /// # Errors
    ///
    /// Returns the OS error when the executable is missing, not executable,
    /// or the argument vector cannot be passed.
    pub fn spawn(command: &WorkerCommand) -> io::Result<Self> {
        let mut child = Command::new(&command.executable)
            .args(command.argv())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        tracing::info!(
            executable = %command.executable.display(),
            script = %command.script.display(),
            pid = child.id(),
            "worker spawned"
        );

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
        })
    }

    /// Takes the control input handle. Subsequent calls return `None`.
    pub fn take_input(&mut self) -> Option<WorkerInput> {
        self.stdin.take().map(WorkerInput)
    }

    /// Takes the stdout line stream (the measurement protocol).
    pub fn take_stdout_lines(&mut self) -> Option<Lines<BufReader<ChildStdout>>> {
        self.stdout.take().map(|out| BufReader::new(out).lines())
    }

    /// Takes the stderr line stream (log text only).
    pub fn take_stderr_lines(&mut self) -> Option<Lines<BufReader<ChildStderr>>> {
        self.stderr.take().map(|err| BufReader::new(err).lines())
    }

    /// OS process id, if the worker is still running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Checks for exit without blocking.
    ///
    /// # Errors
    ///
    /// Propagates the underlying wait error.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Waits for the worker to exit and reaps it.
    ///
    /// # Errors
    ///
    /// Propagates the underlying wait error.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }
}

/// Runs `<executable> --version` as a startup environment check.
///
/// Mirrors the interpreter probe the measurement bench performs before a
/// run: a broken virtual environment is reported up front instead of as a
/// confusing mid-run spawn failure.
///
/// # Errors
///
/// Returns an error when the executable cannot be launched or exits
/// non-zero.
pub async fn probe(executable: &Path) -> io::Result<String> {
    let output = Command::new(executable).arg("--version").output().await?;
    if !output.status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("version probe exited with {}", output.status),
        ));
    }
    // Python 2 printed the version on stderr; accept either stream.
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> WorkerCommand {
        WorkerCommand {
            executable: PathBuf::from("venv/bin/python"),
            script: PathBuf::from("scripts/resistance_keithley.py"),
            voltage: "1".into(),
            time_s: "3".into(),
            sample_interval: "AUTO".into(),
            current_range: "AUTO".into(),
            nplc: "1".into(),
            compliance_current: "0.1".into(),
            output_folder: "/data/runs".into(),
            output_base_name: "sample_a".into(),
        }
    }

    #[test]
    fn argv_is_positional_and_in_wire_order() {
        let argv = command().argv();
        assert_eq!(
            argv,
            vec![
                "scripts/resistance_keithley.py",
                "1",
                "3",
                "AUTO",
                "AUTO",
                "1",
                "0.1",
                "/data/runs",
                "sample_a",
            ]
        );
        // Ten positional strings on the wire, counting the executable.
        assert_eq!(argv.len() + 1, 10);
    }

    #[tokio::test]
    async fn spawn_reports_missing_executable() {
        let mut cmd = command();
        cmd.executable = PathBuf::from("/nonexistent/python-interpreter");
        let err = WorkerProcess::spawn(&cmd).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn probe_reports_missing_executable() {
        let err = probe(Path::new("/nonexistent/python-interpreter"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
