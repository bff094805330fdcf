//! Worker output line protocol.
//!
//! The worker streams newline-delimited UTF-8 text on stdout. A line is a
//! measurement sample iff splitting on `,` yields exactly four fields that
//! all parse as floating point, in the order
//! `(absolute time, voltage, current, resistance)`. Every other line is log
//! text. Classification is fail-open by design: garbled telemetry degrades
//! to a log line and must never abort the session.

use serde::{Deserialize, Serialize};

/// Number of comma-separated fields in a sample line.
const SAMPLE_FIELDS: usize = 4;

/// One structured measurement record parsed from a worker output line.
///
/// Voltage and current are retained for export; only `(time_s,
/// resistance_ohm)` is plotted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the worker started its measurement loop.
    pub time_s: f64,
    /// Source voltage in volts.
    pub voltage_v: f64,
    /// Measured current in amperes.
    pub current_a: f64,
    /// Computed resistance in ohms.
    pub resistance_ohm: f64,
}

/// Classification of a single worker output line.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerLine {
    /// A well-formed 4-field numeric sample.
    Sample(Sample),
    /// Anything else, forwarded verbatim to the log sink.
    Log(String),
}

/// Classifies one line of worker output. Never fails.
///
/// Fields are trimmed before the numeric parse; the worker pads some fields
/// with a leading space.
pub fn classify(line: &str) -> WorkerLine {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() == SAMPLE_FIELDS {
        let mut values = [0.0_f64; SAMPLE_FIELDS];
        let mut numeric = true;
        for (slot, field) in values.iter_mut().zip(&fields) {
            match field.trim().parse::<f64>() {
                Ok(value) => *slot = value,
                Err(_) => {
                    numeric = false;
                    break;
                }
            }
        }
        if numeric {
            return WorkerLine::Sample(Sample {
                time_s: values[0],
                voltage_v: values[1],
                current_a: values[2],
                resistance_ohm: values[3],
            });
        }
    }
    WorkerLine::Log(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_numeric_fields_classify_as_sample() {
        let line = "0.5,1.0,0.01,100.0";
        assert_eq!(
            classify(line),
            WorkerLine::Sample(Sample {
                time_s: 0.5,
                voltage_v: 1.0,
                current_a: 0.01,
                resistance_ohm: 100.0,
            })
        );
    }

    #[test]
    fn fields_with_padding_and_exponents_parse() {
        // Worker format: f"{t:.6f},{v:.6f},{i:.12e}, {r:.12e}"
        let line = "1.234567,1.000000,9.000000000000e-03, 1.111111111111e+02";
        match classify(line) {
            WorkerLine::Sample(sample) => {
                assert!((sample.current_a - 0.009).abs() < 1e-12);
                assert!((sample.resistance_ohm - 111.1111111111).abs() < 1e-6);
            }
            other => panic!("expected sample, got {other:?}"),
        }
    }

    #[test]
    fn wrong_field_count_is_log_text() {
        assert_eq!(
            classify("1.0,2.0,3.0"),
            WorkerLine::Log("1.0,2.0,3.0".to_string())
        );
        assert_eq!(
            classify("1.0,2.0,3.0,4.0,5.0"),
            WorkerLine::Log("1.0,2.0,3.0,4.0,5.0".to_string())
        );
    }

    #[test]
    fn non_numeric_field_downgrades_to_log() {
        // Four fields, one unparsable: still a log line, never an error.
        assert_eq!(
            classify("0.0,1.0,oops,100.0"),
            WorkerLine::Log("0.0,1.0,oops,100.0".to_string())
        );
    }

    #[test]
    fn free_text_is_log_text() {
        assert_eq!(
            classify("Connected to: USB0::0x05E6::0x2450"),
            WorkerLine::Log("Connected to: USB0::0x05E6::0x2450".to_string())
        );
        assert_eq!(classify("garbage"), WorkerLine::Log("garbage".to_string()));
    }

    #[test]
    fn nan_fields_still_count_as_numeric() {
        // The worker emits nan for failed instrument reads.
        match classify("2.0,1.0,nan,nan") {
            WorkerLine::Sample(sample) => {
                assert!(sample.current_a.is_nan());
                assert!(sample.resistance_ohm.is_nan());
            }
            other => panic!("expected sample, got {other:?}"),
        }
    }
}
