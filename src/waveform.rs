//! Biphasic stimulation waveform generator
//!
//! One cycle is four segments of `pulse_width_us` each:
//!
//! ```text
//!  +1 ┌──┐
//!   0 ┘  └──┐  ┌──
//!  -1       └──┘
//! ```
//!
//! `burst_count` cycles form one pulse; `pulse_count` pulses are separated
//! by `pulse_interval_us` of silence, with no trailing interval.

use crate::config::WaveformConfig;
use crate::error::{AnalysisError, Result};

pub const WAVEFORM_FILE_NAME: &str = "ems_waveform.csv";

/// Samples per SIMD reduction; partial sums of unit amplitudes stay exact in
/// f32 well below 2^24
const CHARGE_CHUNK: usize = 1 << 20;

/// One sample of the waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub time_us: u64,
    /// Normalised amplitude: +1, 0 or -1
    pub amplitude: i8,
}

/// A generated waveform and its timing
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<Sample>,
    /// Length of one biphasic cycle (µs)
    pub cycle_us: u64,
    /// Length of one pulse of `burst_count` cycles (µs)
    pub pulse_us: u64,
    /// Length of the whole stimulus (µs)
    pub total_us: u64,
}

impl Waveform {
    /// `time_us,amplitude` table
    pub fn to_csv(&self) -> String {
        let mut output = String::with_capacity(self.samples.len() * 8);
        output.push_str("time_us,amplitude\n");
        for s in &self.samples {
            output.push_str(&format!("{},{}\n", s.time_us, s.amplitude));
        }
        output
    }

    /// Net charge as the sum of all amplitudes (amplitude x samples)
    ///
    /// Zero for a balanced biphasic stimulus.
    pub fn net_charge(&self) -> Result<i64> {
        let amplitudes: Vec<f32> = self.samples.iter().map(|s| f32::from(s.amplitude)).collect();
        amplitudes.chunks(CHARGE_CHUNK).try_fold(0i64, |total, chunk| {
            let sum = trueno::Vector::from_slice(chunk)
                .sum()
                .map_err(|e| AnalysisError::Numeric(format!("waveform charge: {e}")))?;
            Ok(total + sum.round() as i64)
        })
    }

    /// One-line description of the timing
    pub fn summary(&self, config: &WaveformConfig) -> String {
        format!(
            "Biphasic pulse: {} µs/phase, cycle {} µs, {} cycles = {} µs per pulse, {} pulse(s), stimulus {} µs",
            config.pulse_width_us,
            self.cycle_us,
            config.burst_count,
            self.pulse_us,
            config.pulse_count,
            self.total_us
        )
    }
}

/// Generate the sampled waveform
///
/// # Example
/// ```
/// use emsrt::config::WaveformConfig;
/// use emsrt::waveform::generate_biphasic;
///
/// let waveform = generate_biphasic(&WaveformConfig::default()).unwrap();
/// assert_eq!(waveform.cycle_us, 200);
/// assert_eq!(waveform.total_us, 600);
/// assert_eq!(waveform.samples.len(), 600);
/// ```
pub fn generate_biphasic(config: &WaveformConfig) -> Result<Waveform> {
    config.validate()?;

    let dt = u64::from(config.dt_us);
    let per_segment = u64::from(config.pulse_width_us) / dt;
    let interval_samples = u64::from(config.pulse_interval_us) / dt;

    let mut samples = Vec::new();
    let mut t = 0u64;
    let mut push = |amplitude: i8, count: u64| {
        for _ in 0..count {
            samples.push(Sample { time_us: t, amplitude });
            t += dt;
        }
    };

    for pulse in 0..config.pulse_count {
        for _ in 0..config.burst_count {
            push(1, per_segment);
            push(0, per_segment);
            push(-1, per_segment);
            push(0, per_segment);
        }
        if pulse + 1 < config.pulse_count {
            push(0, interval_samples);
        }
    }

    let cycle_us = 4 * u64::from(config.pulse_width_us);
    let pulse_us = cycle_us * u64::from(config.burst_count);
    let pulse_count = u64::from(config.pulse_count);
    let total_us = pulse_us * pulse_count + u64::from(config.pulse_interval_us) * (pulse_count - 1);

    tracing::debug!("Generated {} waveform samples", samples.len());

    Ok(Waveform {
        samples,
        cycle_us,
        pulse_us,
        total_us,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_waveform_shape() {
        let w = generate_biphasic(&WaveformConfig::default()).unwrap();
        assert_eq!(w.samples.len(), 600);
        assert_eq!(w.samples[0], Sample { time_us: 0, amplitude: 1 });
        assert_eq!(w.samples[49].amplitude, 1);
        assert_eq!(w.samples[50].amplitude, 0);
        assert_eq!(w.samples[100].amplitude, -1);
        assert_eq!(w.samples[150].amplitude, 0);
        assert_eq!(w.samples[200].amplitude, 1);
        assert_eq!(w.samples[599].time_us, 599);
    }

    #[test]
    fn test_biphasic_is_charge_balanced() {
        let w = generate_biphasic(&WaveformConfig::default()).unwrap();
        assert_eq!(w.net_charge().unwrap(), 0);

        let long = WaveformConfig {
            burst_count: 2_000,
            pulse_count: 3,
            pulse_interval_us: 1_000,
            ..WaveformConfig::default()
        };
        assert_eq!(generate_biphasic(&long).unwrap().net_charge().unwrap(), 0);
    }

    #[test]
    fn test_net_charge_of_unbalanced_samples() {
        let mut w = generate_biphasic(&WaveformConfig::default()).unwrap();
        // drop the trailing zero segment and the cathodic segment of the last cycle
        w.samples.truncate(500);
        assert_eq!(w.net_charge().unwrap(), 50);
        w.samples.clear();
        assert_eq!(w.net_charge().unwrap(), 0);
    }

    #[test]
    fn test_interval_between_pulses_only() {
        let config = WaveformConfig {
            pulse_width_us: 10,
            burst_count: 1,
            pulse_count: 2,
            pulse_interval_us: 100,
            ..WaveformConfig::default()
        };
        let w = generate_biphasic(&config).unwrap();
        // 2 pulses of 40 samples plus one interval of 100
        assert_eq!(w.samples.len(), 180);
        assert_eq!(w.total_us, 180);
        assert!(w.samples[40..140].iter().all(|s| s.amplitude == 0));
        assert_eq!(w.samples[140].amplitude, 1);
        assert_eq!(w.samples.last().unwrap().time_us, 179);
    }

    #[test]
    fn test_coarser_time_step() {
        let config = WaveformConfig {
            dt_us: 10,
            ..WaveformConfig::default()
        };
        let w = generate_biphasic(&config).unwrap();
        assert_eq!(w.samples.len(), 60);
        assert_eq!(w.samples[1].time_us, 10);
        assert_eq!(w.total_us, 600);
    }

    #[test]
    fn test_csv_and_summary() {
        let config = WaveformConfig::default();
        let w = generate_biphasic(&config).unwrap();
        let csv = w.to_csv();
        assert!(csv.starts_with("time_us,amplitude\n0,1\n"));
        assert_eq!(csv.lines().count(), 601);
        let summary = w.summary(&config);
        assert!(summary.contains("cycle 200 µs"));
        assert!(summary.contains("stimulus 600 µs"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = WaveformConfig {
            burst_count: 0,
            ..WaveformConfig::default()
        };
        assert!(matches!(
            generate_biphasic(&config).unwrap_err(),
            AnalysisError::InvalidConfig(_)
        ));
    }
}
