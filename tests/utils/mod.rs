// Integration test utilities
//
// Writers for synthetic experiment directories in the on-disk trial format.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Zero-mean jitter added to every synthetic session (ms)
pub const JITTER: [f64; 12] = [
    4.0, -3.0, 6.5, -5.5, 2.0, -1.0, 3.5, -4.5, 1.5, -2.5, 5.0, -6.0,
];

/// Twelve trials around `center` with zero-mean jitter
pub fn session_values(center: f64) -> Vec<f64> {
    JITTER.iter().map(|j| center + j).collect()
}

/// Write one session file with the given reaction times
pub fn write_session(
    dir: &Path,
    subject: &str,
    status: &str,
    timestamp: &str,
    stimulus_offset: i32,
    rts: &[f64],
) {
    let mut body = String::from("--- Settings ---\n");
    body.push_str(&format!("StimulusOffset,{}\n", stimulus_offset));
    body.push_str("TrialCount,12\n");
    body.push_str("Trial,Direction,ReactionTime_ms\n");
    for (i, rt) in rts.iter().enumerate() {
        let direction = if i % 2 == 0 { "Left" } else { "Right" };
        body.push_str(&format!("{},{},{}\n", i + 1, direction, rt));
    }
    body.push_str("--- Summary ---\n");
    body.push_str("MeanReactionTime,0\n");

    let name = format!("Data_{}_{}_{}.csv", subject, status, timestamp);
    fs::write(dir.join(name), body).expect("write session file");
}

/// Write the six sessions of one subject in protocol order
///
/// Baseline and the two post-training measurements are centred on the
/// given means; EMS sessions carry arbitrary values.
pub fn write_subject(dir: &Path, subject: &str, baseline: f64, post1: f64, post2: f64) {
    let ems = session_values(220.0);
    write_session(dir, subject, "EMS_ON", "20240501_090000", 40, &ems);
    write_session(dir, subject, "EMS_OFF", "20240501_091500", 0, &session_values(baseline));
    write_session(dir, subject, "EMS_ON", "20240501_093000", 40, &ems);
    write_session(dir, subject, "EMS_ON", "20240501_100000", 40, &ems);
    write_session(dir, subject, "EMS_OFF", "20240501_103000", 40, &session_values(post1));
    write_session(dir, subject, "EMS_OFF", "20240501_110000", 40, &session_values(post2));
}
