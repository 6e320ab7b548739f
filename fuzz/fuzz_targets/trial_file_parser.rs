#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    // Trial files come from external recording software; malformed bodies
    // must surface as errors, never panics
    let input = String::from_utf8_lossy(data);
    let _ = emsrt::trial_file::parse_trial_str(&input, Path::new("fuzz.csv"));
});
