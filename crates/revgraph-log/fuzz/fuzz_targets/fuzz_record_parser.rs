#![no_main]

use libfuzzer_sys::fuzz_target;
use revgraph_log::parser::{RecordReader, parse_record};

fuzz_target!(|data: &[u8]| {
    let _ = parse_record(data);
    for chunk in RecordReader::new(data).flatten() {
        let _ = parse_record(&chunk);
    }
});
