#![no_main]

use libfuzzer_sys::fuzz_target;
use rangeseries_core::{chunk_by_day, decode, flatten, EventPayload, EventRecord};

fuzz_target!(|data: &[u8]| {
    // Stored records come back from an external table and may be corrupt:
    // - Malformed JSON
    // - Truncated or garbage LZ4 blocks
    // - Compressed flag that disagrees with the body
    // - Mismatched timestamps
    if let Ok(record) = serde_json::from_slice::<EventRecord>(data) {
        if let Ok(decoded) = decode(&record) {
            let _ = flatten(vec![decoded]);
        }
    }

    // Raw bytes as a compressed body
    if !data.is_empty() {
        let _ = lz4_flex::decompress_size_prepended(data);
    }

    // Arbitrary timestamps through the day chunker, including pre-epoch and out of range
    if data.len() >= 16 {
        let timestamps: Vec<i64> = data
            .chunks_exact(8)
            .take(64)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect();
        let events = timestamps
            .iter()
            .map(|ts| EventPayload::new(*ts, "fuzz", serde_json::Value::Null))
            .collect();
        if let Ok(chunks) = chunk_by_day(events) {
            let total: usize = chunks.iter().map(|c| c.len()).sum();
            assert_eq!(total, timestamps.len());
        }
    }
});
