//! Edge-case tests for day chunking and the codec working together.

use rangeseries_core::{
    chunk_by_day, decode, encode, flatten, utc_day, EncodeOptions, Error, EventPayload,
    SubjectKey,
};
use serde_json::json;
use std::collections::BTreeSet;

const DAY_MS: i64 = 86_400_000;
const HOUR_MS: i64 = 3_600_000;
// 2015-11-18T00:00:00Z
const MIDNIGHT: i64 = 1_447_804_800_000;

fn series(timestamps: &[i64]) -> Vec<EventPayload> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| EventPayload::new(*ts, "reading", json!({ "seq": i })))
        .collect()
}

// ---------------------------------------------------------------
// Chunk count equals distinct day count for sorted input
// ---------------------------------------------------------------

#[test]
fn sorted_series_yields_one_chunk_per_day() {
    let layouts: Vec<Vec<i64>> = vec![
        vec![MIDNIGHT],
        vec![MIDNIGHT, MIDNIGHT + 1, MIDNIGHT + DAY_MS - 1],
        vec![MIDNIGHT + 23 * HOUR_MS, MIDNIGHT + 25 * HOUR_MS],
        (0..48).map(|h| MIDNIGHT + h * HOUR_MS).collect(),
        (0..30).map(|d| MIDNIGHT + d * 3 * DAY_MS + 7).collect(),
        vec![MIDNIGHT, MIDNIGHT + 7 * DAY_MS, MIDNIGHT + 14 * DAY_MS],
    ];

    for timestamps in layouts {
        let distinct: BTreeSet<_> = timestamps.iter().map(|ts| utc_day(*ts).unwrap()).collect();
        let chunks = chunk_by_day(series(&timestamps)).unwrap();

        assert_eq!(chunks.len(), distinct.len(), "layout {timestamps:?}");

        let mut previous = None;
        for chunk in &chunks {
            let day = utc_day(chunk.timestamp).unwrap();
            assert!(chunk.entries.iter().all(|e| utc_day(e.timestamp).unwrap() == day));
            assert_eq!(chunk.timestamp, chunk.entries[0].timestamp);
            if let Some(prev) = previous {
                assert!(day > prev, "chunks must follow first-occurrence order");
            }
            previous = Some(day);
        }

        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total, timestamps.len());
    }
}

#[test]
fn empty_series_is_rejected() {
    assert!(matches!(chunk_by_day(Vec::new()), Err(Error::InvalidArgument(_))));
}

#[test]
fn pre_epoch_timestamps_chunk_by_utc_date() {
    let chunks = chunk_by_day(series(&[-DAY_MS - 1, -DAY_MS + 1, -1, 1])).unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].len(), 1);
    assert_eq!(chunks[1].len(), 2);
    assert_eq!(chunks[2].len(), 1);
}

// ---------------------------------------------------------------
// Chunk -> codec -> flatten recovers the original series
// ---------------------------------------------------------------

#[test]
fn chunked_series_flattens_back_in_order() {
    let timestamps: Vec<i64> = (0..40).map(|i| MIDNIGHT + i * 5 * HOUR_MS).collect();
    let original = series(&timestamps);
    let key = SubjectKey::new("sensor-9", "reading");

    for options in [EncodeOptions::default(), EncodeOptions::compressed()] {
        let records: Vec<_> = chunk_by_day(original.clone())
            .unwrap()
            .into_iter()
            .map(|chunk| {
                let tag = chunk.type_tag.clone();
                let ts = chunk.timestamp;
                encode(&key, &tag, ts, &chunk.into_value(), options).unwrap()
            })
            .collect();

        let decoded = records.iter().map(decode).collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(flatten(decoded), original);
    }
}
