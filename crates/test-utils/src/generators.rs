//! Generators for synthetic domain data.
//!
//! Output is deterministic for a given seed so benches and tests stay
//! reproducible.

/// Creates `count` elevation intervals.
///
/// Starts are spread over `[0, span)` and widths over `[0, max_width)`.
///
/// # Example
///
/// ```
/// use test_utils::create_interval_series;
///
/// let intervals = create_interval_series(100, 1000.0, 10.0, 7);
/// assert_eq!(intervals.len(), 100);
/// assert!(intervals.iter().all(|(start, end)| start <= end));
/// ```
pub fn create_interval_series(count: usize, span: f64, max_width: f64, seed: u32) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| {
            let start = unit(simple_hash(i as u32, 0, seed)) * span;
            let width = unit(simple_hash(i as u32, 1, seed)) * max_width;
            (start, start + width)
        })
        .collect()
}

/// Creates `count` integer values in `[0, distinct)`, repeating so that many
/// records share a value.
pub fn create_value_series(count: usize, distinct: u32, seed: u32) -> Vec<i64> {
    (0..count)
        .map(|i| (simple_hash(i as u32, 2, seed) % distinct.max(1)) as i64)
        .collect()
}

/// Creates `count` hourly ISO-8601 instants starting at `2012-01-01T00:00:00Z`.
pub fn create_hourly_instants(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let day = i / 24;
            let month = day / 28;
            format!(
                "2012-{:02}-{:02}T{:02}:00:00Z",
                month % 12 + 1,
                day % 28 + 1,
                i % 24
            )
        })
        .collect()
}

fn unit(hash: u32) -> f64 {
    hash as f64 / u32::MAX as f64
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}
