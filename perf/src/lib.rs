//! Shared helpers for the basalt benchmarks.

/// Unique region path under /tmp so parallel bench runs do not collide.
pub fn temp_region_path(label: &str) -> String {
    let pid = std::process::id();
    format!("/tmp/basalt_bench_{label}_{pid}")
}

/// Payload of `len` bytes with non-constant content, so the CRC pass does
/// representative work.
pub fn make_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) % 251) as u8).collect()
}

/// A representative topic snapshot: a handful of mixed-shape topics of
/// the size a telemetry tick typically carries.
pub fn sample_snapshot() -> serde_json::Value {
    serde_json::json!({
        "speed": 287.4,
        "gear": 7,
        "rpm": 11_450,
        "tyres": { "fl": 97.1, "fr": 96.8, "rl": 101.3, "rr": 100.9 },
        "lap": { "number": 23, "sector": 2, "delta_ms": -142 }
    })
}
