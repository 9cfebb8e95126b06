//! Test fixtures and sample data

use chrono::{Duration, TimeZone, Utc};

/// `rclone lsf` output for the given names, one per line
pub fn listing(names: &[&str]) -> String {
    let mut out = names.join("\n");
    out.push('\n');
    out
}

/// Artifact names for `count` consecutive days, oldest first
pub fn artifact_names(database: &str, count: usize) -> Vec<String> {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let at = start + Duration::days(i as i64);
            format!(
                "backup_{}_{}.sql.gz",
                database,
                at.format("%Y-%m-%dT%H-%M-%S-000Z")
            )
        })
        .collect()
}

/// `rclone lsf` output for `count` daily artifacts
pub fn artifact_listing(database: &str, count: usize) -> String {
    let names = artifact_names(database, count);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    listing(&refs)
}
