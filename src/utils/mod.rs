//! Configuration, errors, logging and output helpers shared by both binaries

pub mod config;
pub mod error;
pub mod logging;

use std::time::Duration;

pub use config::AppConfig;
pub use error::{BrainError, Result};
pub use logging::init_logging;

/// Short elapsed-time text for CLI summaries ("850ms", "12.4s", "3m 05s")
pub fn format_duration(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    match millis {
        0..=999 => format!("{}ms", millis),
        1_000..=59_999 => format!("{:.1}s", elapsed.as_secs_f64()),
        _ => {
            let secs = elapsed.as_secs();
            format!("{}m {:02}s", secs / 60, secs % 60)
        }
    }
}

/// Count with a noun, pluralised and grouped by thousands ("1 image", "12,480 images")
pub fn format_count(n: usize, noun: &str) -> String {
    let digits = n.to_string();
    let grouped: Vec<&str> = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    let plural = if n == 1 { "" } else { "s" };
    format!("{} {}{}", grouped.join(","), noun, plural)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(12_400)), "12.4s");
        assert_eq!(format_duration(Duration::from_secs(185)), "3m 05s");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1, "image"), "1 image");
        assert_eq!(format_count(0, "image"), "0 images");
        assert_eq!(format_count(12_480, "image"), "12,480 images");
        assert_eq!(format_count(1_000_000, "scan"), "1,000,000 scans");
    }
}
