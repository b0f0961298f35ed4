//! Human-readable rate and age formatting helpers.

use std::time::Duration;

/// Format a rate in bits/sec as "12.3 Mbps".
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn fmt_bps(bps: u64) -> String {
    if bps >= 1_000_000_000 {
        format!("{:.1} Gbps", bps as f64 / 1_000_000_000.0)
    } else if bps >= 1_000_000 {
        format!("{:.1} Mbps", bps as f64 / 1_000_000.0)
    } else if bps >= 1_000 {
        format!("{:.1} Kbps", bps as f64 / 1_000.0)
    } else {
        format!("{bps} bps")
    }
}

/// Format an optional rate; "never measured" renders as an em-width dash.
pub fn fmt_bps_opt(bps: Option<u64>) -> String {
    bps.map_or_else(|| "—".to_owned(), fmt_bps)
}

/// Compact age like "12s" or "3m 20s" for staleness display.
#[allow(clippy::cast_sign_loss, clippy::as_conversions)]
pub fn fmt_age_ms(age_ms: i64) -> String {
    let secs = (age_ms.max(0) as u64) / 1000;
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rates_pick_largest_unit() {
        assert_eq!(fmt_bps(0), "0 bps");
        assert_eq!(fmt_bps(950), "950 bps");
        assert_eq!(fmt_bps(8000), "8.0 Kbps");
        assert_eq!(fmt_bps(2_500_000), "2.5 Mbps");
        assert_eq!(fmt_bps(1_200_000_000), "1.2 Gbps");
    }

    #[test]
    fn unknown_rate_renders_dash() {
        assert_eq!(fmt_bps_opt(None), "—");
        assert_eq!(fmt_bps_opt(Some(8000)), "8.0 Kbps");
    }

    #[test]
    fn ages_are_compact() {
        assert_eq!(fmt_age_ms(12_000), "12s");
        assert_eq!(fmt_age_ms(200_000), "3m 20s");
        assert_eq!(fmt_age_ms(-5), "0s");
    }
}
