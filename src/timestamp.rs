use std::time::{SystemTime, UNIX_EPOCH};

pub fn unix_millis(at: SystemTime) -> u128 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn iso8601(at: SystemTime) -> String {
    let millis = unix_millis(at);
    let secs = (millis / 1000) as i64;
    let (year, month, day) = civil_from_days(secs.div_euclid(86_400));
    let (hour, minute, second) = clock(secs);
    format!(
        "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{:03}Z",
        millis % 1000
    )
}

/// Wall-clock `HH:MM:SS` (UTC) used to stamp chat messages.
pub fn time_of_day(at: SystemTime) -> String {
    let secs = (unix_millis(at) / 1000) as i64;
    let (hour, minute, second) = clock(secs);
    format!("{hour:02}:{minute:02}:{second:02}")
}

fn clock(secs: i64) -> (i64, i64, i64) {
    let of_day = secs.rem_euclid(86_400);
    (of_day / 3600, (of_day % 3600) / 60, of_day % 60)
}

// Howard Hinnant's days-to-civil conversion.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn formats_epoch() {
        assert_eq!(iso8601(UNIX_EPOCH), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn formats_known_instant() {
        // 2024-02-29T12:34:56.789Z
        let at = UNIX_EPOCH + Duration::from_millis(1_709_210_096_789);
        assert_eq!(iso8601(at), "2024-02-29T12:34:56.789Z");
        assert_eq!(time_of_day(at), "12:34:56");
        assert_eq!(unix_millis(at), 1_709_210_096_789);
    }
}
