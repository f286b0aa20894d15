use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

pub fn format_epoch_ms(ms: i64) -> String {
    let dt_utc: DateTime<Utc> = Utc
        .timestamp_millis_opt(ms)
        .single()
        .unwrap_or_default();
    dt_utc.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}

/// Parses random.org's `completionTime` ("2011-10-10 13:19:12Z"), accepting plain RFC 3339 too.
pub fn parse_completion_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), "%Y-%m-%d %H:%M:%S").ok()?;
    Some(Utc.from_utc_datetime(&naive))
}
