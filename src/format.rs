//! Size and timestamp formatting for the status bar.

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

/// Size in whole KiB, rounded up, with thousands separators (`1,234KB`).
/// Unknown sizes render empty.
pub fn format_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes else {
        return String::new();
    };
    if bytes == 0 {
        return "0KB".to_string();
    }
    let kb = bytes.div_ceil(1024);
    format!("{}KB", group_thousands(kb))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `YYYY-MM-DD HH:MM:SS` in `offset`. Unknown or out-of-range times render
/// empty.
pub fn format_modified(secs: Option<i64>, offset: FixedOffset) -> String {
    secs.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|t| t.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Parse a configured UTC offset: `local`, `utc`, or `+HH:MM` / `-HH:MM`.
pub fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    match s.trim().to_ascii_lowercase().as_str() {
        "local" => Some(Local::now().offset().fix()),
        "utc" | "z" => FixedOffset::east_opt(0),
        other => {
            let (sign, rest) = match other.as_bytes().first()? {
                b'+' => (1, &other[1..]),
                b'-' => (-1, &other[1..]),
                _ => return None,
            };
            let (h, m) = rest.split_once(':').unwrap_or((rest, "0"));
            let hours: i32 = h.parse().ok()?;
            let minutes: i32 = m.parse().ok()?;
            if hours > 23 || minutes > 59 {
                return None;
            }
            FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        }
    }
}
