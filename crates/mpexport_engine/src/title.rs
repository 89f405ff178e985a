use chrono::{Local, LocalResult, TimeZone};
use unicode_general_category::{get_general_category, GeneralCategory};

/// Strips format (Cf) and unassigned (Cn) characters and all whitespace from an article title.
pub fn clean_title(raw: &str) -> String {
    raw.chars().filter(|c| is_visible(*c)).collect()
}

fn is_visible(c: char) -> bool {
    if c.is_whitespace() || c.is_control() {
        return false;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Format | GeneralCategory::Unassigned
    )
}

/// Local `YYYY-MM-DD HH:MM:SS` for unix seconds; other values pass through.
pub fn format_publish_time(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(secs) => match Local.timestamp_opt(secs, 0) {
            LocalResult::Single(time) | LocalResult::Ambiguous(time, _) => {
                time.format("%Y-%m-%d %H:%M:%S").to_string()
            }
            LocalResult::None => trimmed.to_string(),
        },
        Err(_) => trimmed.to_string(),
    }
}

/// `(year, month)` of a unix-seconds publish time, in local time.
pub fn publish_year_month(raw: &str) -> Option<(i32, u32)> {
    use chrono::Datelike;

    let secs = raw.trim().parse::<i64>().ok()?;
    let time = Local.timestamp_opt(secs, 0).earliest()?;
    Some((time.year(), time.month()))
}
