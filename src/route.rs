use chrono::NaiveDate;

use crate::dates::{day_key, parse_day};

/// App location: `/` is home, `/<YYYY-MM-DD>` a Day Page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Day(NaiveDate),
    /// Path that does not name a valid date; holds the raw segment
    Invalid(String),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let segment = path.trim().trim_start_matches('/').trim_end_matches('/');
        if segment.is_empty() {
            return Route::Home;
        }
        match parse_day(segment) {
            Ok(date) => Route::Day(date),
            Err(_) => Route::Invalid(segment.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Day(date) => format!("/{}", day_key(*date)),
            Route::Invalid(raw) => format!("/{}", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_home_and_days() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(Route::parse("/2024-06-01"), Route::Day(day));
        assert_eq!(Route::parse("2024-06-01/"), Route::Day(day));
        assert_eq!(Route::Day(day).path(), "/2024-06-01");
    }

    #[test]
    fn unparseable_segments_are_invalid() {
        assert_eq!(Route::parse("/tomorrow"), Route::Invalid("tomorrow".into()));
        assert_eq!(Route::parse("/2024-02-30"), Route::Invalid("2024-02-30".into()));
        assert_eq!(Route::parse("/2024-06-01/x"), Route::Invalid("2024-06-01/x".into()));
    }
}
