use chrono::{DateTime, Days, Utc};

/// Lifetimes a snippet may be created with, in days.
pub const PERMITTED_EXPIRY_DAYS: [i64; 3] = [1, 7, 365];

pub const MAX_TITLE_RUNES: usize = 100;

/// How many snippets the home page lists.
pub const LATEST_LIMIT: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Snippet {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

/// Expiry for a snippet created at `created` that lives `days` days.
///
/// Days are counted on the UTC timeline, so each one is exactly 24 hours and
/// a leap day counts like any other day. `None` for negative or overflowing
/// input.
pub fn expiry_from(created: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    let days = u64::try_from(days).ok()?;
    created.checked_add_days(Days::new(days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Europe::Berlin;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn one_and_seven_days() {
        let created = at(2024, 3, 17, 10, 15);
        assert_eq!(expiry_from(created, 1), Some(at(2024, 3, 18, 10, 15)));
        assert_eq!(expiry_from(created, 7), Some(at(2024, 3, 24, 10, 15)));
    }

    #[test]
    fn year_spanning_leap_day_is_365_days_not_a_calendar_year() {
        let created = at(2024, 1, 1, 0, 0);
        let expires = expiry_from(created, 365).unwrap();
        assert_eq!(expires, at(2024, 12, 31, 0, 0));
        assert_eq!(expires - created, Duration::days(365));
    }

    #[test]
    fn year_without_leap_day_lands_on_same_date() {
        let created = at(2025, 1, 1, 12, 0);
        assert_eq!(expiry_from(created, 365), Some(at(2026, 1, 1, 12, 0)));
    }

    #[test]
    fn dst_transition_keeps_absolute_day_length() {
        // Berlin switches to CEST at 2024-03-31 01:00 UTC.
        let created = at(2024, 3, 30, 11, 0);
        let expires = expiry_from(created, 1).unwrap();
        assert_eq!(expires - created, Duration::hours(24));

        let local_created = created.with_timezone(&Berlin);
        let local_expires = expires.with_timezone(&Berlin);
        assert_eq!(local_created.format("%H:%M").to_string(), "12:00");
        assert_eq!(local_expires.format("%H:%M").to_string(), "13:00");
    }

    #[test]
    fn negative_days_are_rejected() {
        assert_eq!(expiry_from(at(2024, 1, 1, 0, 0), -1), None);
    }

    #[test]
    fn visibility_is_strictly_before_expiry() {
        let created = at(2024, 1, 1, 0, 0);
        let snippet = Snippet {
            id: 1,
            title: "t".into(),
            content: "c".into(),
            created,
            expires: expiry_from(created, 1).unwrap(),
        };
        assert!(snippet.is_visible_at(created));
        assert!(!snippet.is_visible_at(snippet.expires));
        assert!(!snippet.is_visible_at(snippet.expires + Duration::seconds(1)));
    }
}
