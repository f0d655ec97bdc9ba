use chrono::{DateTime, Utc};

/// Early-completion bonus, proportional to the share of the deadline window left.
///
/// `round(bounty * percent * remaining / window / 100)`, zero when the window is
/// empty or the deadline has passed.
pub fn early_completion_bonus(
    bounty: i64,
    percent: i64,
    created_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    completed_at: DateTime<Utc>,
) -> i64 {
    let window = (deadline - created_at).num_milliseconds();
    if window <= 0 {
        return 0;
    }
    let remaining = (deadline - completed_at).num_milliseconds();
    if remaining <= 0 {
        return 0;
    }
    let proportion = remaining as f64 / window as f64;
    (bounty as f64 * percent as f64 * proportion / 100.0).round() as i64
}

/// Percentage of `amount` rounded half away from zero, for non-negative inputs.
pub fn percent_of(amount: i64, percent: i64) -> i64 {
    (amount * percent + 50).div_euclid(100)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
    }

    #[test]
    fn proportional_to_time_remaining() {
        let created = at(0);
        let deadline = at(10);
        assert_eq!(early_completion_bonus(200, 10, created, deadline, at(2)), 16);
        assert_eq!(early_completion_bonus(200, 10, created, deadline, at(4)), 12);
        assert_eq!(early_completion_bonus(200, 10, created, deadline, at(8)), 4);
        assert_eq!(early_completion_bonus(200, 10, created, deadline, at(1)), 18);
    }

    #[test]
    fn zero_at_or_after_deadline() {
        assert_eq!(early_completion_bonus(200, 10, at(0), at(10), at(10)), 0);
        assert_eq!(early_completion_bonus(200, 10, at(0), at(10), at(12)), 0);
    }

    #[test]
    fn zero_for_empty_window() {
        assert_eq!(early_completion_bonus(200, 10, at(5), at(5), at(1)), 0);
        assert_eq!(early_completion_bonus(200, 10, at(6), at(5), at(1)), 0);
    }

    #[test]
    fn rounds_to_nearest_point() {
        // 100 * 10% * 2/3 = 6.67
        assert_eq!(early_completion_bonus(100, 10, at(0), at(3), at(1)), 7);
    }

    #[test]
    fn percent_of_rounds_half_up() {
        assert_eq!(percent_of(100, 10), 10);
        assert_eq!(percent_of(15, 10), 2);
        assert_eq!(percent_of(14, 10), 1);
        assert_eq!(percent_of(1, 10), 0);
    }
}
