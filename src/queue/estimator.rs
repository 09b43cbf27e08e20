pub const DEFAULT_AVG_SERVICE_MINUTES: i64 = 15;

/// Minutes a customer at `position` waits when everyone ahead takes
/// `avg_service_minutes`. Computed once when the entry is created.
pub fn estimate(position: i64, avg_service_minutes: i64) -> i64 {
    avg_service_minutes * (position - 1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_in_line_waits_nothing() {
        assert_eq!(estimate(1, 15), 0);
        assert_eq!(estimate(1, 0), 0);
    }

    #[test]
    fn scales_with_people_ahead() {
        assert_eq!(estimate(2, DEFAULT_AVG_SERVICE_MINUTES), 15);
        assert_eq!(estimate(4, 15), 45);
        assert_eq!(estimate(4, 20), 60);
    }

    #[test]
    fn never_negative() {
        assert_eq!(estimate(0, 15), 0);
        assert_eq!(estimate(-3, 15), 0);
    }
}
