use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate};

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn local_day(timestamp: i64) -> Result<NaiveDate> {
    let instant = DateTime::from_timestamp(timestamp, 0)
        .with_context(|| format!("Timestamp out of range: {timestamp}"))?;

    Ok(instant.with_timezone(&Local).date_naive())
}

pub fn day_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;

    while current <= end {
        days.push(current);
        current += Duration::days(1);
    }

    days
}

#[cfg(test)]
mod tests {
    use super::day_range;
    use chrono::NaiveDate;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn range_is_inclusive_and_ascending() {
        let days = day_range(day(2024, 1, 1), day(2024, 1, 3));
        assert_eq!(
            days,
            vec![day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)]
        );
    }

    #[test]
    fn range_crosses_month_boundary() {
        let days = day_range(day(2024, 1, 31), day(2024, 2, 1));
        assert_eq!(days, vec![day(2024, 1, 31), day(2024, 2, 1)]);
    }

    #[test]
    fn single_day_range() {
        let days = day_range(day(2024, 1, 5), day(2024, 1, 5));
        assert_eq!(days, vec![day(2024, 1, 5)]);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(day_range(day(2024, 1, 5), day(2024, 1, 4)).is_empty());
    }
}
