//! Daily step tracking types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of step tracking for a user.
///
/// At most one record exists per user per day; re-logging a day
/// replaces the previous values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Database identifier, set once stored
    pub id: Option<i64>,
    /// Owning user
    pub user_id: i64,
    /// Day the steps were taken
    pub day: NaiveDate,
    /// Step count for the day
    pub count: u32,
    /// Distance covered in meters, when the pedometer reports it
    pub distance_m: Option<f64>,
    /// Estimated energy burned in kcal
    pub calories: Option<f64>,
}

impl StepRecord {
    /// Create a record for the given user and day.
    pub fn new(user_id: i64, day: NaiveDate, count: u32) -> Self {
        Self {
            id: None,
            user_id,
            day,
            count,
            distance_m: None,
            calories: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_no_id() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let record = StepRecord::new(1, day, 8500);

        assert_eq!(record.id, None);
        assert_eq!(record.count, 8500);
        assert_eq!(record.distance_m, None);
    }
}
