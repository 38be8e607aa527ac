//! The check-in tracker: one record per user, and the pure arithmetic that
//! decides whether that user is overdue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, user::UserId};

/// Interval assigned to a check-in record created on first access.
pub const DEFAULT_INTERVAL_DAYS: u32 = 7;
pub const MIN_INTERVAL_DAYS: u32 = 1;
/// Two years.
pub const MAX_INTERVAL_DAYS: u32 = 730;

/// The single check-in record owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkin {
  pub user_id:         UserId,
  /// `None` until the user confirms for the first time.
  pub last_checkin_at: Option<DateTime<Utc>>,
  pub interval_days:   u32,
  pub created_at:      DateTime<Utc>,
}

impl Checkin {
  /// Evaluate this record against `now`.
  pub fn status(&self, now: DateTime<Utc>) -> CheckinStatus {
    let days_since = days_since(self.last_checkin_at, now);
    CheckinStatus {
      last_checkin_at: self.last_checkin_at,
      interval_days:   self.interval_days,
      days_since,
      overdue:         is_overdue(days_since, self.interval_days),
    }
  }
}

/// Computed view returned by `get_checkin_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinStatus {
  pub last_checkin_at: Option<DateTime<Utc>>,
  pub interval_days:   u32,
  pub days_since:      Option<i64>,
  pub overdue:         bool,
}

/// Whole days elapsed since `last`, floored. `None` if never checked in.
///
/// A `last` in the future (clock skew between writers) counts as zero days.
pub fn days_since(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
  last.map(|at| (now - at).num_days().max(0))
}

/// Never checked in ⇒ overdue. Otherwise strictly more days than the interval.
pub fn is_overdue(days_since: Option<i64>, interval_days: u32) -> bool {
  match days_since {
    None => true,
    Some(days) => days > i64::from(interval_days),
  }
}

/// Reject intervals outside `[MIN_INTERVAL_DAYS, MAX_INTERVAL_DAYS]`.
pub fn validate_interval(days: i64) -> Result<u32> {
  if (i64::from(MIN_INTERVAL_DAYS)..=i64::from(MAX_INTERVAL_DAYS)).contains(&days) {
    Ok(days as u32)
  } else {
    Err(Error::Validation(format!(
      "interval_days must be between {MIN_INTERVAL_DAYS} and {MAX_INTERVAL_DAYS}, got {days}"
    )))
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn at(day: i64, hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
      + Duration::days(day)
      + Duration::hours(hour)
  }

  #[test]
  fn boundary_is_not_overdue() {
    assert!(!is_overdue(Some(7), 7));
    assert!(is_overdue(Some(8), 7));
    assert!(!is_overdue(Some(0), 1));
  }

  #[test]
  fn never_checked_in_is_always_overdue() {
    assert!(is_overdue(None, 1));
    assert!(is_overdue(None, MAX_INTERVAL_DAYS));
  }

  #[test]
  fn days_since_floors_partial_days() {
    assert_eq!(days_since(Some(at(0, 0)), at(7, 23)), Some(7));
    assert_eq!(days_since(Some(at(0, 12)), at(1, 11)), Some(0));
    assert_eq!(days_since(None, at(3, 0)), None);
  }

  #[test]
  fn future_checkin_counts_as_zero() {
    assert_eq!(days_since(Some(at(2, 0)), at(1, 0)), Some(0));
  }

  #[test]
  fn status_combines_both_rules() {
    let checkin = Checkin {
      user_id:         UserId::from("u"),
      last_checkin_at: Some(at(0, 0)),
      interval_days:   7,
      created_at:      at(0, 0),
    };
    let status = checkin.status(at(7, 5));
    assert_eq!(status.days_since, Some(7));
    assert!(!status.overdue);
    assert!(checkin.status(at(8, 0)).overdue);
  }

  #[test]
  fn interval_bounds() {
    assert_eq!(validate_interval(1).unwrap(), 1);
    assert_eq!(validate_interval(730).unwrap(), 730);
    assert!(matches!(validate_interval(0), Err(Error::Validation(_))));
    assert!(matches!(validate_interval(731), Err(Error::Validation(_))));
    assert!(matches!(validate_interval(-5), Err(Error::Validation(_))));
  }
}
