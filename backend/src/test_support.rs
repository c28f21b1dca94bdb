//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and behind the `test-support` feature.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{CallerContext, HierarchyLevel, StaffUser, UserId};

/// Clock pinned to an instant that tests move forward explicitly.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Timestamp used as "now" across the test suites.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("valid fixture timestamp"))
}

/// Build a user id, panicking on invalid input.
pub fn user_id(raw: &str) -> UserId {
    UserId::new(raw).unwrap_or_else(|err| panic!("invalid fixture user id {raw:?}: {err}"))
}

/// Active staff member with an optional senior.
pub fn staff(id: &str, name: &str, level: HierarchyLevel, senior: Option<&str>) -> StaffUser {
    let user = StaffUser::new(user_id(id), name, Some(level))
        .with_email(format!("{id}@example.com"));
    match senior {
        Some(senior) => user.with_senior(user_id(senior)),
        None => user,
    }
}

/// Caller context for a staff member.
pub fn caller(id: &str, level: HierarchyLevel) -> CallerContext {
    CallerContext::new(user_id(id), Some(level))
}

/// Small org chart: admin > manager > team lead > two executives.
pub fn sample_org() -> Vec<StaffUser> {
    vec![
        staff("admin", "Asha Admin", HierarchyLevel::SuperAdmin, None),
        staff("mgr", "Manoj Manager", HierarchyLevel::Manager, Some("admin")),
        staff("lead", "Tara Lead", HierarchyLevel::TeamLead, Some("mgr")),
        staff("exec-1", "Esha Exec", HierarchyLevel::Executive, Some("lead")),
        staff("exec-2", "Eli Exec", HierarchyLevel::Executive, Some("lead")),
    ]
}
