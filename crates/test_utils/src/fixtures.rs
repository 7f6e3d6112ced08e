//! Pre-built Test Fixtures
//!
//! Consistent, predictable data for unit and API tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use domain_claims::{Actor, Clock, Role, Upload};

/// Fixture for the people who use the system
pub struct ActorFixtures;

impl ActorFixtures {
    pub const LECTURER: &'static str = "lecturer@example.com";
    pub const OTHER_LECTURER: &'static str = "second.lecturer@example.com";
    pub const MANAGER: &'static str = "manager@example.com";
    pub const COORDINATOR: &'static str = "coordinator@example.com";
    pub const HR: &'static str = "hr@example.com";

    pub fn lecturer() -> Actor {
        Actor::lecturer(Self::LECTURER)
    }

    /// A lecturer who does not own the default fixtures' claims
    pub fn other_lecturer() -> Actor {
        Actor::lecturer(Self::OTHER_LECTURER)
    }

    pub fn manager() -> Actor {
        Actor::manager(Self::MANAGER)
    }

    pub fn coordinator() -> Actor {
        Actor::coordinator(Self::COORDINATOR)
    }

    pub fn hr() -> Actor {
        Actor::hr(Self::HR)
    }

    /// An authenticated user holding no role
    pub fn nobody() -> Actor {
        Actor::new("nobody@example.com", Vec::<Role>::new())
    }
}

/// Fixture for timestamps
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Fixed instant the workflow clock starts from
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    /// Clock fixed at [`TemporalFixtures::now`]
    pub fn fixed_clock() -> Clock {
        let now = Self::now();
        Arc::new(move || now)
    }

    /// Clock that advances one minute per reading, starting at `now`
    pub fn ticking_clock() -> Clock {
        let ticks = Arc::new(AtomicI64::new(0));
        let start = Self::now();
        Arc::new(move || start + Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst)))
    }
}

/// Fixture for uploaded files
pub struct UploadFixtures;

impl UploadFixtures {
    /// A small PDF timesheet
    pub fn timesheet_pdf() -> Upload {
        Upload::new("timesheet.pdf", b"%PDF-1.4 timesheet".to_vec())
    }

    /// A small PNG scan
    pub fn scan_png() -> Upload {
        Upload::new("scan.PNG", vec![0x89, b'P', b'N', b'G'])
    }

    /// An executable, which is never accepted
    pub fn executable() -> Upload {
        Upload::new("payload.exe", b"MZ".to_vec())
    }

    /// A file of exactly `size` bytes
    pub fn sized(file_name: &str, size: usize) -> Upload {
        Upload::new(file_name, vec![0u8; size])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::Principal;

    #[test]
    fn test_actor_fixtures_hold_their_roles() {
        assert!(ActorFixtures::manager().has_role(Role::Manager));
        assert!(!ActorFixtures::lecturer().has_role(Role::Manager));
        assert!(!ActorFixtures::nobody().has_role(Role::Lecturer));
    }

    #[test]
    fn test_ticking_clock_advances() {
        let clock = TemporalFixtures::ticking_clock();
        let first = clock();
        let second = clock();
        assert_eq!(second - first, Duration::minutes(1));
    }
}
