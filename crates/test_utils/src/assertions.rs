//! Custom Test Assertions
//!
//! Assertion helpers with messages that name the claim involved.

use domain_claims::{Claim, ClaimError, ClaimStatus};

/// Asserts that a claim is in the expected status
pub fn assert_status(claim: &Claim, expected: ClaimStatus) {
    assert_eq!(
        claim.status(),
        expected,
        "Claim {} has status {}, expected {}",
        claim.id,
        claim.status(),
        expected
    );
}

/// Asserts that a claim carries a review stamp by `reviewer`
pub fn assert_reviewed_by(claim: &Claim, reviewer: &str) {
    assert_eq!(
        claim.approval_by.as_deref(),
        Some(reviewer),
        "Claim {} was reviewed by {:?}, expected {}",
        claim.id,
        claim.approval_by,
        reviewer
    );
}

/// Asserts that every claim in the list has one of the given statuses
pub fn assert_all_in(claims: &[Claim], statuses: &[ClaimStatus]) {
    for claim in claims {
        assert!(
            statuses.contains(&claim.status()),
            "Claim {} has status {}, expected one of {:?}",
            claim.id,
            claim.status(),
            statuses
        );
    }
}

/// Asserts that a result failed with a validation error on `field`
pub fn assert_field_error<T: std::fmt::Debug>(result: Result<T, ClaimError>, field: &str) {
    match result {
        Err(ClaimError::Validation(err)) => assert_eq!(
            err.field, field,
            "Validation error on '{}', expected '{}': {}",
            err.field, field, err.message
        ),
        other => panic!("Expected validation error on '{field}', got {other:?}"),
    }
}
