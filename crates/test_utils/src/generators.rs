//! Property-Based Test Generators
//!
//! Proptest strategies for claim data that respects the domain rules.

use domain_claims::attachment::ALLOWED_EXTENSIONS;
use domain_claims::{ClaimStatus, ClaimSubmission, Role};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Non-negative amounts with two decimal places
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Hours worked, in quarter-hour steps up to 200 hours
pub fn hours_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=800i64).prop_map(|quarters| Decimal::new(quarters * 25, 2))
}

/// A file stem without dots or path separators
pub fn file_stem_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_ -]{1,24}"
}

/// File names with an accepted extension in random letter case
pub fn allowed_file_name_strategy() -> impl Strategy<Value = String> {
    (
        file_stem_strategy(),
        prop::sample::select(ALLOWED_EXTENSIONS.to_vec()),
        any::<bool>(),
    )
        .prop_map(|(stem, ext, upper)| {
            let ext = if upper { ext.to_uppercase() } else { ext.to_string() };
            format!("{stem}.{ext}")
        })
}

/// File names whose extension is never accepted
pub fn rejected_file_name_strategy() -> impl Strategy<Value = String> {
    (
        file_stem_strategy(),
        prop::sample::select(vec!["exe", "txt", "zip", "gif", "doc", "pdf.exe", "sh"]),
    )
        .prop_map(|(stem, ext)| format!("{stem}.{ext}"))
}

/// Submissions with valid amounts and no attachment
pub fn submission_strategy() -> impl Strategy<Value = ClaimSubmission> {
    ("LEC-[0-9]{3}", hours_strategy(), amount_strategy(), ".{0,40}").prop_map(
        |(lecturer_id, hours, rate, notes)| ClaimSubmission {
            lecturer_id,
            hours_worked: hours,
            hourly_rate: rate,
            total_amount: (hours * rate).round_dp(2),
            submitted_at: None,
            document_type: "Timesheet".to_string(),
            notes,
            attachment: None,
        },
    )
}

pub fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

pub fn status_strategy() -> impl Strategy<Value = ClaimStatus> {
    prop_oneof![
        Just(ClaimStatus::Pending),
        Just(ClaimStatus::Approved),
        Just(ClaimStatus::Rejected),
        Just(ClaimStatus::InvoiceGenerated),
        Just(ClaimStatus::Paid),
    ]
}
