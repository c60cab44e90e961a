//! Per-operation allowed-role sets.
//!
//! Each protected operation names the slice of roles permitted to perform
//! it; the middleware's `AuthContext::require_any` checks membership.

use reflab_core::Role;

/// Registering a new user.
pub const REGISTER_USER: &[Role] = &[Role::Admin];

/// Reading any resource (patients, catalog, referrals, results).
pub const RESOURCE_READ: &[Role] = &[
    Role::Admin,
    Role::HospitalStaff,
    Role::LabTech,
    Role::Viewer,
];

/// Creating or updating a patient.
pub const PATIENT_WRITE: &[Role] = &[Role::Admin, Role::HospitalStaff];

/// Deleting a patient.
pub const PATIENT_DELETE: &[Role] = &[Role::Admin];

/// Creating or updating a catalog entry.
pub const CATALOG_WRITE: &[Role] = &[Role::Admin, Role::LabTech];

/// Deleting a catalog entry.
pub const CATALOG_DELETE: &[Role] = &[Role::Admin];

/// Placing a referral.
pub const REFERRAL_CREATE: &[Role] = &[Role::Admin, Role::HospitalStaff];

/// Updating a referral.
pub const REFERRAL_UPDATE: &[Role] = &[Role::Admin, Role::LabTech];

/// Recording a test result.
pub const RESULT_CREATE: &[Role] = &[Role::Admin, Role::LabTech];

/// Updating a test result.
pub const RESULT_UPDATE: &[Role] = &[Role::Admin, Role::LabTech];
