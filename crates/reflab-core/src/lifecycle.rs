//! Status lifecycles for referrals and test results.
//!
//! Both statuses are tagged enums with an explicit allowed-pairs transition
//! table: each state may stay put or advance one step forward. Skipping ahead
//! or moving backwards is rejected unless the operator runs the server in
//! free-form status mode, which skips the transition check for corrections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Referral priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Stat,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
            Self::Stat => write!(f, "stat"),
        }
    }
}

/// Status of a referral, from intake to reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    #[default]
    Pending,
    Received,
    InProgress,
    Completed,
    Reported,
}

impl ReferralStatus {
    /// Returns `true` if moving from `self` to `next` is an allowed step.
    ///
    /// The allowed pairs are the adjacent forward steps of
    /// `pending -> received -> in_progress -> completed -> reported`,
    /// plus self-transitions (re-sending the current status is a no-op).
    #[must_use]
    pub fn can_transition(self, next: ReferralStatus) -> bool {
        use ReferralStatus::*;
        matches!(
            (self, next),
            (Pending, Received)
                | (Received, InProgress)
                | (InProgress, Completed)
                | (Completed, Reported)
        ) || self == next
    }

    /// Validates a transition, producing a typed error on a disallowed pair.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if the pair is not allowed.
    pub fn transition(self, next: ReferralStatus) -> Result<ReferralStatus, CoreError> {
        if self.can_transition(next) {
            Ok(next)
        } else {
            Err(CoreError::invalid_transition(
                self.to_string(),
                next.to_string(),
            ))
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Received => write!(f, "received"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Reported => write!(f, "reported"),
        }
    }
}

impl FromStr for ReferralStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "received" => Ok(Self::Received),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "reported" => Ok(Self::Reported),
            other => Err(CoreError::invalid_document(format!(
                "unknown referral status: {other}"
            ))),
        }
    }
}

/// Status of a test result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    #[default]
    Pending,
    Completed,
    Verified,
}

impl ResultStatus {
    /// Returns `true` if moving from `self` to `next` is an allowed step.
    ///
    /// Allowed pairs: `pending -> completed -> verified`, plus
    /// self-transitions.
    #[must_use]
    pub fn can_transition(self, next: ResultStatus) -> bool {
        use ResultStatus::*;
        matches!((self, next), (Pending, Completed) | (Completed, Verified)) || self == next
    }

    /// Validates a transition, producing a typed error on a disallowed pair.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if the pair is not allowed.
    pub fn transition(self, next: ResultStatus) -> Result<ResultStatus, CoreError> {
        if self.can_transition(next) {
            Ok(next)
        } else {
            Err(CoreError::invalid_transition(
                self.to_string(),
                next.to_string(),
            ))
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Verified => write!(f, "verified"),
        }
    }
}

impl FromStr for ResultStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "verified" => Ok(Self::Verified),
            other => Err(CoreError::invalid_document(format!(
                "unknown result status: {other}"
            ))),
        }
    }
}
