//! SafetyPlan - the user-authored crisis-response artifact.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{ErrorCode, Timestamp, UserId};

/// Minimum non-blank warning signs for a usable plan.
pub const MIN_WARNING_SIGNS: usize = 1;

/// Minimum non-blank coping strategies for a usable plan.
pub const MIN_COPING_STRATEGIES: usize = 3;

/// Someone the user can reach in a crisis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportContact {
    pub name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}

/// Why a safety plan does not satisfy the precondition.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SafetyPlanError {
    #[error("No safety plan exists for this user")]
    Missing,

    #[error("Safety plan needs at least {required} warning sign(s), found {found}")]
    TooFewWarningSigns { found: usize, required: usize },

    #[error("Safety plan needs at least {required} coping strategies, found {found}")]
    TooFewCopingStrategies { found: usize, required: usize },
}

impl SafetyPlanError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SafetyPlanError::Missing => ErrorCode::SafetyPlanMissing,
            _ => ErrorCode::SafetyPlanIncomplete,
        }
    }
}

/// Crisis-response plan a user authors before receiving skill recommendations.
///
/// # Invariants
///
/// - Valid iff it has at least one warning sign and at least three coping
///   strategies. Blank entries do not count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPlan {
    pub user_id: UserId,
    #[serde(default)]
    pub warning_signs: Vec<String>,
    #[serde(default)]
    pub coping_strategies: Vec<String>,
    #[serde(default)]
    pub support_contacts: Vec<SupportContact>,
    pub updated_at: Timestamp,
}

impl SafetyPlan {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            warning_signs: Vec::new(),
            coping_strategies: Vec::new(),
            support_contacts: Vec::new(),
            updated_at: Timestamp::now(),
        }
    }

    pub fn with_warning_sign(mut self, sign: impl Into<String>) -> Self {
        self.warning_signs.push(sign.into());
        self
    }

    pub fn with_coping_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.coping_strategies.push(strategy.into());
        self
    }

    pub fn with_contact(mut self, contact: SupportContact) -> Self {
        self.support_contacts.push(contact);
        self
    }

    /// Checks the plan invariants.
    ///
    /// # Errors
    ///
    /// - `TooFewWarningSigns` / `TooFewCopingStrategies` when under-populated
    pub fn validate(&self) -> Result<(), SafetyPlanError> {
        let signs = count_filled(&self.warning_signs);
        if signs < MIN_WARNING_SIGNS {
            return Err(SafetyPlanError::TooFewWarningSigns {
                found: signs,
                required: MIN_WARNING_SIGNS,
            });
        }
        let strategies = count_filled(&self.coping_strategies);
        if strategies < MIN_COPING_STRATEGIES {
            return Err(SafetyPlanError::TooFewCopingStrategies {
                found: strategies,
                required: MIN_COPING_STRATEGIES,
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn count_filled(entries: &[String]) -> usize {
    entries.iter().filter(|e| !e.trim().is_empty()).count()
}

/// Result of checking a possibly-absent plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "problem")]
pub enum SafetyPlanStatus {
    Valid,
    Invalid(SafetyPlanError),
}

impl SafetyPlanStatus {
    pub fn of(plan: Option<&SafetyPlan>) -> Self {
        match plan {
            None => SafetyPlanStatus::Invalid(SafetyPlanError::Missing),
            Some(plan) => match plan.validate() {
                Ok(()) => SafetyPlanStatus::Valid,
                Err(e) => SafetyPlanStatus::Invalid(e),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SafetyPlanStatus::Valid)
    }

    /// Converts to the precondition result.
    pub fn into_result(self) -> Result<(), SafetyPlanError> {
        match self {
            SafetyPlanStatus::Valid => Ok(()),
            SafetyPlanStatus::Invalid(e) => Err(e),
        }
    }
}
