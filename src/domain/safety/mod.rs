//! Safety module - safety plan precondition and the crisis gate.

mod crisis_gate;
mod safety_plan;

pub use crisis_gate::{CrisisGate, EscalationReason, EscalationTrigger, GateResult};
pub use safety_plan::{
    SafetyPlan, SafetyPlanError, SafetyPlanStatus, SupportContact, MIN_COPING_STRATEGIES,
    MIN_WARNING_SIGNS,
};
