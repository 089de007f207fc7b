//! Personalization module - coaching templates and the resolver.

mod resolver;
mod template;

pub use resolver::{personalize, RenderedRecommendation};
pub use template::{
    CoachingTemplate, DurationMinutes, SkillVariant, MINUTES_PLACEHOLDER,
};
