use crate::domain::{PlanTier, TemplateKind};
use std::str::FromStr;

pub(super) fn parse_plan_tier(plan: &str) -> Option<PlanTier> {
    PlanTier::from_str(plan).ok()
}

pub(super) fn parse_template_kind(template: &str) -> Option<TemplateKind> {
    TemplateKind::from_str(template).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_values() {
        assert_eq!(parse_plan_tier("pro"), Some(PlanTier::Pro));
        assert_eq!(parse_template_kind("recipe"), Some(TemplateKind::Recipe));
    }

    #[test]
    fn parse_invalid_inputs_return_none() {
        assert!(parse_plan_tier("nope").is_none());
        assert!(parse_template_kind("nope").is_none());
    }
}
