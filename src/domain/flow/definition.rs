//! Flow definitions - the ordered step lists the engine walks.
//!
//! Definitions are produced by an external provider and are read-only to
//! the engine. Authoring formats are out of scope; these types only derive
//! serde so providers can load them from whatever source they use.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::slots::{display_value, SlotMap, SlotValue};
use crate::domain::foundation::{FlowName, SlotName, StepId, ValidationError};

/// One step of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepSpec {
    /// Ask the user for a slot. Complete as soon as the slot has a value.
    Collect {
        slot: SlotName,
        /// Prompt shown when asking; a generic prompt is used if absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
        /// Why the slot is needed, used to answer clarification requests.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rule: Option<SlotRule>,
    },

    /// Call business logic. `input_map` maps action parameter -> slot;
    /// an empty map passes every slot of the instance. `output_map` maps
    /// action output key -> slot to write.
    Action {
        call: String,
        #[serde(default)]
        input_map: BTreeMap<String, SlotName>,
        #[serde(default)]
        output_map: BTreeMap<String, SlotName>,
    },

    /// Ask the user to confirm; `{slot}` placeholders are filled from slots.
    Confirm { message_template: String },

    /// Jump to `goto` when `cond` holds, otherwise fall through.
    Branch { cond: BranchCondition, goto: StepId },

    /// Tell the user something; `{slot}` placeholders are filled from slots.
    Say { message: String },
}

impl StepSpec {
    /// Shorthand for a bare collect step.
    pub fn collect(slot: impl Into<SlotName>) -> Self {
        StepSpec::Collect {
            slot: slot.into(),
            prompt: None,
            description: None,
            rule: None,
        }
    }

    /// Shorthand for an action step without input/output mapping.
    pub fn action(call: impl Into<String>) -> Self {
        StepSpec::Action {
            call: call.into(),
            input_map: BTreeMap::new(),
            output_map: BTreeMap::new(),
        }
    }

    pub fn confirm(message_template: impl Into<String>) -> Self {
        StepSpec::Confirm {
            message_template: message_template.into(),
        }
    }

    pub fn say(message: impl Into<String>) -> Self {
        StepSpec::Say {
            message: message.into(),
        }
    }

    pub fn branch(cond: BranchCondition, goto: StepId) -> Self {
        StepSpec::Branch { cond, goto }
    }

    /// Slot collected by this step, if it is a collect step.
    pub fn collected_slot(&self) -> Option<&SlotName> {
        match self {
            StepSpec::Collect { slot, .. } => Some(slot),
            _ => None,
        }
    }

    /// Whether reaching this step requires a human response.
    pub fn awaits_user(&self) -> bool {
        matches!(self, StepSpec::Collect { .. } | StepSpec::Confirm { .. })
    }
}

/// Condition evaluated by a branch step against the instance's slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum BranchCondition {
    SlotPresent { slot: SlotName },
    SlotAbsent { slot: SlotName },
    SlotEquals { slot: SlotName, value: SlotValue },
}

impl BranchCondition {
    pub fn holds(&self, slots: &SlotMap) -> bool {
        match self {
            BranchCondition::SlotPresent { slot } => slots.contains_key(slot),
            BranchCondition::SlotAbsent { slot } => !slots.contains_key(slot),
            BranchCondition::SlotEquals { slot, value } => slots.get(slot) == Some(value),
        }
    }
}

/// Validation applied to a value before it is written to a collect slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SlotRule {
    /// Rejects null and blank strings.
    NonEmpty,
    /// Accepts only one of the listed values.
    OneOf { values: Vec<SlotValue> },
    /// Accepts numbers (or numeric strings) within the inclusive bounds.
    NumberRange {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
}

impl SlotRule {
    /// Returns the reason a value is rejected, if it is.
    pub fn check(&self, value: &SlotValue) -> Result<(), String> {
        match self {
            SlotRule::NonEmpty => match value {
                SlotValue::Null => Err("a value is required".to_string()),
                SlotValue::String(s) if s.trim().is_empty() => {
                    Err("a value is required".to_string())
                }
                _ => Ok(()),
            },
            SlotRule::OneOf { values } => {
                if values.contains(value) {
                    Ok(())
                } else {
                    let options: Vec<String> = values.iter().map(display_value).collect();
                    Err(format!("it must be one of: {}", options.join(", ")))
                }
            }
            SlotRule::NumberRange { min, max } => {
                let number = match value {
                    SlotValue::Number(n) => n.as_f64(),
                    SlotValue::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| "it must be a number".to_string())?;

                if let Some(min) = min {
                    if number < *min {
                        return Err(format!("it must be at least {}", min));
                    }
                }
                if let Some(max) = max {
                    if number > *max {
                        return Err(format!("it must be at most {}", max));
                    }
                }
                Ok(())
            }
        }
    }
}

/// A named, ordered sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub name: FlowName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<StepSpec>,
    /// Message emitted when the flow completes; a generic one is used if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_message: Option<String>,
}

impl FlowDefinition {
    pub fn new(name: impl Into<FlowName>, steps: Vec<StepSpec>) -> Self {
        Self {
            name: name.into(),
            description: None,
            steps,
            completion_message: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_completion_message(mut self, message: impl Into<String>) -> Self {
        self.completion_message = Some(message.into());
        self
    }

    pub fn step(&self, id: StepId) -> Option<&StepSpec> {
        self.steps.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Cursor position meaning "past the last step".
    pub fn end(&self) -> StepId {
        StepId::new(self.steps.len())
    }

    /// The collect step for a slot, if the flow collects it.
    pub fn collect_step_for(&self, slot: &SlotName) -> Option<(StepId, &StepSpec)> {
        self.steps
            .iter()
            .enumerate()
            .find(|(_, step)| step.collected_slot() == Some(slot))
            .map(|(index, step)| (StepId::new(index), step))
    }

    /// Validation rule attached to a slot's collect step.
    pub fn rule_for(&self, slot: &SlotName) -> Option<&SlotRule> {
        match self.collect_step_for(slot) {
            Some((_, StepSpec::Collect { rule, .. })) => rule.as_ref(),
            _ => None,
        }
    }

    /// Slots collected by this flow, in definition order.
    pub fn collected_slots(&self) -> Vec<&SlotName> {
        self.steps.iter().filter_map(StepSpec::collected_slot).collect()
    }

    /// Structural checks a provider should run before serving a definition.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.as_str().trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if self.steps.is_empty() {
            return Err(ValidationError::empty_field("steps"));
        }

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                StepSpec::Branch { goto, .. } if goto.index() > self.steps.len() => {
                    return Err(ValidationError::invalid_format(
                        "goto",
                        format!(
                            "branch at step {} targets {} but flow '{}' has {} steps",
                            index,
                            goto,
                            self.name,
                            self.steps.len()
                        ),
                    ));
                }
                StepSpec::Action { call, .. } if call.trim().is_empty() => {
                    return Err(ValidationError::empty_field("call"));
                }
                StepSpec::Collect { slot, .. } if slot.as_str().trim().is_empty() => {
                    return Err(ValidationError::empty_field("slot"));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book_flight() -> FlowDefinition {
        FlowDefinition::new(
            "book_flight",
            vec![
                StepSpec::collect("origin"),
                StepSpec::collect("destination"),
                StepSpec::collect("date"),
                StepSpec::action("search"),
                StepSpec::confirm("Fly {origin} to {destination} on {date}?"),
                StepSpec::action("book"),
            ],
        )
    }

    mod definition {
        use super::*;

        #[test]
        fn collected_slots_in_order() {
            let flow = book_flight();
            let slots: Vec<&str> = flow.collected_slots().iter().map(|s| s.as_str()).collect();
            assert_eq!(slots, vec!["origin", "destination", "date"]);
        }

        #[test]
        fn collect_step_for_finds_position() {
            let flow = book_flight();
            let (id, _) = flow.collect_step_for(&"date".into()).unwrap();
            assert_eq!(id, StepId::new(2));
            assert!(flow.collect_step_for(&"seat".into()).is_none());
        }

        #[test]
        fn end_is_one_past_last_step() {
            let flow = book_flight();
            assert_eq!(flow.end(), StepId::new(6));
            assert!(flow.step(flow.end()).is_none());
        }

        #[test]
        fn validate_accepts_well_formed_flow() {
            assert!(book_flight().validate().is_ok());
        }

        #[test]
        fn validate_rejects_empty_flow() {
            assert!(FlowDefinition::new("empty", vec![]).validate().is_err());
        }

        #[test]
        fn validate_rejects_unnamed_flow() {
            let flow = FlowDefinition::new("", vec![StepSpec::collect("origin")]);
            assert_eq!(flow.validate(), Err(ValidationError::empty_field("name")));
        }

        #[test]
        fn validate_rejects_blank_collect_slot() {
            let yaml = "name: broken\nsteps:\n  - type: collect\n    slot: \"\"\n";
            let flow: FlowDefinition = serde_yaml::from_str(yaml).unwrap();
            assert_eq!(flow.validate(), Err(ValidationError::empty_field("slot")));
        }

        #[test]
        fn validate_rejects_out_of_range_branch() {
            let flow = FlowDefinition::new(
                "broken",
                vec![StepSpec::branch(
                    BranchCondition::SlotPresent { slot: "x".into() },
                    StepId::new(9),
                )],
            );
            assert!(flow.validate().is_err());
        }

        #[test]
        fn deserializes_from_yaml() {
            let yaml = r#"
name: check_weather
steps:
  - type: collect
    slot: city
    prompt: Which city?
    rule:
      rule: non_empty
  - type: action
    call: weather_lookup
    input_map:
      location: city
    output_map:
      forecast: forecast
  - type: say
    message: "It'll be {forecast} in {city}."
"#;
            let flow: FlowDefinition = serde_yaml::from_str(yaml).unwrap();
            assert_eq!(flow.len(), 3);
            assert_eq!(flow.rule_for(&"city".into()), Some(&SlotRule::NonEmpty));
        }
    }

    mod branch_condition {
        use super::*;

        #[test]
        fn slot_present_and_absent() {
            let mut slots = SlotMap::new();
            slots.insert("vip".into(), json!(true));

            assert!(BranchCondition::SlotPresent { slot: "vip".into() }.holds(&slots));
            assert!(!BranchCondition::SlotAbsent { slot: "vip".into() }.holds(&slots));
        }

        #[test]
        fn slot_equals_compares_values() {
            let mut slots = SlotMap::new();
            slots.insert("class".into(), json!("business"));

            let cond = BranchCondition::SlotEquals {
                slot: "class".into(),
                value: json!("business"),
            };
            assert!(cond.holds(&slots));

            slots.insert("class".into(), json!("economy"));
            assert!(!cond.holds(&slots));
        }
    }

    mod slot_rule {
        use super::*;

        #[test]
        fn non_empty_rejects_blank() {
            assert!(SlotRule::NonEmpty.check(&json!("  ")).is_err());
            assert!(SlotRule::NonEmpty.check(&json!(null)).is_err());
            assert!(SlotRule::NonEmpty.check(&json!("Madrid")).is_ok());
        }

        #[test]
        fn one_of_lists_options() {
            let rule = SlotRule::OneOf {
                values: vec![json!("economy"), json!("business")],
            };
            assert!(rule.check(&json!("business")).is_ok());
            let reason = rule.check(&json!("first")).unwrap_err();
            assert_eq!(reason, "it must be one of: economy, business");
        }

        #[test]
        fn number_range_accepts_numeric_strings() {
            let rule = SlotRule::NumberRange {
                min: Some(1.0),
                max: Some(9.0),
            };
            assert!(rule.check(&json!(3)).is_ok());
            assert!(rule.check(&json!("4")).is_ok());
            assert!(rule.check(&json!(0)).is_err());
            assert!(rule.check(&json!(10)).is_err());
            assert_eq!(rule.check(&json!("many")).unwrap_err(), "it must be a number");
        }
    }
}
