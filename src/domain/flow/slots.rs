//! Slot Store - per-instance slot data.
//!
//! Every read and write is addressed by `InstanceId`. There is intentionally
//! no accessor keyed by flow definition name: two running instances of the
//! same flow must never observe each other's values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{InstanceId, SlotName};

/// An opaque, already-normalized slot value.
pub type SlotValue = serde_json::Value;

/// Slot values of one flow instance.
pub type SlotMap = BTreeMap<SlotName, SlotValue>;

static EMPTY_SLOTS: SlotMap = SlotMap::new();

/// Mapping `instance_id -> (slot_name -> value)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotStore {
    data: BTreeMap<InstanceId, SlotMap>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes (or overwrites) one slot of one instance.
    pub fn set_slot(&mut self, instance_id: InstanceId, name: SlotName, value: SlotValue) {
        self.data.entry(instance_id).or_default().insert(name, value);
    }

    /// All slots of an instance; empty if the instance has written nothing.
    pub fn get_slots(&self, instance_id: InstanceId) -> &SlotMap {
        self.data.get(&instance_id).unwrap_or(&EMPTY_SLOTS)
    }

    pub fn get_slot(&self, instance_id: InstanceId, name: &SlotName) -> Option<&SlotValue> {
        self.data.get(&instance_id).and_then(|slots| slots.get(name))
    }

    pub fn has_slot(&self, instance_id: InstanceId, name: &SlotName) -> bool {
        self.get_slot(instance_id, name).is_some()
    }

    /// Removes one slot, returning its previous value.
    pub fn remove_slot(&mut self, instance_id: InstanceId, name: &SlotName) -> Option<SlotValue> {
        self.data.get_mut(&instance_id).and_then(|slots| slots.remove(name))
    }

    /// Drops all data of an instance (after it leaves the stack).
    pub fn remove_instance(&mut self, instance_id: InstanceId) -> Option<SlotMap> {
        self.data.remove(&instance_id)
    }

    pub fn instance_count(&self) -> usize {
        self.data.len()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Renders a slot value for user-facing text: strings without quotes,
/// everything else in its JSON form.
pub fn display_value(value: &SlotValue) -> String {
    match value {
        SlotValue::String(s) => s.clone(),
        SlotValue::Null => String::new(),
        other => other.to_string(),
    }
}
