// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

use log::warn;

use super::{array_ref_value, DecodeError};
use crate::dump::Value;
use crate::packed::ArrayRef;

/// Link bookkeeping shared by both node kinds: the packed refs decoded
/// from (and rewritten into) the dump, plus handles into the owning
/// sequence's consolidated tables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeLinks {
    pub variable_links_ref: ArrayRef,
    pub output_links_ref: ArrayRef,
    /// Positions in the sequence's consolidated variable link table.
    pub variable_links: Vec<usize>,
    /// Positions in the sequence's consolidated output link table.
    pub output_links: Vec<usize>,
}

/// A graph node of a behavior sequence. Link resolution always goes
/// through the owning sequence's tables; nodes hold no pointers.
pub trait Node {
    fn links(&self) -> &NodeLinks;
}

/// One `EventData2` entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventNode {
    pub event_name: String,
    pub enabled: bool,
    pub replicate: bool,
    pub max_trigger_count: i32,
    pub re_trigger_delay: f32,
    pub filter_object: Option<String>,
    pub links: NodeLinks,
}

impl EventNode {
    pub fn from_dump(value: &Value) -> Result<Self, DecodeError> {
        let user_data = value.entry("UserData")?;
        // game data never fills FilterObject in; tolerate dumps that drop
        // the key entirely
        let filter_object = match user_data.get("FilterObject") {
            Some(Value::Str(text)) if text != "None" => Some(text.clone()),
            _ => None,
        };
        Ok(EventNode {
            event_name: user_data.quoted_field("EventName")?.to_string(),
            enabled: user_data.bool_field("bEnabled")?,
            replicate: user_data.bool_field("bReplicate")?,
            max_trigger_count: user_data.int_field("MaxTriggerCount")?,
            re_trigger_delay: user_data.float_field("ReTriggerDelay")?,
            filter_object,
            links: NodeLinks {
                // events keep their variable link range under the
                // OutputVariables key
                variable_links_ref: ArrayRef::from(
                    value.entry("OutputVariables")?.int_field("ArrayIndexAndLength")?,
                ),
                output_links_ref: ArrayRef::from(
                    value.entry("OutputLinks")?.int_field("ArrayIndexAndLength")?,
                ),
                ..Default::default()
            },
        })
    }

    pub fn to_dump(&self) -> Value {
        Value::record([
            (
                "UserData",
                Value::record([
                    ("EventName", Value::quoted(&self.event_name)),
                    ("bEnabled", Value::bool(self.enabled)),
                    ("bReplicate", Value::bool(self.replicate)),
                    ("MaxTriggerCount", Value::int(self.max_trigger_count)),
                    ("ReTriggerDelay", Value::float(self.re_trigger_delay)),
                    (
                        "FilterObject",
                        Value::string(self.filter_object.as_deref().unwrap_or("None")),
                    ),
                ]),
            ),
            ("OutputVariables", array_ref_value(self.links.variable_links_ref)),
            ("OutputLinks", array_ref_value(self.links.output_links_ref)),
        ])
    }
}

impl Node for EventNode {
    fn links(&self) -> &NodeLinks {
        &self.links
    }
}

/// One `BehaviorData2` entry. The `Behavior` reference `Class'Object'` is
/// kept split in two fields; the literal `None` (and anything malformed)
/// decodes as class `None`, object `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct BehaviorNode {
    pub behavior_class: String,
    pub behavior_object: String,
    pub links: NodeLinks,
}

impl Default for BehaviorNode {
    fn default() -> Self {
        BehaviorNode {
            behavior_class: "None".to_string(),
            behavior_object: "None".to_string(),
            links: NodeLinks::default(),
        }
    }
}

impl BehaviorNode {
    pub fn from_dump(value: &Value) -> Result<Self, DecodeError> {
        let behavior = value.str_field("Behavior")?;
        let (behavior_class, behavior_object) = match split_behavior(behavior) {
            Some(parts) => parts,
            None => {
                if behavior != "None" {
                    warn!("unreadable behavior reference {behavior:?}, treating as None");
                }
                ("None".to_string(), "None".to_string())
            }
        };
        Ok(BehaviorNode {
            behavior_class,
            behavior_object,
            links: NodeLinks {
                variable_links_ref: ArrayRef::from(
                    value.entry("LinkedVariables")?.int_field("ArrayIndexAndLength")?,
                ),
                output_links_ref: ArrayRef::from(
                    value.entry("OutputLinks")?.int_field("ArrayIndexAndLength")?,
                ),
                ..Default::default()
            },
        })
    }

    pub fn to_dump(&self) -> Value {
        Value::record([
            ("Behavior", Value::string(self.behavior())),
            ("LinkedVariables", array_ref_value(self.links.variable_links_ref)),
            ("OutputLinks", array_ref_value(self.links.output_links_ref)),
        ])
    }

    /// The dump spelling of the behavior reference.
    pub fn behavior(&self) -> String {
        if self.behavior_class == "None" && self.behavior_object == "None" {
            "None".to_string()
        } else {
            format!("{}'{}'", self.behavior_class, self.behavior_object)
        }
    }
}

impl Node for BehaviorNode {
    fn links(&self) -> &NodeLinks {
        &self.links
    }
}

fn split_behavior(behavior: &str) -> Option<(String, String)> {
    let (class, rest) = behavior.split_once('\'')?;
    let object = rest.split_once('\'').map_or(rest, |(object, _)| object);
    Some((class.to_string(), object.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_value() -> Value {
        Value::record([
            (
                "UserData",
                Value::record([
                    ("EventName", Value::string("\"OnTakeDamage\"")),
                    ("bEnabled", Value::string("True")),
                    ("bReplicate", Value::string("False")),
                    ("MaxTriggerCount", Value::int(0)),
                    ("ReTriggerDelay", Value::string("0.000000")),
                    ("FilterObject", Value::string("None")),
                ]),
            ),
            ("OutputVariables", array_ref_value(ArrayRef { index: 0, length: 2 })),
            ("OutputLinks", array_ref_value(ArrayRef { index: 1, length: 1 })),
        ])
    }

    #[test]
    fn event_decode() {
        let event = EventNode::from_dump(&event_value()).unwrap();
        assert_eq!(event.event_name, "OnTakeDamage");
        assert!(event.enabled);
        assert!(!event.replicate);
        assert_eq!(event.links.variable_links_ref, ArrayRef { index: 0, length: 2 });
        assert_eq!(event.links.output_links_ref, ArrayRef { index: 1, length: 1 });
        assert_eq!(event.filter_object, None);
        // handles are only filled in by the sequence decode stages
        assert!(event.links.variable_links.is_empty());
    }

    #[test]
    fn event_round_trips_through_the_dump_shape() {
        let event = EventNode::from_dump(&event_value()).unwrap();
        assert_eq!(EventNode::from_dump(&event.to_dump()).unwrap(), event);
    }

    #[test]
    fn behavior_reference_splits() {
        let value = Value::record([
            (
                "Behavior",
                Value::string("Behavior_AttachItems'GD_Hornet.Behavior_AttachItems_77'"),
            ),
            ("LinkedVariables", array_ref_value(ArrayRef::default())),
            ("OutputLinks", array_ref_value(ArrayRef::default())),
        ]);
        let behavior = BehaviorNode::from_dump(&value).unwrap();
        assert_eq!(behavior.behavior_class, "Behavior_AttachItems");
        assert_eq!(behavior.behavior_object, "GD_Hornet.Behavior_AttachItems_77");
        assert_eq!(behavior.behavior(), "Behavior_AttachItems'GD_Hornet.Behavior_AttachItems_77'");
        assert_eq!(BehaviorNode::from_dump(&behavior.to_dump()).unwrap(), behavior);
    }

    #[test]
    fn malformed_behavior_falls_back_to_none() {
        for text in ["None", "deleted", ""] {
            let value = Value::record([
                ("Behavior", Value::string(text)),
                ("LinkedVariables", array_ref_value(ArrayRef::default())),
                ("OutputLinks", array_ref_value(ArrayRef::default())),
            ]);
            let behavior = BehaviorNode::from_dump(&value).unwrap();
            assert_eq!(behavior.behavior_class, "None");
            assert_eq!(behavior.behavior_object, "None");
            assert_eq!(behavior.behavior(), "None");
        }
    }

    #[test]
    fn filter_object_survives_round_trips() {
        let mut event = EventNode::from_dump(&event_value()).unwrap();
        event.filter_object = Some("WillowGame.Default__WillowAIPawn".to_string());
        let reread = EventNode::from_dump(&event.to_dump()).unwrap();
        assert_eq!(reread.filter_object, event.filter_object);
    }

    #[test]
    fn missing_user_data_is_structural() {
        let value = Value::record([("OutputLinks", array_ref_value(ArrayRef::default()))]);
        assert!(matches!(
            EventNode::from_dump(&value),
            Err(DecodeError::Structure(_))
        ));
    }

    #[test]
    fn packed_entry_shape() {
        let value = array_ref_value(ArrayRef { index: 2, length: 1 });
        assert_eq!(
            value.int_field("ArrayIndexAndLength").unwrap(),
            i32::from(ArrayRef { index: 2, length: 1 })
        );
    }
}
