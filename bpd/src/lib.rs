// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod dump;
pub mod packed;
pub mod sequence;

use crate::dump::Value;
use crate::sequence::{BehaviorSequence, DecodeError};

/// One `BehaviorProviderDefinition` object: the named behavior sequences
/// of one game object, decoded out of its dump tree.
///
/// Decoding inflates the flattened per-sequence tables into an editable
/// graph; [`Self::export`] flattens back. Serializing without
/// reconsolidating first is only sound when nothing was edited, which is
/// why `export` is the one serialization entry point that takes `&mut`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BehaviorProviderDefinition {
    pub sequences: Vec<BehaviorSequence>,
}

impl BehaviorProviderDefinition {
    pub fn from_dump(value: &Value) -> Result<Self, DecodeError> {
        Ok(BehaviorProviderDefinition {
            sequences: value
                .list_field("BehaviorSequences")?
                .iter()
                .map(BehaviorSequence::from_dump)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Decode from the JSON interchange form of a dump tree.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, DecodeError> {
        Self::from_dump(&Value::from_json(json))
    }

    pub fn to_dump(&self) -> Value {
        Value::record([(
            "BehaviorSequences",
            Value::list(self.sequences.iter().map(BehaviorSequence::to_dump)),
        )])
    }

    /// Flatten every sequence back to canonical table form; see
    /// [`BehaviorSequence::reconsolidate`].
    pub fn reconsolidate(&mut self) {
        for sequence in &mut self.sequences {
            sequence.reconsolidate();
        }
    }

    /// Reconsolidate, then serialize. What comes back decodes to exactly
    /// the post-reconsolidation state.
    pub fn export(&mut self) -> Value {
        self.reconsolidate();
        self.to_dump()
    }

    /// The object as dump property lines, the way dump viewers print it.
    pub fn to_text(&self) -> String {
        dump::object_text(&self.to_dump())
    }

    /// Per-sequence structural equality; see
    /// [`BehaviorSequence::graph_eq`].
    pub fn graph_eq(&self, other: &Self) -> bool {
        self.sequences.len() == other.sequences.len()
            && self
                .sequences
                .iter()
                .zip(&other.sequences)
                .all(|(mine, theirs)| mine.graph_eq(theirs))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::packed::ArrayRef;
    use crate::sequence::VariableType;

    /// A canonical one-sequence object: one event firing two behaviors,
    /// all three link encodings (zero, direct index, appended range)
    /// present. Packed ints spelled as numbers the way dump-to-JSON
    /// converters emit them.
    fn fixture() -> serde_json::Value {
        json!({
            "BehaviorSequences": [
                {
                    "BehaviorSequenceName": "\"Enable\"",
                    "EventData2": [
                        {
                            "UserData": {
                                "EventName": "\"OnActivated\"",
                                "bEnabled": "True",
                                "bReplicate": "False",
                                "MaxTriggerCount": 0,
                                "ReTriggerDelay": 0,
                                "FilterObject": "None"
                            },
                            "OutputVariables": { "ArrayIndexAndLength": 1 },
                            "OutputLinks": { "ArrayIndexAndLength": 2 }
                        }
                    ],
                    "BehaviorData2": [
                        {
                            "Behavior": "Behavior_Gate'GD_Doorway.TheDoor:BehaviorProviderDefinition_0.Behavior_Gate_27'",
                            "LinkedVariables": { "ArrayIndexAndLength": 65538 },
                            "OutputLinks": { "ArrayIndexAndLength": 131073 }
                        },
                        {
                            "Behavior": "Behavior_OpenDoor'GD_Doorway.TheDoor:BehaviorProviderDefinition_0.Behavior_OpenDoor_3'",
                            "LinkedVariables": { "ArrayIndexAndLength": 0 },
                            "OutputLinks": { "ArrayIndexAndLength": 0 }
                        }
                    ],
                    "VariableData": [
                        { "Name": "\"Target\"", "Type": "BVAR_Object" },
                        { "Name": "\"Delay\"", "Type": "BVAR_Float" },
                        { "Name": "\"Flag\"", "Type": "BVAR_Bool" }
                    ],
                    "ConsolidatedOutputLinkData": [
                        { "LinkIdAndLinkedBehavior": 0, "ActivateDelay": 0 },
                        { "LinkIdAndLinkedBehavior": 16777217, "ActivateDelay": 0.25 },
                        { "LinkIdAndLinkedBehavior": -16777215, "ActivateDelay": 0 }
                    ],
                    "ConsolidatedVariableLinkData": [
                        {
                            "PropertyName": "\"Context\"",
                            "VariableLinkType": "BVARLINK_Context",
                            "ConnectionIndex": 0,
                            "LinkedVariables": { "ArrayIndexAndLength": 1 },
                            "CachedProperty": "None"
                        },
                        {
                            "PropertyName": "\"Input\"",
                            "VariableLinkType": "BVARLINK_Input",
                            "ConnectionIndex": 0,
                            "LinkedVariables": { "ArrayIndexAndLength": 196610 },
                            "CachedProperty": "None"
                        },
                        {
                            "PropertyName": "\"Result\"",
                            "VariableLinkType": "BVARLINK_Output",
                            "ConnectionIndex": 0,
                            "LinkedVariables": { "ArrayIndexAndLength": 65537 },
                            "CachedProperty": "None"
                        }
                    ],
                    "ConsolidatedLinkedVariables": "0,1,2,0,2"
                }
            ]
        })
    }

    #[test]
    fn decode_inflates_the_flattened_tables() {
        let object = BehaviorProviderDefinition::from_json(&fixture()).unwrap();
        assert_eq!(object.sequences.len(), 1);
        let sequence = &object.sequences[0];
        assert_eq!(sequence.name, "Enable");
        assert_eq!(sequence.linked_variables, vec![0, 1, 2, 0, 2]);
        assert_eq!(
            sequence.variables.iter().map(|v| v.variable_type).collect::<Vec<_>>(),
            vec![VariableType::Object, VariableType::Float, VariableType::Bool]
        );

        let event = &sequence.events[0];
        assert_eq!(event.event_name, "OnActivated");
        assert_eq!(event.links.variable_links, vec![0]);
        assert_eq!(event.links.output_links, vec![0, 1]);
        let destinations: Vec<_> = sequence
            .node_output_links(event)
            .map(|link| (link.link_id, link.link_index, link.activate_delay))
            .collect();
        assert_eq!(destinations, vec![(0, 0, 0.0), (1, 1, 0.25)]);

        let gate = &sequence.behaviors[0];
        assert_eq!(gate.behavior_class, "Behavior_Gate");
        assert_eq!(gate.links.variable_links, vec![1, 2]);
        assert_eq!(gate.links.output_links, vec![2]);
        // the appended range and the direct index decode through the same
        // indirection array
        assert_eq!(sequence.variable_links[1].linked_variable_indexes, vec![0, 2]);
        assert_eq!(sequence.variable_links[2].linked_variable_indexes, vec![1]);
        assert_eq!(sequence.output_links[2].link_id, -1);

        assert_eq!(sequence.behaviors[1].links.variable_links_ref, ArrayRef::default());
        assert!(sequence.behaviors[1].links.output_links.is_empty());
    }

    #[test]
    fn export_round_trips_the_canonical_form() {
        let object = BehaviorProviderDefinition::from_json(&fixture()).unwrap();
        let mut exported = object.clone();
        let value = exported.export();
        // the fixture is already canonical, so reconsolidation is a no-op
        assert_eq!(exported, object);
        let re_decoded = BehaviorProviderDefinition::from_dump(&value).unwrap();
        assert_eq!(re_decoded, object);
        assert!(re_decoded.graph_eq(&object));

        // and the JSON interchange form carries the same tree
        let json = value.to_json();
        assert_eq!(BehaviorProviderDefinition::from_json(&json).unwrap(), object);
    }

    #[test]
    fn edits_survive_an_export_cycle() {
        let mut edited = BehaviorProviderDefinition::from_json(&fixture()).unwrap();
        edited.sequences[0].delete_behavior(0);
        let re_decoded = BehaviorProviderDefinition::from_dump(&edited.export()).unwrap();
        // export reconsolidated `edited` in place, so the re-decode matches
        // it exactly
        assert_eq!(re_decoded, edited);
        assert!(re_decoded.graph_eq(&edited));

        let sequence = &re_decoded.sequences[0];
        assert_eq!(sequence.behaviors.len(), 1);
        assert_eq!(sequence.behaviors[0].behavior_class, "Behavior_OpenDoor");
        // the deleted node took its own links with it; the event's edge to
        // it was dropped, the edge to the survivor renumbered
        assert_eq!(sequence.output_links.len(), 1);
        assert_eq!(sequence.output_links[0].link_index, 0);
        assert_eq!(sequence.output_links[0].link_id, 1);
        assert_eq!(sequence.variable_links.len(), 1);
        assert_eq!(sequence.variable_links[0].property_name, "Context");
        assert_eq!(sequence.linked_variables, vec![0, 1, 2]);

        let original = BehaviorProviderDefinition::from_json(&fixture()).unwrap();
        assert!(!re_decoded.graph_eq(&original));
    }

    #[test]
    fn object_text_lists_sequences_unreal_style() {
        let object = BehaviorProviderDefinition::from_json(&fixture()).unwrap();
        let text = object.to_text();
        assert!(text.starts_with("BehaviorSequences(0)=(BehaviorSequenceName=\"Enable\","));
        assert_eq!(text.lines().count(), 1);

        // serialization key order is fixed
        let keys = [
            "BehaviorSequenceName=",
            "EventData2=",
            "BehaviorData2=",
            "VariableData=",
            "ConsolidatedOutputLinkData=",
            "ConsolidatedVariableLinkData=",
            "ConsolidatedLinkedVariables=",
        ];
        let positions: Vec<_> = keys.iter().map(|key| text.find(key).unwrap()).collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn an_object_without_sequences_is_structural() {
        assert_eq!(
            BehaviorProviderDefinition::from_json(&json!({ "ObjectFlags": 0 })),
            Err(DecodeError::Structure(dump::StructureError::MissingKey {
                key: "BehaviorSequences".to_string()
            }))
        );
    }
}
