// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

use super::DecodeError;
use crate::dump::Value;
use crate::packed::LinkRef;
use crate::sequence::node::BehaviorNode;

/// One `ConsolidatedOutputLinkData` entry: an activation edge from a node
/// to a behavior, fired after `activate_delay` seconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputLink {
    /// Stored faithfully; `-1` is the format's "fire all outputs" value.
    pub link_id: i8,
    /// Position of the destination in the sequence's behavior list, `-1`
    /// (or anything out of range) when unlinked.
    pub link_index: i32,
    pub activate_delay: f32,
}

impl OutputLink {
    pub fn from_dump(value: &Value) -> Result<Self, DecodeError> {
        let link_ref = LinkRef::from(value.int_field("LinkIdAndLinkedBehavior")?);
        Ok(OutputLink {
            link_id: link_ref.link_id,
            link_index: link_ref.behavior_index as i32,
            activate_delay: value.float_field("ActivateDelay")?,
        })
    }

    pub fn to_dump(&self) -> Value {
        Value::record([
            ("LinkIdAndLinkedBehavior", Value::int(self.packed_ref().into())),
            ("ActivateDelay", Value::float(self.activate_delay)),
        ])
    }

    /// Repacked from the current id and destination index. The int decoded
    /// from the dump is never reused, so destinations renumbered by edits
    /// serialize correctly.
    pub fn packed_ref(&self) -> LinkRef {
        LinkRef {
            link_id: self.link_id,
            behavior_index: self.link_index.clamp(0, u16::MAX as i32) as u16,
        }
    }

    pub fn has_destination(&self, behavior_count: usize) -> bool {
        (0..behavior_count as i32).contains(&self.link_index)
    }

    /// The destination node, if `link_index` currently points at one.
    pub fn linked_behavior<'a>(&self, behaviors: &'a [BehaviorNode]) -> Option<&'a BehaviorNode> {
        usize::try_from(self.link_index)
            .ok()
            .and_then(|index| behaviors.get(index))
    }

    /// Setter for the raw text of an edit field: unparsable text (and
    /// anything outside the signed byte the format packs) keeps the
    /// previous value.
    pub fn set_link_id(&mut self, text: &str) {
        if let Ok(value) = text.trim().parse() {
            self.link_id = value;
        }
    }
}
