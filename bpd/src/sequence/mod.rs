// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! One behavior sequence: decode out of the flattened dump form, edit as a
//! graph, reconsolidate, serialize back.
//!
//! The flattened form stores per-node link collections as packed ranges
//! into per-sequence consolidated tables. Editing operations work on the
//! graph view and may leave those tables stale or orphaned;
//! [`BehaviorSequence::reconsolidate`] makes them canonical again and has
//! to run before serialization.

pub mod node;
pub mod output_link;
pub mod variable;
pub mod variable_link;

use std::mem;

use itertools::Itertools;
use thiserror::Error;

pub use node::{BehaviorNode, EventNode, Node, NodeLinks};
pub use output_link::OutputLink;
pub use variable::{Variable, VariableType};
pub use variable_link::{VariableLink, VariableLinkType};

use crate::dump::{StructureError, Value};
use crate::packed::ArrayRef;

/// A dump subtree could not be decoded into sequence state.
///
/// Fatal to the object being decoded, never to the process: batch callers
/// report the one object and move on, interactive callers refuse it.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DecodeError {
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error("unknown variable type {name:?}")]
    UnknownVariableType { name: String },
    #[error("unknown variable link type {name:?}")]
    UnknownVariableLinkType { name: String },
}

/// Addresses one node of a sequence by kind and list position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NodeId {
    Event(usize),
    Behavior(usize),
}

/// One `BehaviorSequences` element: the variable table, the consolidated
/// link tables, and the event/behavior nodes slicing into them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BehaviorSequence {
    pub name: String,
    pub variables: Vec<Variable>,
    /// The `ConsolidatedLinkedVariables` indirection array: variable table
    /// positions, negative for a slot that is present but unbound.
    pub linked_variables: Vec<i32>,
    pub variable_links: Vec<VariableLink>,
    pub output_links: Vec<OutputLink>,
    pub events: Vec<EventNode>,
    pub behaviors: Vec<BehaviorNode>,
}

impl BehaviorSequence {
    /// Decode one sequence subtree. Later stages index tables built by
    /// earlier ones, so the order here is fixed: variables, the
    /// indirection array, variable links, nodes and their variable link
    /// ranges, output links, output link ranges.
    pub fn from_dump(value: &Value) -> Result<Self, DecodeError> {
        let name = value.quoted_field("BehaviorSequenceName")?.to_string();

        let variables = value
            .list_field("VariableData")?
            .iter()
            .map(Variable::from_dump)
            .collect::<Result<Vec<_>, _>>()?;

        let linked_variables =
            parse_linked_variables(value.str_field("ConsolidatedLinkedVariables")?)?;

        let variable_links = value
            .list_field("ConsolidatedVariableLinkData")?
            .iter()
            .map(|link| VariableLink::from_dump(link, &linked_variables))
            .collect::<Result<Vec<_>, _>>()?;

        let mut events = value
            .list_field("EventData2")?
            .iter()
            .map(EventNode::from_dump)
            .collect::<Result<Vec<_>, _>>()?;
        let mut behaviors = value
            .list_field("BehaviorData2")?
            .iter()
            .map(BehaviorNode::from_dump)
            .collect::<Result<Vec<_>, _>>()?;
        for links in node_links(&mut events, &mut behaviors) {
            links.variable_links = links.variable_links_ref.resolve(variable_links.len()).collect();
        }

        let output_links = value
            .list_field("ConsolidatedOutputLinkData")?
            .iter()
            .map(OutputLink::from_dump)
            .collect::<Result<Vec<_>, _>>()?;
        // dumps exist with nonzero output ranges next to an empty table;
        // the clamp resolves those to no links
        for links in node_links(&mut events, &mut behaviors) {
            links.output_links = links.output_links_ref.resolve(output_links.len()).collect();
        }

        Ok(BehaviorSequence {
            name,
            variables,
            linked_variables,
            variable_links,
            output_links,
            events,
            behaviors,
        })
    }

    /// Serialize the current consolidated state. Run
    /// [`Self::reconsolidate`] first when the sequence has been edited.
    pub fn to_dump(&self) -> Value {
        Value::record([
            ("BehaviorSequenceName", Value::quoted(&self.name)),
            ("EventData2", Value::list(self.events.iter().map(EventNode::to_dump))),
            ("BehaviorData2", Value::list(self.behaviors.iter().map(BehaviorNode::to_dump))),
            ("VariableData", Value::list(self.variables.iter().map(Variable::to_dump))),
            (
                "ConsolidatedOutputLinkData",
                Value::list(self.output_links.iter().map(OutputLink::to_dump)),
            ),
            (
                "ConsolidatedVariableLinkData",
                Value::list(self.variable_links.iter().map(VariableLink::to_dump)),
            ),
            (
                "ConsolidatedLinkedVariables",
                Value::string(self.linked_variables.iter().join(",")),
            ),
        ])
    }

    /// Rebuild the flattened tables from the current graph state.
    ///
    /// The indirection array becomes the identity prefix (entry `i` holds
    /// `i`, which is what lets single-variable links point straight at the
    /// variable index) plus the appended tails of multi-variable links.
    /// The link tables are rebuilt node by node, events first: wholly
    /// unbound variable links, output links without a live destination,
    /// and entries no node slot claims do not survive.
    pub fn reconsolidate(&mut self) {
        let variable_count = self.variables.len();
        let behavior_count = self.behaviors.len();
        let mut linked_variables: Vec<i32> = (0..variable_count as i32).collect();
        let mut old_variable_links: Vec<Option<VariableLink>> =
            mem::take(&mut self.variable_links).into_iter().map(Some).collect();
        let mut old_output_links: Vec<Option<OutputLink>> =
            mem::take(&mut self.output_links).into_iter().map(Some).collect();
        let mut variable_links = Vec::new();
        let mut output_links = Vec::new();

        for links in node_links(&mut self.events, &mut self.behaviors) {
            let start = variable_links.len();
            for handle in mem::take(&mut links.variable_links) {
                // a stale or already-claimed handle drops out here
                let Some(mut link) = old_variable_links.get_mut(handle).and_then(Option::take)
                else {
                    continue;
                };
                link.consolidate_linked_variables(variable_count, &mut linked_variables);
                if link.linked_variable_indexes.is_empty() {
                    continue;
                }
                links.variable_links.push(variable_links.len());
                variable_links.push(link);
            }
            links.variable_links_ref = range_ref(start, variable_links.len());

            let start = output_links.len();
            for handle in mem::take(&mut links.output_links) {
                let Some(link) = old_output_links.get_mut(handle).and_then(Option::take) else {
                    continue;
                };
                if !link.has_destination(behavior_count) {
                    continue;
                }
                links.output_links.push(output_links.len());
                output_links.push(link);
            }
            links.output_links_ref = range_ref(start, output_links.len());
        }

        self.linked_variables = linked_variables;
        self.variable_links = variable_links;
        self.output_links = output_links;
    }

    /// Append a variable; the new table index comes back.
    pub fn add_variable(&mut self, name: impl Into<String>, variable_type: VariableType) -> usize {
        self.variables.push(Variable { name: name.into(), variable_type });
        self.variables.len() - 1
    }

    /// Remove the variable at `index` and fix up every link's slots: exact
    /// references become unbound, higher ones shift down. The indirection
    /// array is left for the next reconsolidation to rebuild.
    pub fn remove_variable(&mut self, index: usize) {
        let removed = index as i32;
        for link in &mut self.variable_links {
            for slot in &mut link.linked_variable_indexes {
                if *slot == removed {
                    *slot = -1;
                } else if *slot > removed {
                    *slot -= 1;
                }
            }
        }
        self.variables.remove(index);
    }

    /// Delete the behavior at `index`. Links across the whole sequence are
    /// renumbered before the node is removed: exact hits unlink, higher
    /// destinations shift down. The node's own links become orphans until
    /// the next reconsolidation.
    pub fn delete_behavior(&mut self, index: usize) {
        let removed = index as i32;
        for link in &mut self.output_links {
            if link.link_index == removed {
                link.link_index = -1;
            } else if link.link_index > removed {
                link.link_index -= 1;
            }
        }
        self.behaviors.remove(index);
    }

    /// Delete the event at `index`; nothing points at events, so no
    /// renumbering is needed.
    pub fn delete_event(&mut self, index: usize) {
        self.events.remove(index);
    }

    /// Attach a link to a node: the link lands in the consolidated table,
    /// its handle in the node's slot list. `None` for a node that does not
    /// exist.
    pub fn add_variable_link(&mut self, id: NodeId, link: VariableLink) -> Option<usize> {
        let links = match id {
            NodeId::Event(index) => &mut self.events.get_mut(index)?.links,
            NodeId::Behavior(index) => &mut self.behaviors.get_mut(index)?.links,
        };
        let handle = self.variable_links.len();
        self.variable_links.push(link);
        links.variable_links.push(handle);
        Some(handle)
    }

    pub fn add_output_link(&mut self, id: NodeId, link: OutputLink) -> Option<usize> {
        let links = match id {
            NodeId::Event(index) => &mut self.events.get_mut(index)?.links,
            NodeId::Behavior(index) => &mut self.behaviors.get_mut(index)?.links,
        };
        let handle = self.output_links.len();
        self.output_links.push(link);
        links.output_links.push(handle);
        Some(handle)
    }

    /// Detach the variable link in `slot` (a position in the node's own
    /// list, not the consolidated table). The orphaned table entry is
    /// swept by the next reconsolidation. The detached handle comes back.
    pub fn remove_variable_link(&mut self, id: NodeId, slot: usize) -> Option<usize> {
        let links = match id {
            NodeId::Event(index) => &mut self.events.get_mut(index)?.links,
            NodeId::Behavior(index) => &mut self.behaviors.get_mut(index)?.links,
        };
        (slot < links.variable_links.len()).then(|| links.variable_links.remove(slot))
    }

    pub fn remove_output_link(&mut self, id: NodeId, slot: usize) -> Option<usize> {
        let links = match id {
            NodeId::Event(index) => &mut self.events.get_mut(index)?.links,
            NodeId::Behavior(index) => &mut self.behaviors.get_mut(index)?.links,
        };
        (slot < links.output_links.len()).then(|| links.output_links.remove(slot))
    }

    /// The variable links attached to one node, in slot order.
    pub fn node_variable_links<'a>(
        &'a self,
        node: &'a (impl Node + ?Sized),
    ) -> impl Iterator<Item = &'a VariableLink> {
        self.variable_links_of(node.links())
    }

    /// The output links attached to one node, in slot order.
    pub fn node_output_links<'a>(
        &'a self,
        node: &'a (impl Node + ?Sized),
    ) -> impl Iterator<Item = &'a OutputLink> {
        self.output_links_of(node.links())
    }

    fn variable_links_of<'a>(
        &'a self,
        links: &'a NodeLinks,
    ) -> impl Iterator<Item = &'a VariableLink> {
        links.variable_links.iter().filter_map(|&handle| self.variable_links.get(handle))
    }

    fn output_links_of<'a>(&'a self, links: &'a NodeLinks) -> impl Iterator<Item = &'a OutputLink> {
        links.output_links.iter().filter_map(|&handle| self.output_links.get(handle))
    }

    /// Structural graph equality: same variables and nodes, same resolved
    /// bindings and destinations per node, no matter how the consolidated
    /// tables happen to be laid out and regardless of orphaned entries.
    pub fn graph_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.variables == other.variables
            && self.events.len() == other.events.len()
            && self.behaviors.len() == other.behaviors.len()
            && self.events.iter().zip(&other.events).all(|(mine, theirs)| {
                mine.event_name == theirs.event_name
                    && mine.enabled == theirs.enabled
                    && mine.replicate == theirs.replicate
                    && mine.max_trigger_count == theirs.max_trigger_count
                    && mine.re_trigger_delay == theirs.re_trigger_delay
                    && mine.filter_object == theirs.filter_object
                    && self.links_eq(&mine.links, other, &theirs.links)
            })
            && self.behaviors.iter().zip(&other.behaviors).all(|(mine, theirs)| {
                mine.behavior_class == theirs.behavior_class
                    && mine.behavior_object == theirs.behavior_object
                    && self.links_eq(&mine.links, other, &theirs.links)
            })
    }

    fn links_eq(&self, mine: &NodeLinks, other: &Self, theirs: &NodeLinks) -> bool {
        self.variable_links_of(mine)
            .map(|link| link_key(link, self.variables.len()))
            .eq(other
                .variable_links_of(theirs)
                .map(|link| link_key(link, other.variables.len())))
            && self
                .output_links_of(mine)
                .map(|link| edge_key(link, self.behaviors.len()))
                .eq(other
                    .output_links_of(theirs)
                    .map(|link| edge_key(link, other.behaviors.len())))
    }
}

fn link_key(
    link: &VariableLink,
    variable_count: usize,
) -> (&str, VariableLinkType, i32, &str, Vec<i32>) {
    (
        &link.property_name,
        link.link_type,
        link.connection_index,
        &link.cached_property,
        link.bound_variable_indexes(variable_count).collect(),
    )
}

fn edge_key(link: &OutputLink, behavior_count: usize) -> (i8, i32, f32) {
    let destination = if link.has_destination(behavior_count) { link.link_index } else { -1 };
    (link.link_id, destination, link.activate_delay)
}

fn node_links<'a>(
    events: &'a mut [EventNode],
    behaviors: &'a mut [BehaviorNode],
) -> impl Iterator<Item = &'a mut NodeLinks> {
    events
        .iter_mut()
        .map(|event| &mut event.links)
        .chain(behaviors.iter_mut().map(|behavior| &mut behavior.links))
}

fn range_ref(start: usize, end: usize) -> ArrayRef {
    if end == start {
        ArrayRef::default()
    } else {
        ArrayRef { index: start as u16, length: (end - start) as u16 }
    }
}

/// The `(ArrayIndexAndLength=n)` struct every packed range is wrapped in.
pub(crate) fn array_ref_value(reference: ArrayRef) -> Value {
    Value::record([("ArrayIndexAndLength", Value::int(reference.into()))])
}

/// `ConsolidatedLinkedVariables` is one comma-joined string of ints. An
/// empty string is an empty array, not one empty entry.
fn parse_linked_variables(text: &str) -> Result<Vec<i32>, StructureError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|part| {
            part.trim().parse().map_err(|_| StructureError::BadInt {
                key: "ConsolidatedLinkedVariables".to_string(),
                text: part.to_string(),
            })
        })
        .collect()
}
