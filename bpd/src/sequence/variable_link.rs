// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::str::FromStr;

use derive_more::Display;
use enum_iterator::{all, Sequence};

use super::{array_ref_value, DecodeError};
use crate::dump::Value;
use crate::packed::ArrayRef;
use crate::sequence::variable::Variable;

#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq, Ord, PartialOrd, Sequence)]
pub enum VariableLinkType {
    #[default]
    #[display("BVARLINK_Unknown")]
    Unknown,
    #[display("BVARLINK_Context")]
    Context,
    #[display("BVARLINK_Input")]
    Input,
    #[display("BVARLINK_Output")]
    Output,
}

impl FromStr for VariableLinkType {
    type Err = DecodeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        all::<VariableLinkType>()
            .find(|link_type| link_type.to_string() == name)
            .ok_or_else(|| DecodeError::UnknownVariableLinkType { name: name.to_string() })
    }
}

/// One `ConsolidatedVariableLinkData` entry: a named variable slot on a
/// node, binding any number of sequence variables.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableLink {
    pub property_name: String,
    pub link_type: VariableLinkType,
    pub connection_index: i32,
    /// Kept verbatim for round trips; dumps normally store `None` here.
    pub cached_property: String,
    /// The decoded `LinkedVariables` ref; rewritten by reconsolidation.
    pub linked_variables_ref: ArrayRef,
    /// Variable table positions this link binds, `-1` for a slot that is
    /// present but unbound.
    pub linked_variable_indexes: Vec<i32>,
}

impl Default for VariableLink {
    fn default() -> Self {
        VariableLink {
            property_name: String::new(),
            link_type: VariableLinkType::default(),
            connection_index: 0,
            cached_property: "None".to_string(),
            linked_variables_ref: ArrayRef::default(),
            linked_variable_indexes: Vec::new(),
        }
    }
}

impl VariableLink {
    pub fn new(property_name: impl Into<String>, link_type: VariableLinkType) -> Self {
        VariableLink {
            property_name: property_name.into(),
            link_type,
            ..Default::default()
        }
    }

    /// Decode one consolidated entry, pulling the bound variable indexes
    /// out of the `linked_variables` indirection array.
    pub fn from_dump(value: &Value, linked_variables: &[i32]) -> Result<Self, DecodeError> {
        let linked_variables_ref =
            ArrayRef::from(value.entry("LinkedVariables")?.int_field("ArrayIndexAndLength")?);
        let linked_variable_indexes = linked_variables_ref
            .resolve(linked_variables.len())
            .map(|slot| linked_variables[slot])
            .collect();
        let cached_property = match value.get("CachedProperty") {
            Some(Value::Str(text)) => text.clone(),
            _ => "None".to_string(),
        };
        Ok(VariableLink {
            property_name: value.quoted_field("PropertyName")?.to_string(),
            link_type: value.str_field("VariableLinkType")?.parse()?,
            connection_index: value.int_field("ConnectionIndex")?,
            cached_property,
            linked_variables_ref,
            linked_variable_indexes,
        })
    }

    pub fn to_dump(&self) -> Value {
        Value::record([
            ("PropertyName", Value::quoted(&self.property_name)),
            ("VariableLinkType", Value::string(self.link_type.to_string())),
            ("ConnectionIndex", Value::int(self.connection_index)),
            ("LinkedVariables", array_ref_value(self.linked_variables_ref)),
            ("CachedProperty", Value::string(self.cached_property.as_str())),
        ])
    }

    /// The slots of this link resolved against the variable table; unbound
    /// and out-of-range slots come back as `None`.
    pub fn resolve_variables<'a>(
        &'a self,
        variables: &'a [Variable],
    ) -> impl Iterator<Item = Option<&'a Variable>> + 'a {
        self.linked_variable_indexes
            .iter()
            .map(|&index| usize::try_from(index).ok().and_then(|index| variables.get(index)))
    }

    /// The slots that actually bind a variable of a table with
    /// `variable_count` entries.
    pub fn bound_variable_indexes(
        &self,
        variable_count: usize,
    ) -> impl Iterator<Item = i32> + '_ {
        self.linked_variable_indexes
            .iter()
            .copied()
            .filter(move |&index| (0..variable_count as i32).contains(&index))
    }

    /// Flatten the bound slots back into packed form: zero bound variables
    /// pack the zero ref, exactly one packs the variable index directly
    /// (the identity prefix makes that decode correctly), more than one
    /// appends a fresh range at the indirection tail. Unbound slots are not
    /// representable in the flattened form and are dropped.
    pub fn consolidate_linked_variables(
        &mut self,
        variable_count: usize,
        linked_variables: &mut Vec<i32>,
    ) {
        let bound: Vec<i32> = self.bound_variable_indexes(variable_count).collect();
        self.linked_variables_ref = match bound.as_slice() {
            [] => ArrayRef::default(),
            &[index] => ArrayRef { index: index as u16, length: 1 },
            multiple => {
                let start = linked_variables.len();
                linked_variables.extend_from_slice(multiple);
                ArrayRef { index: start as u16, length: multiple.len() as u16 }
            }
        };
        self.linked_variable_indexes = bound;
    }

    /// Setter for the raw text of an edit field: unparsable text keeps the
    /// previous value.
    pub fn set_connection_index(&mut self, text: &str) {
        if let Ok(value) = text.trim().parse() {
            self.connection_index = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::variable::VariableType;

    fn link_value(packed: i32) -> Value {
        Value::record([
            ("PropertyName", Value::string("\"Context\"")),
            ("VariableLinkType", Value::string("BVARLINK_Context")),
            ("ConnectionIndex", Value::int(0)),
            ("LinkedVariables", array_ref_value(ArrayRef::from(packed))),
            ("CachedProperty", Value::string("None")),
        ])
    }

    #[test]
    fn decode_resolves_through_the_indirection_array() {
        // range [1, 4) of the indirection array
        let packed = i32::from(ArrayRef { index: 1, length: 3 });
        let link = VariableLink::from_dump(&link_value(packed), &[9, 2, -1, 0]).unwrap();
        assert_eq!(link.linked_variable_indexes, vec![2, -1, 0]);
        assert_eq!(link.link_type, VariableLinkType::Context);
    }

    #[test]
    fn single_fast_path_and_range_decode_alike() {
        // identity prefix, so a direct index and a length-1 range agree
        let indirection = [0, 1, 2];
        let direct = VariableLink::from_dump(
            &link_value(i32::from(ArrayRef { index: 2, length: 1 })),
            &indirection,
        )
        .unwrap();
        assert_eq!(direct.linked_variable_indexes, vec![2]);
    }

    #[test]
    fn overlong_ref_is_clamped() {
        let packed = i32::from(ArrayRef { index: 2, length: 9 });
        let link = VariableLink::from_dump(&link_value(packed), &[5, 4, 3]).unwrap();
        assert_eq!(link.linked_variable_indexes, vec![3]);

        let empty = VariableLink::from_dump(&link_value(packed), &[]).unwrap();
        assert!(empty.linked_variable_indexes.is_empty());
    }

    #[test]
    fn unknown_link_type_is_an_error() {
        let mut value = link_value(0);
        if let Value::Struct(entries) = &mut value {
            entries[1].1 = Value::string("BVARLINK_Sideways");
        }
        assert_eq!(
            VariableLink::from_dump(&value, &[]),
            Err(DecodeError::UnknownVariableLinkType { name: "BVARLINK_Sideways".to_string() })
        );
    }

    #[test]
    fn resolve_skips_unbound_slots() {
        let variables = vec![
            Variable { name: "A".to_string(), variable_type: VariableType::Object },
            Variable { name: "B".to_string(), variable_type: VariableType::Int },
        ];
        let link = VariableLink {
            linked_variable_indexes: vec![1, -1, 7],
            ..VariableLink::new("Other", VariableLinkType::Input)
        };
        let resolved: Vec<_> = link.resolve_variables(&variables).collect();
        assert_eq!(resolved, vec![Some(&variables[1]), None, None]);
        assert_eq!(link.bound_variable_indexes(variables.len()).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn consolidate_single_uses_the_direct_index() {
        let mut indirection = vec![0, 1, 2];
        let mut link = VariableLink {
            linked_variable_indexes: vec![-1, 2],
            ..VariableLink::default()
        };
        link.consolidate_linked_variables(3, &mut indirection);
        assert_eq!(link.linked_variables_ref, ArrayRef { index: 2, length: 1 });
        assert_eq!(link.linked_variable_indexes, vec![2]);
        // the fast path appends nothing
        assert_eq!(indirection, vec![0, 1, 2]);
    }

    #[test]
    fn consolidate_multiple_appends_at_the_tail() {
        let mut indirection = vec![0, 1, 2];
        let mut link = VariableLink {
            linked_variable_indexes: vec![2, 0],
            ..VariableLink::default()
        };
        link.consolidate_linked_variables(3, &mut indirection);
        assert_eq!(link.linked_variables_ref, ArrayRef { index: 3, length: 2 });
        assert_eq!(indirection, vec![0, 1, 2, 2, 0]);
    }

    #[test]
    fn consolidate_empty_packs_zero() {
        let mut indirection = vec![0];
        let mut link = VariableLink {
            linked_variable_indexes: vec![-1, 4],
            ..VariableLink::default()
        };
        link.consolidate_linked_variables(1, &mut indirection);
        assert_eq!(i32::from(link.linked_variables_ref), 0);
        assert!(link.linked_variable_indexes.is_empty());
        assert_eq!(indirection, vec![0]);
    }

    #[test]
    fn connection_index_rejects_garbage_silently() {
        let mut link = VariableLink::new("Context", VariableLinkType::Context);
        link.set_connection_index("12");
        assert_eq!(link.connection_index, 12);
        link.set_connection_index("twelve");
        assert_eq!(link.connection_index, 12);
        link.set_connection_index(" -3 ");
        assert_eq!(link.connection_index, -3);
    }
}
