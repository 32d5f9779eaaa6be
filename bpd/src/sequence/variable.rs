// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::str::FromStr;

use derive_more::Display;
use enum_iterator::{all, Sequence};

use super::DecodeError;
use crate::dump::Value;

/// The declared type of a sequence variable. Dumps store the `BVAR_` name,
/// never a number; declaration order is the order pickers show. The
/// format's `BVAR_MAX` sentinel has no variant here, use
/// [`enum_iterator::cardinality`] where the count is needed.
#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq, Ord, PartialOrd, Sequence)]
pub enum VariableType {
    #[default]
    #[display("BVAR_None")]
    None,
    #[display("BVAR_Bool")]
    Bool,
    #[display("BVAR_Int")]
    Int,
    #[display("BVAR_Float")]
    Float,
    #[display("BVAR_Vector")]
    Vector,
    #[display("BVAR_Object")]
    Object,
    #[display("BVAR_AllPlayers")]
    AllPlayers,
    #[display("BVAR_Attribute")]
    Attribute,
    #[display("BVAR_InstanceData")]
    InstanceData,
    #[display("BVAR_NamedVariable")]
    NamedVariable,
    #[display("BVAR_NamedKismetVariable")]
    NamedKismetVariable,
    #[display("BVAR_DirectionVector")]
    DirectionVector,
    #[display("BVAR_AttachmentLocation")]
    AttachmentLocation,
    #[display("BVAR_UnaryMath")]
    UnaryMath,
    #[display("BVAR_BinaryMath")]
    BinaryMath,
    #[display("BVAR_Flag")]
    Flag,
}

impl FromStr for VariableType {
    type Err = DecodeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        all::<VariableType>()
            .find(|variable_type| variable_type.to_string() == name)
            .ok_or_else(|| DecodeError::UnknownVariableType { name: name.to_string() })
    }
}

/// One `VariableData` entry of a sequence's variable table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Variable {
    pub name: String,
    pub variable_type: VariableType,
}

impl Variable {
    pub fn from_dump(value: &Value) -> Result<Self, DecodeError> {
        Ok(Variable {
            name: value.quoted_field("Name")?.to_string(),
            variable_type: value.str_field("Type")?.parse()?,
        })
    }

    pub fn to_dump(&self) -> Value {
        Value::record([
            ("Name", Value::quoted(&self.name)),
            ("Type", Value::string(self.variable_type.to_string())),
        ])
    }
}
