// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Batch reporting over decoded objects: per-object statistics and the
//! export round-trip check.

use std::fmt::{Display, Formatter};
use std::ops::AddAssign;

use similar::TextDiff;

use bpd::dump::object_text;
use bpd::sequence::DecodeError;
use bpd::BehaviorProviderDefinition;

/// Element counts of one decoded object; `+=` accumulates batch totals.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub sequences: usize,
    pub events: usize,
    pub behaviors: usize,
    pub variables: usize,
    pub variable_links: usize,
    pub output_links: usize,
}

impl Summary {
    pub fn of(object: &BehaviorProviderDefinition) -> Self {
        let mut summary = Summary {
            sequences: object.sequences.len(),
            ..Default::default()
        };
        for sequence in &object.sequences {
            summary.events += sequence.events.len();
            summary.behaviors += sequence.behaviors.len();
            summary.variables += sequence.variables.len();
            summary.variable_links += sequence.variable_links.len();
            summary.output_links += sequence.output_links.len();
        }
        summary
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, other: Self) {
        self.sequences += other.sequences;
        self.events += other.events;
        self.behaviors += other.behaviors;
        self.variables += other.variables;
        self.variable_links += other.variable_links;
        self.output_links += other.output_links;
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} sequences, {} events, {} behaviors, {} variables, {} variable links, {} output links",
            self.sequences,
            self.events,
            self.behaviors,
            self.variables,
            self.variable_links,
            self.output_links
        )
    }
}

/// What re-decoding an object's own export showed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoundTrip {
    /// The export reproduces the dumped text; the object was already in
    /// canonical form.
    Clean,
    /// The text changed but the graph did not: the dump carried
    /// non-canonical tables (orphans, stale refs, unbound links) that
    /// reconsolidation cleaned up.
    Reconsolidated { diff: String },
    /// The re-decoded graph differs from the reconsolidated state. This is
    /// a codec defect, not a property of the input.
    Diverged { diff: String },
}

/// Export `object` and decode the export back, comparing text before the
/// trip against text after and graph against graph.
pub fn round_trip(object: &BehaviorProviderDefinition) -> Result<RoundTrip, DecodeError> {
    let dumped = object_text(&object.to_dump());
    let mut reconsolidated = object.clone();
    let exported = reconsolidated.export();
    let canonical = object_text(&exported);
    let re_decoded = BehaviorProviderDefinition::from_dump(&exported)?;
    if !re_decoded.graph_eq(&reconsolidated) {
        Ok(RoundTrip::Diverged { diff: unified_diff(&dumped, &canonical) })
    } else if canonical != dumped {
        Ok(RoundTrip::Reconsolidated { diff: unified_diff(&dumped, &canonical) })
    } else {
        Ok(RoundTrip::Clean)
    }
}

fn unified_diff(dumped: &str, canonical: &str) -> String {
    TextDiff::from_lines(dumped, canonical)
        .unified_diff()
        .context_radius(1)
        .header("dumped", "reconsolidated")
        .to_string()
}
