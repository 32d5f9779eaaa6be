// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The bit-packed int32 reference fields of the flattened sequence form.
//!
//! Both fields are stored in dumps as one decimal int32 whose big-endian
//! bytes carry the actual halves.

use std::io::Cursor;
use std::ops::Range;

use binrw::{binrw, BinRead, BinWrite};
use log::warn;

/// An `ArrayIndexAndLength` field: the sub-range `[index, index + length)`
/// of some consolidated table, packed into the two halves of an int32.
///
/// A packed value of `0` means "no elements".
#[binrw]
#[brw(big)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ArrayRef {
    pub index: u16,
    pub length: u16,
}

impl ArrayRef {
    /// The half-open range this ref selects out of a table of `len` entries.
    ///
    /// Dumps in the wild contain refs that overrun the table they point
    /// into, up to and including nonzero refs into an empty table, so the
    /// range is clamped to the table.
    pub fn resolve(self, len: usize) -> Range<usize> {
        let start = (self.index as usize).min(len);
        let end = (self.index as usize + self.length as usize).min(len);
        if end - start < self.length as usize {
            warn!(
                "reference {}+{} overruns a table of {len} entries",
                self.index, self.length
            );
        }
        start..end
    }
}

impl From<i32> for ArrayRef {
    fn from(packed: i32) -> Self {
        // reading four in-memory bytes cannot fail
        Self::read(&mut Cursor::new(packed.to_be_bytes())).unwrap()
    }
}

impl From<ArrayRef> for i32 {
    fn from(unpacked: ArrayRef) -> Self {
        let mut data = Cursor::new([0u8; 4]);
        unpacked.write(&mut data).unwrap();
        i32::from_be_bytes(data.into_inner())
    }
}

/// A `LinkIdAndLinkedBehavior` field: a signed link id byte, one padding
/// byte and the destination behavior's position in the consolidated
/// behavior list.
///
/// The padding byte is ignored on decode and written as zero on encode, so
/// repacking an int32 with nonzero padding normalizes it. A `link_id` of
/// `-1` is the stored "fire all outputs" value and gets no interpretation
/// here.
#[binrw]
#[brw(big)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LinkRef {
    pub link_id: i8,
    #[br(temp)]
    #[bw(calc = 0)]
    padding: i8,
    pub behavior_index: u16,
}

impl From<i32> for LinkRef {
    fn from(packed: i32) -> Self {
        Self::read(&mut Cursor::new(packed.to_be_bytes())).unwrap()
    }
}

impl From<LinkRef> for i32 {
    fn from(unpacked: LinkRef) -> Self {
        let mut data = Cursor::new([0u8; 4]);
        unpacked.write(&mut data).unwrap();
        i32::from_be_bytes(data.into_inner())
    }
}
