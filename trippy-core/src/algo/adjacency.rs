//! Classification of legs directly connected to a DRT leg.
//!
//! Works on the legs of one trip with walk legs already removed, in
//! traversal order. Positions are 1-based like `leg_number`: a leg at
//! position `p` is adjacent to a DRT leg at position `d` if `|p - d| == 1`.
//! A DRT leg that is the only leg of the sequence is kept as `Direct`.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegOrder {
    Direct,
    Before,
    After,
}

impl LegOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            LegOrder::Direct => "direct",
            LegOrder::Before => "before",
            LegOrder::After => "after",
        }
    }
}

impl fmt::Display for LegOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leg retained by [`adjacent_legs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacentLeg {
    /// Index into the slice passed to [`adjacent_legs`]
    pub index: usize,
    /// 1-based position of the DRT leg this leg was matched against
    pub drt_number: usize,
    pub order: LegOrder,
}

/// Pair every leg with every DRT leg of the same sequence and keep the pairs
/// that are directly adjacent (or the sole-leg case).
///
/// `is_drt[i]` tells whether the leg at position `i + 1` is a DRT leg.
/// Output is ordered by leg, then by DRT position.
pub fn adjacent_legs(is_drt: &[bool]) -> Vec<AdjacentLeg> {
    let legs_count = is_drt.len();
    let drt_numbers: Vec<usize> = is_drt
        .iter()
        .enumerate()
        .filter(|(_, drt)| **drt)
        .map(|(idx, _)| idx + 1)
        .collect();

    let mut adjacent = Vec::new();
    for index in 0..legs_count {
        let leg_number = index + 1;
        for &drt_number in &drt_numbers {
            let sole_leg = drt_number == 1 && legs_count == 1;
            if sole_leg || leg_number.abs_diff(drt_number) == 1 {
                let order = match leg_number.cmp(&drt_number) {
                    std::cmp::Ordering::Equal => LegOrder::Direct,
                    std::cmp::Ordering::Less => LegOrder::Before,
                    std::cmp::Ordering::Greater => LegOrder::After,
                };
                adjacent.push(AdjacentLeg {
                    index,
                    drt_number,
                    order,
                });
            }
        }
    }
    adjacent
}
