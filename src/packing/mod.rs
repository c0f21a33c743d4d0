//! Packed texel fetch policy
//!
//! A packed texture stores a 2×2 block of logical values per RGBA texel:
//!
//! ```text
//!            col 2k   col 2k+1
//! row 2j   ┌────────┬─────────┐
//!          │   x    │    y    │
//! row 2j+1 ├────────┼─────────┤
//!          │   z    │    w    │
//!          └────────┴─────────┘
//! ```
//!
//! For convolution over NHWC input packed along (W, C), a texel fetched at
//! an even column yields two channels for two adjacent columns. Odd left
//! padding shifts every filter tap by one column, so the logical values
//! a tap needs straddle two texels and have to be composed from halves.
//! Dilation parity decides whether the second tap of a column pair lands
//! on the same texel grid as the first. [`table::DECISION_TABLE`] enumerates
//! every case and [`RowFetch`] emits the chosen strategy per column pair.

mod fetch;
mod table;

pub use fetch::{RowFetch, composed, ready_flag, texel_slot};
pub use table::{DECISION_TABLE, DecisionEntry, FetchStrategy, Parity, Slot, select_strategy};

use std::collections::BTreeSet;

use crate::glsl::{Expr, Stmt};

/// Texel slots assigned from `getX` anywhere in `stmts`.
///
/// Each slot is fetched at most once per row step (its ready flag guards
/// it), so the set size is the number of distinct fetch sites per row.
/// Scratch texels (`previous`, `final`) are not slots and are not counted.
pub fn texel_fetch_sites(stmts: &[Stmt]) -> BTreeSet<i32> {
    let mut sites = BTreeSet::new();
    for stmt in stmts {
        stmt.walk(&mut |s| {
            if let Stmt::Assign {
                target: Expr::Ident(name),
                value,
                ..
            } = s
            {
                if value.callee() == Some("getX") {
                    sites.extend(slot_index(name));
                }
            }
        });
    }
    sites
}

fn slot_index(name: &str) -> Option<i32> {
    name.strip_prefix("xTexelC")?.parse().ok()
}
