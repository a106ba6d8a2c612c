#![deny(warnings)]
//! Season pair comparison model: race ordering, pair grouping and
//! eligibility, per-race differentials and chart axis bounds.
pub mod axis;
pub mod calendar;
pub mod pair;
pub mod record;
pub mod series;
