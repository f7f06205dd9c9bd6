//! Pure derivations behind the parent dashboard.
//!
//! Everything here is a plain function of its inputs: proficiency bands
//! from test scores, display labels from names, and display dates from
//! stored timestamps.

pub mod datetime;
pub mod names;
pub mod status;
