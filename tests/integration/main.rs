//! End-to-end runs of the detection suite over in-memory lot tables.

mod fixtures;
mod properties;
mod scenarios;
