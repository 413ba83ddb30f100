//! Analytics over HURDAT2 tropical cyclone tracks: distances and translation speeds,
//! landfalls, peak winds, per-year counts and a test of where the strongest winds lie
//! relative to a storm's heading.
//!
//! Parsing and the data model live in [`common::hurdat`].

pub mod accuracy;
pub mod config;
pub mod report;
pub mod summary;
pub mod track;
