//! Implementation of search algorithms.
//!
//! A single driver runs over a frontier whose removal policy decides the
//! algorithm (depth-first, breadth-first, greedy best-first or A*).

pub mod frontier;
pub mod solver;
