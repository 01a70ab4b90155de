//! Core types and the aggregation pipeline for the Observatório do Sorriso
//! dashboard.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! implement [`source::TableSource`]; everything downstream of the load works
//! on the immutable [`table::BaseTables`] it returns.
//!
//! Stages, leaf to root: [`join`] → [`classify`] → [`filter`] →
//! [`aggregate`] → [`metric`]. [`view`] wires them into one canonical page
//! pipeline parameterised by the grouping [`view::Dimension`].

pub mod age;
pub mod aggregate;
pub mod classify;
pub mod error;
pub mod filter;
pub mod join;
pub mod metric;
pub mod source;
pub mod table;
pub mod view;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod fixture;
