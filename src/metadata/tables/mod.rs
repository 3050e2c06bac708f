//! # Metadata Table Infrastructure
//!
//! This module provides the building blocks the table builder and serializer are made
//! of: the table identifier enumeration with its fixed ECMA indices, the coded-index
//! schemes that let a single column reference rows of several tables, and the
//! in-memory row records.
//!
//! ## Key Components
//!
//! - [`TableId`]: Enumeration of all metadata table indices
//! - [`CodedIndexType`]: The 14 coded-index schemes and their encoders
//! - [`TABLE_COUNT`]: Size of the presence bitmask / row count arrays
//!
//! ## References
//!
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Partition II, Section 22

mod codedindex;
pub(crate) mod rows;
mod tableid;

pub use codedindex::CodedIndexType;
pub use tableid::{TableId, TABLE_COUNT};
