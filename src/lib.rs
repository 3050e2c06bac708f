// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # dotemit
//!
//! A deterministic ECMA-335 metadata emission library, written in pure Rust.
//! `dotemit` is the byte-level back half of a managed-code emitter: a semantic
//! compiler decides *what* types, members, signatures and debug records exist,
//! and this crate turns that model into the exact metadata byte stream embedded
//! in a .NET executable - or into a standalone portable-PDB blob.
//!
//! ## Features
//!
//! - **📦 Complete table surface** - all type-system and portable-PDB debug tables
//! - **🔧 Deduplicating heaps** - `#Strings` suffix folding, content-addressed blobs,
//!   value-deduplicated GUIDs and user strings
//! - **⚡ Deterministic output** - identical input models produce identical bytes,
//!   including content-derived portable-PDB ids
//! - **🛡️ Compile-time freeze** - the builder is consumed by `freeze()`, making
//!   post-freeze mutation a type error rather than a runtime assertion
//! - **🧩 Edit-and-continue aware** - heap start offsets, `#-`/`#JTD` delta streams
//!   and EnC flag bits
//!
//! ## Quick Start
//!
//! ```rust
//! use dotemit::prelude::*;
//! use uguid::guid;
//!
//! let mut builder = MetadataBuilder::new();
//!
//! let name = builder.get_or_add_string("Program.dll");
//! let mvid = builder.get_or_add_guid(guid!("d437908e-65e6-487c-9735-7bdff699bea5"));
//! builder.add_module(0, name, mvid, GuidHandle::default(), GuidHandle::default());
//!
//! let frozen = builder.freeze();
//! let serializer = TypeSystemMetadataSerializer::new(frozen, "v4.0.30319", false)?;
//! let blob = serializer.serialize(0, 0)?;
//! assert_eq!(&blob[0..4], b"BSJB");
//! # Ok::<(), dotemit::Error>(())
//! ```
//!
//! ## Scope
//!
//! `dotemit` writes metadata only. IL method bodies, PE section layout, resource
//! data and strong-name signing belong to the surrounding emitter; this crate
//! receives their results (body offsets, stream RVAs, a content-hash function for
//! the portable-PDB id) as plain values.

mod error;

/// Low-level little-endian buffer access and compressed-integer encoding.
pub mod io;
/// Heaps, tables, sizes and serializers - the metadata emission core.
pub mod metadata;
/// Convenience re-exports of the most commonly used types.
pub mod prelude;

pub use error::{Error, Result};
pub use metadata::builder::{FrozenMetadata, MetadataBuilder};
pub use metadata::serializer::{StandaloneDebugMetadataSerializer, TypeSystemMetadataSerializer};
