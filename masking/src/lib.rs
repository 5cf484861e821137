//! In-place masking of sensitive string fields across nested object graphs.
//!
//! The crate is organised around a single entrypoint, [`MaskingEngine::redact`],
//! which walks an arbitrary payload (records, sequences, maps, options, boxes),
//! collects every leaf field that carries a masking [`Directive`], and rewrites
//! each one through the [`Algorithm`] the directive names.
//!
//! Key rules:
//! - `#[derive(Mask)]` emits a static field table for a record; there is no
//!   runtime reflection.
//! - `#[mask]` or `#[mask(Algo)]` attaches a directive to a field. Presets
//!   (`#[mask_preset(MaskPhone)]`) carry a directive one level removed.
//! - Directives on record/collection fields do not mask the container; they
//!   mark the subtree so that `#[mask(inherit)]` fields below it become eligible.
//! - A record's row override (`#[mask(row_flag)]`) beats the ambient decision
//!   for that record and everything beneath it.
//! - Map keys and set members are never inspected.
//!
//! What this crate does:
//! - resolves directives, binds and caches field accessors, resolves and caches
//!   algorithm instances
//! - carries a per-unit-of-work [`ActivationContext`]
//! - provides built-in algorithms behind the `algorithms` feature
//!
//! What it does not do:
//! - decide *when* a payload should be masked (that is the caller's boundary)
//! - serialize payloads, except for the optional `slog` adapter
//!
//! Masking is not idempotent: redacting an already-masked payload masks the
//! masked text again.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::if_not_else,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::enum_glob_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

pub use masking_derive::Mask;

// Lets `#[derive(Mask)]` resolve `masking::...` paths inside this crate's own tests.
#[allow(unused_extern_crates)]
extern crate self as masking;

mod accessor;
mod algorithm;
mod context;
mod directive;
mod engine;
mod error;
mod graph;
mod page;
#[cfg(feature = "slog")]
pub mod slog;

pub use accessor::{Accessor, AccessorCache, CacheStats, FieldKey, FieldSpec, TypeKey};
#[cfg(feature = "algorithms")]
pub use algorithm::{
    ChineseNameCover, EmailCover, EnglishNameCover, IdCardCover, MaskEmail, MaskIdCard, MaskName,
    MaskPhone, NameCover, PhoneCover,
};
pub use algorithm::{
    Algorithm, AlgorithmId, AlgorithmProvider, AlgorithmRegistry, DefaultCover, DEFAULT_MASK,
};
pub use context::{ActivationContext, ActivationGuard};
pub use directive::{Directive, DirectiveResolver, FieldMetadata, Preset, PresetRef};
pub use engine::{MaskingEngine, MaskingEngineBuilder, Redact};
pub use error::{
    AlgorithmUnavailableError, BindingError, ConstructError, DiscoveryError, RedactionError,
    TypeMismatchError,
};
pub use graph::{
    FieldBinding, LeafValue, Maskable, Record, RowOverride, ScalarKind, ScalarValue, Shape,
    ValueType, Walker,
};
pub use page::Page;
