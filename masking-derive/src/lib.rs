//! Derive macro for `masking`.
//!
//! This crate generates the static field tables behind `#[derive(Mask)]`. It:
//! - reads `#[mask(...)]` and `#[mask_preset(...)]` field attributes
//! - emits `Maskable` and `Record` implementations that report each field to
//!   the walker together with its directive metadata and projections
//!
//! It does **not** define algorithms, presets, or caches. Those live in the
//! main `masking` crate and are resolved at runtime.

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
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

#[allow(unused_extern_crates)]
extern crate proc_macro;

use proc_macro2::TokenStream;
use proc_macro_crate::{crate_name, FoundCrate};
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Result};

mod container;
mod derive_enum;
mod derive_struct;
mod generics;
mod strategy;
mod transform;
mod types;
use container::parse_container_options;
use derive_enum::derive_enum;
use derive_struct::derive_struct;
use generics::{add_maskable_bounds, add_static_bounds};
use transform::DeriveContext;

/// Derives `masking::Maskable` and `masking::Record` for structs and enums.
///
/// # Container Attributes
///
/// - `#[mask(row_override)]` - Take the record's mask decision from a manual
///   `masking::RowOverride` impl.
/// - `#[mask(page = field)]` - Mark the type as a page wrapper: redacting it
///   redacts the records held in `field` one by one.
///
/// # Field Attributes
///
/// - **No annotation**: The field is walked. Records, collections and options
///   are descended into; leaves are left alone. The field type must implement
///   `Maskable`.
/// - `#[mask]`: Mask the leaf with the engine's default algorithm.
/// - `#[mask(Algorithm)]`: Mask the leaf with `Algorithm`.
/// - `#[mask(inherit)]` / `#[mask(Algorithm, inherit)]`: Mask only when the
///   field that led to this record carried a directive itself.
/// - `#[mask_preset(Preset, ..)]`: Take the directive from the first preset
///   that carries one, unless `#[mask(..)]` gives one directly.
/// - `#[mask(row_flag)]`: A `bool` or `Option<bool>` field holding the row
///   override. `None` defers to the enclosing decision.
/// - `#[mask(skip)]`: The field is never visited. Use this for foreign types
///   that do not implement `Maskable`.
///
/// `PhantomData` fields are left out. Enums whose variants are all unit
/// variants become leaves that may also be held in sets. Types with lifetime
/// parameters and unions are rejected at compile time.
#[proc_macro_derive(Mask, attributes(mask, mask_preset))]
pub fn derive_mask(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Returns the token stream to reference the masking crate root.
///
/// Handles crate renaming (e.g., `my_mask = { package = "masking", ... }`)
/// and internal usage (when derive is used inside the masking crate itself).
fn crate_root() -> TokenStream {
    match crate_name("masking") {
        Ok(FoundCrate::Itself) => quote! { crate },
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            quote! { ::#ident }
        }
        Err(_) => quote! { ::masking },
    }
}

/// What the struct or enum derivation contributes to the generated impls.
pub(crate) struct DeriveOutput {
    /// Enums without data are leaves rather than records.
    pub(crate) leaf: bool,
    pub(crate) visit_body: Option<TokenStream>,
    /// Expression of type `Option<bool>`.
    pub(crate) row_flag: Option<TokenStream>,
    /// Expression borrowing the page's records mutably.
    pub(crate) page: Option<TokenStream>,
}

impl DeriveOutput {
    pub(crate) fn record() -> Self {
        Self {
            leaf: false,
            visit_body: None,
            row_flag: None,
            page: None,
        }
    }

    pub(crate) fn leaf() -> Self {
        Self {
            leaf: true,
            ..Self::record()
        }
    }
}

fn expand(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput {
        ident,
        generics,
        data,
        attrs,
        ..
    } = input;

    if let Some(lifetime) = generics.lifetimes().next() {
        return Err(syn::Error::new(
            lifetime.span(),
            "`Mask` cannot be derived for types with lifetime parameters",
        ));
    }

    let options = parse_container_options(&attrs)?;
    let root = crate_root();
    let mut ctx = DeriveContext::new(&root, &generics);

    let output = match &data {
        Data::Struct(data) => derive_struct(data, &options, &mut ctx)?,
        Data::Enum(data) => derive_enum(data, &options, &mut ctx)?,
        Data::Union(u) => {
            return Err(syn::Error::new(
                u.union_token.span(),
                "`Mask` cannot be derived for unions",
            ));
        }
    };

    let row_override = match (options.row_override, output.row_flag) {
        (true, Some(_)) => {
            return Err(syn::Error::new(
                ident.span(),
                "#[mask(row_override)] cannot be combined with a #[mask(row_flag)] field",
            ));
        }
        (true, None) => Some(quote! { #root::RowOverride::mask_flag(self) }),
        (false, flag) => flag,
    };

    let DeriveContext {
        used_generics,
        helpers,
        spec_arms,
        ..
    } = ctx;

    let bounded = add_maskable_bounds(add_static_bounds(generics.clone()), &used_generics, &root);
    let (impl_generics, ty_generics, where_clause) = bounded.split_for_impl();

    let shape = if output.leaf {
        quote! { #root::Shape::Leaf }
    } else {
        quote! { #root::Shape::Record }
    };

    let visit_fn = output.visit_body.map(|body| {
        quote! {
            fn visit_fields<'__mask>(
                &'__mask mut self,
                walker: &mut #root::Walker<'__mask>,
            ) -> ::core::result::Result<(), #root::DiscoveryError> {
                #body
                ::core::result::Result::Ok(())
            }
        }
    });

    let row_override_fn = row_override.map(|expr| {
        quote! {
            fn row_override(&self) -> ::core::option::Option<bool> {
                #expr
            }
        }
    });

    let page_fn = output.page.map(|records| {
        quote! {
            fn page_records(&mut self) -> ::core::option::Option<&mut dyn #root::Maskable> {
                ::core::option::Option::Some(#records)
            }
        }
    });

    let record_impl = (!output.leaf).then(|| {
        quote! {
            #[automatically_derived]
            impl #impl_generics #root::Record for #ident #ty_generics #where_clause {
                fn field_spec(name: &str) -> ::core::option::Option<#root::FieldSpec> {
                    match name {
                        #(#spec_arms)*
                        _ => ::core::option::Option::None,
                    }
                }
            }
        }
    });

    let leaf_impl = output.leaf.then(|| {
        quote! {
            #[automatically_derived]
            impl #impl_generics #root::LeafValue for #ident #ty_generics #where_clause {}
        }
    });

    let helper_impl = (!helpers.is_empty()).then(|| {
        quote! {
            #[automatically_derived]
            impl #impl_generics #ident #ty_generics #where_clause {
                #(#helpers)*
            }
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics #root::Maskable for #ident #ty_generics #where_clause {
            fn shape(&self) -> #root::Shape {
                #shape
            }

            #row_override_fn

            #page_fn

            #visit_fn
        }

        #record_impl

        #leaf_impl

        #helper_impl
    })
}
