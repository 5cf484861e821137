//! Generic type parameter handling and trait bound management.
//!
//! Only generics that appear in walked fields get a `Maskable` bound.
//! Every type parameter gets `'static`, which the graph requires of the
//! whole record.
//!
//! ## PhantomData Handling
//!
//! `PhantomData<T>` fields are never walked, so they do not make `T` require
//! `Maskable`:
//!
//! ```ignore
//! #[derive(Mask)]
//! struct TypedId<T> {
//!     #[mask]
//!     id: String,
//!     _marker: PhantomData<T>,
//! }
//! ```

use proc_macro2::TokenStream;
use syn::{parse_quote, Ident};

pub(crate) fn collect_generics_from_type(
    ty: &syn::Type,
    generics: &syn::Generics,
    result: &mut Vec<Ident>,
) {
    match ty {
        syn::Type::Path(path) => {
            let Some(segment) = path.path.segments.last() else {
                return;
            };
            if segment.ident == "PhantomData" {
                return;
            }

            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                for arg in &args.args {
                    if let syn::GenericArgument::Type(inner_ty) = arg {
                        collect_generics_from_type(inner_ty, generics, result);
                    }
                }
            }

            for param in generics.type_params() {
                if segment.ident == param.ident && !result.iter().any(|g| g == &param.ident) {
                    result.push(param.ident.clone());
                }
            }
        }
        syn::Type::Array(array) => collect_generics_from_type(&array.elem, generics, result),
        syn::Type::Paren(paren) => collect_generics_from_type(&paren.elem, generics, result),
        syn::Type::Group(group) => collect_generics_from_type(&group.elem, generics, result),
        _ => {}
    }
}

/// Adds `Maskable` bounds to generic parameters used in walked fields.
pub(crate) fn add_maskable_bounds(
    mut generics: syn::Generics,
    used_generics: &[Ident],
    root: &TokenStream,
) -> syn::Generics {
    for param in generics.type_params_mut() {
        if used_generics.iter().any(|g| g == &param.ident) {
            param.bounds.push(parse_quote!(#root::Maskable));
        }
    }
    generics
}

pub(crate) fn add_static_bounds(mut generics: syn::Generics) -> syn::Generics {
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!('static));
    }
    generics
}
