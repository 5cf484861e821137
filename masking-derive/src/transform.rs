//! Shared field handling for struct and enum derivation.
//!
//! Every walked field gets four hidden helpers on the deriving type: its
//! `FieldSpec`, its `FieldMetadata`, and shared and mutable projections from
//! the owner to the field. The spec is what `visit_fields` hands to the walker
//! and what `Record::field_spec` returns by name.

use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote, quote_spanned};

use crate::{
    generics::collect_generics_from_type,
    strategy::{DirectiveAttr, Walk},
};

/// Accumulated state during field processing.
pub(crate) struct DeriveContext<'a> {
    pub(crate) root: &'a TokenStream,
    pub(crate) generics: &'a syn::Generics,
    pub(crate) used_generics: Vec<Ident>,
    pub(crate) helpers: Vec<TokenStream>,
    pub(crate) spec_arms: Vec<TokenStream>,
}

/// One field as reached from a value of the deriving type.
pub(crate) struct FieldSite<'a> {
    /// `"phone"`, `"0"`, or `"Variant.phone"` for enum variants.
    pub(crate) key: String,
    pub(crate) ty: &'a syn::Type,
    pub(crate) binding: &'a Ident,
    /// A pattern over `Self` binding only this field, to `binding`.
    pub(crate) pattern: TokenStream,
    pub(crate) span: Span,
}

impl<'a> DeriveContext<'a> {
    pub(crate) fn new(root: &'a TokenStream, generics: &'a syn::Generics) -> Self {
        Self {
            root,
            generics,
            used_generics: Vec::new(),
            helpers: Vec::new(),
            spec_arms: Vec::new(),
        }
    }

    pub(crate) fn track_generics(&mut self, ty: &syn::Type) {
        collect_generics_from_type(ty, self.generics, &mut self.used_generics);
    }

    /// Emits the helpers for a walked field and returns its visit statement.
    pub(crate) fn walk_field(&mut self, site: &FieldSite<'_>, walk: &Walk) -> TokenStream {
        let root = self.root;
        let index = self.spec_arms.len();
        let spec_fn = format_ident!("__mask_spec_{}", index);
        let meta_fn = format_ident!("__mask_meta_{}", index);
        let ref_fn = format_ident!("__mask_ref_{}", index);
        let mut_fn = format_ident!("__mask_mut_{}", index);
        let FieldSite {
            key,
            ty,
            binding,
            pattern,
            span,
        } = site;
        let metadata = metadata_tokens(root, walk);

        self.track_generics(ty);
        self.helpers.push(quote! {
            #[doc(hidden)]
            fn #spec_fn() -> #root::FieldSpec {
                #root::FieldSpec::new::<Self, #ty>(#key, Self::#meta_fn, Self::#ref_fn, Self::#mut_fn)
            }

            #[doc(hidden)]
            fn #meta_fn() -> #root::FieldMetadata {
                #metadata
            }

            #[doc(hidden)]
            #[allow(trivial_casts)]
            fn #ref_fn(
                owner: &dyn ::core::any::Any,
            ) -> ::core::option::Option<&dyn #root::Maskable> {
                match owner.downcast_ref::<Self>() {
                    ::core::option::Option::Some(#pattern) => {
                        ::core::option::Option::Some(#binding as &dyn #root::Maskable)
                    }
                    _ => ::core::option::Option::None,
                }
            }

            #[doc(hidden)]
            #[allow(trivial_casts)]
            fn #mut_fn(
                owner: &mut dyn ::core::any::Any,
            ) -> ::core::option::Option<&mut dyn #root::Maskable> {
                match owner.downcast_mut::<Self>() {
                    ::core::option::Option::Some(#pattern) => {
                        ::core::option::Option::Some(#binding as &mut dyn #root::Maskable)
                    }
                    _ => ::core::option::Option::None,
                }
            }
        });
        self.spec_arms.push(quote! {
            #key => ::core::option::Option::Some(Self::#spec_fn()),
        });

        quote_spanned! { *span =>
            walker.visit_field(Self::#spec_fn(), #binding);
        }
    }
}

/// Builds the `FieldMetadata` expression for a field's attributes.
fn metadata_tokens(root: &TokenStream, walk: &Walk) -> TokenStream {
    let mut metadata = quote! { #root::FieldMetadata::new() };

    if let Some(DirectiveAttr { algorithm, inherit }) = &walk.directive {
        let directive = match algorithm {
            Some(path) => quote! { #root::Directive::with::<#path>() },
            None => quote! { <#root::Directive as ::core::default::Default>::default() },
        };
        metadata = quote! {
            #metadata.with_directive(#directive.inherit_from_parent(#inherit))
        };
    }

    for preset in &walk.presets {
        metadata = quote! { #metadata.with_preset::<#preset>() };
    }

    metadata
}
