//! Enum-specific `Maskable` derivation.
//!
//! Each variant contributes a match arm to `visit_fields`. Field keys are
//! prefixed with the variant name (`"Card.number"`, `"Phone.0"`), so specs of
//! different variants never collide. Enums made only of unit variants are
//! leaves.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::{ext::IdentExt, spanned::Spanned, DataEnum, Fields, FieldsNamed, FieldsUnnamed, Result};

use crate::{
    container::ContainerOptions,
    derive_struct::walk_settings,
    strategy::{parse_field_strategy, Strategy, Walk},
    transform::{DeriveContext, FieldSite},
    DeriveOutput,
};

pub(crate) fn derive_enum(
    data: &DataEnum,
    options: &ContainerOptions,
    ctx: &mut DeriveContext<'_>,
) -> Result<DeriveOutput> {
    if let Some(page) = &options.page {
        return Err(syn::Error::new(
            page.span(),
            "`page` is only supported on structs",
        ));
    }

    if data
        .variants
        .iter()
        .all(|variant| matches!(variant.fields, Fields::Unit))
    {
        return Ok(DeriveOutput::leaf());
    }

    let mut arms = Vec::new();
    let mut any_visits = false;

    for variant in &data.variants {
        let variant_ident = &variant.ident;
        let (arm, visits) = match &variant.fields {
            Fields::Unit => (quote! { Self::#variant_ident => {} }, false),
            Fields::Named(fields) => derive_named_variant(variant_ident, fields, ctx)?,
            Fields::Unnamed(fields) => derive_unnamed_variant(variant_ident, fields, ctx)?,
        };
        any_visits |= visits;
        arms.push(arm);
    }

    let mut output = DeriveOutput::record();
    if any_visits {
        output.visit_body = Some(quote! {
            match self {
                #(#arms)*
            }
        });
    }
    Ok(output)
}

fn variant_walk(field: &syn::Field) -> Result<Option<Walk>> {
    match parse_field_strategy(&field.attrs)? {
        Strategy::Skip => Ok(None),
        Strategy::RowFlag => Err(syn::Error::new(
            field.span(),
            "#[mask(row_flag)] is only supported on struct fields",
        )),
        Strategy::Walk(walk) => walk_settings(field, walk),
    }
}

fn derive_named_variant(
    variant_ident: &Ident,
    fields: &FieldsNamed,
    ctx: &mut DeriveContext<'_>,
) -> Result<(TokenStream, bool)> {
    let mut bindings = Vec::new();
    let mut visits = Vec::new();

    for (index, field) in fields.named.iter().enumerate() {
        let Some(ident) = &field.ident else {
            continue;
        };
        let Some(walk) = variant_walk(field)? else {
            continue;
        };
        let binding = format_ident!("__mask_field_{}", index);
        let site = FieldSite {
            key: format!("{}.{}", variant_ident.unraw(), ident.unraw()),
            ty: &field.ty,
            binding: &binding,
            pattern: quote! { Self::#variant_ident { #ident: #binding, .. } },
            span: field.span(),
        };
        visits.push(ctx.walk_field(&site, &walk));
        bindings.push(quote! { #ident: #binding });
    }

    let arm = quote! {
        Self::#variant_ident { #(#bindings,)* .. } => {
            #(#visits)*
        }
    };
    Ok((arm, !visits.is_empty()))
}

fn derive_unnamed_variant(
    variant_ident: &Ident,
    fields: &FieldsUnnamed,
    ctx: &mut DeriveContext<'_>,
) -> Result<(TokenStream, bool)> {
    let mut slots = Vec::new();
    let mut visits = Vec::new();

    for (index, field) in fields.unnamed.iter().enumerate() {
        let Some(walk) = variant_walk(field)? else {
            slots.push(quote!(_));
            continue;
        };
        let binding = format_ident!("__mask_field_{}", index);
        let skipped = (0..index).map(|_| quote!(_));
        let site = FieldSite {
            key: format!("{}.{}", variant_ident.unraw(), index),
            ty: &field.ty,
            binding: &binding,
            pattern: quote! { Self::#variant_ident(#(#skipped,)* #binding, ..) },
            span: field.span(),
        };
        visits.push(ctx.walk_field(&site, &walk));
        slots.push(quote!(#binding));
    }

    let arm = quote! {
        Self::#variant_ident(#(#slots),*) => {
            #(#visits)*
        }
    };
    Ok((arm, !visits.is_empty()))
}
