//! Struct-specific `Maskable` derivation.
//!
//! Generates the destructuring `visit_fields` body, the row flag expression,
//! and the page projection for structs.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{ext::IdentExt, spanned::Spanned, DataStruct, Fields, FieldsNamed, FieldsUnnamed, Index, Result};

use crate::{
    container::ContainerOptions,
    strategy::{parse_field_strategy, Strategy, Walk},
    transform::{DeriveContext, FieldSite},
    types::{is_phantom_data, is_row_flag_type},
    DeriveOutput,
};

pub(crate) fn derive_struct(
    data: &DataStruct,
    options: &ContainerOptions,
    ctx: &mut DeriveContext<'_>,
) -> Result<DeriveOutput> {
    match &data.fields {
        Fields::Named(fields) => derive_named_struct(fields, options, ctx),
        Fields::Unnamed(fields) => derive_unnamed_struct(fields, options, ctx),
        Fields::Unit => {
            if let Some(page) = &options.page {
                return Err(syn::Error::new(page.span(), "unit structs have no fields"));
            }
            Ok(DeriveOutput::record())
        }
    }
}

/// The field's walk settings, or `None` for marker fields that are left out.
pub(crate) fn walk_settings(field: &syn::Field, walk: Walk) -> Result<Option<Walk>> {
    if !is_phantom_data(&field.ty) {
        return Ok(Some(walk));
    }
    if walk.directive.is_some() || !walk.presets.is_empty() {
        return Err(syn::Error::new(
            field.span(),
            "`PhantomData` fields cannot carry a masking directive",
        ));
    }
    Ok(None)
}

fn row_flag_expr(
    current: Option<TokenStream>,
    field: &syn::Field,
    access: TokenStream,
) -> Result<TokenStream> {
    if current.is_some() {
        return Err(syn::Error::new(
            field.span(),
            "multiple #[mask(row_flag)] fields specified",
        ));
    }
    if !is_row_flag_type(&field.ty) {
        return Err(syn::Error::new(
            field.ty.span(),
            "#[mask(row_flag)] requires a `bool` or `Option<bool>` field",
        ));
    }
    Ok(quote! {
        ::core::convert::Into::<::core::option::Option<bool>>::into(self.#access)
    })
}

fn derive_named_struct(
    fields: &FieldsNamed,
    options: &ContainerOptions,
    ctx: &mut DeriveContext<'_>,
) -> Result<DeriveOutput> {
    let mut output = DeriveOutput::record();

    if let Some(page) = &options.page {
        let field = fields
            .named
            .iter()
            .find(|field| field.ident.as_ref() == Some(page))
            .ok_or_else(|| syn::Error::new(page.span(), format!("no field named `{page}`")))?;
        ctx.track_generics(&field.ty);
        output.page = Some(quote! { &mut self.#page });
    }

    let mut bindings = Vec::new();
    let mut visits = Vec::new();

    for (index, field) in fields.named.iter().enumerate() {
        let Some(ident) = &field.ident else {
            continue;
        };
        match parse_field_strategy(&field.attrs)? {
            Strategy::Skip => {}
            Strategy::RowFlag => {
                output.row_flag = Some(row_flag_expr(output.row_flag, field, quote!(#ident))?);
            }
            Strategy::Walk(walk) => {
                let Some(walk) = walk_settings(field, walk)? else {
                    continue;
                };
                let binding = format_ident!("__mask_field_{}", index);
                let site = FieldSite {
                    key: ident.unraw().to_string(),
                    ty: &field.ty,
                    binding: &binding,
                    pattern: quote! { Self { #ident: #binding, .. } },
                    span: field.span(),
                };
                visits.push(ctx.walk_field(&site, &walk));
                bindings.push(quote! { #ident: #binding });
            }
        }
    }

    if !visits.is_empty() {
        output.visit_body = Some(quote! {
            let Self { #(#bindings,)* .. } = self;
            #(#visits)*
        });
    }
    Ok(output)
}

fn derive_unnamed_struct(
    fields: &FieldsUnnamed,
    options: &ContainerOptions,
    ctx: &mut DeriveContext<'_>,
) -> Result<DeriveOutput> {
    if let Some(page) = &options.page {
        return Err(syn::Error::new(
            page.span(),
            "`page` requires a struct with named fields",
        ));
    }

    let mut output = DeriveOutput::record();
    let mut slots = Vec::new();
    let mut visits = Vec::new();

    for (index, field) in fields.unnamed.iter().enumerate() {
        let binding = format_ident!("__mask_field_{}", index);
        let walk = match parse_field_strategy(&field.attrs)? {
            Strategy::Skip => None,
            Strategy::RowFlag => {
                let position = Index::from(index);
                output.row_flag = Some(row_flag_expr(output.row_flag, field, quote!(#position))?);
                None
            }
            Strategy::Walk(walk) => walk_settings(field, walk)?,
        };

        let Some(walk) = walk else {
            slots.push(quote!(_));
            continue;
        };
        let skipped = (0..index).map(|_| quote!(_));
        let site = FieldSite {
            key: index.to_string(),
            ty: &field.ty,
            binding: &binding,
            pattern: quote! { Self(#(#skipped,)* #binding, ..) },
            span: field.span(),
        };
        visits.push(ctx.walk_field(&site, &walk));
        slots.push(quote!(#binding));
    }

    if !visits.is_empty() {
        output.visit_body = Some(quote! {
            let Self(#(#slots),*) = self;
            #(#visits)*
        });
    }
    Ok(output)
}
