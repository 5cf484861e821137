//! Parsing of `#[mask(...)]` and `#[mask_preset(...)]` field attributes.
//!
//! This module maps attribute syntax to traversal decisions and produces
//! structured errors for invalid forms.

use proc_macro2::Span;
use syn::{punctuated::Punctuated, spanned::Spanned, Attribute, Meta, Path, Result, Token};

/// Field handling decided by its attributes.
///
/// | Attributes | Strategy |
/// |------------|----------|
/// | none | `Walk` without directive |
/// | `#[mask]`, `#[mask(Algo)]`, `#[mask(inherit)]` | `Walk` with directive |
/// | `#[mask_preset(P, ..)]` | `Walk` with presets |
/// | `#[mask(skip)]` | `Skip` |
/// | `#[mask(row_flag)]` | `RowFlag` |
#[derive(Clone, Debug)]
pub(crate) enum Strategy {
    /// The field is reported to the walker.
    Walk(Walk),
    /// The field never participates.
    Skip,
    /// The field holds the record's row override.
    RowFlag,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Walk {
    pub(crate) directive: Option<DirectiveAttr>,
    pub(crate) presets: Vec<Path>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct DirectiveAttr {
    /// `None` selects the default algorithm.
    pub(crate) algorithm: Option<Path>,
    pub(crate) inherit: bool,
}

enum MaskAttr {
    Directive(DirectiveAttr),
    Skip,
    RowFlag,
}

fn parse_mask_attr(attr: &Attribute) -> Result<MaskAttr> {
    let list = match &attr.meta {
        Meta::Path(_) => return Ok(MaskAttr::Directive(DirectiveAttr::default())),
        Meta::NameValue(_) => {
            return Err(syn::Error::new(
                attr.span(),
                "name-value syntax is not supported for #[mask]",
            ));
        }
        Meta::List(list) => list,
    };

    let mut algorithm: Option<Path> = None;
    let mut inherit = false;
    let mut skip = false;
    let mut row_flag = false;

    list.parse_nested_meta(|meta| {
        if meta.input.peek(Token![=]) || meta.input.peek(syn::token::Paren) {
            return Err(meta.error("expected `skip`, `row_flag`, `inherit`, or an algorithm type"));
        }
        if meta.path.is_ident("skip") {
            skip = true;
        } else if meta.path.is_ident("row_flag") {
            row_flag = true;
        } else if meta.path.is_ident("inherit") {
            inherit = true;
        } else if algorithm.is_some() {
            return Err(meta.error("only one masking algorithm may be given"));
        } else {
            algorithm = Some(meta.path.clone());
        }
        Ok(())
    })?;

    let has_directive = algorithm.is_some() || inherit;
    match (skip, row_flag) {
        (true, true) => Err(syn::Error::new(
            attr.span(),
            "`skip` and `row_flag` cannot be combined",
        )),
        (true, false) if has_directive => Err(syn::Error::new(
            attr.span(),
            "`skip` cannot be combined with a masking directive",
        )),
        (false, true) if has_directive => Err(syn::Error::new(
            attr.span(),
            "`row_flag` cannot be combined with a masking directive",
        )),
        (true, false) => Ok(MaskAttr::Skip),
        (false, true) => Ok(MaskAttr::RowFlag),
        (false, false) => Ok(MaskAttr::Directive(DirectiveAttr { algorithm, inherit })),
    }
}

fn parse_presets(attr: &Attribute) -> Result<Vec<Path>> {
    let list = attr.meta.require_list()?;
    let paths = list.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)?;
    if paths.is_empty() {
        return Err(syn::Error::new(
            attr.span(),
            "expected at least one preset type (e.g., #[mask_preset(MaskPhone)])",
        ));
    }
    Ok(paths.into_iter().collect())
}

pub(crate) fn parse_field_strategy(attrs: &[Attribute]) -> Result<Strategy> {
    let mut mask: Option<MaskAttr> = None;
    let mut presets = Vec::new();
    let mut preset_span: Option<Span> = None;

    for attr in attrs {
        if attr.path().is_ident("mask") {
            if mask.is_some() {
                return Err(syn::Error::new(
                    attr.span(),
                    "multiple #[mask] attributes specified on the same field",
                ));
            }
            mask = Some(parse_mask_attr(attr)?);
        } else if attr.path().is_ident("mask_preset") {
            presets.extend(parse_presets(attr)?);
            preset_span.get_or_insert_with(|| attr.span());
        }
    }

    match (mask, preset_span) {
        (Some(MaskAttr::Skip), Some(span)) => Err(syn::Error::new(
            span,
            "#[mask_preset] cannot be used on a skipped field",
        )),
        (Some(MaskAttr::RowFlag), Some(span)) => Err(syn::Error::new(
            span,
            "#[mask_preset] cannot be used on a row flag",
        )),
        (Some(MaskAttr::Skip), None) => Ok(Strategy::Skip),
        (Some(MaskAttr::RowFlag), None) => Ok(Strategy::RowFlag),
        (Some(MaskAttr::Directive(directive)), _) => Ok(Strategy::Walk(Walk {
            directive: Some(directive),
            presets,
        })),
        (None, _) => Ok(Strategy::Walk(Walk {
            directive: None,
            presets,
        })),
    }
}
