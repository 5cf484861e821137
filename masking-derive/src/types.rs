//! Type utilities for the derive macro.
//!
//! Checks are syntactic: type aliases are not seen through.

fn last_segment(ty: &syn::Type) -> Option<&syn::PathSegment> {
    match ty {
        syn::Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        syn::Type::Paren(paren) => last_segment(&paren.elem),
        syn::Type::Group(group) => last_segment(&group.elem),
        _ => None,
    }
}

/// Checks if a type is `PhantomData<..>`, under any path prefix.
pub(crate) fn is_phantom_data(ty: &syn::Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "PhantomData")
}

fn is_bool(ty: &syn::Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "bool" && segment.arguments.is_empty())
}

/// Checks if a type can carry a row override: `bool` or `Option<bool>`.
pub(crate) fn is_row_flag_type(ty: &syn::Type) -> bool {
    if is_bool(ty) {
        return true;
    }
    let Some(segment) = last_segment(ty) else {
        return false;
    };
    if segment.ident != "Option" {
        return false;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return false;
    };
    matches!(
        args.args.first(),
        Some(syn::GenericArgument::Type(inner)) if args.args.len() == 1 && is_bool(inner)
    )
}
