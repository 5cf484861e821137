//! Container-level attribute parsing for `#[derive(Mask)]`.
//!
//! This module handles attributes on the struct/enum itself, not on fields.

use syn::{Attribute, Ident, Meta, Result};

/// Options parsed from container-level `#[mask(...)]` attributes.
#[derive(Clone, Debug, Default)]
pub(crate) struct ContainerOptions {
    /// Delegate the row override to a manual `RowOverride` impl.
    pub(crate) row_override: bool,
    /// Field holding the records of a paginated wrapper.
    pub(crate) page: Option<Ident>,
}

/// Parses container-level `#[mask(...)]` attributes.
pub(crate) fn parse_container_options(attrs: &[Attribute]) -> Result<ContainerOptions> {
    let mut options = ContainerOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("mask") {
            continue;
        }

        match &attr.meta {
            Meta::Path(_) => {
                // Bare #[mask] on a container has no meaning; ignore it.
            }
            Meta::List(list) => {
                list.parse_nested_meta(|meta| {
                    if meta.path.is_ident("row_override") {
                        options.row_override = true;
                        Ok(())
                    } else if meta.path.is_ident("page") {
                        if options.page.is_some() {
                            return Err(meta.error("`page` specified more than once"));
                        }
                        options.page = Some(meta.value()?.parse()?);
                        Ok(())
                    } else {
                        Err(meta.error(format!(
                            "unknown container option `{}`; expected `row_override` or `page = field`",
                            meta.path
                                .get_ident()
                                .map_or_else(|| "?".to_string(), ToString::to_string)
                        )))
                    }
                })?;
            }
            Meta::NameValue(nv) => {
                return Err(syn::Error::new_spanned(
                    nv,
                    "name-value syntax is not supported for container-level #[mask]",
                ));
            }
        }
    }

    Ok(options)
}
