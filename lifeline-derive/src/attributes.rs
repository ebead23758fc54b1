//! Attribute parsing utilities

use syn::{Attribute, Expr, ExprLit, Field, Lit, LitStr, Path};

fn string_value(attrs: &[Attribute], name: &str) -> syn::Result<Option<LitStr>> {
    for attr in attrs {
        if attr.path().is_ident(name) {
            let meta = attr.meta.require_name_value()?;
            return match &meta.value {
                Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(Some(s.clone())),
                other => Err(syn::Error::new_spanned(
                    other,
                    format!("expected `#[{name} = \"...\"]`"),
                )),
            };
        }
    }
    Ok(None)
}

/// Extract table name from struct attributes
pub fn extract_table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    Ok(string_value(attrs, "table_name")?.map(|s| s.value()))
}

/// Extract column name from field attributes
pub fn extract_column_name(field: &Field) -> syn::Result<Option<String>> {
    Ok(string_value(&field.attrs, "column_name")?.map(|s| s.value()))
}

/// Path to the `RelationDef` constant named by `#[relation = "..."]`
pub fn extract_relation_path(field: &Field) -> syn::Result<Option<Path>> {
    match string_value(&field.attrs, "relation")? {
        Some(lit) => lit.parse::<Path>().map(Some),
        None => Ok(None),
    }
}

/// Check if field has a specific attribute
pub fn has_attribute(field: &Field, attr_name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}
