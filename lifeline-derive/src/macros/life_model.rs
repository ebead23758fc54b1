//! LifeModel derive macro implementation
//!
//! Splits the struct into column fields and relation fields, then generates
//! `ModelTrait` and `FromRow` from the columns. Relation fields are handed to
//! [`super::relation`].

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields, Ident, LitStr, Path, Type};

use crate::attributes;
use crate::macros::relation;
use crate::utils;

struct ColumnField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    column: String,
    primary_key: bool,
    auto_increment: bool,
}

impl ColumnField<'_> {
    /// Names accepted by the by-name accessors: the column, its camelCase
    /// form and the field name.
    fn accepted_names(&self) -> Vec<LitStr> {
        let mut names: Vec<String> = vec![self.column.clone()];
        for alias in [utils::camel_case(&self.column), self.ident.unraw().to_string()] {
            if !names.contains(&alias) {
                names.push(alias);
            }
        }
        names
            .iter()
            .map(|name| LitStr::new(name, self.ident.span()))
            .collect()
    }
}

pub(crate) struct RelationField<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub related: &'a Type,
    pub def: Path,
}

pub fn derive_life_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "LifeModel cannot be derived for generic structs",
        ));
    }

    let table_name = attributes::extract_table_name(&input.attrs)?
        .unwrap_or_else(|| utils::snake_case(&struct_name.to_string()));
    let table_lit = LitStr::new(&table_name, struct_name.span());

    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "LifeModel can only be derived for structs with named fields",
            ));
        }
    };

    let mut columns: Vec<ColumnField> = Vec::new();
    let mut relations: Vec<RelationField> = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if let Some(def) = attributes::extract_relation_path(field)? {
            let related = relation::related_type(&field.ty).ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "relation fields must be Option<R>, Option<Box<R>>, Vec<R>, HashSet<R> or BTreeSet<R>",
                )
            })?;
            relations.push(RelationField {
                ident,
                ty: &field.ty,
                related,
                def,
            });
            continue;
        }
        let column = attributes::extract_column_name(field)?.unwrap_or_else(|| ident.unraw().to_string());
        columns.push(ColumnField {
            ident,
            ty: &field.ty,
            column,
            primary_key: attributes::has_attribute(field, "primary_key"),
            auto_increment: attributes::has_attribute(field, "auto_increment"),
        });
    }

    let primary_key = primary_key_column(struct_name, &columns)?;
    let primary_key_lit = LitStr::new(&primary_key, struct_name.span());

    let column_lits: Vec<LitStr> = columns
        .iter()
        .map(|c| LitStr::new(&c.column, c.ident.span()))
        .collect();

    let get_arms = columns.iter().map(|c| {
        let ident = c.ident;
        let names = c.accepted_names();
        quote! {
            #(#names)|* => ::std::option::Option::Some(
                ::lifeline::sea_query::Value::from(::std::clone::Clone::clone(&self.#ident))
            ),
        }
    });

    let set_arms = columns.iter().map(|c| {
        let ident = c.ident;
        let ty = c.ty;
        let names = c.accepted_names();
        let column = LitStr::new(&c.column, c.ident.span());
        quote! {
            #(#names)|* => {
                self.#ident = <#ty as ::lifeline::value::TryGetable>::try_get(value).map_err(|e| {
                    ::lifeline::ModelError::InvalidValue {
                        column: ::std::string::ToString::to_string(#column),
                        reason: ::std::string::ToString::to_string(&e),
                    }
                })?;
                ::std::result::Result::Ok(())
            }
        }
    });

    let insert_values = columns.iter().filter(|c| !c.auto_increment).map(|c| {
        let ident = c.ident;
        let column = LitStr::new(&c.column, c.ident.span());
        quote! {
            (#column, ::lifeline::sea_query::Value::from(::std::clone::Clone::clone(&self.#ident)))
        }
    });

    let row_fields = columns.iter().map(|c| {
        let ident = c.ident;
        let ty = c.ty;
        let column = LitStr::new(&c.column, c.ident.span());
        quote! { #ident: row.try_get::<#ty>(#column)?, }
    });
    let empty_relations = relations.iter().map(|r| {
        let ident = r.ident;
        quote! { #ident: ::std::default::Default::default(), }
    });

    let relation_impls = relation::expand_relations(struct_name, &table_lit, &relations);

    Ok(quote! {
        impl ::lifeline::ModelTrait for #struct_name {
            fn table_name() -> &'static str {
                #table_lit
            }

            fn primary_key() -> &'static str {
                #primary_key_lit
            }

            fn column_names() -> &'static [&'static str] {
                &[#(#column_lits),*]
            }

            fn get_by_column_name(&self, column_name: &str) -> ::std::option::Option<::lifeline::sea_query::Value> {
                match column_name {
                    #(#get_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set_by_column_name(
                &mut self,
                column_name: &str,
                value: ::lifeline::sea_query::Value,
            ) -> ::std::result::Result<(), ::lifeline::ModelError> {
                match column_name {
                    #(#set_arms)*
                    _ => ::std::result::Result::Err(::lifeline::ModelError::ColumnNotFound {
                        table: #table_lit,
                        column: ::std::string::ToString::to_string(column_name),
                    }),
                }
            }

            fn insert_values(&self) -> ::std::vec::Vec<(&'static str, ::lifeline::sea_query::Value)> {
                ::std::vec![#(#insert_values),*]
            }
        }

        impl ::lifeline::FromRow for #struct_name {
            fn from_row(row: &::lifeline::Row) -> ::std::result::Result<Self, ::lifeline::LifeError> {
                ::std::result::Result::Ok(Self {
                    #(#row_fields)*
                    #(#empty_relations)*
                })
            }
        }

        #relation_impls
    })
}

/// The `#[primary_key]` column, or the column named `id`.
fn primary_key_column(struct_name: &Ident, columns: &[ColumnField]) -> syn::Result<String> {
    let marked: Vec<&ColumnField> = columns.iter().filter(|c| c.primary_key).collect();
    match marked.as_slice() {
        [single] => Ok(single.column.clone()),
        [] => columns
            .iter()
            .find(|c| c.column == "id")
            .map(|c| c.column.clone())
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    struct_name,
                    "LifeModel needs a #[primary_key] field or a column named `id`",
                )
            }),
        [_, second, ..] => Err(syn::Error::new_spanned(
            second.ident,
            "LifeModel supports a single #[primary_key] column",
        )),
    }
}
