//! Relation field expansion
//!
//! Generates `WithRelations` (relation name to request node) and one
//! `RelatedField<R>` impl per distinct related type, so a relation loaded
//! into the wrong field type fails to compile. A const assertion per field
//! rejects a singular kind on a collection field and a plural kind on an
//! `Option` field.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{GenericArgument, Ident, LitStr, PathArguments, Type};

use crate::macros::life_model::RelationField;

/// `Wrapper<T>` with a single type argument: returns the wrapper name and `T`.
fn single_argument(ty: &Type) -> Option<(&Ident, &Type)> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) => Some((&segment.ident, inner)),
        _ => None,
    }
}

/// Related entity type held by a relation field.
pub(crate) fn related_type(ty: &Type) -> Option<&Type> {
    let (wrapper, inner) = single_argument(ty)?;
    match wrapper.to_string().as_str() {
        "Vec" | "HashSet" | "BTreeSet" => Some(inner),
        "Option" => match single_argument(inner) {
            Some((boxed, target)) if boxed == "Box" => Some(target),
            _ => Some(inner),
        },
        _ => None,
    }
}

fn field_lit(field: &RelationField) -> LitStr {
    LitStr::new(&field.ident.unraw().to_string(), field.ident.span())
}

pub(crate) fn expand_relations(struct_name: &Ident, table: &LitStr, relations: &[RelationField]) -> TokenStream2 {
    let name_param = if relations.is_empty() {
        quote!(_name)
    } else {
        quote!(name)
    };
    let requests = relations.iter().map(|field| {
        let lit = field_lit(field);
        let related = field.related;
        let def = &field.def;
        quote! {
            if ::lifeline::row::same_column_name(name, #lit) {
                return ::std::option::Option::Some(
                    ::lifeline::Load::<#struct_name, #related>::new(#def).boxed()
                );
            }
        }
    });

    // Group fields by related type, first-seen order.
    let mut groups: Vec<(String, Vec<&RelationField>)> = Vec::new();
    for field in relations {
        let related = field.related;
        let key = quote!(#related).to_string();
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, fields)) => fields.push(field),
            None => groups.push((key, vec![field])),
        }
    }

    let related_impls = groups.iter().map(|(_, fields)| {
        let related = fields[0].related;
        let lits: Vec<LitStr> = fields.iter().map(|f| field_lit(f)).collect();
        let assigns = fields.iter().zip(&lits).map(|(field, lit)| {
            let ident = field.ident;
            let ty = field.ty;
            quote! {
                if ::lifeline::row::same_column_name(field, #lit) {
                    self.#ident = <#ty as ::lifeline::RelationSlot<#related>>::fill(related);
                    return ::std::result::Result::Ok(());
                }
            }
        });
        let shapes = fields.iter().zip(&lits).map(|(field, lit)| {
            let ty = field.ty;
            quote! {
                if ::lifeline::row::same_column_name(field, #lit) {
                    return ::std::option::Option::Some(<#ty as ::lifeline::RelationSlot<#related>>::SINGULAR);
                }
            }
        });
        quote! {
            impl ::lifeline::RelatedField<#related> for #struct_name {
                fn accepts_related_field(field: &str) -> bool {
                    #(::lifeline::row::same_column_name(field, #lits))||*
                }

                fn related_field_is_singular(field: &str) -> ::std::option::Option<bool> {
                    #(#shapes)*
                    ::std::option::Option::None
                }

                fn assign_related(
                    &mut self,
                    field: &str,
                    related: ::std::vec::Vec<#related>,
                ) -> ::std::result::Result<(), ::lifeline::RelationError> {
                    #(#assigns)*
                    ::std::result::Result::Err(::lifeline::RelationError::UnknownField {
                        entity: #table,
                        field: ::std::string::ToString::to_string(field),
                    })
                }
            }
        }
    });

    let shape_checks = relations.iter().map(|field| {
        let ty = field.ty;
        let related = field.related;
        let def = &field.def;
        let message = LitStr::new(
            &format!(
                "relation field `{}` does not fit its relation kind: singular kinds need Option<R> or Option<Box<R>>, plural kinds need Vec<R>, HashSet<R> or BTreeSet<R>",
                field.ident.unraw()
            ),
            field.ident.span(),
        );
        quote! {
            const _: () = {
                if <#ty as ::lifeline::RelationSlot<#related>>::SINGULAR != #def.rel_type().is_singular() {
                    ::std::panic!(#message);
                }
            };
        }
    });

    quote! {
        #(#shape_checks)*

        impl ::lifeline::WithRelations for #struct_name {
            fn load_request(#name_param: &str) -> ::std::option::Option<::std::boxed::Box<dyn ::lifeline::EagerLoad<Self>>> {
                #(#requests)*
                ::std::option::Option::None
            }
        }

        #(#related_impls)*
    }
}
