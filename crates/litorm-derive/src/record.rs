//! Record derive macro implementation
//!
//! For each field, generates a `Field` const named after the field in
//! SCREAMING_SNAKE_CASE, a schema declaration and an encoder entry.

use crate::attrs;
use heck::ToShoutySnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }
    let vis = &input.vis;
    let table_name = attrs::table_name(&input)?;
    let fields = attrs::named_fields(&input, "Record")?;

    let mut consts = Vec::new();
    let mut declarations = Vec::new();
    let mut encodes = Vec::new();
    let mut primary_keys = 0usize;

    for field in fields {
        let attr = attrs::field_attr(field)?;
        let field_ident = attrs::field_ident(field)?;
        let field_name = field_ident.unraw().to_string();
        let column_name = attrs::column_name(field, &attr)?;
        let const_ident = format_ident!("{}", field_name.to_shouty_snake_case());
        let ty = &field.ty;

        consts.push(quote! {
            #vis const #const_ident: litorm::Field<#name, #ty> =
                litorm::Field::new(#field_name, #column_name);
        });

        let mut constraints = Vec::new();
        if attr.primary_key {
            primary_keys += 1;
            constraints.push(if attr.autoincrement {
                quote!(litorm::Constraint::primary_key_autoincrement())
            } else {
                quote!(litorm::Constraint::primary_key())
            });
        }
        if attr.unique {
            constraints.push(quote!(litorm::Constraint::Unique));
        }
        if let Some(lit) = &attr.default {
            constraints.push(quote!(litorm::Constraint::default_literal(#lit)));
        }
        if let Some(expr) = &attr.default_expr {
            constraints.push(quote!(litorm::Constraint::default_expr(#expr)));
        }
        if let Some(target) = &attr.references {
            constraints.push(quote!(litorm::Constraint::foreign_key(#target)));
        }

        declarations.push(if constraints.is_empty() {
            quote!(.field(Self::#const_ident))
        } else {
            quote!(.field_with(Self::#const_ident, [#(#constraints),*]))
        });
        encodes.push(quote! {
            out.set(Self::#const_ident, &self.#field_ident);
        });
    }

    if primary_keys > 1 {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Record supports at most one #[orm(id)] field",
        ));
    }

    Ok(quote! {
        impl #name {
            #(#consts)*
        }

        impl litorm::Record for #name {
            const TABLE: &'static str = #table_name;

            fn describe(schema: litorm::SchemaBuilder<Self>) -> litorm::SchemaBuilder<Self> {
                schema #(#declarations)*
            }

            fn encode(&self, out: &mut litorm::Encoder<Self>) {
                #(#encodes)*
            }
        }
    })
}
