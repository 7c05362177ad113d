//! FromRow derive macro implementation

use crate::attrs;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = attrs::named_fields(&input, "FromRow")?;

    let field_extracts = fields
        .iter()
        .map(|field| {
            let attr = attrs::field_attr(field)?;
            let field_name = attrs::field_ident(field)?;
            let column_name = attrs::column_name(field, &attr)?;
            Ok(quote! {
                #field_name: row.get(#column_name)?
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        impl #impl_generics litorm::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &litorm::RowDecoder<'_>) -> litorm::OrmResult<Self> {
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
