//! Attribute parsing for the derive macros.
//!
//! Handles struct-level `#[orm(table = "...")]` and field-level `#[orm(...)]`.

use syn::ext::IdentExt;
use syn::{DeriveInput, Result};

/// Field options collected from every `#[orm(...)]` on one field.
#[derive(Default)]
pub struct FieldAttr {
    pub primary_key: bool,
    pub autoincrement: bool,
    pub unique: bool,
    pub column: Option<String>,
    pub references: Option<syn::Path>,
    pub default: Option<syn::Lit>,
    pub default_expr: Option<String>,
}

impl FieldAttr {
    fn merge(&mut self, other: FieldAttr) {
        self.primary_key |= other.primary_key;
        self.autoincrement |= other.autoincrement;
        self.unique |= other.unique;
        if other.column.is_some() {
            self.column = other.column;
        }
        if other.references.is_some() {
            self.references = other.references;
        }
        if other.default.is_some() {
            self.default = other.default;
        }
        if other.default_expr.is_some() {
            self.default_expr = other.default_expr;
        }
    }
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        // Comma-separated flags or key = value pairs
        while !input.is_empty() {
            let ident: syn::Ident = input.call(syn::Ident::parse_any)?;
            match ident.to_string().as_str() {
                "id" | "primary_key" => attr.primary_key = true,
                "autoincrement" => {
                    attr.primary_key = true;
                    attr.autoincrement = true;
                }
                "unique" => attr.unique = true,
                "column" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    attr.column = Some(value.value());
                }
                "references" => {
                    let _: syn::Token![=] = input.parse()?;
                    attr.references = Some(if input.peek(syn::LitStr) {
                        let value: syn::LitStr = input.parse()?;
                        value.parse()?
                    } else {
                        input.parse()?
                    });
                }
                "default" => {
                    let _: syn::Token![=] = input.parse()?;
                    attr.default = Some(input.parse()?);
                }
                "default_expr" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    attr.default_expr = Some(value.value());
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        format!("unknown orm attribute `{other}`"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

/// Collect all `#[orm(...)]` options on a field.
pub fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut attr = FieldAttr::default();
    for a in &field.attrs {
        if a.path().is_ident("orm") {
            attr.merge(a.parse_args::<FieldAttr>()?);
        }
    }
    if attr.default.is_some() && attr.default_expr.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "`default` and `default_expr` are mutually exclusive",
        ));
    }
    Ok(attr)
}

/// Column name of a field: `#[orm(column = "...")]` or the field name.
pub fn column_name(field: &syn::Field, attr: &FieldAttr) -> Result<String> {
    match &attr.column {
        Some(column) => Ok(column.clone()),
        None => Ok(field_ident(field)?.unraw().to_string()),
    }
}

pub fn field_ident(field: &syn::Field) -> Result<&syn::Ident> {
    field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))
}

/// Table name from `#[orm(table = "...")]`, defaulting to the struct name.
pub fn table_name(input: &DeriveInput) -> Result<String> {
    for attr in &input.attrs {
        if attr.path().is_ident("orm") {
            let nested = attr.parse_args::<syn::MetaNameValue>()?;
            if !nested.path.is_ident("table") {
                return Err(syn::Error::new_spanned(
                    &nested.path,
                    "expected #[orm(table = \"table_name\")]",
                ));
            }
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) = &nested.value
            {
                return Ok(lit.value());
            }
            return Err(syn::Error::new_spanned(
                &nested.value,
                "table name must be a string literal",
            ));
        }
    }
    Ok(input.ident.unraw().to_string())
}

/// Named fields of a struct, or an error naming the derive.
pub fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> Result<&'a syn::punctuated::Punctuated<syn::Field, syn::Token![,]>> {
    match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{derive} can only be derived for structs"),
        )),
    }
}
