//! Record derive macro implementation

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

use crate::attrs::{FieldAttrs, field_attrs, struct_attrs};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let table = struct_attrs(&input)?
        .table
        .unwrap_or_else(|| name.to_string().to_snake_case());

    let mut columns = Vec::with_capacity(fields.len());
    let mut scans = Vec::with_capacity(fields.len());
    for field in fields {
        let attrs = field_attrs(field)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let column = attrs.column.clone().unwrap_or_else(|| ident.to_string());

        let value = quote! {
            ::rowmap::Value::from(::core::clone::Clone::clone(&self.#ident))
        };
        let col = match column_options(&attrs) {
            Some(opt) => quote! { ::rowmap::Col::new(#column, #value).with_opt(#opt) },
            None => quote! { ::rowmap::Col::new(#column, #value) },
        };
        columns.push(col);
        scans.push(quote! { self.#ident = row.next()?; });
    }

    Ok(quote! {
        impl #impl_generics ::rowmap::Record for #name #ty_generics #where_clause {
            fn table_name(&self) -> &str {
                #table
            }

            #[allow(unused_variables)]
            fn row(&self, cfg: &::rowmap::RowConfig) -> ::rowmap::Row {
                ::std::vec![#(#columns),*]
            }

            fn scan(&mut self, row: &mut ::rowmap::RowReader<'_>) -> ::rowmap::OrmResult<()> {
                #(#scans)*
                ::core::result::Result::Ok(())
            }
        }
    })
}

/// `ColOpt` expression for a field, or `None` when it carries no metadata.
fn column_options(attrs: &FieldAttrs) -> Option<TokenStream> {
    if !attrs.has_options() {
        return None;
    }

    let mut opt = if attrs.auto_key {
        quote! { cfg.auto_key() }
    } else if attrs.blob {
        quote! { cfg.blob() }
    } else {
        quote! { ::rowmap::ColOpt::new() }
    };
    if attrs.primary_key {
        opt = quote! { #opt.flags(::rowmap::ColFlags::PRIMARY_KEY) };
    }
    if attrs.no_insert {
        opt = quote! { #opt.flags(::rowmap::ColFlags::NO_INSERT) };
    }
    if let Some(sql_type) = &attrs.sql_type {
        opt = quote! { #opt.sql_type(#sql_type) };
    }
    Some(opt)
}
