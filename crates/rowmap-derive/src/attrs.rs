//! Attribute parsing for the Record derive macro.

use proc_macro2::Span;
use syn::Result;

#[derive(Default)]
pub(crate) struct StructAttrs {
    pub(crate) table: Option<String>,
}

#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub(crate) column: Option<String>,
    pub(crate) primary_key: bool,
    pub(crate) auto_key: bool,
    pub(crate) no_insert: bool,
    pub(crate) blob: bool,
    pub(crate) skip: bool,
    pub(crate) sql_type: Option<String>,
}

impl FieldAttrs {
    pub(crate) fn has_options(&self) -> bool {
        self.primary_key || self.auto_key || self.no_insert || self.blob || self.sql_type.is_some()
    }
}

/// One `key` or `key = "value"` item of a `#[rowmap(...)]` list.
struct Item {
    key: syn::Ident,
    value: Option<syn::LitStr>,
}

fn parse_items(input: syn::parse::ParseStream) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    loop {
        if input.is_empty() {
            break;
        }

        let key: syn::Ident = input.parse()?;
        if input.peek(syn::token::Paren) {
            return Err(syn::Error::new(
                key.span(),
                "unexpected function-style attribute",
            ));
        }

        let value = if input.peek(syn::Token![=]) {
            let _: syn::Token![=] = input.parse()?;
            Some(input.parse::<syn::LitStr>()?)
        } else {
            None
        };
        items.push(Item { key, value });

        if input.is_empty() {
            break;
        }
        let _: syn::Token![,] = input.parse()?;
    }
    Ok(items)
}

fn attr_items(attrs: &[syn::Attribute]) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("rowmap") {
            items.extend(attr.parse_args_with(parse_items)?);
        }
    }
    Ok(items)
}

fn require_value(item: &Item) -> Result<String> {
    match &item.value {
        Some(lit) => Ok(lit.value()),
        None => Err(syn::Error::new(
            item.key.span(),
            format!("`{}` expects a string value", item.key),
        )),
    }
}

fn reject_value(item: &Item) -> Result<()> {
    match &item.value {
        Some(lit) => Err(syn::Error::new(
            lit.span(),
            format!("`{}` takes no value", item.key),
        )),
        None => Ok(()),
    }
}

pub(crate) fn struct_attrs(input: &syn::DeriveInput) -> Result<StructAttrs> {
    let mut out = StructAttrs::default();
    for item in attr_items(&input.attrs)? {
        match item.key.to_string().as_str() {
            "table" => {
                let table = require_value(&item)?;
                if table.is_empty() {
                    return Err(syn::Error::new(item.key.span(), "table name is empty"));
                }
                out.table = Some(table);
            }
            other => {
                return Err(syn::Error::new(
                    item.key.span(),
                    format!("unknown struct attribute `{other}`"),
                ));
            }
        }
    }
    Ok(out)
}

pub(crate) fn field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for item in attr_items(&field.attrs)? {
        match item.key.to_string().as_str() {
            "column" => out.column = Some(require_value(&item)?),
            "sql_type" => out.sql_type = Some(require_value(&item)?),
            "primary_key" => {
                reject_value(&item)?;
                out.primary_key = true;
            }
            "auto_key" => {
                reject_value(&item)?;
                out.auto_key = true;
            }
            "no_insert" => {
                reject_value(&item)?;
                out.no_insert = true;
            }
            "blob" => {
                reject_value(&item)?;
                out.blob = true;
            }
            "skip" => {
                reject_value(&item)?;
                out.skip = true;
            }
            other => {
                return Err(syn::Error::new(
                    item.key.span(),
                    format!("unknown field attribute `{other}`"),
                ));
            }
        }
    }

    if out.skip && (out.has_options() || out.column.is_some()) {
        return Err(syn::Error::new(
            Span::call_site(),
            "`skip` cannot be combined with other rowmap attributes",
        ));
    }
    if out.auto_key && out.blob {
        return Err(syn::Error::new(
            Span::call_site(),
            "`auto_key` and `blob` are mutually exclusive",
        ));
    }
    Ok(out)
}
