use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, Lit, Meta, Token, Type, ext::IdentExt,
    parse_macro_input,
};

/// Helper enum for parsed attribute values
enum MetaValue {
    Str(String),
    Flag,
}

/// Derives `configurate::Configurable`, building the field descriptor table at compile time.
///
/// Field attributes, all inside `#[config(...)]`:
/// * `key = "name"` - document key, defaults to the field name
/// * `env = "VAR"` - environment variable; bare `env` uses the upper-cased field name
/// * `default = "literal"` or `default = 42` - used when the field holds its zero value
/// * `optional` - exempt a non-`Option` field from the required check
/// * `doc = "text"` - description for generated docs, defaults to the `///` comment
/// * `skip` - leave the field out of every loader
#[proc_macro_derive(Configurable, attributes(config))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_configurable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_configurable(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "derive(Configurable) does not support generic structs",
        ));
    }

    // Extract fields from the struct
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "derive(Configurable) only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "derive(Configurable) only supports structs",
            ));
        }
    };

    let mut descriptors = Vec::new();
    let mut slots = Vec::new();

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let field_type = &field.ty;
        let config = parse_field_config(&field.attrs)?;

        if config.skip {
            continue;
        }

        let name = field_name.unraw().to_string();
        let type_name = type_to_string(field_type);
        let key = config.key.unwrap_or_else(|| name.clone());
        let env = match config.env {
            EnvName::Named(var) => quote!(::core::option::Option::Some(#var)),
            EnvName::FromField => {
                let var = name.to_uppercase();
                quote!(::core::option::Option::Some(#var))
            }
            EnvName::Unset => quote!(::core::option::Option::None),
        };
        let default = match config.default {
            Some(literal) => quote!(::core::option::Option::Some(#literal)),
            None => quote!(::core::option::Option::None),
        };
        let description = config
            .description
            .unwrap_or_else(|| doc_comment(&field.attrs));
        let optional = config.optional;
        let index = descriptors.len();

        descriptors.push(quote! {
            ::configurate::FieldDescriptor {
                name: #name,
                type_name: #type_name,
                kind: <#field_type as ::configurate::FieldType>::KIND,
                optional: <#field_type as ::configurate::FieldType>::OPTIONAL || #optional,
                key: #key,
                env: #env,
                default: #default,
                description: #description,
            }
        });

        slots.push(quote! {
            ::configurate::Field {
                descriptor: &fields[#index],
                slot: ::configurate::FieldType::slot(&mut self.#field_name),
            }
        });
    }

    Ok(quote! {
        impl ::configurate::Configurable for #struct_name {
            fn schema() -> &'static [::configurate::FieldDescriptor] {
                const FIELDS: &[::configurate::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            fn descriptors(&self) -> &'static [::configurate::FieldDescriptor] {
                <Self as ::configurate::Configurable>::schema()
            }

            #[allow(unused_variables)]
            fn fields_mut(&mut self) -> ::std::vec::Vec<::configurate::Field<'_>> {
                let fields = <Self as ::configurate::Configurable>::schema();
                ::std::vec![#(#slots),*]
            }
        }
    })
}

#[derive(Debug, Default)]
struct FieldConfig {
    key: Option<String>,
    env: EnvName,
    default: Option<String>,
    description: Option<String>,
    optional: bool,
    skip: bool,
}

#[derive(Debug, Default)]
enum EnvName {
    Named(String),
    FromField,
    #[default]
    Unset,
}

/// Parse #[config(key = "x", env = "Y", default = val, optional)] syntax
fn parse_config_list(meta_list: &syn::MetaList) -> syn::Result<HashMap<String, MetaValue>> {
    let mut values = HashMap::new();

    meta_list.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("expected identifier"))?
            .to_string();

        if meta.input.peek(Token![=]) {
            meta.input.parse::<Token![=]>()?;

            let negative = meta.input.peek(Token![-]);
            if negative {
                meta.input.parse::<Token![-]>()?;
            }

            let value = match meta.input.parse::<Lit>()? {
                Lit::Str(s) if !negative => s.value(),
                Lit::Int(i) if key == "default" => {
                    let digits = i.base10_digits();
                    if negative {
                        format!("-{}", digits)
                    } else {
                        digits.to_string()
                    }
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        format!("`{}` expects a string literal", key),
                    ));
                }
            };
            values.insert(key, MetaValue::Str(value));
        } else {
            values.insert(key, MetaValue::Flag);
        }

        Ok(())
    })?;

    Ok(values)
}

fn parse_field_config(attrs: &[Attribute]) -> syn::Result<FieldConfig> {
    let mut config = FieldConfig::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("config")) {
        let parsed = match &attr.meta {
            Meta::List(list) => parse_config_list(list)?,
            _ => {
                return Err(syn::Error::new_spanned(
                    attr,
                    "config attribute must be a list: #[config(env = \"...\", ...)]",
                ));
            }
        };

        for (name, value) in parsed {
            match (name.as_str(), value) {
                ("key", MetaValue::Str(s)) => {
                    config.key = Some(s).filter(|s| !s.is_empty());
                }
                ("env", MetaValue::Str(s)) => config.env = EnvName::Named(s),
                ("env", MetaValue::Flag) => config.env = EnvName::FromField,
                ("default", MetaValue::Str(s)) => {
                    config.default = Some(s).filter(|s| !s.is_empty());
                }
                ("doc", MetaValue::Str(s)) => config.description = Some(s.trim().to_string()),
                ("optional", MetaValue::Flag) => config.optional = true,
                ("skip", MetaValue::Flag) => config.skip = true,
                ("key" | "default" | "doc", MetaValue::Flag) => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        format!("`{}` needs a value: {} = \"...\"", name, name),
                    ));
                }
                ("optional" | "skip", MetaValue::Str(_)) => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        format!("`{}` is a flag and takes no value", name),
                    ));
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        format!(
                            "unknown config attribute `{}`, expected one of: key, env, default, optional, doc, skip",
                            name
                        ),
                    ));
                }
            }
        }
    }

    Ok(config)
}

/// Join the field's `///` lines into a single description
fn doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(syn::ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The field type as written, without token spacing
fn type_to_string(ty: &Type) -> String {
    quote!(#ty)
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
