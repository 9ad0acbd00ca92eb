use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use std::collections::HashSet;
use syn::{
    Expr, ExprLit, Field, Fields, Ident, ItemStruct, Lit, Meta, Path, Token, parse_macro_input,
    parse_quote, parse_str, punctuated::Punctuated,
};

struct BaseEntityConfig {
    traits_path: Path,
    active_model_ident: Ident,
    id_field: Ident,
    created_at_field: Ident,
    updated_at_field: Ident,
    deleted_at_field: Option<Ident>,
}

impl Default for BaseEntityConfig {
    fn default() -> Self {
        Self {
            traits_path: parse_str("crate::db::dao::base_traits")
                .expect("default traits path should parse"),
            active_model_ident: Ident::new("ActiveModel", Span::call_site()),
            id_field: Ident::new("id", Span::call_site()),
            created_at_field: Ident::new("created_at", Span::call_site()),
            updated_at_field: Ident::new("updated_at", Span::call_site()),
            deleted_at_field: None,
        }
    }
}

/// Injects the shared `id`, `created_at` and `updated_at` columns into a SeaORM
/// model and wires up the DAO marker traits.
///
/// `#[base_entity(soft_delete)]` additionally adds a nullable `deleted_at`
/// column; rows with a value there are treated as removed by the DAO layer.
#[proc_macro_attribute]
pub fn base_entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr with Punctuated<Meta, Token![,]>::parse_terminated);
    let mut config = BaseEntityConfig::default();
    if let Err(err) = apply_args(&mut config, args) {
        return err.to_compile_error().into();
    }

    let mut input = parse_macro_input!(item as ItemStruct);
    let fields = match &mut input.fields {
        Fields::Named(fields) => fields,
        _ => {
            return syn::Error::new_spanned(
                input,
                "base_entity requires a struct with named fields",
            )
            .to_compile_error()
            .into();
        }
    };

    let existing: HashSet<String> = fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref().map(|ident| ident.to_string()))
        .collect();

    let mut leading: Punctuated<Field, Token![,]> = Punctuated::new();

    if !existing.contains(&config.id_field.to_string()) {
        let id_ident = &config.id_field;
        leading.push(parse_quote! {
            #[sea_orm(primary_key, auto_increment = false)]
            pub #id_ident: uuid::Uuid
        });
    }

    for ident in [&config.created_at_field, &config.updated_at_field] {
        if !existing.contains(&ident.to_string()) {
            leading.push(parse_quote! {
                #[sea_orm(default_expr = "Expr::current_timestamp()")]
                pub #ident: sea_orm::entity::prelude::DateTimeWithTimeZone
            });
        }
    }

    let mut trailing: Punctuated<Field, Token![,]> = Punctuated::new();
    if let Some(deleted_ident) = &config.deleted_at_field {
        if !existing.contains(&deleted_ident.to_string()) {
            trailing.push(parse_quote! {
                #[sea_orm(indexed)]
                pub #deleted_ident: Option<sea_orm::entity::prelude::DateTimeWithTimeZone>
            });
        }
    }

    // Relation fields (HasMany/HasOne) must stay last, so soft-delete goes
    // right after the plain columns.
    let (plain, relations): (Vec<Field>, Vec<Field>) = fields
        .named
        .iter()
        .cloned()
        .partition(|field| !is_relation_field(field));

    let mut merged = leading;
    merged.extend(plain);
    merged.extend(trailing);
    merged.extend(relations);
    fields.named = merged;

    let traits_path = &config.traits_path;
    let active_model = &config.active_model_ident;
    let id_field = &config.id_field;
    let created_at_field = &config.created_at_field;
    let updated_at_field = &config.updated_at_field;

    let soft_delete_impls = config.deleted_at_field.as_ref().map(|deleted_ident| {
        let column = Ident::new(&to_pascal_case(&deleted_ident.to_string()), Span::call_site());
        quote! {
            impl #traits_path::SoftDeleteActiveModel for #active_model {
                fn set_deleted_at(
                    &mut self,
                    ts: Option<sea_orm::entity::prelude::DateTimeWithTimeZone>,
                ) {
                    self.#deleted_ident = sea_orm::ActiveValue::Set(ts);
                }
            }

            impl #traits_path::HasDeletedAtColumn for Entity {
                fn deleted_at_column() -> Column {
                    Column::#column
                }
            }
        }
    });

    let expanded = quote! {
        #input

        impl #traits_path::HasIdActiveModel for #active_model {
            fn set_id(&mut self, id: uuid::Uuid) {
                self.#id_field = sea_orm::ActiveValue::Set(id);
            }
        }

        impl #traits_path::TimestampedActiveModel for #active_model {
            fn set_created_at(
                &mut self,
                ts: sea_orm::entity::prelude::DateTimeWithTimeZone,
            ) {
                self.#created_at_field = sea_orm::ActiveValue::Set(ts);
            }

            fn set_updated_at(
                &mut self,
                ts: sea_orm::entity::prelude::DateTimeWithTimeZone,
            ) {
                self.#updated_at_field = sea_orm::ActiveValue::Set(ts);
            }
        }

        impl #traits_path::HasCreatedAtColumn for Entity {
            fn created_at_column() -> Column {
                Column::CreatedAt
            }
        }

        #soft_delete_impls
    };

    expanded.into()
}

fn is_relation_field(field: &Field) -> bool {
    let syn::Type::Path(type_path) = &field.ty else {
        return false;
    };
    type_path
        .path
        .segments
        .last()
        .map(|segment| matches!(segment.ident.to_string().as_str(), "HasMany" | "HasOne"))
        .unwrap_or(false)
}

fn to_pascal_case(raw: &str) -> String {
    raw.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn apply_args(
    config: &mut BaseEntityConfig,
    args: Punctuated<Meta, Token![,]>,
) -> Result<(), syn::Error> {
    for meta in args {
        let name_value = match meta {
            Meta::Path(path) if path.is_ident("soft_delete") => {
                config.deleted_at_field = Some(Ident::new("deleted_at", Span::call_site()));
                continue;
            }
            Meta::NameValue(name_value) => name_value,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "expected `soft_delete` or a name-value pair, e.g. traits = \"path::to::traits\"",
                ));
            }
        };

        let Some(ident) = name_value.path.get_ident() else {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "expected simple identifier for attribute key",
            ));
        };

        let value = match name_value.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit_str),
                ..
            }) => lit_str,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "expected string literal for attribute value",
                ));
            }
        };

        match ident.to_string().as_str() {
            "traits" => {
                config.traits_path = value.parse::<Path>().map_err(|err| {
                    syn::Error::new(value.span(), format!("invalid traits path: {err}"))
                })?;
            }
            "active_model" => {
                config.active_model_ident = Ident::new(&value.value(), value.span());
            }
            "id" => {
                config.id_field = Ident::new(&value.value(), value.span());
            }
            "created_at" => {
                config.created_at_field = Ident::new(&value.value(), value.span());
            }
            "updated_at" => {
                config.updated_at_field = Ident::new(&value.value(), value.span());
            }
            "deleted_at" => {
                config.deleted_at_field = Some(Ident::new(&value.value(), value.span()));
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "unknown base_entity attribute key",
                ));
            }
        }
    }

    Ok(())
}
