use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derives `calmform::form::FormModel` for a struct with named fields.
///
/// Every field becomes a `FieldKey` accessor on the generated `<Name>Fields`
/// struct. `from_values` starts from `Default::default()`, so the struct must
/// implement `Default`; every field type must implement `FieldType`.
#[proc_macro_derive(FormModel)]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let form = calmform_path();
    let mut key_methods = Vec::new();
    let mut key_consts = Vec::new();
    let mut overlays = Vec::new();
    let mut exports = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_ty = field.ty;
        let field_name = field_ident.to_string();
        let field_name = field_name.strip_prefix("r#").unwrap_or(&field_name).to_string();

        key_methods.push(quote! {
            pub const fn #field_ident(&self) -> #form::FieldKey {
                #form::FieldKey::new(#field_name)
            }
        });

        key_consts.push(quote! { #form::FieldKey::new(#field_name) });

        overlays.push(quote! {
            if let ::core::option::Option::Some(value) = values.get(&#form::FieldKey::new(#field_name)) {
                if let ::core::option::Option::Some(value) =
                    <#field_ty as #form::FieldType>::from_field_value(value)
                {
                    model.#field_ident = value;
                }
            }
        });

        exports.push(quote! {
            if let ::core::option::Option::Some(value) =
                <#field_ty as #form::FieldType>::to_field_value(&self.#field_ident)
            {
                values.insert(#form::FieldKey::new(#field_name), value);
            }
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#key_methods)*
        }

        impl #form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_keys() -> &'static [#form::FieldKey] {
                const KEYS: &[#form::FieldKey] = &[#(#key_consts),*];
                KEYS
            }

            fn from_values(values: &#form::Values) -> Self {
                let mut model = <Self as ::core::default::Default>::default();
                #(#overlays)*
                model
            }

            fn to_values(&self) -> #form::Values {
                let mut values = #form::Values::new();
                #(#exports)*
                values
            }
        }
    }
    .into()
}

fn calmform_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident::form)
        }
        Ok(FoundCrate::Itself) => quote!(crate::form),
        Err(_) => quote!(::calmform::form),
    }
}
