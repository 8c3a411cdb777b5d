use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DataEnum, DataStruct, DeriveInput, Ident, LitInt};

fn derive_minecraft_data_for_struct(name: Ident, data: DataStruct) -> TokenStream {
    let reader_id = format_ident!("reader");
    let writer_id = format_ident!("writer");
    let is_named = matches!(data.fields, syn::Fields::Named(_));
    let members = data.fields.members().collect::<Vec<_>>();
    let types = data.fields.iter().map(|f| f.ty.clone()).collect::<Vec<_>>();

    let decode_expr = quote! {crate::datatypes::MinecraftData::decode(#reader_id)?};
    let decode_body = if is_named {
        // fields are decoded in declaration order, which is wire order
        let decode_lines = members.iter().zip(types.iter()).map(|(ident, ty)| {
            quote! {let #ident: #ty = #decode_expr;}
        });
        quote! {
            #(#decode_lines)*
            Ok(Self {
                #(#members),*
            })
        }
    } else {
        quote! {
            Ok(Self {
                #(#members: #decode_expr),*
            })
        }
    };
    let encode_lines = members.iter().map(|ident| {
        quote! {crate::datatypes::MinecraftData::encode(self.#ident, #writer_id)?;}
    });
    let num_bytes_body = if members.is_empty() {
        quote! {0}
    } else {
        let num_bytes_lines = members.iter().map(|ident| {
            quote! {crate::datatypes::MinecraftData::num_bytes(&self.#ident)}
        });
        quote! {#(#num_bytes_lines)+*}
    };
    quote! {
        #[allow(unused_variables)]
        impl crate::datatypes::MinecraftData for #name {
            fn decode<R: ::std::io::Read>(#reader_id: &mut R) -> ::std::result::Result<Self, crate::datatypes::Error> {
                #decode_body
            }

            fn encode<W: ::std::io::Write>(self, #writer_id: &mut W) -> ::std::result::Result<(), crate::datatypes::Error> {
                #(#encode_lines)*
                Ok(())
            }

            fn num_bytes(&self) -> usize {
                #num_bytes_body
            }
        }
    }
    .into()
}

/// Unit-only enums are sent as a VarInt; each variant names its value with `#[mc_repr(n)]`.
fn derive_minecraft_data_for_enum(name: Ident, data: DataEnum) -> TokenStream {
    let reader_id = format_ident!("reader");
    let writer_id = format_ident!("writer");
    let mut idents = Vec::new();
    let mut reprs: Vec<LitInt> = Vec::new();
    for v in data.variants.into_iter() {
        if !matches!(v.fields, syn::Fields::Unit) {
            return quote!(compile_error!(
                "Can only derive(MinecraftData) on unit-only enum"
            );)
            .into();
        }
        let repr = if let Some(attr) = v.attrs.iter().find(|attr| attr.path().is_ident("mc_repr")) {
            match attr.parse_args::<LitInt>() {
                Ok(lit) => lit,
                Err(e) => return e.into_compile_error().into(),
            }
        } else {
            return quote!(compile_error!("Each variant needs a repr");).into();
        };

        idents.push(v.ident);
        reprs.push(repr);
    }
    let invalid = format!("invalid {name}");

    quote! {
        impl crate::datatypes::MinecraftData for #name {
            fn decode<R: ::std::io::Read>(#reader_id: &mut R) -> ::std::result::Result<Self, crate::datatypes::Error> {
                let value: crate::datatypes::VarInt = crate::datatypes::MinecraftData::decode(#reader_id)?;
                match value.0 {
                    #(#reprs => Ok(Self::#idents),)*
                    _ => Err(::anyhow::anyhow!(#invalid)),
                }
            }

            fn encode<W: ::std::io::Write>(self, #writer_id: &mut W) -> ::std::result::Result<(), crate::datatypes::Error> {
                let value = match self {
                    #(Self::#idents => crate::datatypes::VarInt(#reprs),)*
                };
                crate::datatypes::MinecraftData::encode(value, #writer_id)
            }

            fn num_bytes(&self) -> usize {
                let value = match self {
                    #(Self::#idents => crate::datatypes::VarInt(#reprs),)*
                };
                crate::datatypes::MinecraftData::num_bytes(&value)
            }
        }
    }
    .into()
}

#[proc_macro_derive(MinecraftData, attributes(mc_repr))]
pub fn derive_minecraft_data(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match input.data {
        Data::Struct(data_struct) => derive_minecraft_data_for_struct(input.ident, data_struct),
        Data::Enum(data_enum) => derive_minecraft_data_for_enum(input.ident, data_enum),
        Data::Union(_) => {
            quote! {compile_error!{"derive(MinecraftData) does not work on unions"};}.into()
        }
    }
}
