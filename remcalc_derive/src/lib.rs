use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `WireParam` trait for a serde-enabled type, encoding the
/// payload as JSON or MessagePack according to the frame's serialize type.
///
/// The expansion refers to `WireParam`, `SerializeType`, `Error`,
/// `ErrorKind` and `Result` unqualified, so the deriving module must have
/// them in scope (a glob import of `remcalc_protocol` suffices).
#[proc_macro_derive(WireParam)]
pub fn wire_param(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = input.ident;

    let expanded = quote! {
        impl WireParam for #name {
            fn into_bytes(&self, st: SerializeType) -> Result<Vec<u8>> {
                match st {
                    SerializeType::JSON => {
                        ::serde_json::to_vec(self).map_err(Error::from)
                    }
                    SerializeType::MsgPack => {
                        ::rmp_serde::to_vec_named(self).map_err(Error::from)
                    }
                    SerializeType::SerializeNone => Err(Error::new(
                        ErrorKind::Serialization,
                        "no serialize type on frame",
                    )),
                }
            }

            fn from_slice(&mut self, st: SerializeType, data: &[u8]) -> Result<()> {
                match st {
                    SerializeType::JSON => {
                        let param: Self = ::serde_json::from_slice(data)?;
                        *self = param;
                        Ok(())
                    }
                    SerializeType::MsgPack => {
                        let param: Self = ::rmp_serde::from_slice(data)?;
                        *self = param;
                        Ok(())
                    }
                    SerializeType::SerializeNone => Err(Error::new(
                        ErrorKind::Serialization,
                        "no serialize type on frame",
                    )),
                }
            }
        }
    };

    TokenStream::from(expanded)
}
