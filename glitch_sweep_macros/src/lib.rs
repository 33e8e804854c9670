// This file is part of glitch-sweep, an application to sweep fault-injection parameters against embedded targets.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// glitch-sweep is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// glitch-sweep is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{ItemStruct, LitStr, parse_macro_input};

/// Attach a registry name to a platform struct.
///
/// Expands to the struct itself plus a `PLATFORM_NAME` constant and a
/// `register_platform()` associated function which inserts `Self::new()` into
/// `crate::platforms::platform::PLATFORM_REGISTRY` under that name. The struct
/// must provide a `new()` constructor.
///
/// ```rust,ignore
/// #[platform(name = "simulated")]
/// pub struct SimulatedPlatform {}
/// ```
#[proc_macro_attribute]
pub fn platform(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut name: Option<LitStr> = None;
    let name_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            name = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported platform property, expected `name = \"...\"`"))
        }
    });
    parse_macro_input!(attr with name_parser);
    let item = parse_macro_input!(item as ItemStruct);

    let Some(name) = name else {
        return syn::Error::new(
            Span::call_site(),
            "#[platform] requires a registry name: #[platform(name = \"...\")]",
        )
        .to_compile_error()
        .into();
    };

    let ident = &item.ident;
    quote! {
        #item

        impl #ident {
            /// Name this platform is registered under.
            pub const PLATFORM_NAME: &'static str = #name;

            /// Insert this platform's constructor into the global platform registry.
            pub fn register_platform() {
                crate::platforms::platform::register_platform(#name, || {
                    Box::new(#ident::new())
                });
            }
        }
    }
    .into()
}
