//! # Graphcode Derive Macros
//!
//! This crate provides the procedural macros for `graphcode`. It automates the
//! implementation of `GraphType` for structs and enums: the type name, the layout used for
//! structural hashing, and the field-by-field encoder and decoder.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DataEnum, DeriveInput, Fields, GenericParam,
    Generics, Ident, LitStr, Type,
};

/// Derives `graphcode::GraphType`.
///
/// Container attributes (`#[graphcode(...)]` on the type):
/// - `name = "..."`: serialized name; defaults to the type's module path and ident.
/// - `callbacks`: call the type's `GraphCallbacks` hooks around encoding and decoding.
/// - `contract`: encode through the type's `GraphContract` instead of its fields.
/// - `auto_register`: submit the type to `CodecRegistry::auto_register`.
///
/// Field attributes:
/// - `skip`: not written; rebuilt with `Default::default()`.
/// - `rename = "..."`: name used in the structural hash.
/// - `entries`: encode the struct as a dictionary over this field.
#[proc_macro_derive(GraphcodeObject, attributes(graphcode))]
pub fn derive_graphcode_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

// --- Internal Data Structures ---

#[derive(Default)]
struct ContainerOpts {
    name: Option<LitStr>,
    callbacks: bool,
    contract: bool,
    auto_register: bool,
}

#[derive(Default)]
struct FieldOpts {
    skip: bool,
    rename: Option<LitStr>,
    entries: bool,
}

struct FieldSpec {
    /// Accessor: the field ident, or its index for tuple fields.
    member: syn::Member,
    /// Local binding used by the generated code.
    binding: Ident,
    ty: Type,
    wire_name: String,
    opts: FieldOpts,
}

fn parse_container(attrs: &[Attribute]) -> syn::Result<ContainerOpts> {
    let mut opts = ContainerOpts::default();
    for attr in attrs {
        if !attr.path().is_ident("graphcode") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                opts.name = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("callbacks") {
                opts.callbacks = true;
                return Ok(());
            }
            if meta.path.is_ident("contract") {
                opts.contract = true;
                return Ok(());
            }
            if meta.path.is_ident("auto_register") {
                opts.auto_register = true;
                return Ok(());
            }
            Err(meta.error(
                "Unknown graphcode attribute key. Supported: name, callbacks, contract, auto_register",
            ))
        })?;
    }
    Ok(opts)
}

fn parse_field(attrs: &[Attribute]) -> syn::Result<FieldOpts> {
    let mut opts = FieldOpts::default();
    for attr in attrs {
        if !attr.path().is_ident("graphcode") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                opts.skip = true;
                return Ok(());
            }
            if meta.path.is_ident("rename") {
                opts.rename = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("entries") {
                opts.entries = true;
                return Ok(());
            }
            Err(meta.error("Unknown graphcode field attribute. Supported: skip, rename, entries"))
        })?;
    }
    Ok(opts)
}

fn collect_fields(fields: &Fields, prefix: &str) -> syn::Result<Vec<FieldSpec>> {
    let mut specs = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let opts = parse_field(&field.attrs)?;
        let (member, default_name) = match &field.ident {
            Some(ident) => (syn::Member::Named(ident.clone()), ident.to_string()),
            None => (syn::Member::Unnamed(index.into()), index.to_string()),
        };
        let wire_name = opts
            .rename
            .as_ref()
            .map(LitStr::value)
            .unwrap_or(default_name);
        specs.push(FieldSpec {
            member,
            binding: format_ident!("__field{}", index),
            ty: field.ty.clone(),
            wire_name: format!("{prefix}{wire_name}"),
            opts,
        });
    }
    Ok(specs)
}

// --- Expansion ---

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let opts = parse_container(&input.attrs)?;
    let name = &input.ident;

    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "GraphcodeObject types must be 'static; borrowed fields are not supported",
        ));
    }
    if opts.auto_register && !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            name.span(),
            "auto_register needs a concrete type; register each instantiation instead",
        ));
    }

    let generics = add_bounds(input.generics.clone());
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let type_name = generate_type_name(name, &opts, &input.generics);

    let body = if opts.contract {
        generate_contract()
    } else {
        match &input.data {
            Data::Struct(ds) => generate_struct(&ds.fields, &opts)?,
            Data::Enum(de) => generate_enum(de, &opts)?,
            Data::Union(_) => {
                return Err(syn::Error::new(
                    name.span(),
                    "GraphcodeObject does not support unions",
                ))
            }
        }
    };

    let registration = if opts.auto_register {
        quote! {
            graphcode::internal::inventory::submit! {
                graphcode::AutoRegistration::of::<#name>()
            }
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        impl #impl_generics graphcode::GraphType for #name #ty_generics #where_clause {
            #type_name
            #body
        }

        #registration
    })
}

fn add_bounds(mut generics: Generics) -> Generics {
    for param in &mut generics.params {
        if let GenericParam::Type(tp) = param {
            tp.bounds.push(parse_quote!(graphcode::GraphType));
        }
    }
    generics
}

fn generate_type_name(name: &Ident, opts: &ContainerOpts, generics: &Generics) -> TokenStream2 {
    let base = match &opts.name {
        Some(lit) => quote! { #lit },
        None => quote! { concat!(module_path!(), "::", stringify!(#name)) },
    };
    let args: Vec<TokenStream2> = generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(tp) => {
                let ident = &tp.ident;
                Some(quote! { <#ident as graphcode::GraphType>::type_name() })
            }
            GenericParam::Const(cp) => {
                let ident = &cp.ident;
                Some(quote! { #ident.to_string() })
            }
            GenericParam::Lifetime(_) => None,
        })
        .collect();

    if args.is_empty() {
        quote! {
            fn type_name() -> ::std::string::String {
                ::std::string::String::from(#base)
            }
        }
    } else {
        quote! {
            fn type_name() -> ::std::string::String {
                let args: ::std::vec::Vec<::std::string::String> = vec![#(#args),*];
                format!("{}<{}>", #base, args.join(","))
            }
        }
    }
}

// --- Generator: Contract ---

fn generate_contract() -> TokenStream2 {
    quote! {
        const KIND: graphcode::TypeKind = graphcode::TypeKind::Contract;

        fn type_info() -> graphcode::TypeInfo {
            graphcode::TypeInfo::new(Self::type_name(), Self::KIND)
                .factory(<Self as graphcode::GraphContract>::FACTORY.is_some())
        }

        fn encode(&self, w: &mut graphcode::graph::GraphWriter<'_>) -> graphcode::Result<()> {
            graphcode::rt::encode_contract(self, w)
        }

        fn decode(r: &mut graphcode::graph::GraphReader<'_>) -> graphcode::Result<Self> {
            graphcode::rt::decode_contract(r)
        }
    }
}

// --- Generator: Struct ---

fn field_infos(fields: &[FieldSpec]) -> Vec<TokenStream2> {
    fields
        .iter()
        .filter(|f| !f.opts.skip)
        .map(|f| {
            let ty = &f.ty;
            let wire_name = &f.wire_name;
            quote! { .field::<#ty>(#wire_name) }
        })
        .collect()
}

fn encode_fields<'a>(fields: impl Iterator<Item = &'a FieldSpec>) -> Vec<TokenStream2> {
    fields
        .map(|f| {
            let member = &f.member;
            quote! { graphcode::GraphType::encode(&self.#member, w)?; }
        })
        .collect()
}

fn decode_fields<'a>(fields: impl Iterator<Item = &'a FieldSpec>) -> Vec<TokenStream2> {
    fields
        .map(|f| {
            let binding = &f.binding;
            let ty = &f.ty;
            quote! { let #binding = <#ty as graphcode::GraphType>::decode(r)?; }
        })
        .collect()
}

/// Builds `Self { a: __field0, b: Default::default() }` (or the tuple form).
fn construct(path: TokenStream2, fields: &Fields, specs: &[FieldSpec]) -> TokenStream2 {
    let values = specs.iter().map(|f| {
        if f.opts.skip {
            quote! { ::std::default::Default::default() }
        } else {
            let binding = &f.binding;
            quote! { #binding }
        }
    });
    match fields {
        Fields::Named(_) => {
            let members = specs.iter().map(|f| &f.member);
            quote! { #path { #(#members: #values),* } }
        }
        Fields::Unnamed(_) => quote! { #path( #(#values),* ) },
        Fields::Unit => path,
    }
}

fn generate_struct(fields: &Fields, opts: &ContainerOpts) -> syn::Result<TokenStream2> {
    let specs = collect_fields(fields, "")?;
    let entries: Vec<&FieldSpec> = specs.iter().filter(|f| f.opts.entries).collect();
    if entries.len() > 1 {
        return Err(syn::Error::new(
            Span::call_site(),
            "at most one field can be marked #[graphcode(entries)]",
        ));
    }
    if let Some(f) = entries.first() {
        if f.opts.skip {
            return Err(syn::Error::new_spanned(&f.ty, "an entries field cannot be skipped"));
        }
    }
    let entries = entries.first().copied();

    let infos = field_infos(&specs);
    let kind = if entries.is_some() {
        quote! { graphcode::TypeKind::Map }
    } else {
        quote! { graphcode::TypeKind::Struct }
    };

    let (before_encode, after_encode, before_decode, after_decode) = callback_hooks(opts);
    let built = construct(quote! { Self }, fields, &specs);

    let plain = || specs.iter().filter(|f| !f.opts.skip && !f.opts.entries);
    let (encode_body, decode_body) = match entries {
        None => {
            let encodes = encode_fields(plain());
            let decodes = decode_fields(plain());
            (quote! { #(#encodes)* }, quote! { #(#decodes)* })
        }
        Some(entry) => {
            let member = &entry.member;
            let binding = &entry.binding;
            let ty = &entry.ty;
            let encodes = encode_fields(plain());
            let decodes = decode_fields(plain());
            let extras: Vec<&Ident> = plain().map(|f| &f.binding).collect();
            (
                quote! {
                    graphcode::rt::encode_dictionary(&self.#member, w, |w| {
                        #(#encodes)*
                        Ok(())
                    })?;
                },
                quote! {
                    let (#binding, (#(#extras,)*)) =
                        graphcode::rt::decode_dictionary::<#ty, _, _>(r, |r| {
                            #(#decodes)*
                            Ok((#(#extras,)*))
                        })?;
                },
            )
        }
    };

    Ok(quote! {
        const KIND: graphcode::TypeKind = #kind;

        fn type_info() -> graphcode::TypeInfo {
            graphcode::TypeInfo::new(Self::type_name(), Self::KIND) #(#infos)*
        }

        #[allow(unused_variables)]
        fn encode(&self, w: &mut graphcode::graph::GraphWriter<'_>) -> graphcode::Result<()> {
            #before_encode
            #encode_body
            #after_encode
            Ok(())
        }

        #[allow(unused_variables)]
        fn decode(r: &mut graphcode::graph::GraphReader<'_>) -> graphcode::Result<Self> {
            #before_decode
            #decode_body
            let mut value = #built;
            #after_decode
            Ok(value)
        }
    })
}

fn callback_hooks(opts: &ContainerOpts) -> (TokenStream2, TokenStream2, TokenStream2, TokenStream2) {
    if opts.callbacks {
        (
            quote! { graphcode::GraphCallbacks::on_serializing(self); },
            quote! { graphcode::GraphCallbacks::on_serialized(self); },
            quote! { <Self as graphcode::GraphCallbacks>::on_deserializing(); },
            quote! { graphcode::GraphCallbacks::on_deserialized(&mut value)?; },
        )
    } else {
        (quote! {}, quote! {}, quote! {}, quote! { let _ = &mut value; })
    }
}

// --- Generator: Enum ---

fn generate_enum(data: &DataEnum, opts: &ContainerOpts) -> syn::Result<TokenStream2> {
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            Span::call_site(),
            "GraphcodeObject cannot be derived for an empty enum",
        ));
    }
    let unit_only = data.variants.iter().all(|v| matches!(v.fields, Fields::Unit));
    let (before_encode, after_encode, before_decode, after_decode) = callback_hooks(opts);

    let (infos, encode_body, decode_body) = if unit_only {
        unit_enum(data)
    } else {
        data_enum(data)?
    };

    Ok(quote! {
        const KIND: graphcode::TypeKind = graphcode::TypeKind::Enum;

        fn type_info() -> graphcode::TypeInfo {
            graphcode::TypeInfo::new(Self::type_name(), Self::KIND) #infos
        }

        #[allow(unused_variables)]
        fn encode(&self, w: &mut graphcode::graph::GraphWriter<'_>) -> graphcode::Result<()> {
            #before_encode
            #encode_body
            #after_encode
            Ok(())
        }

        #[allow(unused_variables)]
        fn decode(r: &mut graphcode::graph::GraphReader<'_>) -> graphcode::Result<Self> {
            #before_decode
            let mut value: Self = #decode_body;
            #after_decode
            Ok(value)
        }
    })
}

/// Unit-only enums travel as their `i32` discriminant.
///
/// Discriminants outside the `i32` range (possible with a wider `repr`) fail to compile
/// instead of silently sharing a tag.
fn unit_enum(data: &DataEnum) -> (TokenStream2, TokenStream2, TokenStream2) {
    let idents: Vec<&Ident> = data.variants.iter().map(|v| &v.ident).collect();
    let names: Vec<String> = idents.iter().map(|i| i.to_string()).collect();
    let overflow: Vec<String> = names
        .iter()
        .map(|n| format!("discriminant of `{n}` does not fit the i32 wire tag"))
        .collect();

    let infos = quote! { #(.variant(#names, Self::#idents as i64))* };
    let encode = quote! {
        const {
            #(assert!(
                Self::#idents as i128 >= i32::MIN as i128
                    && Self::#idents as i128 <= i32::MAX as i128,
                #overflow
            );)*
        };
        let tag: i32 = match self {
            #(Self::#idents => Self::#idents as i32,)*
        };
        w.wire().write_i32(tag);
    };
    let decode = quote! {
        match r.wire().read_i32()? {
            #(tag if tag == Self::#idents as i32 => Self::#idents,)*
            other => return Err(graphcode::rt::unknown_variant(&Self::type_name(), other)),
        }
    };
    (infos, encode, decode)
}

/// Enums with data travel as the `i32` variant index followed by the variant's fields.
fn data_enum(data: &DataEnum) -> syn::Result<(TokenStream2, TokenStream2, TokenStream2)> {
    let mut infos = Vec::new();
    let mut encode_arms = Vec::new();
    let mut decode_arms = Vec::new();

    for (index, variant) in data.variants.iter().enumerate() {
        let ident = &variant.ident;
        let vname = ident.to_string();
        let tag = i32::try_from(index)
            .map_err(|_| syn::Error::new_spanned(ident, "too many variants"))?;
        let specs = collect_fields(&variant.fields, &format!("{vname}."))?;
        if let Some(f) = specs.iter().find(|f| f.opts.entries) {
            return Err(syn::Error::new_spanned(
                &f.ty,
                "#[graphcode(entries)] is only supported on struct fields",
            ));
        }

        let field_infos = field_infos(&specs);
        infos.push(quote! { .variant(#vname, #tag as i64) #(#field_infos)* });

        let pattern = match &variant.fields {
            Fields::Named(_) => {
                let members = specs.iter().filter(|f| !f.opts.skip).map(|f| &f.member);
                let bindings = specs.iter().filter(|f| !f.opts.skip).map(|f| &f.binding);
                quote! { Self::#ident { #(#members: #bindings,)* .. } }
            }
            Fields::Unnamed(_) => {
                let slots = specs.iter().map(|f| {
                    if f.opts.skip {
                        quote! { _ }
                    } else {
                        let binding = &f.binding;
                        quote! { #binding }
                    }
                });
                quote! { Self::#ident( #(#slots),* ) }
            }
            Fields::Unit => quote! { Self::#ident },
        };
        let encodes = specs.iter().filter(|f| !f.opts.skip).map(|f| {
            let binding = &f.binding;
            quote! { graphcode::GraphType::encode(#binding, w)?; }
        });
        encode_arms.push(quote! {
            #pattern => {
                w.wire().write_i32(#tag);
                #(#encodes)*
            }
        });

        let decodes = decode_fields(specs.iter().filter(|f| !f.opts.skip));
        let built = construct(quote! { Self::#ident }, &variant.fields, &specs);
        decode_arms.push(quote! {
            #tag => {
                #(#decodes)*
                #built
            }
        });
    }

    let infos = quote! { #(#infos)* };
    let encode = quote! {
        match self {
            #(#encode_arms)*
        }
    };
    let decode = quote! {
        match r.wire().read_i32()? {
            #(#decode_arms)*
            other => return Err(graphcode::rt::unknown_variant(&Self::type_name(), other)),
        }
    };
    Ok((infos, encode, decode))
}
