//! Derive macros for plasma-lab.
//!
//! [`GpuInstance`] turns a plain Rust struct into a per-instance GPU record:
//!
//! - a companion `{Name}Gpu` struct with `#[repr(C)]` and WGSL-compatible padding
//! - a `WGSL_STRUCT` constant declaring the same layout for shaders
//! - vertex attribute descriptors for instanced drawing
//! - `to_gpu()` / `from_gpu()` conversions
//!
//! These macros are re-exported from the main `plasma_lab` crate:
//!
//! ```ignore
//! use plasma_lab::prelude::*;
//!
//! #[derive(GpuInstance, Clone, Debug)]
//! struct Spark {
//!     pos: Vec2,
//!     vel: Vec2,
//!     age: f32,
//! }
//! ```
//!
//! # GPU Memory Layout
//!
//! WGSL alignment rules are applied field by field:
//! - `Vec2` aligns to 8 bytes, `Vec4` to 16, scalars to 4
//! - the struct is padded to a multiple of 16 bytes so the same buffer can be
//!   bound as a storage array and as an instance vertex buffer with one stride
//! - padding is spelled out as `_padN` fields on both sides

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, Type};

/// Derive macro for GPU instance structs.
///
/// # Supported Types
///
/// | Rust Type | WGSL Type | Size | Alignment | Vertex format |
/// |-----------|-----------|------|-----------|---------------|
/// | `Vec2` | `vec2<f32>` | 8 | 8 | `Float32x2` |
/// | `Vec4` | `vec4<f32>` | 16 | 16 | `Float32x4` |
/// | `f32` | `f32` | 4 | 4 | `Float32` |
/// | `u32` | `u32` | 4 | 4 | `Uint32` |
///
/// # Generated Code
///
/// ```ignore
/// #[repr(C)]
/// #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
/// pub struct SparkGpu {
///     pub pos: [f32; 2],
///     pub vel: [f32; 2],
///     pub age: f32,
///     pub _pad0: [f32; 3],
/// }
///
/// impl plasma_lab::GpuInstance for Spark { /* ... */ }
/// ```
///
/// # Panics
///
/// The macro panics at compile time if:
/// - Applied to an enum or a tuple struct
/// - Any field has an unsupported type
#[proc_macro_derive(GpuInstance)]
pub fn derive_gpu_instance(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let name_str = name.to_string();
    let gpu_name = Ident::new(&format!("{}Gpu", name), Span::call_site());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("GpuInstance derive only supports structs with named fields"),
        },
        _ => panic!("GpuInstance derive only supports structs"),
    };

    let mut layout = Layout::default();
    let mut to_gpu_conversions = Vec::new();
    let mut from_gpu_conversions = Vec::new();
    let mut attributes = Vec::new();

    for field in fields.iter() {
        let field_name = field.ident.as_ref().expect("named field");
        let field_name_str = field_name.to_string();
        let type_info = rust_type_info(&field.ty);

        layout.pad_to(type_info.align, &mut to_gpu_conversions);

        let offset = layout.offset;
        let format = &type_info.vertex_format;
        attributes.push(quote! {
            plasma_lab::InstanceAttribute {
                name: #field_name_str,
                offset: #offset,
                format: plasma_lab::AttributeFormat::#format,
            }
        });

        layout
            .wgsl_fields
            .push(format!("    {}: {},", field_name_str, type_info.wgsl_type));
        let gpu_field_type = &type_info.gpu_type;
        layout.gpu_fields.push(quote! { #field_name: #gpu_field_type });
        layout.offset += type_info.size;

        let conversion = generate_conversion(field_name, &field.ty);
        to_gpu_conversions.push(quote! { #field_name: #conversion });
        let reverse = generate_reverse_conversion(field_name, &field.ty);
        from_gpu_conversions.push(quote! { #field_name: #reverse });
    }

    // Same stride for storage arrays and instance buffers.
    layout.pad_to(16, &mut to_gpu_conversions);
    let size = layout.offset;

    let wgsl_struct = format!(
        "struct {} {{\n{}\n}}",
        name_str,
        layout.wgsl_fields.join("\n")
    );
    let gpu_fields = &layout.gpu_fields;

    let expanded = quote! {
        #[repr(C)]
        #[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
        pub struct #gpu_name {
            #(pub #gpu_fields),*
        }

        impl plasma_lab::GpuInstance for #name {
            type Gpu = #gpu_name;

            const WGSL_NAME: &'static str = #name_str;
            const WGSL_STRUCT: &'static str = #wgsl_struct;
            const SIZE: u32 = #size;
            const ATTRIBUTES: &'static [plasma_lab::InstanceAttribute] = &[
                #(#attributes),*
            ];

            fn to_gpu(&self) -> Self::Gpu {
                #gpu_name {
                    #(#to_gpu_conversions),*
                }
            }

            fn from_gpu(gpu: &Self::Gpu) -> Self {
                Self {
                    #(#from_gpu_conversions),*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Running layout state while walking the struct fields.
#[derive(Default)]
struct Layout {
    offset: u32,
    pad_count: u32,
    wgsl_fields: Vec<String>,
    gpu_fields: Vec<proc_macro2::TokenStream>,
}

impl Layout {
    /// Insert a padding field so the next field starts on `align`.
    fn pad_to(&mut self, align: u32, to_gpu: &mut Vec<proc_macro2::TokenStream>) {
        let padding = (align - (self.offset % align)) % align;
        if padding == 0 {
            return;
        }

        let pad_name_str = format!("_pad{}", self.pad_count);
        let pad_name = Ident::new(&pad_name_str, Span::call_site());
        self.pad_count += 1;

        let count = (padding / 4) as usize;
        if count == 1 {
            self.wgsl_fields.push(format!("    {}: f32,", pad_name_str));
            self.gpu_fields.push(quote! { #pad_name: f32 });
            to_gpu.push(quote! { #pad_name: 0.0 });
        } else {
            self.wgsl_fields
                .push(format!("    {}: array<f32, {}>,", pad_name_str, count));
            self.gpu_fields.push(quote! { #pad_name: [f32; #count] });
            to_gpu.push(quote! { #pad_name: [0.0; #count] });
        }
        self.offset += padding;
    }
}

/// Type metadata for GPU memory layout calculations.
struct TypeInfo {
    /// WGSL type name (e.g., "vec2<f32>")
    wgsl_type: &'static str,
    /// Rust type for the GPU struct (e.g., `[f32; 2]`)
    gpu_type: proc_macro2::TokenStream,
    /// Variant of `plasma_lab::AttributeFormat`
    vertex_format: Ident,
    /// Size in bytes
    size: u32,
    /// Required alignment in bytes
    align: u32,
}

fn rust_type_info(ty: &Type) -> TypeInfo {
    let type_str = quote!(#ty).to_string().replace(' ', "");
    let format = |name: &str| Ident::new(name, Span::call_site());

    match type_str.as_str() {
        "Vec2" | "glam::Vec2" => TypeInfo {
            wgsl_type: "vec2<f32>",
            gpu_type: quote! { [f32; 2] },
            vertex_format: format("Float32x2"),
            size: 8,
            align: 8,
        },
        "Vec4" | "glam::Vec4" => TypeInfo {
            wgsl_type: "vec4<f32>",
            gpu_type: quote! { [f32; 4] },
            vertex_format: format("Float32x4"),
            size: 16,
            align: 16,
        },
        "f32" => TypeInfo {
            wgsl_type: "f32",
            gpu_type: quote! { f32 },
            vertex_format: format("Float32"),
            size: 4,
            align: 4,
        },
        "u32" => TypeInfo {
            wgsl_type: "u32",
            gpu_type: quote! { u32 },
            vertex_format: format("Uint32"),
            size: 4,
            align: 4,
        },
        _ => panic!("Unsupported type in GpuInstance struct: {}", type_str),
    }
}

fn is_vector(ty: &Type) -> Option<&'static str> {
    let type_str = quote!(#ty).to_string().replace(' ', "");
    match type_str.as_str() {
        "Vec2" | "glam::Vec2" => Some("Vec2"),
        "Vec4" | "glam::Vec4" => Some("Vec4"),
        _ => None,
    }
}

/// Vector types go through `to_array()`, scalars are copied.
fn generate_conversion(field_name: &Ident, ty: &Type) -> proc_macro2::TokenStream {
    match is_vector(ty) {
        Some(_) => quote! { self.#field_name.to_array() },
        None => quote! { self.#field_name },
    }
}

fn generate_reverse_conversion(field_name: &Ident, ty: &Type) -> proc_macro2::TokenStream {
    match is_vector(ty) {
        Some("Vec2") => quote! { glam::Vec2::from_array(gpu.#field_name) },
        Some(_) => quote! { glam::Vec4::from_array(gpu.#field_name) },
        None => quote! { gpu.#field_name },
    }
}
