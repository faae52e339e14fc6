#![cfg(feature = "codegen")]

//! Code generation.
//!
//! The emitter boundary: the builder hands this module structured values,
//! the values render themselves as Rust expressions. Nothing in the core
//! formats target text by hand.
//!
//! Useful for generating tables programmatically in `build.rs`:
//!
//! ```ignore
//! let code = phgen::codegen::CodeGenerator::new().generate(&map);
//! // write `code` to a file, then:
//! static MAP: phgen::BuiltMap<&str, u32> = include!("path/to/generated.rs");
//! ```
//!
//! Generated literals are unsuffixed, so the surrounding context must pin
//! down the type, usually through the annotation on the receiving item.

use proc_macro2::{Literal, TokenStream, TokenTree};
use quote::{format_ident, quote};

/// Code generator.
///
/// Carries the path under which this crate is reachable in the generated
/// code, `::phgen` by default.
pub struct CodeGenerator {
    /// Prefix for items of this crate in generated code.
    krate: TokenStream,
}

impl CodeGenerator {
    /// Create a code generator with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { krate: quote!(::phgen) }
    }

    /// Override the path the generated code uses to name this crate.
    ///
    /// Necessary when generating from a proc-macro or when the crate is
    /// renamed in the consumer's manifest.
    #[inline]
    pub fn set_crate(&mut self, path: TokenStream) {
        self.krate = path;
    }

    /// The path the generated code uses to name this crate.
    #[inline]
    #[must_use]
    pub fn krate(&self) -> TokenStream {
        self.krate.clone()
    }

    /// Turn a value into code.
    #[inline]
    pub fn generate<T: Codegen>(mut self, value: &T) -> TokenStream {
        let value = self.piece(value);
        quote!({ #value })
    }

    /// Turn a value into a recursively usable piece of code.
    #[inline]
    pub fn piece<T: Codegen>(&mut self, piece: &T) -> TokenStream {
        piece.generate_piece(self)
    }

    /// Produce code for an array from an iterator.
    #[inline]
    pub fn array<'a, T: 'a + Codegen>(
        &mut self,
        elements: impl IntoIterator<Item = &'a T>,
    ) -> TokenStream {
        let elements = elements.into_iter().map(|element| self.piece(element));
        quote!([#(#elements),*])
    }
}

impl Default for CodeGenerator {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Values that can be turned into code.
///
/// Artifact types without a constructor consuming all their state expose
/// a `#[doc(hidden)]` `__from_raw_parts` instead, which generated code calls
/// the way a macro would.
pub trait Codegen: Sized {
    /// Emit a piece of code corresponding to this value.
    ///
    /// Called recursively from [`Codegen`] implementations; call
    /// [`CodeGenerator::generate`] for the complete output of a single value.
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream;
}

/// Implement [`Codegen`] for scalars by calling methods on [`Literal`].
macro_rules! literal {
    ($($ty:ty => $method:ident,)*) => {
        $(
            impl Codegen for $ty {
                #[inline]
                fn generate_piece(&self, _gen: &mut CodeGenerator) -> TokenStream {
                    TokenTree::Literal(Literal::$method(*self)).into()
                }
            }
        )*
    };
}

literal! {
    u8 => u8_unsuffixed,
    u16 => u16_unsuffixed,
    u32 => u32_unsuffixed,
    u64 => u64_unsuffixed,
    usize => usize_unsuffixed,
    // `str` itself is `!Sized`, so do the next best thing.
    &'_ str => string,
}

impl Codegen for bool {
    #[inline]
    fn generate_piece(&self, _gen: &mut CodeGenerator) -> TokenStream {
        TokenTree::Ident(format_ident!("{self}")).into()
    }
}

impl Codegen for String {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        let text = gen.piece(&self.as_str());
        quote!(::std::string::String::from(#text))
    }
}

impl<T: Codegen> Codegen for &T {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        let target = gen.piece(*self);
        quote!(&#target)
    }
}

impl<T: Codegen> Codegen for Vec<T> {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        let array = gen.array(self);
        quote!(::std::vec!#array)
    }
}

impl<T: Codegen, const N: usize> Codegen for [T; N] {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        gen.array(self)
    }
}

impl<T: Codegen> Codegen for Option<T> {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        match self {
            None => quote!(::core::option::Option::None),
            Some(value) => {
                let value = gen.piece(value);
                quote!(::core::option::Option::Some(#value))
            }
        }
    }
}

impl<A: Codegen, B: Codegen> Codegen for (A, B) {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        let first = gen.piece(&self.0);
        let second = gen.piece(&self.1);
        quote!((#first, #second))
    }
}

impl<A: Codegen, B: Codegen, C: Codegen> Codegen for (A, B, C) {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        let first = gen.piece(&self.0);
        let second = gen.piece(&self.1);
        let third = gen.piece(&self.2);
        quote!((#first, #second, #third))
    }
}
