//! Rust types that can describe themselves to the schema compiler.

use super::types::{NumberKind, TypeDescription};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::PathBuf;

/// Supplies the [`TypeDescription`] of a Rust type.
///
/// Implemented for primitives and std containers. Option structs implement
/// it with the description builders:
///
/// ```
/// use optionset::schema::{Described, Field, TypeDescription};
///
/// struct Options {
///     enable: bool,
///     name: Option<String>,
/// }
///
/// impl Described for Options {
///     fn describe() -> TypeDescription {
///         TypeDescription::object(
///             std::any::type_name::<Self>(),
///             vec![
///                 Field::optional("enable", bool::describe()),
///                 Field::optional("name", Option::<String>::describe()),
///             ],
///         )
///     }
/// }
/// ```
pub trait Described {
    fn describe() -> TypeDescription;
}

macro_rules! described_numbers {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Described for $ty {
                fn describe() -> TypeDescription {
                    TypeDescription::number(NumberKind::$kind)
                }
            }
        )*
    };
}

described_numbers! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64, i128 => I128, isize => Isize,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64, u128 => U128, usize => Usize,
    f32 => F32, f64 => F64,
}

impl Described for bool {
    fn describe() -> TypeDescription {
        TypeDescription::boolean()
    }
}

impl Described for char {
    fn describe() -> TypeDescription {
        TypeDescription::char()
    }
}

impl Described for String {
    fn describe() -> TypeDescription {
        TypeDescription::string()
    }
}

impl Described for &str {
    fn describe() -> TypeDescription {
        TypeDescription::string()
    }
}

impl Described for PathBuf {
    fn describe() -> TypeDescription {
        TypeDescription::string()
    }
}

impl Described for Map<String, Value> {
    fn describe() -> TypeDescription {
        TypeDescription::opaque_object()
    }
}

impl<T: Described> Described for Option<T> {
    fn describe() -> TypeDescription {
        TypeDescription::nullable(T::describe())
    }
}

impl<T: Described> Described for Box<T> {
    fn describe() -> TypeDescription {
        T::describe()
    }
}

macro_rules! described_lists {
    ($($ty:ident),*) => {
        $(
            impl<T: Described> Described for $ty<T> {
                fn describe() -> TypeDescription {
                    TypeDescription::list(T::describe())
                }
            }
        )*
    };
}

described_lists!(Vec, VecDeque, BTreeSet);

impl<T: Described, S> Described for HashSet<T, S> {
    fn describe() -> TypeDescription {
        TypeDescription::list(T::describe())
    }
}

impl<V: Described, S> Described for HashMap<String, V, S> {
    fn describe() -> TypeDescription {
        TypeDescription::map(V::describe())
    }
}

impl<V: Described> Described for BTreeMap<String, V> {
    fn describe() -> TypeDescription {
        TypeDescription::map(V::describe())
    }
}

impl<V: Described, S> Described for IndexMap<String, V, S> {
    fn describe() -> TypeDescription {
        TypeDescription::map(V::describe())
    }
}
