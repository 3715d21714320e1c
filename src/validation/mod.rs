mod extract;
pub mod rules;
mod value;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

pub use extract::{Payload, Valid};
pub use value::{Coerced, CoerceError, FieldType, Kind, RawValue};

/// One row of a shape's field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: Kind,
    pub rules: &'static str,
}

pub trait Shape: Sized {
    const FIELDS: &'static [FieldSpec];

    /// Build the value from coerced fields, one slot per entry of `FIELDS`.
    fn assemble(values: Vec<Option<Coerced>>) -> Self;
}

/// Field name to human readable problem, ordered by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, message)| (field.into(), message.into()))
                .collect(),
        )
    }
}

/// Validate and coerce `data` into `S`.
///
/// Either every declared field passed its rules and coerced cleanly and the
/// populated value is returned, or the complete error map is returned.
pub fn decode<S: Shape>(data: &Map<String, Value>) -> Result<S, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut values = Vec::with_capacity(S::FIELDS.len());

    for field in S::FIELDS {
        let raw = RawValue::lookup(data, field.name);

        if let Err(rule) = rules::evaluate(&raw, field.rules) {
            errors.insert(field.name, rule);
            values.push(None);
            continue;
        }

        match raw.coerce(field.kind) {
            Ok(value) => values.push(value),
            Err(err) => {
                errors.insert(field.name, err.to_string());
                values.push(None);
            }
        }
    }

    if errors.is_empty() {
        Ok(S::assemble(values))
    } else {
        Err(errors)
    }
}

/// Declare a request shape.
///
/// ```ignore
/// shape! {
///     struct NoteRequest {
///         kind as "type": String => "required|in:movie,todo,text",
///         title: String => "required",
///         tags: Vec<String> => "array",
///     }
/// }
/// ```
#[macro_export]
macro_rules! shape {
    (@json $field:ident) => {
        stringify!($field)
    };
    (@json $field:ident $json:literal) => {
        $json
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $field:ident $(as $json:literal)? : $ty:ty => $rules:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        $vis struct $name {
            $( pub $field: $ty, )*
        }

        impl $crate::validation::Shape for $name {
            const FIELDS: &'static [$crate::validation::FieldSpec] = &[
                $(
                    $crate::validation::FieldSpec {
                        name: $crate::shape!(@json $field $($json)?),
                        kind: <$ty as $crate::validation::FieldType>::KIND,
                        rules: $rules,
                    },
                )*
            ];

            fn assemble(
                values: ::std::vec::Vec<::std::option::Option<$crate::validation::Coerced>>,
            ) -> Self {
                let mut values = values.into_iter();
                let mut shape = Self::default();
                $(
                    if let ::std::option::Option::Some(value) = values
                        .next()
                        .flatten()
                        .and_then(<$ty as $crate::validation::FieldType>::from_coerced)
                    {
                        shape.$field = value;
                    }
                )*
                shape
            }
        }
    };
}
