use serde_json::Value;
use std::num::ParseIntError;

/// The closed set of value kinds a loader knows how to populate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldKind {
    /// `String`
    Text,
    /// Any primitive signed or unsigned integer
    Integer,
    /// Only populated from the document; the text-driven loaders reject it
    Unsupported,
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Integer => "integer",
            FieldKind::Unsupported => "unsupported",
        }
    }
}

/// Static description of one record field, generated by `#[derive(Configurable)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldDescriptor {
    /// Rust field name
    pub name: &'static str,
    /// Declared type, as written in the struct
    pub type_name: &'static str,
    pub kind: FieldKind,
    /// `Option<T>` or `#[config(optional)]`, exempt from the required check
    pub optional: bool,
    /// Key looked up in the structured document
    pub key: &'static str,
    /// Environment variable providing this field
    pub env: Option<&'static str>,
    /// Default literal, parsed per field type when the field is unset
    pub default: Option<&'static str>,
    /// Human-readable description used for generated docs
    pub description: &'static str,
}

impl FieldDescriptor {
    /// Environment variable name, ignoring empty annotations
    pub fn env_var(&self) -> Option<&'static str> {
        self.env.filter(|var| !var.is_empty())
    }

    /// Default literal, ignoring empty annotations
    pub fn default_literal(&self) -> Option<&'static str> {
        self.default.filter(|literal| !literal.is_empty())
    }

    pub fn is_required(&self) -> bool {
        !self.optional
    }
}

/// Mutable access to an integer field of any width
pub trait IntegerField {
    fn is_zero(&self) -> bool;

    /// Parses `raw` as a base-10 integer of this width and stores it
    fn parse_from(&mut self, raw: &str) -> Result<(), ParseIntError>;

    /// Stores `value` if it fits this width, returns false otherwise
    fn set_wide(&mut self, value: i128) -> bool;
}

/// Mutable access to an `Option<T>` field
pub trait OptionalField {
    fn is_none(&self) -> bool;

    fn clear(&mut self);

    /// Slot of the wrapped value, inserting `T::default()` when empty
    fn inner(&mut self) -> FieldSlot<'_>;
}

/// Mutable access to a field that only the document loader can populate
pub trait DocumentField {
    /// Stores `value` if it has the right shape, returns false otherwise
    fn set_document(&mut self, value: &Value) -> bool;
}

/// Mutable view of one field's value
pub enum FieldSlot<'a> {
    Text(&'a mut String),
    Integer(&'a mut dyn IntegerField),
    Optional(&'a mut dyn OptionalField),
    Unsupported(&'a mut dyn DocumentField),
}

/// Why a textual value could not be stored in a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Unassignable {
    Malformed,
    Unsupported,
}

impl FieldSlot<'_> {
    /// Whether the field holds its type's zero value (`""`, `0`, `None`).
    ///
    /// Unsupported slots have no zero value and report `false`.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldSlot::Text(value) => value.is_empty(),
            FieldSlot::Integer(value) => value.is_zero(),
            FieldSlot::Optional(value) => value.is_none(),
            FieldSlot::Unsupported(_) => false,
        }
    }

    /// Parses `raw` according to the slot kind and stores it.
    ///
    /// Only plain `String` and integer slots take text; `Option` slots are
    /// rejected like the unsupported kinds.
    pub(crate) fn assign_text(self, raw: &str) -> Result<(), Unassignable> {
        match self {
            FieldSlot::Text(value) => {
                *value = raw.to_string();
                Ok(())
            }
            FieldSlot::Integer(value) => value.parse_from(raw).map_err(|_| Unassignable::Malformed),
            FieldSlot::Optional(_) | FieldSlot::Unsupported(_) => Err(Unassignable::Unsupported),
        }
    }
}

/// One described field together with mutable access to its value
pub struct Field<'a> {
    pub descriptor: &'static FieldDescriptor,
    pub slot: FieldSlot<'a>,
}

/// Types that may appear as fields of a `Configurable` record
pub trait FieldType {
    const KIND: FieldKind;
    const OPTIONAL: bool = false;

    fn slot(&mut self) -> FieldSlot<'_>;
}

/// A record whose fields can be populated by loaders.
///
/// Implement with `#[derive(Configurable)]`.
pub trait Configurable {
    /// Descriptor table for the record type
    fn schema() -> &'static [FieldDescriptor]
    where
        Self: Sized;

    /// Descriptor table, callable through `dyn Configurable`
    fn descriptors(&self) -> &'static [FieldDescriptor];

    /// Every described field in declaration order
    fn fields_mut(&mut self) -> Vec<Field<'_>>;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Text(self)
    }
}

macro_rules! integer_fields {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntegerField for $ty {
                fn is_zero(&self) -> bool {
                    *self == 0
                }

                fn parse_from(&mut self, raw: &str) -> Result<(), ParseIntError> {
                    *self = raw.parse()?;
                    Ok(())
                }

                fn set_wide(&mut self, value: i128) -> bool {
                    match <$ty>::try_from(value) {
                        Ok(value) => {
                            *self = value;
                            true
                        }
                        Err(_) => false,
                    }
                }
            }

            impl FieldType for $ty {
                const KIND: FieldKind = FieldKind::Integer;

                fn slot(&mut self) -> FieldSlot<'_> {
                    FieldSlot::Integer(self)
                }
            }
        )*
    };
}

integer_fields!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! document_fields {
    ($($ty:ty => |$value:ident| $decode:expr),* $(,)?) => {
        $(
            impl DocumentField for $ty {
                fn set_document(&mut self, $value: &Value) -> bool {
                    match $decode {
                        Some(decoded) => {
                            *self = decoded;
                            true
                        }
                        None => false,
                    }
                }
            }

            impl FieldType for $ty {
                const KIND: FieldKind = FieldKind::Unsupported;

                fn slot(&mut self) -> FieldSlot<'_> {
                    FieldSlot::Unsupported(self)
                }
            }
        )*
    };
}

document_fields!(
    f64 => |value| value.as_f64(),
    f32 => |value| value.as_f64().map(|wide| wide as f32).filter(|narrow| narrow.is_finite()),
    bool => |value| value.as_bool(),
    char => |value| value.as_str().and_then(single_char),
);

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Decoded element by element; any rejected element leaves the vector untouched
impl<T: FieldType + Default> DocumentField for Vec<T> {
    fn set_document(&mut self, value: &Value) -> bool {
        let Value::Array(items) = value else {
            return false;
        };

        let mut decoded = Vec::with_capacity(items.len());
        for item in items {
            let mut element = T::default();
            if !crate::document::decode_into(element.slot(), item) {
                return false;
            }
            decoded.push(element);
        }

        *self = decoded;
        true
    }
}

impl<T: FieldType + Default> FieldType for Vec<T> {
    const KIND: FieldKind = FieldKind::Unsupported;

    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Unsupported(self)
    }
}

impl<T: FieldType + Default> OptionalField for Option<T> {
    fn is_none(&self) -> bool {
        Option::is_none(self)
    }

    fn clear(&mut self) {
        *self = None;
    }

    fn inner(&mut self) -> FieldSlot<'_> {
        self.get_or_insert_with(T::default).slot()
    }
}

impl<T: FieldType + Default> FieldType for Option<T> {
    const KIND: FieldKind = T::KIND;
    const OPTIONAL: bool = true;

    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Optional(self)
    }
}
