use crate::error::{ConfigError, ConfigResult};
use crate::field::{Configurable, FieldDescriptor, FieldSlot};
use crate::loader::Loader;
use serde_json::{Map, Value};
use std::io::Read;

/// Populates fields from a JSON document read from `reader`.
///
/// A document key belongs to the field with exactly that key, or failing that
/// to any field whose key matches ignoring ASCII case. When several keys
/// belong to the same field the last one in document order wins. Keys missing
/// from the document leave the field untouched and unknown keys are ignored.
pub struct DocumentLoader<R> {
    reader: R,
}

impl<R: Read> DocumentLoader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> Loader for DocumentLoader<R> {
    fn name(&self) -> &'static str {
        "document"
    }

    fn load(&mut self, target: &mut dyn Configurable) -> ConfigResult<()> {
        let entries = match read_document(&mut self.reader)? {
            Value::Object(entries) => entries,
            other => {
                return Err(ConfigError::Parse {
                    message: format!("expected an object at the top level, found {}", describe(&other)),
                });
            }
        };

        let descriptors = target.descriptors();
        for field in target.fields_mut() {
            let descriptor = field.descriptor;
            let Some((key, value)) = lookup(&entries, descriptor, descriptors) else {
                continue;
            };

            if !decode_into(field.slot, value) {
                return Err(ConfigError::TypeMismatch {
                    field: descriptor.name,
                    key: key.clone(),
                    expected: descriptor.type_name,
                    found: describe(value),
                });
            }
        }

        Ok(())
    }
}

/// Decodes the first JSON value of the stream, ignoring anything after it
fn read_document(reader: &mut dyn Read) -> ConfigResult<Value> {
    let mut stream = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();

    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(error)) => Err(ConfigError::Parse {
            message: error.to_string(),
        }),
        None => Err(ConfigError::Parse {
            message: "empty document".to_string(),
        }),
    }
}

/// Last entry in document order that belongs to `field`
fn lookup<'m>(
    entries: &'m Map<String, Value>,
    field: &FieldDescriptor,
    all: &[FieldDescriptor],
) -> Option<(&'m String, &'m Value)> {
    entries.iter().rev().find(|(name, _)| {
        *name == field.key
            || (name.eq_ignore_ascii_case(field.key) && !all.iter().any(|other| *name == other.key))
    })
}

/// Stores `value` in `slot`, returns false when its shape does not fit
pub(crate) fn decode_into(slot: FieldSlot<'_>, value: &Value) -> bool {
    match (slot, value) {
        (FieldSlot::Optional(inner), Value::Null) => {
            inner.clear();
            true
        }
        // null never clears a non-optional field
        (_, Value::Null) => true,
        (FieldSlot::Text(text), Value::String(s)) => {
            *text = s.clone();
            true
        }
        (FieldSlot::Integer(number), Value::Number(n)) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .is_some_and(|wide| number.set_wide(wide)),
        (FieldSlot::Optional(inner), value) => {
            let was_none = inner.is_none();
            let decoded = decode_into(inner.inner(), value);
            if !decoded && was_none {
                inner.clear();
            }
            decoded
        }
        (FieldSlot::Unsupported(other), value) => other.set_document(value),
        _ => false,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(n) => format!("number {}", n),
        Value::String(_) => "a string".to_string(),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}
