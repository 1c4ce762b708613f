use crate::error::{ConfigError, ConfigResult};
use crate::field::{Configurable, FieldSlot};
use crate::loader::Loader;

/// Fails on the first non-optional field still at its zero value.
///
/// Performs no mutation and belongs at the end of a pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredLoader;

impl RequiredLoader {
    pub fn new() -> Self {
        Self
    }
}

impl Loader for RequiredLoader {
    fn name(&self) -> &'static str {
        "required"
    }

    fn load(&mut self, target: &mut dyn Configurable) -> ConfigResult<()> {
        for field in target.fields_mut() {
            let descriptor = field.descriptor;
            if descriptor.optional {
                continue;
            }

            match field.slot {
                FieldSlot::Unsupported(_) => {
                    return Err(ConfigError::UnsupportedType {
                        field: descriptor.name,
                        type_name: descriptor.type_name,
                        loader: self.name(),
                    });
                }
                ref slot if slot.is_zero() => {
                    return Err(ConfigError::MissingRequiredValue {
                        field: descriptor.name,
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }
}
