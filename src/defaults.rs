use crate::error::{ConfigError, ConfigResult, ValueOrigin};
use crate::field::{Configurable, FieldKind, FieldSlot, Unassignable};
use crate::loader::Loader;

/// Fills fields that still hold their zero value from their `default` literal.
///
/// Defaults never overwrite a non-zero value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsLoader;

impl DefaultsLoader {
    pub fn new() -> Self {
        Self
    }
}

impl Loader for DefaultsLoader {
    fn name(&self) -> &'static str {
        "default"
    }

    fn load(&mut self, target: &mut dyn Configurable) -> ConfigResult<()> {
        for field in target.fields_mut() {
            let descriptor = field.descriptor;
            let Some(literal) = descriptor.default_literal() else {
                continue;
            };

            // `Option` fields take no default, whatever they currently hold
            if descriptor.kind == FieldKind::Unsupported
                || matches!(field.slot, FieldSlot::Optional(_))
            {
                return Err(ConfigError::UnsupportedType {
                    field: descriptor.name,
                    type_name: descriptor.type_name,
                    loader: self.name(),
                });
            }

            if !field.slot.is_zero() {
                continue;
            }

            match field.slot.assign_text(literal) {
                Ok(()) => tracing::trace!(field = descriptor.name, "applied default"),
                Err(Unassignable::Malformed) => {
                    return Err(ConfigError::Coercion {
                        field: descriptor.name,
                        value: literal.to_string(),
                        type_name: descriptor.type_name,
                        origin: ValueOrigin::Default,
                    });
                }
                Err(Unassignable::Unsupported) => {
                    return Err(ConfigError::UnsupportedType {
                        field: descriptor.name,
                        type_name: descriptor.type_name,
                        loader: self.name(),
                    });
                }
            }
        }

        Ok(())
    }
}
