use colored::Colorize;
use std::{fmt, io, path::PathBuf};

/// Result alias used by every loader
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where a textual value being coerced came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOrigin {
    /// Read from the named environment variable
    Env(String),
    /// The field's `default` annotation
    Default,
}

impl fmt::Display for ValueOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueOrigin::Env(var) => write!(f, "environment variable {}", var),
            ValueOrigin::Default => write!(f, "default"),
        }
    }
}

/// Errors that can occur while populating a configuration record
#[derive(Debug)]
pub enum ConfigError {
    /// The structured document is not well-formed
    Parse { message: String },
    /// A document value has the wrong shape for its target field
    TypeMismatch {
        field: &'static str,
        key: String,
        expected: &'static str,
        found: String,
    },
    /// An env or default string could not be parsed as the field's type
    Coercion {
        field: &'static str,
        value: String,
        type_name: &'static str,
        origin: ValueOrigin,
    },
    /// The field's declared type has no behavior defined for this loader
    UnsupportedType {
        field: &'static str,
        type_name: &'static str,
        loader: &'static str,
    },
    /// A non-optional field is still at its zero value
    MissingRequiredValue { field: &'static str },
    /// The configuration file could not be opened or read
    Io { path: PathBuf, source: io::Error },
}

impl ConfigError {
    /// Name of the record field the error refers to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::TypeMismatch { field, .. }
            | ConfigError::Coercion { field, .. }
            | ConfigError::UnsupportedType { field, .. }
            | ConfigError::MissingRequiredValue { field } => Some(*field),
            ConfigError::Parse { .. } | ConfigError::Io { .. } => None,
        }
    }

    pub fn is_missing_required(&self) -> bool {
        matches!(self, ConfigError::MissingRequiredValue { .. })
    }

    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, ConfigError::UnsupportedType { .. })
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse { message } => {
                write!(f, "Malformed configuration document: {}", message)
            }
            ConfigError::TypeMismatch {
                field,
                key,
                expected,
                found,
            } => write!(
                f,
                "{}: document key {} holds {}, expected {}",
                field.magenta().bold(),
                format!("'{}'", key).cyan(),
                found.red(),
                expected
            ),
            ConfigError::Coercion {
                field,
                value,
                type_name,
                origin,
            } => write!(
                f,
                "{}: Invalid value {} from {}, expected {}",
                field.magenta().bold(),
                format!("'{}'", value).red(),
                origin,
                type_name
            ),
            ConfigError::UnsupportedType {
                field,
                type_name,
                loader,
            } => write!(
                f,
                "{}: No {} loader defined for type {}",
                field.magenta().bold(),
                loader,
                type_name.yellow()
            ),
            ConfigError::MissingRequiredValue { field } => {
                write!(f, "Required value {} missing", field.magenta().bold())
            }
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "Could not read {}: {}",
                    path.display().to_string().cyan(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_missing_required_value() {
        colored::control::set_override(false);

        let error = ConfigError::MissingRequiredValue { field: "req_yes" };

        assert_eq!(error.to_string(), "Required value req_yes missing");
        assert_eq!(error.field(), Some("req_yes"));
        assert!(error.is_missing_required());
    }

    #[test]
    fn test_coercion_from_env() {
        colored::control::set_override(false);

        let error = ConfigError::Coercion {
            field: "port",
            value: "not-a-number".to_string(),
            type_name: "u16",
            origin: ValueOrigin::Env("PORT".to_string()),
        };

        let output = error.to_string();
        assert!(output.contains("port:"));
        assert!(output.contains("Invalid value 'not-a-number'"));
        assert!(output.contains("environment variable PORT"));
        assert!(output.contains("expected u16"));
    }

    #[test]
    fn test_coercion_from_default() {
        colored::control::set_override(false);

        let error = ConfigError::Coercion {
            field: "retries",
            value: "many".to_string(),
            type_name: "i32",
            origin: ValueOrigin::Default,
        };

        assert!(error.to_string().contains("from default"));
    }

    #[test]
    fn test_type_mismatch() {
        colored::control::set_override(false);

        let error = ConfigError::TypeMismatch {
            field: "number_of_retries",
            key: "number_of_retries".to_string(),
            expected: "integer",
            found: "string".to_string(),
        };

        let output = error.to_string();
        assert!(output.contains("'number_of_retries' holds string, expected integer"));
    }

    #[test]
    fn test_unsupported_type() {
        colored::control::set_override(false);

        let error = ConfigError::UnsupportedType {
            field: "ratio",
            type_name: "f64",
            loader: "default",
        };

        assert_eq!(
            error.to_string(),
            "ratio: No default loader defined for type f64"
        );
        assert!(error.is_unsupported_type());
    }

    #[test]
    fn test_io_has_source() {
        colored::control::set_override(false);

        let error = ConfigError::Io {
            path: PathBuf::from("missing.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };

        assert!(error.to_string().contains("missing.json"));
        assert!(error.source().is_some());
        assert_eq!(error.field(), None);
    }

    #[test]
    fn test_debug_format() {
        let error = ConfigError::Parse {
            message: "EOF while parsing".to_string(),
        };

        let debug_output = format!("{:?}", error);
        assert!(debug_output.contains("Parse"));
        assert!(debug_output.contains("EOF"));
    }
}
