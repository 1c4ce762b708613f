use crate::error::{ConfigError, ConfigResult, ValueOrigin};
use crate::field::{Configurable, Unassignable};
use crate::loader::Loader;
use std::{
    collections::{BTreeMap, HashMap},
    env,
    hash::BuildHasher,
    path::{Path, PathBuf},
};

/// A key-value lookup the environment loader reads variables from
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    /// Values that are not valid unicode are converted lossily
    fn var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(raw)) => {
                tracing::warn!(var = key, "environment variable is not valid unicode, using a lossy conversion");
                Some(raw.to_string_lossy().into_owned())
            }
        }
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Variables from a `.env` file, falling back to the process environment.
///
/// The file is parsed once with `dotenvy`; the process environment is never
/// modified.
#[derive(Debug, Clone)]
pub struct DotenvSource {
    path: PathBuf,
    vars: HashMap<String, String>,
}

impl DotenvSource {
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let entries = dotenvy::from_path_iter(path).map_err(|e| dotenv_error(path, e))?;

        let mut vars = HashMap::new();
        for entry in entries {
            let (key, value) = entry.map_err(|e| dotenv_error(path, e))?;
            vars.insert(key, value);
        }

        tracing::debug!(path = %path.display(), count = vars.len(), "read dotenv file");

        Ok(Self {
            path: path.to_path_buf(),
            vars,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EnvSource for DotenvSource {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned().or_else(|| ProcessEnv.var(key))
    }
}

fn dotenv_error(path: &Path, error: dotenvy::Error) -> ConfigError {
    match error {
        dotenvy::Error::Io(source) => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => ConfigError::Parse {
            message: format!("{}: {}", path.display(), other),
        },
    }
}

/// Populates fields annotated with `env` from an [`EnvSource`].
///
/// Unset or empty variables leave the field untouched; set variables overwrite
/// whatever value the field already holds. Only `String` and integer fields
/// take a value, so a set variable for an `Option` field is an error.
#[derive(Debug, Clone, Default)]
pub struct EnvLoader<S = ProcessEnv> {
    source: S,
}

impl EnvLoader {
    /// Reads from the process environment
    pub fn new() -> Self {
        Self { source: ProcessEnv }
    }
}

impl<S: EnvSource> EnvLoader<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }
}

impl<S: EnvSource> Loader for EnvLoader<S> {
    fn name(&self) -> &'static str {
        "env"
    }

    fn load(&mut self, target: &mut dyn Configurable) -> ConfigResult<()> {
        for field in target.fields_mut() {
            let descriptor = field.descriptor;
            let Some(var) = descriptor.env_var() else {
                continue;
            };
            let Some(value) = self.source.var(var).filter(|v| !v.is_empty()) else {
                continue;
            };

            match field.slot.assign_text(&value) {
                Ok(()) => {
                    tracing::trace!(field = descriptor.name, var, "applied environment variable");
                }
                Err(Unassignable::Malformed) => {
                    return Err(ConfigError::Coercion {
                        field: descriptor.name,
                        value,
                        type_name: descriptor.type_name,
                        origin: ValueOrigin::Env(var.to_string()),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Configurable;
    use std::io::Write;

    #[derive(Debug, Default, Configurable)]
    struct EnvConfig {
        unconfigured: String,
        #[config(env = "TEST_USED")]
        used: String,
        #[config(env = "TEST_INT")]
        number: i32,
        #[config(env = "TEST_OPTIONAL")]
        maybe: Option<u16>,
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_loader() {
        let mut config = EnvConfig::default();
        let source = vars(&[("TEST_USED", "env_value"), ("TEST_INT", "2")]);

        EnvLoader::with_source(source).load(&mut config).unwrap();

        assert_eq!(config.used, "env_value");
        assert_eq!(config.number, 2);
        assert_eq!(config.unconfigured, "");
    }

    #[test]
    fn test_overwrites_existing_values() {
        let mut config = EnvConfig {
            used: "from_document".to_string(),
            number: 5,
            ..Default::default()
        };
        let source = vars(&[("TEST_USED", "from_env"), ("TEST_INT", "12")]);

        EnvLoader::with_source(source).load(&mut config).unwrap();

        assert_eq!(config.used, "from_env");
        assert_eq!(config.number, 12);
    }

    #[test]
    fn test_unset_and_empty_leave_field_untouched() {
        let mut config = EnvConfig {
            used: "kept".to_string(),
            number: 5,
            ..Default::default()
        };
        let source = vars(&[("TEST_USED", "")]);

        EnvLoader::with_source(source).load(&mut config).unwrap();

        assert_eq!(config.used, "kept");
        assert_eq!(config.number, 5);
    }

    #[test]
    fn test_optional_is_unsupported_when_set() {
        let mut config = EnvConfig::default();

        EnvLoader::with_source(vars(&[("TEST_OPTIONAL", "")]))
            .load(&mut config)
            .unwrap();
        assert_eq!(config.maybe, None);

        let result = EnvLoader::with_source(vars(&[("TEST_OPTIONAL", "8080")])).load(&mut config);
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedType {
                field: "maybe",
                type_name: "Option<u16>",
                loader: "env",
            })
        ));
        assert_eq!(config.maybe, None);
    }

    #[test]
    fn test_coercion_error() {
        let mut config = EnvConfig::default();
        let source = vars(&[("TEST_INT", "twelve")]);

        let result = EnvLoader::with_source(source).load(&mut config);

        match result {
            Err(ConfigError::Coercion {
                field,
                value,
                type_name,
                origin,
            }) => {
                assert_eq!(field, "number");
                assert_eq!(value, "twelve");
                assert_eq!(type_name, "i32");
                assert_eq!(origin, ValueOrigin::Env("TEST_INT".to_string()));
            }
            other => panic!("expected Coercion, got {:?}", other),
        }
        assert_eq!(config.number, 0);
    }

    #[derive(Debug, Default, Configurable)]
    struct FloatConfig {
        #[config(env = "TEST_RATIO")]
        ratio: f64,
    }

    #[test]
    fn test_unsupported_type_only_when_set() {
        let mut config = FloatConfig::default();

        EnvLoader::with_source(vars(&[])).load(&mut config).unwrap();

        let result = EnvLoader::with_source(vars(&[("TEST_RATIO", "0.5")])).load(&mut config);
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedType { field: "ratio", loader: "env", .. })
        ));
    }

    #[test]
    fn test_process_env() {
        #[derive(Default, Configurable)]
        struct ProcessConfig {
            #[config(env = "CONFIGURATE_ENV_RS_PROCESS_TEST")]
            value: String,
        }

        // SAFETY: the variable name is unique to this test
        unsafe { env::set_var("CONFIGURATE_ENV_RS_PROCESS_TEST", "from_process") };

        let mut config = ProcessConfig::default();
        EnvLoader::new().load(&mut config).unwrap();
        assert_eq!(config.value, "from_process");

        unsafe { env::remove_var("CONFIGURATE_ENV_RS_PROCESS_TEST") };
    }

    #[cfg(unix)]
    #[test]
    fn test_process_env_keeps_non_unicode_values() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        // SAFETY: the variable name is unique to this test
        unsafe {
            env::set_var(
                "CONFIGURATE_ENV_RS_NON_UNICODE_TEST",
                OsStr::from_bytes(b"caf\xff"),
            )
        };

        let value = ProcessEnv.var("CONFIGURATE_ENV_RS_NON_UNICODE_TEST");
        assert_eq!(value.as_deref(), Some("caf\u{FFFD}"));

        unsafe { env::remove_var("CONFIGURATE_ENV_RS_NON_UNICODE_TEST") };
    }

    #[test]
    fn test_dotenv_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TEST_USED=dotenv_value").unwrap();
        writeln!(file, "TEST_INT=42").unwrap();

        let source = DotenvSource::from_path(file.path()).unwrap();
        assert_eq!(source.path(), file.path());

        let mut config = EnvConfig::default();
        EnvLoader::with_source(&source).load(&mut config).unwrap();

        assert_eq!(config.used, "dotenv_value");
        assert_eq!(config.number, 42);
    }

    #[test]
    fn test_dotenv_missing_file() {
        let result = DotenvSource::from_path("does/not/exist.env");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
