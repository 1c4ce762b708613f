//! Layered configuration loading into annotated structs.
//!
//! A record deriving [`Configurable`] is populated by a pipeline of loaders:
//! a JSON document, then environment variables, then `default` literals, and
//! finally a check that every non-optional field holds a value.
//!
//! ```rust,no_run
//! use configurate::{Configurable, load_file};
//!
//! #[derive(Debug, Default, Configurable)]
//! struct AppConfig {
//!     #[config(default = "configurate")]
//!     app_name: String,
//!     #[config(env = "NUMBER_OF_RETRIES")]
//!     number_of_retries: i32,
//!     token: Option<String>,
//! }
//!
//! let mut config = AppConfig::default();
//! load_file("config.json", &mut config).unwrap();
//! ```

// Lets the derive output refer to `::configurate` from inside this crate
extern crate self as configurate;

pub mod defaults;
pub mod docs;
pub mod document;
pub mod env;
pub mod error;
pub mod field;
pub mod loader;
pub mod required;

// Re-export main types
pub use defaults::DefaultsLoader;
pub use docs::{render_docs, write_docs};
pub use document::DocumentLoader;
pub use env::{DotenvSource, EnvLoader, EnvSource, ProcessEnv};
pub use error::{ConfigError, ConfigResult, ValueOrigin};
pub use field::{
    Configurable, DocumentField, Field, FieldDescriptor, FieldKind, FieldSlot, FieldType, IntegerField,
    OptionalField,
};
pub use loader::{Loader, load_all};
pub use required::RequiredLoader;

// Re-export macro
pub use configurate_macros::Configurable;

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

/// Loads `path` into `target` with the standard pipeline:
/// document, process environment, defaults, required.
pub fn load_file(path: impl AsRef<Path>, target: &mut dyn Configurable) -> ConfigResult<()> {
    load_file_with_env(path, target, ProcessEnv)
}

/// Like [`load_file`], reading environment variables from `env` instead of the process
pub fn load_file_with_env<S: EnvSource>(
    path: impl AsRef<Path>,
    target: &mut dyn Configurable,
    env: S,
) -> ConfigResult<()> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "loading configuration file");
    load_reader_with_env(BufReader::new(file), target, env)
}

/// Runs the standard pipeline over any byte stream
pub fn load_reader<R: Read>(reader: R, target: &mut dyn Configurable) -> ConfigResult<()> {
    load_reader_with_env(reader, target, ProcessEnv)
}

fn load_reader_with_env<R: Read, S: EnvSource>(
    reader: R,
    target: &mut dyn Configurable,
    env: S,
) -> ConfigResult<()> {
    load_all(
        target,
        &mut [
            &mut DocumentLoader::new(reader),
            &mut EnvLoader::with_source(env),
            &mut DefaultsLoader::new(),
            &mut RequiredLoader::new(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[derive(Debug, Default, Configurable)]
    struct Standard {
        #[config(env = "LIB_TEST_NAME", default = "configurate")]
        name: String,
        #[config(env = "LIB_TEST_PORT")]
        port: u16,
    }

    #[test]
    fn test_load_file_missing() {
        let mut config = Standard::default();

        let result = load_file("definitely/not/here.json", &mut config);

        match result {
            Err(ConfigError::Io { path, source }) => {
                assert_eq!(path, Path::new("definitely/not/here.json"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_file_with_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 80}}"#).unwrap();
        let env: HashMap<String, String> =
            HashMap::from([("LIB_TEST_PORT".to_string(), "8080".to_string())]);
        let mut config = Standard::default();

        load_file_with_env(file.path(), &mut config, env).unwrap();

        assert_eq!(config.name, "configurate");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_load_reader_runs_required_last() {
        let mut config = Standard::default();

        let result = load_reader(r#"{"name": "x"}"#.as_bytes(), &mut config);

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredValue { field: "port" })
        ));
        assert_eq!(config.name, "x");
    }
}
