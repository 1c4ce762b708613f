use crate::error::ConfigResult;
use crate::field::Configurable;

/// One stage of a configuration pipeline
pub trait Loader {
    /// Short name used in logs and unsupported-type errors
    fn name(&self) -> &'static str {
        "custom"
    }

    /// Populate the relevant fields of `target`
    fn load(&mut self, target: &mut dyn Configurable) -> ConfigResult<()>;
}

// Closures can act as ad-hoc loaders
impl<F> Loader for F
where
    F: FnMut(&mut dyn Configurable) -> ConfigResult<()>,
{
    fn load(&mut self, target: &mut dyn Configurable) -> ConfigResult<()> {
        self(target)
    }
}

/// Runs `loaders` against `target` in order and stops at the first error.
///
/// The error is returned as produced by the failing loader. Fields populated by
/// earlier stages stay populated.
///
/// # Example
/// ```rust
/// use configurate::{Configurable, DefaultsLoader, RequiredLoader, load_all};
///
/// #[derive(Default, Configurable)]
/// struct Settings {
///     #[config(default = "localhost")]
///     host: String,
/// }
///
/// let mut settings = Settings::default();
/// load_all(&mut settings, &mut [&mut DefaultsLoader::new(), &mut RequiredLoader::new()]).unwrap();
/// assert_eq!(settings.host, "localhost");
/// ```
pub fn load_all(target: &mut dyn Configurable, loaders: &mut [&mut dyn Loader]) -> ConfigResult<()> {
    let stages = loaders.len();

    for (index, loader) in loaders.iter_mut().enumerate() {
        tracing::debug!(loader = loader.name(), stage = index + 1, stages, "running configuration loader");

        if let Err(error) = loader.load(target) {
            tracing::debug!(
                loader = loader.name(),
                field = error.field(),
                "configuration pipeline aborted"
            );
            return Err(error);
        }
    }

    Ok(())
}
