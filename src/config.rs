//! Global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the `ndarray_gdal` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// # Region Configuration Options
///
/// ## Zero Region Is Default
///  > default: [`false`]
///
/// If enabled, an explicit zero `x`, `y`, `width` or `height` of a raster band transfer is treated as if it were absent and replaced by its default.
/// This mirrors bindings where a zero window component is indistinguishable from a missing one.
///
/// If disabled, only absent components are defaulted and an explicit zero is passed to the engine as is.
///
/// # Validation Configuration Options
///
/// ## Validate Buffer Extent
///  > default: [`true`]
///
/// If enabled, the adapters check that every element addressed by the shape, stride and offset of a supplied buffer lies inside its flat storage before calling the engine.
/// If disabled, only the stride descriptor is checked and the engine is relied upon to reject transfers outside of the buffer.
#[derive(Debug)]
pub struct Config {
    zero_region_is_default: bool,
    validate_buffer_extent: bool,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Config {
            zero_region_is_default: false,
            validate_buffer_extent: true,
        }
    }
}

impl Config {
    /// Get the [zero region is default](#zero-region-is-default) configuration.
    #[must_use]
    pub fn zero_region_is_default(&self) -> bool {
        self.zero_region_is_default
    }

    /// Set the [zero region is default](#zero-region-is-default) configuration.
    pub fn set_zero_region_is_default(&mut self, zero_region_is_default: bool) {
        self.zero_region_is_default = zero_region_is_default;
    }

    /// Get the [validate buffer extent](#validate-buffer-extent) configuration.
    #[must_use]
    pub fn validate_buffer_extent(&self) -> bool {
        self.validate_buffer_extent
    }

    /// Set the [validate buffer extent](#validate-buffer-extent) configuration.
    pub fn set_validate_buffer_extent(&mut self, validate_buffer_extent: bool) {
        self.validate_buffer_extent = validate_buffer_extent;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `ndarray_gdal` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global `ndarray_gdal` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
