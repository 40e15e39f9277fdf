//! Configuration validation.

use super::Config;
use crate::error::{ExportError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.user.trim().is_empty() {
        return Err(ExportError::Config("source.user is required".into()));
    }

    if let Some(ref lib) = config.source.client_library {
        if lib.as_os_str().is_empty() {
            return Err(ExportError::Config(
                "source.client_library must not be empty when set".into(),
            ));
        }
    }

    if let Some(ref host) = config.source.host {
        if host.trim().is_empty() {
            return Err(ExportError::Config(
                "source.host must not be blank when set".into(),
            ));
        }
    }

    if let Some(ref dir) = config.output.dir {
        if dir.as_os_str().is_empty() {
            return Err(ExportError::Config(
                "output.dir must not be empty when set".into(),
            ));
        }
    }

    Ok(())
}
