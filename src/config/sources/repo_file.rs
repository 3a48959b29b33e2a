//! Repo file source: `<home>/config.json`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

/// Add the repo's JSON config file to builder. The file is required.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(File::from(path).format(FileFormat::Json).required(true));
    Ok(builder)
}
