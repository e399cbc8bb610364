//! Reading and writing descriptors and templates as pretty JSON

use crate::domain::{ApplicationDescriptor, ApplicationTemplate};
use crate::error::DescriptorIoError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DescriptorIoError> {
    let content =
        fs::read_to_string(path).map_err(|e| DescriptorIoError::read_error(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| DescriptorIoError::json_parse_error(path, e.to_string()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DescriptorIoError> {
    let mut content =
        serde_json::to_string_pretty(value).map_err(|e| DescriptorIoError::SerializeError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    content.push('\n');
    fs::write(path, content).map_err(|e| DescriptorIoError::write_error(path, e))
}

/// Reads an application descriptor
pub fn read_descriptor(path: impl AsRef<Path>) -> Result<ApplicationDescriptor, DescriptorIoError> {
    read_json(path.as_ref())
}

/// Writes an application descriptor, replacing the file
pub fn write_descriptor(
    path: impl AsRef<Path>,
    descriptor: &ApplicationDescriptor,
) -> Result<(), DescriptorIoError> {
    write_json(path.as_ref(), descriptor)
}

/// Reads an application template
pub fn read_template(path: impl AsRef<Path>) -> Result<ApplicationTemplate, DescriptorIoError> {
    read_json(path.as_ref())
}
