use std::path::PathBuf;

use crate::error::DataError;

pub const TEMPLATE_EXTENSION: &str = "sql";

/// Resolves dataset names to SQL template files under `Data/`.
///
/// Templates are read from disk on every call, so edits take effect on the
/// next request.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Template path for `name`, or `None` when the name is empty or could
    /// escape the template directory.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        if !is_plain_name(name) {
            return None;
        }
        Some(self.dir.join(format!("{name}.{TEMPLATE_EXTENSION}")))
    }

    pub fn load(&self, name: &str) -> Result<String, DataError> {
        let path = self.path_for(name).ok_or(DataError::NotFound)?;
        std::fs::read_to_string(&path)
            .map_err(|error| DataError::Read(format!("{}: {error}", path.display())))
    }
}

pub(crate) fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}
