use serde::Deserialize;

/// Query string for `POST /rooms/{room}/upload`
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl UploadQuery {
    pub const DEFAULT_FILE_NAME: &'static str = "file";

    pub fn file_name(&self) -> &str {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(Self::DEFAULT_FILE_NAME)
    }
}
