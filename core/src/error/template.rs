use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Missing variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("template '{name}' version {proposed} must be greater than existing version {existing}")]
    VersionNotIncreased {
        name: String,
        existing: u32,
        proposed: u32,
    },

    #[error("template not found: {0}")]
    NotFound(String),

    #[error("template library json error: {0}")]
    Serde(#[from] serde_json::Error),
}
