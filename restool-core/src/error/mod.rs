use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("YAML document cannot be represented as JSON: {0}")]
    Convert(String),
}

#[derive(Debug, Error)]
#[error("API description failed validation ({violations_len} violations)")]
pub struct DocumentError {
    pub violations: Vec<Violation>,
    violations_len: usize,
}

impl DocumentError {
    pub fn new(violations: Vec<Violation>) -> Self {
        let violations_len = violations.len();
        Self {
            violations,
            violations_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefError {
    #[error("unsupported external $ref: {0}")]
    External(String),
    #[error("unresolvable $ref: {0}")]
    NotFound(String),
    #[error("cyclic $ref: {0}")]
    Cycle(String),
}
