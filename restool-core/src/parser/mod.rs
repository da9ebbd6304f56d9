use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

/// Parses an API description into a JSON value. YAML inputs are converted so
/// everything downstream only deals with `serde_json::Value`.
pub fn parse_document_str(
    input: &str,
    format: DocumentFormat,
) -> Result<serde_json::Value, ParseError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(input)?),
        DocumentFormat::Yaml => parse_yaml(input),
        DocumentFormat::Auto => parse_auto(input),
    }
}

fn parse_auto(input: &str) -> Result<serde_json::Value, ParseError> {
    // JSON always starts with `{` or `[` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str(input) {
            Ok(v) => Ok(v),
            // YAML is a superset of JSON, so a lenient retry is cheap.
            Err(e) => parse_yaml(input).map_err(|_| ParseError::Json(e)),
        };
    }
    parse_yaml(input)
}

fn parse_yaml(input: &str) -> Result<serde_json::Value, ParseError> {
    let y = serde_yaml::from_str::<serde_yaml::Value>(input)?;
    serde_json::to_value(y).map_err(|e| ParseError::Convert(e.to_string()))
}
