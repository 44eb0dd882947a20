//! `.prog` file format
//!
//! A prog file is a header of `#` directives followed by prog source:
//!
//! ```text
//! #name greet
//! #returns void
//! #parameter actor character
//! send(actor, "Welcome")
//! ```
//!
//! The header ends at the first line that does not start with `#`.

use mud_prog::{ProgError, ProgParameter, ProgType};
use std::path::Path;

/// A parsed prog file
#[derive(Debug, Clone, PartialEq)]
pub struct ProgFile {
    pub name: String,
    pub return_type: ProgType,
    pub parameters: Vec<ProgParameter>,
    pub source: String,
    /// Lines taken by the header, added to source line numbers for reporting
    pub header_lines: usize,
}

impl ProgFile {
    /// Parse a prog file; `default_name` is used when there is no `#name`
    pub fn parse(content: &str, default_name: &str, path: &str) -> Result<Self, ProgError> {
        let mut name = default_name.to_string();
        let mut return_type = ProgType::Void;
        let mut parameters = Vec::new();
        let mut header_lines = 0;

        let load_error = |line: usize, message: String| ProgError::Load {
            path: path.to_string(),
            message: format!("line {}: {}", line, message),
        };

        for line in content.lines() {
            let Some(directive) = line.trim().strip_prefix('#') else {
                break;
            };
            header_lines += 1;

            let (keyword, rest) = directive
                .trim()
                .split_once(char::is_whitespace)
                .map(|(keyword, rest)| (keyword, rest.trim()))
                .unwrap_or((directive.trim(), ""));

            match keyword.to_lowercase().as_str() {
                "name" if rest.is_empty() => {
                    return Err(load_error(header_lines, "Expected '#name NAME'".into()))
                }
                "name" => name = rest.to_string(),
                "returns" => {
                    return_type = ProgType::parse(rest)
                        .ok_or_else(|| load_error(header_lines, format!("Unknown type '{}'", rest)))?;
                }
                "parameter" => {
                    let (param_name, ty) = rest
                        .split_once(char::is_whitespace)
                        .ok_or_else(|| load_error(header_lines, "Expected '#parameter NAME TYPE'".into()))?;
                    let ty = ProgType::parse(ty)
                        .ok_or_else(|| load_error(header_lines, format!("Unknown type '{}'", ty.trim())))?;
                    parameters.push(ProgParameter::new(param_name, ty));
                }
                other => {
                    return Err(load_error(
                        header_lines,
                        format!("Unknown header directive '#{}'", other),
                    ))
                }
            }
        }

        let source = content
            .lines()
            .skip(header_lines)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Self {
            name,
            return_type,
            parameters,
            source,
            header_lines,
        })
    }

    /// Read and parse a prog file from disk
    pub fn load(path: &Path) -> Result<Self, ProgError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|err| ProgError::Load {
            path: display.clone(),
            message: err.to_string(),
        })?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(&content, &stem, &display)
    }

    /// File line for a source line; line 0 (the signature) maps to the header
    pub fn file_line(&self, source_line: usize) -> usize {
        if source_line == 0 {
            return 1;
        }
        source_line + self.header_lines
    }
}
