use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::formats::SchematicFormat;

/// Failure raised by a single format codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("malformed input: {message}{}", at_offset(.offset))]
    Malformed { message: String, offset: Option<u64> },
    #[error("unsupported version {found} (supported: {min}..={max})")]
    UnsupportedVersion { found: i32, min: i32, max: i32 },
    #[error("unsupported feature: {0}")]
    Unsupported(String),
    #[error("{what} of {value} exceeds the format limit of {limit}")]
    LimitExceeded { what: String, value: u64, limit: u64 },
    #[error("failed to write output: {0}")]
    Io(String),
}

fn at_offset(offset: &Option<u64>) -> String {
    match offset {
        Some(offset) => format!(" (at byte {})", offset),
        None => String::new(),
    }
}

impl FormatError {
    pub fn malformed(message: impl Into<String>) -> Self {
        FormatError::Malformed { message: message.into(), offset: None }
    }

    pub fn malformed_at(message: impl Into<String>, offset: u64) -> Self {
        FormatError::Malformed { message: message.into(), offset: Some(offset) }
    }

    pub fn limit(what: impl Into<String>, value: u64, limit: u64) -> Self {
        FormatError::LimitExceeded { what: what.into(), value, limit }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::Malformed { .. } => ErrorKind::Malformed,
            FormatError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            FormatError::Unsupported(_) => ErrorKind::Unsupported,
            FormatError::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            FormatError::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<quartz_nbt::io::NbtIoError> for FormatError {
    fn from(error: quartz_nbt::io::NbtIoError) -> Self {
        FormatError::malformed(format!("invalid NBT: {}", error))
    }
}

/// Pipeline step a conversion failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Decode,
    Reconcile,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Reconcile => "reconcile",
            Stage::Encode => "encode",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("unknown schematic format '{0}'")]
    UnknownFormat(String),
    #[error("{stage} failed for {format}: {source}")]
    Format {
        stage: Stage,
        format: SchematicFormat,
        #[source]
        source: FormatError,
    },
    #[error("internal fault during {stage}: {message}")]
    InternalFault { stage: Stage, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownFormat,
    Malformed,
    UnsupportedVersion,
    Unsupported,
    LimitExceeded,
    Io,
    InternalFault,
}

/// Flattened form of a [`ConversionError`] handed to hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub stage: Option<Stage>,
    pub message: String,
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::UnknownFormat(_) => ErrorKind::UnknownFormat,
            ConversionError::Format { source, .. } => source.kind(),
            ConversionError::InternalFault { .. } => ErrorKind::InternalFault,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            ConversionError::UnknownFormat(_) => None,
            ConversionError::Format { stage, .. } | ConversionError::InternalFault { stage, .. } => Some(*stage),
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            stage: self.stage(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_includes_offset() {
        let error = FormatError::malformed_at("truncated varint", 17);
        assert_eq!(error.to_string(), "malformed input: truncated varint (at byte 17)");
        assert_eq!(FormatError::malformed("bad magic").to_string(), "malformed input: bad magic");
    }

    #[test]
    fn test_report_carries_kind_and_stage() {
        let error = ConversionError::Format {
            stage: Stage::Encode,
            format: SchematicFormat::Schematic,
            source: FormatError::limit("width", 40_000, 32_767),
        };
        let report = error.report();
        assert_eq!(report.kind, ErrorKind::LimitExceeded);
        assert_eq!(report.stage, Some(Stage::Encode));
        assert!(report.message.contains("width of 40000"));

        let unknown = ConversionError::UnknownFormat("nbt".to_string()).report();
        assert_eq!(unknown.kind, ErrorKind::UnknownFormat);
        assert_eq!(unknown.stage, None);
    }
}
