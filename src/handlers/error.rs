// src/handlers/error.rs
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    DataSource,
    NoData,
    InvalidInput,
}

#[derive(Debug, Clone)]
pub struct AnalysisError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AnalysisError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        AnalysisError {
            kind,
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        AnalysisError::new(ErrorKind::Config, message)
    }

    pub fn source_error(message: impl Into<String>) -> Self {
        AnalysisError::new(ErrorKind::DataSource, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        AnalysisError::new(ErrorKind::NoData, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        AnalysisError::new(ErrorKind::InvalidInput, message)
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AnalysisError {}
