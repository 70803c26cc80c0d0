use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConformError {
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl ConformError {
    pub fn config_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::ConfigError {
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            path,
            source: Some(Box::new(source)),
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_with_path() {
        let path = PathBuf::from("/test/repos.yml");
        let error = ConformError::config_error("bad shape", Some(path.clone()));
        assert_eq!(error.to_string(), "Configuration error: bad shape");
        if let ConformError::ConfigError { path: Some(p), .. } = &error {
            assert_eq!(p, &path);
        } else {
            panic!("Expected ConfigError with path");
        }
    }

    #[test]
    fn test_config_error_keeps_source() {
        let yaml_error = serde_yaml::from_str::<u32>("not-a-number").unwrap_err();
        let error = ConformError::config_error_with_source("YAML parsing failed", None, yaml_error);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_filesystem_error_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = ConformError::filesystem_error_with_source("read failed", None, io_error);
        assert_eq!(
            error.to_string(),
            "File system operation failed: read failed"
        );
    }
}
