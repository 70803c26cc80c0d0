use crate::common::error::ConformError;
use std::path::PathBuf;

/// repoconf全体で使用するResult型のエイリアス
///
/// # Examples
///
/// ```
/// use repoconf::common::result::ConformResult;
/// use repoconf::common::error::ConformError;
///
/// fn example_function() -> ConformResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> ConformResult<()> {
///     Err(ConformError::config_error("repositories is empty", None))
/// }
/// ```
pub type ConformResult<T> = Result<T, ConformError>;

/// Resultのエラー変換ヘルパー
pub trait ResultExt<T, E> {
    /// ファイルシステムエラーとしてConformResultに変換
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<PathBuf>,
    ) -> ConformResult<T>
    where
        E: Into<std::io::Error>;

    /// 設定エラーとしてConformResultに変換
    fn with_config_error(self, message: impl Into<String>, path: Option<PathBuf>) -> ConformResult<T>
    where
        E: std::error::Error + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<PathBuf>,
    ) -> ConformResult<T>
    where
        E: Into<std::io::Error>,
    {
        self.map_err(|e| ConformError::filesystem_error_with_source(message, path, e.into()))
    }

    fn with_config_error(self, message: impl Into<String>, path: Option<PathBuf>) -> ConformResult<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.map_err(|e| ConformError::config_error_with_source(message, path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ext_with_filesystem_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let result: Result<String, std::io::Error> = Err(io_error);

        let converted = result.with_filesystem_error("read failed", Some(PathBuf::from("/x")));
        assert!(matches!(
            converted,
            Err(ConformError::FileSystemError { .. })
        ));
    }

    #[test]
    fn test_result_ext_with_config_error() {
        let parse_error = serde_yaml::from_str::<u32>("nope").unwrap_err();
        let result: Result<u32, serde_yaml::Error> = Err(parse_error);

        let converted = result.with_config_error("bad yaml", None);
        assert!(matches!(converted, Err(ConformError::ConfigError { .. })));
    }
}
