//! # 统一错误处理模块
//!
//! 定义 dftio 的所有错误类型，使用 `thiserror` 派生。
//!
//! 校验与分发类错误（字段缺失、形状/类型不符、未知格式）一律不在本地恢复，
//! 直接中止当前帧的处理。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// dftio 统一错误类型
#[derive(Error, Debug)]
pub enum DftioError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 记录校验错误
    // ─────────────────────────────────────────────────────────────
    #[error("Missing required field '{key}'")]
    MissingField { key: String },

    #[error("Invalid shape for '{field}': expected {expected}, got {actual:?}")]
    ShapeError {
        field: String,
        expected: String,
        actual: Vec<usize>,
    },

    #[error("Invalid dtype for '{field}': expected {expected}, got {actual}")]
    DtypeError {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Index {index} in '{field}' is out of range (bound {bound})")]
    IndexOutOfRange {
        field: String,
        index: i64,
        bound: usize,
    },

    #[error("Inconsistent frames: {0}")]
    InconsistentFrames(String),

    // ─────────────────────────────────────────────────────────────
    // 分发错误
    // ─────────────────────────────────────────────────────────────
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Parser mode '{name}' is not registered (available: {available})")]
    UnsupportedParser { name: String, available: String },

    #[error("Parser mode '{0}' is already registered")]
    DuplicateParser(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    // ─────────────────────────────────────────────────────────────
    // 存储错误
    // ─────────────────────────────────────────────────────────────
    #[error("LMDB error: {0}")]
    Lmdb(#[from] heed::Error),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] bincode::Error),

    #[error("Failed to write npy file: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{failed} of {total} frame(s) failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("{0}")]
    Other(String),
}

impl DftioError {
    /// 构造字段缺失错误
    pub fn missing(key: impl Into<String>) -> Self {
        DftioError::MissingField { key: key.into() }
    }

    /// 构造形状错误
    pub fn shape(field: impl Into<String>, expected: impl Into<String>, actual: &[usize]) -> Self {
        DftioError::ShapeError {
            field: field.into(),
            expected: expected.into(),
            actual: actual.to_vec(),
        }
    }

    /// 构造类型错误
    pub fn dtype(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl std::fmt::Display,
    ) -> Self {
        DftioError::DtypeError {
            field: field.into(),
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, DftioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_message_names_field() {
        let err = DftioError::shape("pos", "(n_frame, n_atom, 3)", &[4, 3]);
        let msg = err.to_string();
        assert!(msg.contains("'pos'"));
        assert!(msg.contains("(n_frame, n_atom, 3)"));
        assert!(msg.contains("[4, 3]"));
    }

    #[test]
    fn test_dtype_error_message() {
        let err = DftioError::dtype("atomic_numbers", "int32", "int64");
        assert_eq!(
            err.to_string(),
            "Invalid dtype for 'atomic_numbers': expected int32, got int64"
        );
    }
}
