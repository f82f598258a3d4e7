//! # 解析器模块
//!
//! 定义所有 DFT 后端必须实现的 [`Parser`] trait，以及帧来源的发现逻辑。
//!
//! 后端由 `(root, prefix)` 构造：`root` 为目录时按 `root/*prefix*` 通配发现帧来源
//! （排序后使用），为显式列表时原样使用。每个下标对应一个来源。
//!
//! ## 依赖关系
//! - 被 `commands/` 和 `writers/` 使用
//! - 使用 `data/` 记录类型
//! - 子模块: validate, convert, registry, vasp

pub mod convert;
pub mod registry;
pub mod validate;
pub mod vasp;

pub use convert::{atoms_to_structure, formula_of, structure_to_atoms};
pub use registry::{ParserBuilder, ParserRegistry};
pub use validate::{check_blocks, check_eigenvalue, check_structure};

use crate::data::{Blocks, Record};
use crate::error::{DftioError, Result};
use crate::writers::{self, WriteOptions};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────
// 帧来源
// ─────────────────────────────────────────────────────────────

/// 后端的根位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Root {
    /// 在目录下按前缀通配发现
    Directory(PathBuf),
    /// 调用方给定的来源列表，原样使用
    Explicit(Vec<PathBuf>),
}

impl From<&Path> for Root {
    fn from(path: &Path) -> Self {
        Root::Directory(path.to_path_buf())
    }
}

impl From<Vec<PathBuf>> for Root {
    fn from(paths: Vec<PathBuf>) -> Self {
        Root::Explicit(paths)
    }
}

/// 已发现的帧来源列表
#[derive(Debug, Clone)]
pub struct Sources {
    prefix: String,
    paths: Vec<PathBuf>,
}

impl Sources {
    /// 发现帧来源
    pub fn discover(root: Root, prefix: &str) -> Result<Self> {
        let paths = match root {
            Root::Explicit(paths) => paths,
            Root::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(DftioError::DirectoryNotFound {
                        path: dir.display().to_string(),
                    });
                }
                let pattern = format!(
                    "{}/*{}*",
                    glob::Pattern::escape(&dir.to_string_lossy()),
                    prefix
                );
                let mut found = glob::glob(&pattern)
                    .map_err(|e| {
                        DftioError::InvalidArgument(format!("Bad prefix '{}': {}", prefix, e))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| DftioError::FileReadError {
                        path: e.path().display().to_string(),
                        source: e.into_error(),
                    })?;
                found.sort();
                found
            }
        };

        Ok(Sources {
            prefix: prefix.to_string(),
            paths,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// 第 `idx` 个来源
    pub fn get(&self, idx: usize) -> Result<&Path> {
        self.paths
            .get(idx)
            .map(PathBuf::as_path)
            .ok_or_else(|| DftioError::IndexOutOfRange {
                field: "sources".to_string(),
                index: idx as i64,
                bound: self.paths.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

// ─────────────────────────────────────────────────────────────
// 块请求与结果
// ─────────────────────────────────────────────────────────────

/// 请求的块类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockRequest {
    pub hamiltonian: bool,
    pub overlap: bool,
    pub density_matrix: bool,
}

impl BlockRequest {
    pub fn any(&self) -> bool {
        self.hamiltonian || self.overlap || self.density_matrix
    }
}

/// 后端返回的三类块记录，未请求或不可用时为 `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSet {
    pub hamiltonian: Option<Blocks>,
    pub overlap: Option<Blocks>,
    pub density_matrix: Option<Blocks>,
}

// ─────────────────────────────────────────────────────────────
// 后端契约
// ─────────────────────────────────────────────────────────────

/// DFT 后端
///
/// 实现者只需提供三个查询和来源列表；校验、转换、化学式与写出由提供方法完成。
/// 后端不持有可变状态，可在线程间共享。
pub trait Parser: Send + Sync {
    /// 注册名，例如 `vasp`
    fn name(&self) -> &str;

    fn sources(&self) -> &Sources;

    /// 结构记录：原子序数、坐标、晶格、周期性
    fn get_structure(&self, idx: usize) -> Result<Record>;

    /// 本征值记录：本征值与 k 点，丢弃 `band_index_min` 以下的能带
    fn get_eigenvalue(&self, idx: usize, band_index_min: usize) -> Result<Record>;

    /// 哈密顿量、重叠矩阵、密度矩阵的块记录
    fn get_blocks(&self, idx: usize, request: BlockRequest) -> Result<BlockSet>;

    /// 元素 → 基组描述
    fn get_basis(&self, idx: usize) -> Result<BTreeMap<String, String>> {
        let _ = idx;
        Err(DftioError::NotImplemented(format!(
            "{} does not provide basis information",
            self.name()
        )))
    }

    fn len(&self) -> usize {
        self.sources().len()
    }

    fn is_empty(&self) -> bool {
        self.sources().is_empty()
    }

    fn source(&self, idx: usize) -> Result<&Path> {
        self.sources().get(idx)
    }

    /// 第 `idx` 帧的 Hill 化学式
    fn formula(&self, idx: usize) -> Result<String> {
        formula_of(&self.get_structure(idx)?)
    }

    /// 写出第 `idx` 帧，返回输出位置（目录或 LMDB 环境）
    fn write(&self, idx: usize, outroot: &Path, options: &WriteOptions) -> Result<PathBuf> {
        writers::write(self, idx, outroot, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_sorted_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["frame_2", "frame_0", "frame_1", "other"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }

        let sources = Sources::discover(Root::from(dir.path()), "frame").unwrap();
        assert_eq!(sources.len(), 3);
        let names: Vec<_> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["frame_0", "frame_1", "frame_2"]);
    }

    #[test]
    fn test_discover_escapes_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("run[1]");
        fs::create_dir_all(root.join("scf")).unwrap();

        let sources = Sources::discover(Root::Directory(root), "scf").unwrap();
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn test_explicit_sources_verbatim() {
        let paths = vec![PathBuf::from("b"), PathBuf::from("a")];
        let sources = Sources::discover(Root::from(paths.clone()), "ignored").unwrap();
        assert_eq!(sources.iter().collect::<Vec<_>>(), vec![Path::new("b"), Path::new("a")]);
        assert!(matches!(
            sources.get(2),
            Err(DftioError::IndexOutOfRange { bound: 2, .. })
        ));
    }

    #[test]
    fn test_missing_root() {
        let err = Sources::discover(Root::Directory(PathBuf::from("/no/such/dir")), "").unwrap_err();
        assert!(matches!(err, DftioError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_block_request_any() {
        assert!(!BlockRequest::default().any());
        let request = BlockRequest {
            overlap: true,
            ..Default::default()
        };
        assert!(request.any());
    }
}
