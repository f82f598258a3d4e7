//! # 写出模块
//!
//! 把后端的结构、本征值、块记录写到磁盘。支持的格式：
//!
//! | 格式 | 布局 |
//! |------|------|
//! | `dat` / `hdf5` | `<outroot>/<formula>.<idx>/` 文本结构文件 + npy + h5 块容器 |
//! | `ase` | 同上，结构写为扩展 XYZ 轨迹 `xdat.xyz` |
//! | `lmdb` | `<outroot>/data.<pid>.lmdb` 追加式键值库 |
//!
//! 所有写出器都先取齐并校验全部请求的记录，再触碰文件系统，
//! 因此校验失败的帧不会留下任何输出。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`（`Parser::write`）和 `commands/` 使用
//! - 子模块: directory, h5, lmdb, text, trajectory

pub mod directory;
pub mod h5;
pub mod lmdb;
pub mod text;
pub mod trajectory;

pub use lmdb::{FrameEntry, LmdbStore};

use crate::data::keys::*;
use crate::data::Record;
use crate::error::{DftioError, Result};
use crate::parsers::{check_blocks, check_eigenvalue, check_structure, BlockRequest, BlockSet, Parser};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// LMDB 环境的默认映射大小（字节）
pub const DEFAULT_LMDB_MAP_SIZE: usize = 1_048_576_000_000;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Hdf5,
    Dat,
    Ase,
    Lmdb,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Hdf5,
        OutputFormat::Dat,
        OutputFormat::Ase,
        OutputFormat::Lmdb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Hdf5 => "hdf5",
            OutputFormat::Dat => "dat",
            OutputFormat::Ase => "ase",
            OutputFormat::Lmdb => "lmdb",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = DftioError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| DftioError::UnsupportedFormat(s.to_string()))
    }
}

/// 写出选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub format: OutputFormat,
    pub eigenvalue: bool,
    pub hamiltonian: bool,
    pub overlap: bool,
    pub density_matrix: bool,
    /// 丢弃下标小于该值的能带
    pub band_index_min: usize,
    pub lmdb_map_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            format: OutputFormat::Dat,
            eigenvalue: false,
            hamiltonian: false,
            overlap: false,
            density_matrix: false,
            band_index_min: 0,
            lmdb_map_size: DEFAULT_LMDB_MAP_SIZE,
        }
    }
}

impl WriteOptions {
    pub fn blocks(&self) -> BlockRequest {
        BlockRequest {
            hamiltonian: self.hamiltonian,
            overlap: self.overlap,
            density_matrix: self.density_matrix,
        }
    }
}

/// 按格式分发写出第 `idx` 帧，返回输出位置
pub fn write<P: Parser + ?Sized>(
    parser: &P,
    idx: usize,
    outroot: &Path,
    options: &WriteOptions,
) -> Result<PathBuf> {
    match options.format {
        OutputFormat::Hdf5 | OutputFormat::Dat => {
            directory::write_directory(parser, idx, outroot, options, directory::StructureLayout::Text)
        }
        OutputFormat::Ase => directory::write_directory(
            parser,
            idx,
            outroot,
            options,
            directory::StructureLayout::Trajectory,
        ),
        OutputFormat::Lmdb => lmdb::write_lmdb(parser, idx, outroot, options),
    }
}

// ─────────────────────────────────────────────────────────────
// 记录收集
// ─────────────────────────────────────────────────────────────

/// 已校验的单个下标的全部记录
#[derive(Debug, Clone)]
pub struct FrameBundle {
    pub structure: Record,
    pub n_frame: usize,
    pub eigenvalue: Option<Record>,
    pub blocks: Option<BlockSet>,
    pub basis: Option<BTreeMap<String, String>>,
}

/// 取齐并校验请求的全部记录
pub fn gather<P: Parser + ?Sized>(
    parser: &P,
    idx: usize,
    options: &WriteOptions,
    with_basis: bool,
) -> Result<FrameBundle> {
    let structure = parser.get_structure(idx)?;
    let (n_frame, _) = check_structure(&structure)?;

    let eigenvalue = if options.eigenvalue {
        let eig = parser.get_eigenvalue(idx, options.band_index_min)?;
        let (nf, _, _) = check_eigenvalue(&eig)?;
        if nf != n_frame {
            return Err(DftioError::InconsistentFrames(format!(
                "'{}' has {} frame(s), structure has {}",
                ENERGY_EIGENVALUE_KEY, nf, n_frame
            )));
        }
        Some(eig)
    } else {
        None
    };

    let request = options.blocks();
    let (blocks, basis) = if request.any() {
        let basis = if with_basis {
            match parser.get_basis(idx) {
                Ok(basis) => Some(basis),
                Err(DftioError::NotImplemented(reason)) => {
                    log::warn!("{}; basis.dat is not written", reason);
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        let blocks = parser.get_blocks(idx, request)?;
        check_blocks(&blocks, request, n_frame)?;
        (Some(blocks), basis)
    } else {
        (None, None)
    };

    Ok(FrameBundle {
        structure,
        n_frame,
        eigenvalue,
        blocks,
        basis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("dat".parse::<OutputFormat>().unwrap(), OutputFormat::Dat);
        assert_eq!("LMDB".parse::<OutputFormat>().unwrap(), OutputFormat::Lmdb);
        assert_eq!(OutputFormat::Ase.to_string(), "ase");

        let err = "xyz".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported format: xyz");
    }

    #[test]
    fn test_write_options_default() {
        let options = WriteOptions::default();
        assert_eq!(options.format, OutputFormat::Dat);
        assert_eq!(options.lmdb_map_size, 1048576000000);
        assert!(!options.blocks().any());
    }
}
