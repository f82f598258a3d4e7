//! # LMDB 追加式存储
//!
//! 环境路径 `<outroot>/data.<pid>.lmdb`，一个未命名数据库。每帧一条记录：
//! - 键：写事务内读取的当前条目数，4 字节大端 `u32`
//! - 值：[`FrameEntry`] 的 bincode 编码
//!
//! 每帧一个已提交的写事务；最后一帧之后显式关闭环境。
//! 同一路径只允许一个写入者，键由条目数决定，不做跨进程协调。
//!
//! ## 依赖关系
//! - 被 `writers/mod.rs` 使用
//! - 使用 `heed`, `bincode`

use super::{gather, FrameBundle, WriteOptions};
use crate::data::keys::*;
use crate::data::{BlockFrame, Record};
use crate::error::{DftioError, Result};
use crate::parsers::Parser;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 存储中的单帧条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEntry {
    /// 后端下标
    pub idx: usize,
    /// 该下标内的帧号
    pub nf: usize,
    /// `atomic_numbers`, `cell`, `pos`, `pbc`，以及可选的 `eigenvalue`, `kpoint`
    pub fields: Record,
    pub hamiltonian: Option<BlockFrame>,
    pub overlap: Option<BlockFrame>,
    pub density_matrix: Option<BlockFrame>,
}

/// LMDB 环境及其未命名数据库
pub struct LmdbStore {
    path: PathBuf,
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// 打开（必要时创建）环境
    pub fn open(path: &Path, map_size: usize) -> Result<Self> {
        fs::create_dir_all(path).map_err(|e| DftioError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;

        let env = unsafe { EnvOpenOptions::new().map_size(map_size).max_dbs(1).open(path)? };

        let mut wtxn = env.write_txn()?;
        let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, None)?;
        wtxn.commit()?;

        Ok(LmdbStore {
            path: path.to_path_buf(),
            env,
            db,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条，返回其键
    pub fn append(&self, entry: &FrameEntry) -> Result<u32> {
        let value = bincode::serialize(entry)?;

        let mut wtxn = self.env.write_txn()?;
        let count = self.db.len(&wtxn)?;
        let key = u32::try_from(count).map_err(|_| {
            DftioError::Other(format!("LMDB store {} is full", self.path.display()))
        })?;
        self.db.put(&mut wtxn, &key.to_be_bytes(), &value)?;
        wtxn.commit()?;

        log::debug!(
            "Stored idx {} frame {} under key {} in {}",
            entry.idx,
            entry.nf,
            key,
            self.path.display()
        );
        Ok(key)
    }

    /// 条目数
    pub fn len(&self) -> Result<u64> {
        let rtxn = self.env.read_txn()?;
        Ok(self.db.len(&rtxn)?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// 按键序解码全部条目
    pub fn entries(&self) -> Result<Vec<(u32, FrameEntry)>> {
        let rtxn = self.env.read_txn()?;
        let mut entries = Vec::new();
        for item in self.db.iter(&rtxn)? {
            let (key, value) = item?;
            let key: [u8; 4] = key.try_into().map_err(|_| {
                DftioError::Other(format!("Unexpected LMDB key length {}", key.len()))
            })?;
            entries.push((u32::from_be_bytes(key), bincode::deserialize(value)?));
        }
        Ok(entries)
    }

    /// 关闭环境并等待其释放
    pub fn close(self) {
        self.env.prepare_for_closing().wait();
    }
}

/// 当前进程的存储路径
pub fn store_path(outroot: &Path) -> PathBuf {
    outroot.join(format!("data.{}.lmdb", std::process::id()))
}

/// 把第 `idx` 个下标的每一帧追加到 `<outroot>/data.<pid>.lmdb`
pub fn write_lmdb<P: Parser + ?Sized>(
    parser: &P,
    idx: usize,
    outroot: &Path,
    options: &WriteOptions,
) -> Result<PathBuf> {
    let bundle = gather(parser, idx, options, false)?;
    let entries = (0..bundle.n_frame)
        .map(|nf| frame_entry(&bundle, idx, nf))
        .collect::<Result<Vec<_>>>()?;

    let path = store_path(outroot);
    let store = LmdbStore::open(&path, options.lmdb_map_size)?;
    let written = entries.iter().try_for_each(|entry| store.append(entry).map(|_| ()));
    store.close();
    written?;

    Ok(path)
}

fn frame_entry(bundle: &FrameBundle, idx: usize, nf: usize) -> Result<FrameEntry> {
    let structure = &bundle.structure;
    let mut fields = Record::new();
    fields.insert(
        ATOMIC_NUMBERS_KEY.to_string(),
        structure[ATOMIC_NUMBERS_KEY].clone(),
    );
    fields.insert(CELL_KEY.to_string(), structure[CELL_KEY].frame(nf, CELL_KEY)?);
    fields.insert(
        POSITIONS_KEY.to_string(),
        structure[POSITIONS_KEY].frame(nf, POSITIONS_KEY)?,
    );
    fields.insert(PBC_KEY.to_string(), structure[PBC_KEY].clone());

    if let Some(eig) = &bundle.eigenvalue {
        fields.insert(
            ENERGY_EIGENVALUE_KEY.to_string(),
            eig[ENERGY_EIGENVALUE_KEY].frame(nf, ENERGY_EIGENVALUE_KEY)?,
        );
        fields.insert(KPOINT_KEY.to_string(), eig[KPOINT_KEY].clone());
    }

    let block = |frames: &Option<Vec<BlockFrame>>| frames.as_ref().and_then(|f| f.get(nf).cloned());
    let (hamiltonian, overlap, density_matrix) = match &bundle.blocks {
        Some(blocks) => (
            block(&blocks.hamiltonian),
            block(&blocks.overlap),
            block(&blocks.density_matrix),
        ),
        None => (None, None, None),
    };

    Ok(FrameEntry {
        idx,
        nf,
        fields,
        hamiltonian,
        overlap,
        density_matrix,
    })
}
