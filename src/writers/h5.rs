//! # HDF5 块容器
//!
//! 每类块一个文件（`hamiltonians.h5` / `overlaps.h5` / `density_matrices.h5`），
//! 每帧一个组（`"0"`, `"1"`, …），组内每个原子对一个数据集（键 `i_j_Rx_Ry_Rz`）。
//!
//! 需要 `hdf5` feature；未启用时任何块请求都在写出前返回 `UnsupportedFormat`。
//!
//! ## 依赖关系
//! - 被 `writers/directory.rs` 使用
//! - 使用 `hdf5`（可选）

use crate::data::keys::*;
use crate::data::Blocks;
use crate::error::{DftioError, Result};
use crate::parsers::{BlockRequest, BlockSet};

use std::path::Path;

/// 块类型与容器文件名
pub fn containers<'a>(blocks: &'a BlockSet, request: BlockRequest) -> Vec<(&'static str, &'static str, Option<&'a Blocks>)> {
    [
        (request.hamiltonian, HAMILTONIAN_KEY, "hamiltonians.h5", &blocks.hamiltonian),
        (request.overlap, OVERLAP_KEY, "overlaps.h5", &blocks.overlap),
        (
            request.density_matrix,
            DENSITY_MATRIX_KEY,
            "density_matrices.h5",
            &blocks.density_matrix,
        ),
    ]
    .into_iter()
    .filter(|(wanted, ..)| *wanted)
    .map(|(_, key, file, frames)| (key, file, frames.as_ref()))
    .collect()
}

/// 当前构建是否支持 HDF5 块容器
pub fn ensure_available() -> Result<()> {
    if cfg!(feature = "hdf5") {
        Ok(())
    } else {
        Err(DftioError::UnsupportedFormat(
            "HDF5 block containers (rebuild with `--features hdf5`)".to_string(),
        ))
    }
}

#[cfg(feature = "hdf5")]
pub fn write_blocks(out_dir: &Path, blocks: &BlockSet, request: BlockRequest) -> Result<()> {
    for (key, file_name, frames) in containers(blocks, request) {
        let frames = frames.ok_or_else(|| DftioError::missing(key))?;
        let file = hdf5::File::create(out_dir.join(file_name))?;
        for (i, frame) in frames.iter().enumerate() {
            let group = file.create_group(&i.to_string())?;
            for (pair, block) in frame {
                write_dataset(&group, pair, block)?;
            }
        }
        file.close()?;
    }
    Ok(())
}

#[cfg(not(feature = "hdf5"))]
pub fn write_blocks(_out_dir: &Path, _blocks: &BlockSet, _request: BlockRequest) -> Result<()> {
    ensure_available()
}

#[cfg(feature = "hdf5")]
fn write_dataset(group: &hdf5::Group, name: &str, block: &crate::data::Field) -> Result<()> {
    use crate::data::Field;

    match block {
        Field::Bool(a) => group.new_dataset_builder().with_data(a).create(name)?,
        Field::Int32(a) => group.new_dataset_builder().with_data(a).create(name)?,
        Field::Int64(a) => group.new_dataset_builder().with_data(a).create(name)?,
        Field::Float32(a) => group.new_dataset_builder().with_data(a).create(name)?,
        Field::Float64(a) => group.new_dataset_builder().with_data(a).create(name)?,
        Field::Complex64(a) => group.new_dataset_builder().with_data(a).create(name)?,
    };
    Ok(())
}
