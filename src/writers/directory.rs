//! # 目录布局写出器（`dat` / `hdf5` / `ase`）
//!
//! ```text
//! <outroot>/<formula>.<idx>/
//! ├── cell.dat / positions.dat / atomic_numbers.dat / pbc.dat   (dat, hdf5)
//! ├── xdat.xyz                                                  (ase)
//! ├── kpoints.npy, eigenvalues.npy                              (请求本征值时)
//! └── basis.dat, hamiltonians.h5, overlaps.h5, density_matrices.h5 (请求块时)
//! ```
//!
//! ## 依赖关系
//! - 被 `writers/mod.rs` 使用
//! - 使用 `writers/text.rs`, `writers/trajectory.rs`, `writers/h5.rs`, `ndarray-npy`

use super::{gather, h5, text, trajectory, WriteOptions};
use crate::data::keys::*;
use crate::data::Record;
use crate::error::{DftioError, Result};
use crate::parsers::{formula_of, structure_to_atoms, Parser};

use ndarray_npy::write_npy;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 结构部分的写法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureLayout {
    /// 四个 savetxt 风格的文本文件
    Text,
    /// 扩展 XYZ 轨迹 `xdat.xyz`
    Trajectory,
}

/// 写出第 `idx` 帧到 `<outroot>/<formula>.<idx>/`
pub fn write_directory<P: Parser + ?Sized>(
    parser: &P,
    idx: usize,
    outroot: &Path,
    options: &WriteOptions,
    layout: StructureLayout,
) -> Result<PathBuf> {
    let request = options.blocks();
    if request.any() {
        h5::ensure_available()?;
    }

    let bundle = gather(parser, idx, options, true)?;
    let frames = match layout {
        StructureLayout::Trajectory => Some(structure_to_atoms(&bundle.structure)?),
        StructureLayout::Text => None,
    };
    let formula = formula_of(&bundle.structure)?;

    let out_dir = outroot.join(format!("{}.{}", formula, idx));
    fs::create_dir_all(&out_dir).map_err(|e| DftioError::FileWriteError {
        path: out_dir.display().to_string(),
        source: e,
    })?;

    match frames {
        Some(frames) => {
            trajectory::write_trajectory(&frames, &out_dir.join("xdat.xyz"))?;
        }
        None => text::write_structure_text(&bundle.structure, &out_dir)?,
    }

    if let Some(eig) = &bundle.eigenvalue {
        write_eigenvalue(eig, &out_dir)?;
    }

    if let Some(blocks) = &bundle.blocks {
        if let Some(basis) = &bundle.basis {
            let path = out_dir.join("basis.dat");
            fs::write(&path, format_basis(basis)).map_err(|e| DftioError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            })?;
        }
        h5::write_blocks(&out_dir, blocks, request)?;
    }

    Ok(out_dir)
}

fn write_eigenvalue(eig: &Record, out_dir: &Path) -> Result<()> {
    let kpts = eig[KPOINT_KEY].expect_f32(KPOINT_KEY)?;
    let eigs = eig[ENERGY_EIGENVALUE_KEY].expect_f32(ENERGY_EIGENVALUE_KEY)?;
    write_npy(out_dir.join("kpoints.npy"), kpts)?;
    write_npy(out_dir.join("eigenvalues.npy"), eigs)?;
    Ok(())
}

/// 基组映射的文本形式：`{'Si': '2s2p1d', 'O': '2s2p1d'}`
pub fn format_basis(basis: &BTreeMap<String, String>) -> String {
    let items: Vec<String> = basis
        .iter()
        .map(|(element, description)| format!("'{}': '{}'", element, description))
        .collect();
    format!("{{{}}}", items.join(", "))
}
