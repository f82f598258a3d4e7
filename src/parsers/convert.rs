//! # 结构记录与 [`Atoms`] 互转
//!
//! 两个方向的转换都会重新校验结构记录。多帧列表必须共享原子序数与周期性。
//!
//! ## 依赖关系
//! - 被 `parsers/vasp/`, `writers/trajectory.rs` 使用
//! - 使用 `models/structure.rs`, `parsers/validate.rs`

use super::validate::check_structure;
use crate::data::keys::*;
use crate::data::{must_have, Field, Record};
use crate::error::{DftioError, Result};
use crate::models::{hill_formula, Atoms, Lattice};

use ndarray::{Array1, Array3, Axis};

/// 结构记录 → 每帧一个 [`Atoms`]
pub fn structure_to_atoms(structure: &Record) -> Result<Vec<Atoms>> {
    let (n_frame, n_atom) = check_structure(structure)?;

    let numbers = structure[ATOMIC_NUMBERS_KEY].expect_i32(ATOMIC_NUMBERS_KEY)?;
    let pos = structure[POSITIONS_KEY].expect_f32(POSITIONS_KEY)?;
    let cell = structure[CELL_KEY].expect_f32(CELL_KEY)?;
    let pbc = structure[PBC_KEY].expect_bool(PBC_KEY)?;

    let numbers: Vec<i32> = numbers.iter().copied().collect();
    let pbc = [pbc[[0]], pbc[[1]], pbc[[2]]];

    let mut frames = Vec::with_capacity(n_frame);
    for (frame_pos, frame_cell) in pos.axis_iter(Axis(0)).zip(cell.axis_iter(Axis(0))) {
        let positions = (0..n_atom)
            .map(|i| {
                [
                    frame_pos[[i, 0]] as f64,
                    frame_pos[[i, 1]] as f64,
                    frame_pos[[i, 2]] as f64,
                ]
            })
            .collect();

        let mut matrix = [[0.0; 3]; 3];
        for (r, row) in matrix.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = frame_cell[[r, c]] as f64;
            }
        }

        frames.push(Atoms::new(
            numbers.clone(),
            positions,
            Lattice::from_vectors(matrix),
            pbc,
        ));
    }

    Ok(frames)
}

/// [`Atoms`] 列表 → 结构记录（坐标与晶格转为 float32）
pub fn atoms_to_structure(frames: &[Atoms]) -> Result<Record> {
    let first = frames.first().ok_or_else(|| {
        DftioError::InvalidArgument("cannot build a structure from an empty frame list".to_string())
    })?;

    for (i, frame) in frames.iter().enumerate() {
        if frame.numbers != first.numbers {
            return Err(DftioError::InconsistentFrames(format!(
                "frame {} has different atomic numbers from frame 0",
                i
            )));
        }
        if frame.pbc != first.pbc {
            return Err(DftioError::InconsistentFrames(format!(
                "frame {} has different periodic flags from frame 0",
                i
            )));
        }
        if frame.positions.len() != first.numbers.len() {
            return Err(DftioError::shape(
                POSITIONS_KEY,
                format!("({}, 3)", first.numbers.len()),
                &[frame.positions.len(), 3],
            ));
        }
    }

    let n_frame = frames.len();
    let n_atom = first.numbers.len();

    let pos = Array3::from_shape_fn((n_frame, n_atom, 3), |(f, i, k)| {
        frames[f].positions[i][k] as f32
    });
    let cell = Array3::from_shape_fn((n_frame, 3, 3), |(f, r, c)| {
        frames[f].cell.matrix[r][c] as f32
    });

    let mut structure = Record::new();
    structure.insert(
        ATOMIC_NUMBERS_KEY.to_string(),
        Field::from(Array1::from(first.numbers.clone())),
    );
    structure.insert(PBC_KEY.to_string(), Field::from(Array1::from(first.pbc.to_vec())));
    structure.insert(POSITIONS_KEY.to_string(), Field::from(pos));
    structure.insert(CELL_KEY.to_string(), Field::from(cell));

    check_structure(&structure)?;
    Ok(structure)
}

/// 结构记录的 Hill 化学式（只依赖原子序数）
pub fn formula_of(structure: &Record) -> Result<String> {
    let numbers = must_have(structure, ATOMIC_NUMBERS_KEY)?;
    let numbers: Vec<i32> = match numbers {
        Field::Int32(a) => a.iter().copied().collect(),
        Field::Int64(a) => a.iter().map(|&z| z as i32).collect(),
        other => {
            return Err(DftioError::dtype(
                ATOMIC_NUMBERS_KEY,
                "int32",
                other.dtype(),
            ))
        }
    };
    Ok(hill_formula(&numbers))
}
