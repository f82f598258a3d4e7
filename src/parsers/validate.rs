//! # 记录校验
//!
//! 后端输出在转换与写出之前都要经过这里的形状与 dtype 校验。
//! 任一条件不满足即返回错误，错误信息包含字段名及期望/实际的形状或 dtype。
//!
//! ## 依赖关系
//! - 被 `parsers/convert.rs`, `writers/` 使用
//! - 使用 `data/`

use super::{BlockRequest, BlockSet};
use crate::data::keys::*;
use crate::data::{must_have, DType, Record};
use crate::error::{DftioError, Result};

/// 校验结构记录，返回 `(n_frame, n_atom)`
///
/// - `pos`: float32 `(n_frame, n_atom, 3)`
/// - `cell`: float32 `(n_frame, 3, 3)`
/// - `atomic_numbers`: int32 `(n_atom,)`
/// - `pbc`: bool `(3,)`
pub fn check_structure(data: &Record) -> Result<(usize, usize)> {
    let pos = must_have(data, POSITIONS_KEY)?;
    let cell = must_have(data, CELL_KEY)?;
    let numbers = must_have(data, ATOMIC_NUMBERS_KEY)?;
    let pbc = must_have(data, PBC_KEY)?;

    let (n_frame, n_atom) = match pos.shape() {
        &[n_frame, n_atom, 3] => (n_frame, n_atom),
        other => return Err(DftioError::shape(POSITIONS_KEY, "(n_frame, n_atom, 3)", other)),
    };
    if cell.shape() != [n_frame, 3, 3] {
        return Err(DftioError::shape(
            CELL_KEY,
            format!("({}, 3, 3)", n_frame),
            cell.shape(),
        ));
    }
    if numbers.shape() != [n_atom] {
        return Err(DftioError::shape(
            ATOMIC_NUMBERS_KEY,
            format!("({},)", n_atom),
            numbers.shape(),
        ));
    }
    if pbc.shape() != [3] {
        return Err(DftioError::shape(PBC_KEY, "(3,)", pbc.shape()));
    }

    expect_dtype(data, ATOMIC_NUMBERS_KEY, DType::Int32)?;
    expect_dtype(data, CELL_KEY, DType::Float32)?;
    expect_dtype(data, POSITIONS_KEY, DType::Float32)?;
    expect_dtype(data, PBC_KEY, DType::Bool)?;

    Ok((n_frame, n_atom))
}

/// 校验本征值记录，返回 `(n_frame, n_kpoint, n_band)`
///
/// - `eigenvalue`: float32 `(n_frame, n_kpoint, n_band)`
/// - `kpoint`: float32 `(n_kpoint, 3)`
pub fn check_eigenvalue(data: &Record) -> Result<(usize, usize, usize)> {
    let eigs = must_have(data, ENERGY_EIGENVALUE_KEY)?;
    let kpts = must_have(data, KPOINT_KEY)?;

    let (nf, nk, nb) = match eigs.shape() {
        &[nf, nk, nb] => (nf, nk, nb),
        other => {
            return Err(DftioError::shape(
                ENERGY_EIGENVALUE_KEY,
                "(n_frame, n_kpoint, n_band)",
                other,
            ))
        }
    };
    if kpts.shape() != [nk, 3] {
        return Err(DftioError::shape(KPOINT_KEY, format!("({}, 3)", nk), kpts.shape()));
    }

    expect_dtype(data, ENERGY_EIGENVALUE_KEY, DType::Float32)?;
    expect_dtype(data, KPOINT_KEY, DType::Float32)?;

    Ok((nf, nk, nb))
}

/// 校验请求的块记录
///
/// 每类请求的块必须存在且帧数等于 `n_frame`；哈密顿量的每一帧都必须含在位块
/// `0_0_0_0_0`，dtype 为 float32 或 complex64。
pub fn check_blocks(blocks: &BlockSet, request: BlockRequest, n_frame: usize) -> Result<()> {
    let requested = [
        (request.hamiltonian, &blocks.hamiltonian, HAMILTONIAN_KEY),
        (request.overlap, &blocks.overlap, OVERLAP_KEY),
        (request.density_matrix, &blocks.density_matrix, DENSITY_MATRIX_KEY),
    ];

    for (wanted, frames, key) in requested {
        if !wanted {
            continue;
        }
        let frames = frames.as_ref().ok_or_else(|| DftioError::missing(key))?;
        if frames.len() != n_frame {
            return Err(DftioError::InconsistentFrames(format!(
                "'{}' has {} frame(s) of blocks, structure has {}",
                key,
                frames.len(),
                n_frame
            )));
        }
    }

    if let (true, Some(frames)) = (request.hamiltonian, &blocks.hamiltonian) {
        for (i, frame) in frames.iter().enumerate() {
            let onsite = frame.get(ONSITE_BLOCK_KEY).ok_or_else(|| {
                DftioError::missing(format!("{}[{}].{}", HAMILTONIAN_KEY, i, ONSITE_BLOCK_KEY))
            })?;
            if !matches!(onsite.dtype(), DType::Float32 | DType::Complex64) {
                return Err(DftioError::dtype(
                    format!("{}[{}].{}", HAMILTONIAN_KEY, i, ONSITE_BLOCK_KEY),
                    "float32 or complex64",
                    onsite.dtype(),
                ));
            }
        }
    }

    Ok(())
}

fn expect_dtype(data: &Record, key: &str, expected: DType) -> Result<()> {
    let field = must_have(data, key)?;
    if field.dtype() != expected {
        return Err(DftioError::dtype(key, expected.to_string(), field.dtype()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BlockFrame, Field};
    use ndarray::{arr1, Array1, Array2, Array3};
    use num_complex::Complex32;

    fn structure(n_frame: usize, n_atom: usize) -> Record {
        let mut data = Record::new();
        data.insert(
            POSITIONS_KEY.to_string(),
            Field::from(Array3::<f32>::zeros((n_frame, n_atom, 3))),
        );
        data.insert(
            CELL_KEY.to_string(),
            Field::from(Array3::<f32>::zeros((n_frame, 3, 3))),
        );
        data.insert(
            ATOMIC_NUMBERS_KEY.to_string(),
            Field::from(Array1::<i32>::ones(n_atom)),
        );
        data.insert(PBC_KEY.to_string(), Field::from(arr1(&[true, true, true])));
        data
    }

    #[test]
    fn test_valid_structure() {
        assert_eq!(check_structure(&structure(2, 4)).unwrap(), (2, 4));
    }

    #[test]
    fn test_rank2_positions_rejected() {
        let mut data = structure(1, 4);
        data.insert(
            POSITIONS_KEY.to_string(),
            Field::from(Array2::<f32>::zeros((4, 3))),
        );
        let err = check_structure(&data).unwrap_err();
        assert!(matches!(err, DftioError::ShapeError { ref field, .. } if field == POSITIONS_KEY));
        assert!(err.to_string().contains("(n_frame, n_atom, 3)"));
    }

    #[test]
    fn test_int64_atomic_numbers_rejected() {
        let mut data = structure(1, 4);
        data.insert(
            ATOMIC_NUMBERS_KEY.to_string(),
            Field::from(Array1::<i64>::ones(4)),
        );
        let err = check_structure(&data).unwrap_err();
        assert!(matches!(err, DftioError::DtypeError { ref field, .. } if field == ATOMIC_NUMBERS_KEY));
    }

    #[test]
    fn test_float64_positions_rejected() {
        let mut data = structure(1, 2);
        data.insert(
            POSITIONS_KEY.to_string(),
            Field::from(Array3::<f64>::zeros((1, 2, 3))),
        );
        assert!(matches!(
            check_structure(&data),
            Err(DftioError::DtypeError { .. })
        ));
    }

    #[test]
    fn test_cell_frame_count_mismatch() {
        let mut data = structure(2, 2);
        data.insert(
            CELL_KEY.to_string(),
            Field::from(Array3::<f32>::zeros((1, 3, 3))),
        );
        let err = check_structure(&data).unwrap_err();
        assert!(matches!(err, DftioError::ShapeError { ref field, .. } if field == CELL_KEY));
    }

    #[test]
    fn test_missing_pbc() {
        let mut data = structure(1, 2);
        data.remove(PBC_KEY);
        assert!(matches!(
            check_structure(&data),
            Err(DftioError::MissingField { .. })
        ));
    }

    #[test]
    fn test_eigenvalue_shapes() {
        let mut data = Record::new();
        data.insert(
            ENERGY_EIGENVALUE_KEY.to_string(),
            Field::from(Array3::<f32>::zeros((1, 5, 8))),
        );
        data.insert(
            KPOINT_KEY.to_string(),
            Field::from(Array2::<f32>::zeros((5, 3))),
        );
        assert_eq!(check_eigenvalue(&data).unwrap(), (1, 5, 8));

        data.insert(
            KPOINT_KEY.to_string(),
            Field::from(Array2::<f32>::zeros((4, 3))),
        );
        assert!(check_eigenvalue(&data).is_err());
    }

    fn frame_with_onsite(field: Field) -> BlockFrame {
        let mut frame = BlockFrame::new();
        frame.insert(ONSITE_BLOCK_KEY.to_string(), field);
        frame
    }

    #[test]
    fn test_blocks_valid() {
        let blocks = BlockSet {
            hamiltonian: Some(vec![
                frame_with_onsite(Field::from(Array2::<f32>::zeros((2, 2)))),
                frame_with_onsite(Field::from(Array2::<Complex32>::zeros((2, 2)))),
            ]),
            ..Default::default()
        };
        let request = BlockRequest {
            hamiltonian: true,
            ..Default::default()
        };
        assert!(check_blocks(&blocks, request, 2).is_ok());
    }

    #[test]
    fn test_blocks_missing_onsite_and_count() {
        let request = BlockRequest {
            hamiltonian: true,
            ..Default::default()
        };
        let blocks = BlockSet {
            hamiltonian: Some(vec![BlockFrame::new()]),
            ..Default::default()
        };
        let err = check_blocks(&blocks, request, 1).unwrap_err();
        assert!(err.to_string().contains(ONSITE_BLOCK_KEY));

        assert!(matches!(
            check_blocks(&blocks, request, 3),
            Err(DftioError::InconsistentFrames(_))
        ));
    }

    #[test]
    fn test_blocks_wrong_dtype_and_absent() {
        let request = BlockRequest {
            hamiltonian: true,
            overlap: true,
            density_matrix: false,
        };
        let blocks = BlockSet {
            hamiltonian: Some(vec![frame_with_onsite(Field::from(
                Array2::<f64>::zeros((2, 2)),
            ))]),
            overlap: Some(vec![BlockFrame::new()]),
            density_matrix: None,
        };
        assert!(matches!(
            check_blocks(&blocks, request, 1),
            Err(DftioError::DtypeError { .. })
        ));

        let absent = BlockSet {
            hamiltonian: None,
            ..blocks
        };
        let err = check_blocks(&absent, request, 1).unwrap_err();
        assert!(matches!(err, DftioError::MissingField { ref key } if key == HAMILTONIAN_KEY));
    }
}
