//! # 原子图派生几何量
//!
//! 从记录中按需派生位移向量、向量长度与批次编号。
//!
//! 所有操作都按值接收记录并返回补全后的记录：目标字段已存在时原样返回
//! （仅补算缺失的长度），因此重复调用是无操作。
//!
//! ## 周期性修正
//! ```text
//! vec = pos[target] - pos[source] + shift · cell
//! ```
//! 晶格采用行向量约定（每一行是一条晶格矢量）。批处理记录含多个晶格时，
//! 每个原子对使用其源原子所在图的晶格 `cell[batch[source]]`。
//!
//! ## 依赖关系
//! - 被下游 ML 代码、`data/batch.rs` 使用
//! - 使用 `data/keys.rs`, `data/field.rs`

use crate::data::keys::*;
use crate::data::{must_have, DType, Field, Record};
use crate::error::{DftioError, Result};

use ndarray::{arr1, Array1, Array2, Array3, ArrayD, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Ix1, Ix2, NdFloat};

/// 判定晶格是否全零的阈值
const ZERO_CELL_TOLERANCE: f64 = 1e-10;

/// 位移向量对应的原子对类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// 成键边
    Edge,
    /// 环境对
    Env,
    /// 在位环境对
    OnsiteEnv,
}

impl Relation {
    pub fn index_key(self) -> &'static str {
        match self {
            Relation::Edge => EDGE_INDEX_KEY,
            Relation::Env => ENV_INDEX_KEY,
            Relation::OnsiteEnv => ONSITENV_INDEX_KEY,
        }
    }

    pub fn cell_shift_key(self) -> &'static str {
        match self {
            Relation::Edge => EDGE_CELL_SHIFT_KEY,
            Relation::Env => ENV_CELL_SHIFT_KEY,
            Relation::OnsiteEnv => ONSITENV_CELL_SHIFT_KEY,
        }
    }

    pub fn vectors_key(self) -> &'static str {
        match self {
            Relation::Edge => EDGE_VECTORS_KEY,
            Relation::Env => ENV_VECTORS_KEY,
            Relation::OnsiteEnv => ONSITENV_VECTORS_KEY,
        }
    }

    pub fn length_key(self) -> &'static str {
        match self {
            Relation::Edge => EDGE_LENGTH_KEY,
            Relation::Env => ENV_LENGTH_KEY,
            Relation::OnsiteEnv => ONSITENV_LENGTH_KEY,
        }
    }
}

/// 派生边位移向量（及长度）
pub fn with_edge_vectors(data: Record, with_lengths: bool) -> Result<Record> {
    with_vectors(data, Relation::Edge, with_lengths)
}

/// 派生环境位移向量（及长度）
pub fn with_env_vectors(data: Record, with_lengths: bool) -> Result<Record> {
    with_vectors(data, Relation::Env, with_lengths)
}

/// 派生在位环境位移向量（及长度）
pub fn with_onsitenv_vectors(data: Record, with_lengths: bool) -> Result<Record> {
    with_vectors(data, Relation::OnsiteEnv, with_lengths)
}

/// 为给定关系派生位移向量
pub fn with_vectors(mut data: Record, relation: Relation, with_lengths: bool) -> Result<Record> {
    if let Some(vectors) = data.get(relation.vectors_key()) {
        if with_lengths && !data.contains_key(relation.length_key()) {
            let lengths = field_lengths(vectors, relation.vectors_key())?;
            data.insert(relation.length_key().to_string(), lengths);
        }
        return Ok(data);
    }

    let (vectors, lengths) = match must_have(&data, POSITIONS_KEY)? {
        Field::Float32(pos) => {
            let v = displacements::<f32>(&data, pos, relation)?;
            let l = with_lengths.then(|| Field::from(row_norms(&v)));
            (Field::from(v), l)
        }
        Field::Float64(pos) => {
            let v = displacements::<f64>(&data, pos, relation)?;
            let l = with_lengths.then(|| Field::from(row_norms(&v)));
            (Field::from(v), l)
        }
        other => {
            return Err(DftioError::dtype(
                POSITIONS_KEY,
                "float32 or float64",
                other.dtype(),
            ))
        }
    };

    data.insert(relation.vectors_key().to_string(), vectors);
    if let Some(lengths) = lengths {
        data.insert(relation.length_key().to_string(), lengths);
    }
    Ok(data)
}

/// 补全批次编号：缺失时所有原子属于图 0，`ptr = [0, n_atom]`
pub fn with_batch(mut data: Record) -> Result<Record> {
    if data.contains_key(BATCH_KEY) {
        return Ok(data);
    }

    let pos = must_have(&data, POSITIONS_KEY)?;
    let n_atom = *pos
        .shape()
        .first()
        .ok_or_else(|| DftioError::shape(POSITIONS_KEY, "(n_atom, 3)", pos.shape()))?;

    data.insert(BATCH_KEY.to_string(), Field::from(Array1::<i64>::zeros(n_atom)));
    data.insert(
        BATCH_PTR_KEY.to_string(),
        Field::from(arr1(&[0i64, n_atom as i64])),
    );
    Ok(data)
}

// ─────────────────────────────────────────────────────────────
// 内部实现
// ─────────────────────────────────────────────────────────────

/// 坐标所用的浮点类型（float32 / float64）
trait Real: NdFloat {
    const DTYPE: DType;

    fn view(field: &Field) -> Option<&ArrayD<Self>>;

    /// 任意数值类型转换为本类型（用于整数值的晶格平移）
    fn cast(field: &Field) -> Option<ArrayD<Self>>;

    fn as_f64(self) -> f64;
}

impl Real for f32 {
    const DTYPE: DType = DType::Float32;

    fn view(field: &Field) -> Option<&ArrayD<Self>> {
        field.as_f32()
    }

    fn cast(field: &Field) -> Option<ArrayD<Self>> {
        match field {
            Field::Int32(a) => Some(a.mapv(|v| v as f32)),
            Field::Int64(a) => Some(a.mapv(|v| v as f32)),
            Field::Float32(a) => Some(a.clone()),
            Field::Float64(a) => Some(a.mapv(|v| v as f32)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Real for f64 {
    const DTYPE: DType = DType::Float64;

    fn view(field: &Field) -> Option<&ArrayD<Self>> {
        field.as_f64()
    }

    fn cast(field: &Field) -> Option<ArrayD<Self>> {
        match field {
            Field::Int32(a) => Some(a.mapv(|v| v as f64)),
            Field::Int64(a) => Some(a.mapv(|v| v as f64)),
            Field::Float32(a) => Some(a.mapv(|v| v as f64)),
            Field::Float64(a) => Some(a.clone()),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        self
    }
}

fn displacements<T: Real>(data: &Record, pos: &ArrayD<T>, relation: Relation) -> Result<Array2<T>> {
    let pos = pos
        .view()
        .into_dimensionality::<Ix2>()
        .ok()
        .filter(|p| p.ncols() == 3)
        .ok_or_else(|| DftioError::shape(POSITIONS_KEY, "(n_atom, 3)", pos.shape()))?;
    let n_atom = pos.nrows();

    let index_key = relation.index_key();
    let index_field = must_have(data, index_key)?;
    let index = index_field
        .to_indices(index_key)?
        .into_dimensionality::<Ix2>()
        .ok()
        .filter(|i| i.nrows() == 2)
        .ok_or_else(|| DftioError::shape(index_key, "(2, n_pair)", index_field.shape()))?;
    if let Some(&bad) = index.iter().find(|&&i| i >= n_atom) {
        return Err(DftioError::IndexOutOfRange {
            field: index_key.to_string(),
            index: bad as i64,
            bound: n_atom,
        });
    }
    let n_pair = index.ncols();

    let mut vectors = Array2::<T>::zeros((n_pair, 3));
    for e in 0..n_pair {
        let (source, target) = (index[[0, e]], index[[1, e]]);
        for k in 0..3 {
            vectors[[e, k]] = pos[[target, k]] - pos[[source, k]];
        }
    }

    let cells = match periodic_cells::<T>(data)? {
        Some(cells) => cells,
        None => return Ok(vectors),
    };

    let shift_key = relation.cell_shift_key();
    let shift_field = must_have(data, shift_key)?;
    let shifts = T::cast(shift_field)
        .ok_or_else(|| DftioError::dtype(shift_key, "numeric", shift_field.dtype()))?
        .into_dimensionality::<Ix2>()
        .ok()
        .filter(|s| s.nrows() == n_pair && s.ncols() == 3)
        .ok_or_else(|| DftioError::shape(shift_key, format!("({}, 3)", n_pair), shift_field.shape()))?;

    let n_cell = cells.len_of(Axis(0));
    if n_cell > 1 {
        let batch_field = must_have(data, BATCH_KEY)?;
        let batch = batch_field
            .to_indices(BATCH_KEY)?
            .into_dimensionality::<Ix1>()
            .ok()
            .filter(|b| b.len() == n_atom)
            .ok_or_else(|| DftioError::shape(BATCH_KEY, format!("({},)", n_atom), batch_field.shape()))?;

        for e in 0..n_pair {
            let graph = batch[index[[0, e]]];
            if graph >= n_cell {
                return Err(DftioError::IndexOutOfRange {
                    field: BATCH_KEY.to_string(),
                    index: graph as i64,
                    bound: n_cell,
                });
            }
            add_shift(
                vectors.row_mut(e),
                shifts.row(e),
                cells.index_axis(Axis(0), graph),
            );
        }
    } else {
        let cell = cells.index_axis(Axis(0), 0);
        for e in 0..n_pair {
            add_shift(vectors.row_mut(e), shifts.row(e), cell);
        }
    }

    Ok(vectors)
}

/// 读取晶格并整理为 `(n_cell, 3, 3)`；缺失或全零时返回 `None`
fn periodic_cells<T: Real>(data: &Record) -> Result<Option<Array3<T>>> {
    let field = match data.get(CELL_KEY) {
        Some(field) => field,
        None => return Ok(None),
    };
    let cell = T::view(field)
        .ok_or_else(|| DftioError::dtype(CELL_KEY, T::DTYPE.to_string(), field.dtype()))?;

    let magnitude: f64 = cell.iter().map(|v| v.abs().as_f64()).sum();
    if magnitude <= ZERO_CELL_TOLERANCE {
        return Ok(None);
    }

    if cell.len() % 9 != 0 {
        return Err(DftioError::shape(CELL_KEY, "(n_cell, 3, 3)", cell.shape()));
    }
    let values: Vec<T> = cell.iter().copied().collect();
    let cells = Array3::from_shape_vec((values.len() / 9, 3, 3), values)
        .map_err(|_| DftioError::shape(CELL_KEY, "(n_cell, 3, 3)", cell.shape()))?;
    Ok(Some(cells))
}

/// `row += shift · cell`
fn add_shift<T: Real>(mut row: ArrayViewMut1<T>, shift: ArrayView1<T>, cell: ArrayView2<T>) {
    for j in 0..3 {
        let mut acc = T::zero();
        for i in 0..3 {
            acc += shift[i] * cell[[i, j]];
        }
        row[j] += acc;
    }
}

fn row_norms<T: Real>(vectors: &Array2<T>) -> Array1<T> {
    vectors.map_axis(Axis(1), |row| {
        row.iter().fold(T::zero(), |acc, &x| acc + x * x).sqrt()
    })
}

/// 对已有向量字段沿最后一维求模
fn field_lengths(vectors: &Field, key: &str) -> Result<Field> {
    let last = vectors
        .ndim()
        .checked_sub(1)
        .ok_or_else(|| DftioError::shape(key, "(n_pair, 3)", vectors.shape()))?;
    match vectors {
        Field::Float32(v) => Ok(Field::from(
            v.map_axis(Axis(last), |r| r.iter().fold(0.0f32, |acc, &x| acc + x * x).sqrt()),
        )),
        Field::Float64(v) => Ok(Field::from(
            v.map_axis(Axis(last), |r| r.iter().fold(0.0f64, |acc, &x| acc + x * x).sqrt()),
        )),
        other => Err(DftioError::dtype(key, "float32 or float64", other.dtype())),
    }
}
