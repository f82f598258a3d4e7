//! # 图记录合并
//!
//! 把若干单图记录合并为一个批处理记录：
//! - 原子级字段（坐标、原子序数）沿第 0 维拼接
//! - 原子对字段（平移、向量、长度）沿第 0 维拼接
//! - 下标字段沿第 1 维拼接，并加上前序图的原子数偏移
//! - 图级字段（晶格、周期性）在新的第 0 维堆叠
//! - 重新生成 `batch` 与 `ptr`
//!
//! ## 依赖关系
//! - 使用 `data/keys.rs`, `data/field.rs`

use crate::data::keys::*;
use crate::data::{must_have, Field, Record};
use crate::error::{DftioError, Result};

use ndarray::{Array1, Axis};
use std::collections::BTreeSet;

const NODE_KEYS: &[&str] = &[POSITIONS_KEY, ATOMIC_NUMBERS_KEY];

const PAIR_KEYS: &[&str] = &[
    EDGE_CELL_SHIFT_KEY,
    EDGE_VECTORS_KEY,
    EDGE_LENGTH_KEY,
    ENV_CELL_SHIFT_KEY,
    ENV_VECTORS_KEY,
    ENV_LENGTH_KEY,
    ONSITENV_CELL_SHIFT_KEY,
    ONSITENV_VECTORS_KEY,
    ONSITENV_LENGTH_KEY,
];

const INDEX_KEYS: &[&str] = &[EDGE_INDEX_KEY, ENV_INDEX_KEY, ONSITENV_INDEX_KEY];

/// 图级字段及其单图形状
const GRAPH_KEYS: &[(&str, &[usize])] = &[(CELL_KEY, &[3, 3]), (PBC_KEY, &[3])];

/// 合并单图记录为批处理记录
pub fn collate(records: &[Record]) -> Result<Record> {
    if records.is_empty() {
        return Err(DftioError::InvalidArgument(
            "cannot collate an empty list of records".to_string(),
        ));
    }

    let mut n_atoms = Vec::with_capacity(records.len());
    for record in records {
        let pos = must_have(record, POSITIONS_KEY)?;
        let n = *pos
            .shape()
            .first()
            .ok_or_else(|| DftioError::shape(POSITIONS_KEY, "(n_atom, 3)", pos.shape()))?;
        n_atoms.push(n);
    }

    let all_keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();

    let mut out = Record::new();
    for key in all_keys {
        if key == BATCH_KEY || key == BATCH_PTR_KEY {
            continue;
        }

        let parts = records
            .iter()
            .map(|r| must_have(r, key))
            .collect::<Result<Vec<&Field>>>()?;

        let joined = if NODE_KEYS.contains(&key) || PAIR_KEYS.contains(&key) {
            Field::concatenate(key, 0, &parts)?
        } else if INDEX_KEYS.contains(&key) {
            offset_indices(key, &parts, &n_atoms)?
        } else if let Some((_, shape)) = GRAPH_KEYS.iter().find(|(k, _)| *k == key) {
            let reshaped = parts
                .iter()
                .map(|p| p.reshape(shape, key))
                .collect::<Result<Vec<Field>>>()?;
            Field::stack(key, &reshaped.iter().collect::<Vec<_>>())?
        } else {
            log::debug!("Skipping field '{}' during collation", key);
            continue;
        };
        out.insert(key.to_string(), joined);
    }

    let mut batch = Vec::with_capacity(n_atoms.iter().sum());
    let mut ptr = Vec::with_capacity(n_atoms.len() + 1);
    ptr.push(0i64);
    for (graph, &n) in n_atoms.iter().enumerate() {
        batch.extend(std::iter::repeat(graph as i64).take(n));
        ptr.push(ptr[graph] + n as i64);
    }
    out.insert(BATCH_KEY.to_string(), Field::from(Array1::from(batch)));
    out.insert(BATCH_PTR_KEY.to_string(), Field::from(Array1::from(ptr)));

    Ok(out)
}

/// 下标加上前序图的原子数偏移后沿第 1 维拼接
fn offset_indices(key: &str, parts: &[&Field], n_atoms: &[usize]) -> Result<Field> {
    let mut shifted = Vec::with_capacity(parts.len());
    let mut offset = 0usize;
    for (part, &n) in parts.iter().zip(n_atoms) {
        let index = part.to_indices(key)?;
        if index.ndim() != 2 || index.len_of(Axis(0)) != 2 {
            return Err(DftioError::shape(key, "(2, n_pair)", part.shape()));
        }
        shifted.push(Field::from(index.mapv(|i| (i + offset) as i64)));
        offset += n;
    }
    Field::concatenate(key, 1, &shifted.iter().collect::<Vec<_>>())
}
