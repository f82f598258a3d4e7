//! # 字段名注册表
//!
//! 后端、数据模型与写出器之间共享的字段名。所有记录都以这些字符串为键，
//! 同一概念只有一个名字。新增派生量时在此处添加一个常量，并加入 [`ALL_KEYS`]。
//!
//! ## 依赖关系
//! - 被 `data/`, `parsers/`, `writers/` 使用
//! - 无外部模块依赖

// ─────────────────────────────────────────────────────────────
// 结构
// ─────────────────────────────────────────────────────────────

/// 原子坐标，结构记录 `(n_frame, n_atom, 3)`，图记录 `(n_atom, 3)`
pub const POSITIONS_KEY: &str = "pos";
/// 晶格矩阵，行向量为晶格矢量
pub const CELL_KEY: &str = "cell";
/// 三个晶格方向的周期性标记
pub const PBC_KEY: &str = "pbc";
/// 原子序数 `(n_atom,)`
pub const ATOMIC_NUMBERS_KEY: &str = "atomic_numbers";

// ─────────────────────────────────────────────────────────────
// 图：边 / 环境 / 在位环境
// ─────────────────────────────────────────────────────────────

pub const EDGE_INDEX_KEY: &str = "edge_index";
pub const EDGE_CELL_SHIFT_KEY: &str = "edge_cell_shift";
pub const EDGE_VECTORS_KEY: &str = "edge_vectors";
pub const EDGE_LENGTH_KEY: &str = "edge_lengths";

pub const ENV_INDEX_KEY: &str = "env_index";
pub const ENV_CELL_SHIFT_KEY: &str = "env_cell_shift";
pub const ENV_VECTORS_KEY: &str = "env_vectors";
pub const ENV_LENGTH_KEY: &str = "env_lengths";

pub const ONSITENV_INDEX_KEY: &str = "onsitenv_index";
pub const ONSITENV_CELL_SHIFT_KEY: &str = "onsitenv_cell_shift";
pub const ONSITENV_VECTORS_KEY: &str = "onsitenv_vectors";
pub const ONSITENV_LENGTH_KEY: &str = "onsitenv_lengths";

// ─────────────────────────────────────────────────────────────
// 批处理
// ─────────────────────────────────────────────────────────────

/// 每个原子所属的图编号 `(n_atom,)`
pub const BATCH_KEY: &str = "batch";
/// 原子顺序上的前缀偏移 `(n_graph + 1,)`
pub const BATCH_PTR_KEY: &str = "ptr";

// ─────────────────────────────────────────────────────────────
// 电子结构
// ─────────────────────────────────────────────────────────────

/// 能量本征值 `(n_frame, n_kpoint, n_band)`
pub const ENERGY_EIGENVALUE_KEY: &str = "eigenvalue";
/// k 点 `(n_kpoint, 3)`
pub const KPOINT_KEY: &str = "kpoint";

pub const HAMILTONIAN_KEY: &str = "hamiltonian";
pub const OVERLAP_KEY: &str = "overlap";
pub const DENSITY_MATRIX_KEY: &str = "density_matrix";

/// 在位、零平移的块键 `i_j_Rx_Ry_Rz`
pub const ONSITE_BLOCK_KEY: &str = "0_0_0_0_0";

/// 全部已注册字段名
pub const ALL_KEYS: &[&str] = &[
    POSITIONS_KEY,
    CELL_KEY,
    PBC_KEY,
    ATOMIC_NUMBERS_KEY,
    EDGE_INDEX_KEY,
    EDGE_CELL_SHIFT_KEY,
    EDGE_VECTORS_KEY,
    EDGE_LENGTH_KEY,
    ENV_INDEX_KEY,
    ENV_CELL_SHIFT_KEY,
    ENV_VECTORS_KEY,
    ENV_LENGTH_KEY,
    ONSITENV_INDEX_KEY,
    ONSITENV_CELL_SHIFT_KEY,
    ONSITENV_VECTORS_KEY,
    ONSITENV_LENGTH_KEY,
    BATCH_KEY,
    BATCH_PTR_KEY,
    ENERGY_EIGENVALUE_KEY,
    KPOINT_KEY,
    HAMILTONIAN_KEY,
    OVERLAP_KEY,
    DENSITY_MATRIX_KEY,
    ONSITE_BLOCK_KEY,
];

/// 块键 `i_j_Rx_Ry_Rz`
pub fn block_key(i: usize, j: usize, shift: [i32; 3]) -> String {
    format!("{}_{}_{}_{}_{}", i, j, shift[0], shift[1], shift[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let unique: HashSet<&str> = ALL_KEYS.iter().copied().collect();
        assert_eq!(unique.len(), ALL_KEYS.len());
    }

    #[test]
    fn test_block_key_format() {
        assert_eq!(block_key(0, 0, [0, 0, 0]), ONSITE_BLOCK_KEY);
        assert_eq!(block_key(3, 1, [-1, 0, 2]), "3_1_-1_0_2");
    }
}
