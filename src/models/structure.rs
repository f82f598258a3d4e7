//! # 原子结构数据模型
//!
//! 定义通用的原子结构对象 [`Atoms`]（单帧），作为各 DFT 后端与结构记录之间的中间表示。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `writers/` 使用
//! - 使用 `models/elements.rs`

use super::elements;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 晶格参数表示
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 全零晶格（非周期体系）
    pub fn zero() -> Self {
        Lattice {
            matrix: [[0.0; 3]; 3],
        }
    }

    /// 计算晶格体积
    pub fn volume(&self) -> f64 {
        let a = self.matrix[0];
        let b = self.matrix[1];
        let c = self.matrix[2];

        // 行列式计算
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 所有矩阵元绝对值之和
    pub fn magnitude(&self) -> f64 {
        self.matrix.iter().flatten().map(|v| v.abs()).sum()
    }

    /// 分数坐标转笛卡尔坐标
    pub fn frac_to_cart(&self, frac: [f64; 3]) -> [f64; 3] {
        let m = &self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }
}

/// 单帧原子结构：原子序数、笛卡尔坐标、晶格与周期性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atoms {
    /// 原子序数
    pub numbers: Vec<i32>,

    /// 笛卡尔坐标 (Å)
    pub positions: Vec<[f64; 3]>,

    /// 晶格
    pub cell: Lattice,

    /// 三个晶格方向的周期性
    pub pbc: [bool; 3],
}

impl Atoms {
    pub fn new(numbers: Vec<i32>, positions: Vec<[f64; 3]>, cell: Lattice, pbc: [bool; 3]) -> Self {
        Atoms {
            numbers,
            positions,
            cell,
            pbc,
        }
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// 元素符号列表，未知原子序数记为 `X`
    pub fn symbols(&self) -> Vec<&'static str> {
        self.numbers
            .iter()
            .map(|&z| elements::symbol(z).unwrap_or("X"))
            .collect()
    }

    /// Hill 体系化学式
    pub fn formula(&self) -> String {
        hill_formula(&self.numbers)
    }
}

/// 按 Hill 体系生成化学式
///
/// 含碳时 C 在前、H 次之，其余按字母序；不含碳时全部按字母序。计数为 1 时省略。
pub fn hill_formula(numbers: &[i32]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &z in numbers {
        *counts.entry(elements::symbol(z).unwrap_or("X")).or_insert(0) += 1;
    }

    let mut ordered: Vec<(&str, usize)> = Vec::with_capacity(counts.len());
    if counts.contains_key("C") {
        for head in ["C", "H"] {
            if let Some(count) = counts.remove(head) {
                ordered.push((head, count));
            }
        }
    }
    ordered.extend(counts);

    ordered
        .into_iter()
        .map(|(el, count)| {
            if count == 1 {
                el.to_string()
            } else {
                format!("{}{}", el, count)
            }
        })
        .collect::<Vec<_>>()
        .join("")
}
