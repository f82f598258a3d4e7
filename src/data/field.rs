//! # 带类型的 n 维数组
//!
//! 记录中的每个值都是一个 [`Field`]：`ndarray::ArrayD` 加上 dtype 标签。
//! dtype 校验（int32 原子序数、float32 坐标等）依赖这个标签完成。
//!
//! ## 依赖关系
//! - 被 `data/`, `parsers/`, `writers/` 使用
//! - 使用 `ndarray`, `num-complex`, `serde`

use crate::error::{DftioError, Result};

use ndarray::{Array, ArrayD, ArrayViewD, Axis, Dimension, IxDyn};
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// 数组元素类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Complex64,
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DType::Bool => write!(f, "bool"),
            DType::Int32 => write!(f, "int32"),
            DType::Int64 => write!(f, "int64"),
            DType::Float32 => write!(f, "float32"),
            DType::Float64 => write!(f, "float64"),
            DType::Complex64 => write!(f, "complex64"),
        }
    }
}

/// 带 dtype 标签的动态维数组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    Bool(ArrayD<bool>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Complex64(ArrayD<Complex32>),
}

/// 对每个变体执行同一表达式
macro_rules! each_variant {
    ($field:expr, $a:ident => $body:expr) => {
        match $field {
            Field::Bool($a) => $body,
            Field::Int32($a) => $body,
            Field::Int64($a) => $body,
            Field::Float32($a) => $body,
            Field::Float64($a) => $body,
            Field::Complex64($a) => $body,
        }
    };
}

/// 对每个变体执行同一变换并保持变体
macro_rules! map_variant {
    ($field:expr, $a:ident => $body:expr) => {
        match $field {
            Field::Bool($a) => Field::Bool($body),
            Field::Int32($a) => Field::Int32($body),
            Field::Int64($a) => Field::Int64($body),
            Field::Float32($a) => Field::Float32($body),
            Field::Float64($a) => Field::Float64($body),
            Field::Complex64($a) => Field::Complex64($body),
        }
    };
}

macro_rules! typed_access {
    ($($variant:ident, $ty:ty, $as_fn:ident, $expect_fn:ident;)*) => {
        impl Field {
            $(
                pub fn $as_fn(&self) -> Option<&ArrayD<$ty>> {
                    match self {
                        Field::$variant(a) => Some(a),
                        _ => None,
                    }
                }

                /// 按 dtype 取出数组，类型不符时返回 `DtypeError`
                pub fn $expect_fn(&self, field: &str) -> Result<&ArrayD<$ty>> {
                    self.$as_fn().ok_or_else(|| {
                        DftioError::dtype(field, DType::$variant.to_string(), self.dtype())
                    })
                }
            )*
        }

        $(
            impl<D: Dimension> From<Array<$ty, D>> for Field {
                fn from(a: Array<$ty, D>) -> Self {
                    Field::$variant(a.into_dyn())
                }
            }
        )*
    };
}

typed_access! {
    Bool, bool, as_bool, expect_bool;
    Int32, i32, as_i32, expect_i32;
    Int64, i64, as_i64, expect_i64;
    Float32, f32, as_f32, expect_f32;
    Float64, f64, as_f64, expect_f64;
    Complex64, Complex32, as_c64, expect_c64;
}

impl Field {
    pub fn dtype(&self) -> DType {
        match self {
            Field::Bool(_) => DType::Bool,
            Field::Int32(_) => DType::Int32,
            Field::Int64(_) => DType::Int64,
            Field::Float32(_) => DType::Float32,
            Field::Float64(_) => DType::Float64,
            Field::Complex64(_) => DType::Complex64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        each_variant!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// 元素总数
    pub fn len(&self) -> usize {
        each_variant!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取第一维的第 `index` 个切片（例如多帧记录中的一帧）
    pub fn frame(&self, index: usize, field: &str) -> Result<Field> {
        let shape = self.shape();
        if shape.is_empty() {
            return Err(DftioError::shape(field, "at least one dimension", shape));
        }
        if index >= shape[0] {
            return Err(DftioError::IndexOutOfRange {
                field: field.to_string(),
                index: index as i64,
                bound: shape[0],
            });
        }
        Ok(map_variant!(self, a => a.index_axis(Axis(0), index).to_owned()))
    }

    /// 按逻辑顺序重排为新形状，元素总数必须一致
    pub fn reshape(&self, shape: &[usize], field: &str) -> Result<Field> {
        let err = || DftioError::shape(field, format!("{} elements", self.len()), shape);
        Ok(map_variant!(self, a => {
            let values = a.iter().cloned().collect::<Vec<_>>();
            Array::from_shape_vec(IxDyn(shape), values).map_err(|_| err())?
        }))
    }

    /// 把整数数组转换为非负下标
    pub fn to_indices(&self, field: &str) -> Result<ArrayD<usize>> {
        let bound = self.shape().first().copied().unwrap_or(0);
        let negative = |index: i64| DftioError::IndexOutOfRange {
            field: field.to_string(),
            index,
            bound,
        };
        match self {
            Field::Int32(a) => match a.iter().find(|&&v| v < 0) {
                Some(&v) => Err(negative(v as i64)),
                None => Ok(a.mapv(|v| v as usize)),
            },
            Field::Int64(a) => match a.iter().find(|&&v| v < 0) {
                Some(&v) => Err(negative(v)),
                None => Ok(a.mapv(|v| v as usize)),
            },
            other => Err(DftioError::dtype(field, "int32 or int64", other.dtype())),
        }
    }

    /// 按给定轴拼接同 dtype 的多个数组
    pub fn concatenate(field: &str, axis: usize, parts: &[&Field]) -> Result<Field> {
        Self::join(field, parts, JoinKind::Concatenate(axis))
    }

    /// 在新的第 0 维上堆叠同形状数组
    pub fn stack(field: &str, parts: &[&Field]) -> Result<Field> {
        Self::join(field, parts, JoinKind::Stack)
    }

    fn join(field: &str, parts: &[&Field], kind: JoinKind) -> Result<Field> {
        let first = parts.first().ok_or_else(|| DftioError::missing(field))?;
        let joined = match first {
            Field::Bool(_) => Field::Bool(join_typed(field, parts, Field::as_bool, kind)?),
            Field::Int32(_) => Field::Int32(join_typed(field, parts, Field::as_i32, kind)?),
            Field::Int64(_) => Field::Int64(join_typed(field, parts, Field::as_i64, kind)?),
            Field::Float32(_) => Field::Float32(join_typed(field, parts, Field::as_f32, kind)?),
            Field::Float64(_) => Field::Float64(join_typed(field, parts, Field::as_f64, kind)?),
            Field::Complex64(_) => Field::Complex64(join_typed(field, parts, Field::as_c64, kind)?),
        };
        Ok(joined)
    }
}

#[derive(Debug, Clone, Copy)]
enum JoinKind {
    Concatenate(usize),
    Stack,
}

fn join_typed<T, G>(field: &str, parts: &[&Field], get: G, kind: JoinKind) -> Result<ArrayD<T>>
where
    T: Clone,
    G: Fn(&Field) -> Option<&ArrayD<T>>,
{
    let mut views: Vec<ArrayViewD<'_, T>> = Vec::with_capacity(parts.len());
    for part in parts {
        let array = get(*part).ok_or_else(|| {
            DftioError::dtype(field, parts[0].dtype().to_string(), part.dtype())
        })?;
        views.push(array.view());
    }
    let joined = match kind {
        JoinKind::Concatenate(axis) => ndarray::concatenate(Axis(axis), &views),
        JoinKind::Stack => ndarray::stack(Axis(0), &views),
    };
    joined.map_err(|_| {
        DftioError::shape(field, "compatible shapes across records", parts[0].shape())
    })
}
