//! # VASP EIGENVAL 解析器
//!
//! ## EIGENVAL 格式说明
//! ```text
//! 行 1-5   头部
//! 行 6     n_electron  n_kpoint  n_band
//! 行 7     空行
//! 之后对每个 k 点:
//!   kx ky kz weight          # 4 个数 → k 点
//!   band energy occupation   # n_band 行，第 2 个数为能量
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/vasp/mod.rs` 使用
//! - 使用 `regex`

use crate::data::keys::*;
use crate::data::{Field, Record};
use crate::error::{DftioError, Result};

use ndarray::{Array2, Array3};
use regex::Regex;
use std::fs;
use std::path::Path;

/// 数值记号（含科学计数法）
const NUMBER_PATTERN: &str = r"[0-9\-\.\+E]+";

/// 第一条 k 点数据所在行（从 0 计）
const DATA_START_LINE: usize = 7;

/// 解析后的 EIGENVAL 内容
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenval {
    /// k 点坐标 `(n_kpoint, 3)`
    pub kpoints: Vec<[f64; 3]>,
    /// 每个 k 点升序排列的能带能量 `(n_kpoint, n_band)`
    pub bands: Vec<Vec<f64>>,
    pub n_band: usize,
}

impl Eigenval {
    /// 转为本征值记录，丢弃下标小于 `band_index_min` 的能带
    pub fn to_record(&self, band_index_min: usize) -> Result<Record> {
        if band_index_min > self.n_band {
            return Err(DftioError::InvalidArgument(format!(
                "band_index_min {} exceeds the number of bands {}",
                band_index_min, self.n_band
            )));
        }
        if self.bands.len() != self.kpoints.len() {
            return Err(DftioError::InconsistentFrames(format!(
                "EIGENVAL lists {} k-point(s) but {} band set(s)",
                self.kpoints.len(),
                self.bands.len()
            )));
        }

        let n_k = self.kpoints.len();
        let kept = self.n_band - band_index_min;
        let eigs = Array3::from_shape_fn((1, n_k, kept), |(_, k, b)| {
            self.bands[k][band_index_min + b] as f32
        });
        let kpts = Array2::from_shape_fn((n_k, 3), |(k, c)| self.kpoints[k][c] as f32);

        let mut record = Record::new();
        record.insert(ENERGY_EIGENVALUE_KEY.to_string(), Field::from(eigs));
        record.insert(KPOINT_KEY.to_string(), Field::from(kpts));
        Ok(record)
    }
}

/// 读取 EIGENVAL 文件
pub fn read_eigenval(path: &Path) -> Result<Eigenval> {
    if !path.is_file() {
        return Err(DftioError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| DftioError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_eigenval_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 EIGENVAL
pub fn parse_eigenval_content(content: &str, source: &str) -> Result<Eigenval> {
    let fail = |reason: String| DftioError::ParseError {
        format: "eigenval".to_string(),
        path: source.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    let header = lines
        .get(5)
        .ok_or_else(|| fail("File too short".to_string()))?;

    // 第 6 行的第三个整数为能带数
    let integer = Regex::new(r"[0-9]+").map_err(|e| DftioError::Other(e.to_string()))?;
    let n_band: usize = integer
        .find_iter(header)
        .nth(2)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| fail(format!("Cannot read the number of bands from '{}'", header.trim())))?;
    if n_band == 0 {
        return Err(fail("Number of bands is zero".to_string()));
    }

    let number = Regex::new(NUMBER_PATTERN).map_err(|e| DftioError::Other(e.to_string()))?;
    let parse_f64 = |token: &str, line: usize| {
        token
            .parse::<f64>()
            .map_err(|_| fail(format!("Invalid number '{}' at line {}", token, line + 1)))
    };

    let mut kpoints = Vec::new();
    let mut bands = Vec::new();
    let mut current = Vec::with_capacity(n_band);

    for (i, line) in lines.iter().enumerate().skip(DATA_START_LINE) {
        let tokens: Vec<&str> = number.find_iter(line).map(|m| m.as_str()).collect();
        match tokens.len() {
            0 => continue,
            4 => kpoints.push([
                parse_f64(tokens[0], i)?,
                parse_f64(tokens[1], i)?,
                parse_f64(tokens[2], i)?,
            ]),
            1 => return Err(fail(format!("Unexpected line {}: '{}'", i + 1, line.trim()))),
            _ => {
                current.push(parse_f64(tokens[1], i)?);
                if current.len() == n_band {
                    current.sort_by(f64::total_cmp);
                    bands.push(std::mem::replace(&mut current, Vec::with_capacity(n_band)));
                }
            }
        }
    }

    if !current.is_empty() {
        return Err(fail(format!(
            "Incomplete band list: {} of {} energies for the last k-point",
            current.len(),
            n_band
        )));
    }

    Ok(Eigenval {
        kpoints,
        bands,
        n_band,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "    2    2    1    1
  0.1630018E+02  0.3840000E-09  0.3840000E-09  0.3840000E-09  0.5000000E-15
  1.000000000000000E-004
  CAR
 unknown system
     8     2     4

  0.0000000E+00  0.0000000E+00  0.0000000E+00  0.5000000E+00
    1       -5.712345   1.000000
    2        6.123456   1.000000
    3        2.500000   1.000000
    4        8.000000   0.000000

  0.5000000E+00  0.0000000E+00  0.0000000E+00  0.5000000E+00
    1       -4.000000   1.000000
    2        3.000000   1.000000
    3        5.500000   1.000000
    4        9.250000   0.000000
";

    #[test]
    fn test_parse_eigenval() {
        let eig = parse_eigenval_content(SAMPLE, "EIGENVAL").unwrap();
        assert_eq!(eig.n_band, 4);
        assert_eq!(eig.kpoints.len(), 2);
        assert_eq!(eig.kpoints[1], [0.5, 0.0, 0.0]);

        // 每个 k 点的能带升序
        assert_eq!(eig.bands[0], vec![-5.712345, 2.5, 6.123456, 8.0]);
        assert_eq!(eig.bands[1], vec![-4.0, 3.0, 5.5, 9.25]);
    }

    #[test]
    fn test_eigenvalue_record_band_min() {
        let eig = parse_eigenval_content(SAMPLE, "EIGENVAL").unwrap();
        let record = eig.to_record(1).unwrap();

        let eigs = record[ENERGY_EIGENVALUE_KEY].as_f32().unwrap();
        assert_eq!(eigs.shape(), &[1, 2, 3]);
        assert!((eigs[[0, 0, 0]] - 2.5).abs() < 1e-6);
        assert!((eigs[[0, 1, 2]] - 9.25).abs() < 1e-6);

        let kpts = record[KPOINT_KEY].as_f32().unwrap();
        assert_eq!(kpts.shape(), &[2, 3]);

        assert!(eig.to_record(5).is_err());
    }

    #[test]
    fn test_spin_polarized_uses_first_energy() {
        let content = SAMPLE.replace("   1.000000\n", "   1.000000   0.5   0.5\n");
        let eig = parse_eigenval_content(&content, "EIGENVAL").unwrap();
        assert_eq!(eig.bands[0][0], -5.712345);
    }

    #[test]
    fn test_incomplete_bands() {
        let truncated: String = SAMPLE.lines().take(15).collect::<Vec<_>>().join("\n");
        let err = parse_eigenval_content(&truncated, "EIGENVAL").unwrap_err();
        assert!(err.to_string().contains("Incomplete band list"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_eigenval(Path::new("/no/such/EIGENVAL")).unwrap_err();
        assert!(matches!(err, DftioError::FileNotFound { .. }));
    }
}
