//! # VASP POSCAR 格式解析器
//!
//! 解析 VASP 5 格式的 POSCAR/CONTCAR 文件，输出笛卡尔坐标的 [`Atoms`]。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor（负值表示目标体积，也可给三个分量）
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/vasp/mod.rs` 使用
//! - 使用 `models/structure.rs`, `models/elements.rs`

use crate::error::{DftioError, Result};
use crate::models::{elements, Atoms, Lattice};
use std::fs;
use std::path::Path;

/// 解析 POSCAR/CONTCAR 文件
pub fn read_poscar(path: &Path) -> Result<Atoms> {
    if !path.is_file() {
        return Err(DftioError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| DftioError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, source: &str) -> Result<Atoms> {
    let fail = |reason: String| DftioError::ParseError {
        format: "poscar".to_string(),
        path: source.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 8 {
        return Err(fail("File too short".to_string()));
    }

    // Line 1: Scaling factor
    let scale: Vec<f64> = lines[1]
        .split_whitespace()
        .map(|s| s.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| fail(format!("Invalid scaling factor: '{}'", lines[1].trim())))?;

    // Lines 2-4: Lattice vectors
    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts = parse_vector(lines[2 + i])
            .ok_or_else(|| fail(format!("Invalid lattice vector at line {}", 3 + i)))?;
        *row = parts;
    }

    // 每个笛卡尔分量的缩放系数
    let factors = match scale.as_slice() {
        [s] if *s < 0.0 => {
            // 负值为目标体积
            let volume = Lattice::from_vectors(matrix).volume().abs();
            if volume < 1e-12 {
                return Err(fail("Degenerate lattice with volume scaling".to_string()));
            }
            [(s.abs() / volume).cbrt(); 3]
        }
        [s] => [*s; 3],
        [sx, sy, sz] => [*sx, *sy, *sz],
        _ => return Err(fail(format!("Invalid scaling factor: '{}'", lines[1].trim()))),
    };
    let matrix = matrix.map(|row| scaled(row, factors));
    let lattice = Lattice::from_vectors(matrix);

    // Line 5: Element symbols (VASP 5+)
    let symbols: Vec<&str> = lines[5].split_whitespace().collect();
    if symbols.is_empty() || symbols[0].parse::<i32>().is_ok() {
        return Err(fail(
            "Element symbols are required on line 6 (VASP 5 format)".to_string(),
        ));
    }
    let numbers_per_species = symbols
        .iter()
        .map(|s| elements::atomic_number(s).ok_or_else(|| fail(format!("Unknown element '{}'", s))))
        .collect::<Result<Vec<i32>>>()?;

    // Line 6: Counts
    let counts: Vec<usize> = lines[6]
        .split_whitespace()
        .map(|s| s.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| fail(format!("Invalid atom counts: '{}'", lines[6].trim())))?;
    if counts.len() != symbols.len() {
        return Err(fail(format!(
            "{} element symbols but {} atom counts",
            symbols.len(),
            counts.len()
        )));
    }

    // Check for "Selective dynamics" line
    let mut coord_line = 7;
    if lines[coord_line].trim().to_lowercase().starts_with('s') {
        coord_line += 1;
    }

    // Coordinate type line
    if lines.len() <= coord_line {
        return Err(fail("Missing coordinate type line".to_string()));
    }
    let coord_type = lines[coord_line].trim().to_lowercase();
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    // Parse atom positions
    let n_atom: usize = counts.iter().sum();
    let mut numbers = Vec::with_capacity(n_atom);
    let mut positions = Vec::with_capacity(n_atom);
    let mut line_idx = coord_line + 1;

    for (&z, &count) in numbers_per_species.iter().zip(counts.iter()) {
        for _ in 0..count {
            let vector = lines
                .get(line_idx)
                .and_then(|line| parse_vector(line))
                .ok_or_else(|| fail(format!("Invalid or missing position at line {}", line_idx + 1)))?;

            let cart = if is_cartesian {
                scaled(vector, factors)
            } else {
                lattice.frac_to_cart(vector)
            };

            numbers.push(z);
            positions.push(cart);
            line_idx += 1;
        }
    }

    Ok(Atoms::new(numbers, positions, lattice, [true; 3]))
}

/// 读取一行的前三个浮点数
fn parse_vector(line: &str) -> Option<[f64; 3]> {
    let parts: Vec<f64> = line
        .split_whitespace()
        .take(3)
        .map(|s| s.parse().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [x, y, z] => Some([*x, *y, *z]),
        _ => None,
    }
}

fn scaled(v: [f64; 3], factors: [f64; 3]) -> [f64; 3] {
    [v[0] * factors[0], v[1] * factors[1], v[2] * factors[2]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_poscar_vasp5() {
        let content = r#"NaCl
1.0
5.64 0.0 0.0
0.0 5.64 0.0
0.0 0.0 5.64
Na Cl
4 4
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
0.5 0.0 0.0
0.0 0.5 0.0
0.0 0.0 0.5
0.5 0.5 0.5
"#;
        let atoms = parse_poscar_content(content, "NaCl").unwrap();
        assert_eq!(atoms.len(), 8);
        assert_eq!(&atoms.numbers[..4], &[11, 11, 11, 11]);
        assert_eq!(&atoms.numbers[4..], &[17, 17, 17, 17]);
        assert_eq!(atoms.pbc, [true; 3]);

        // 分数坐标 (0.5, 0.5, 0.0) → 笛卡尔 (2.82, 2.82, 0.0)
        assert!((atoms.positions[1][0] - 2.82).abs() < 1e-9);
        assert!((atoms.positions[1][1] - 2.82).abs() < 1e-9);
        assert_eq!(atoms.formula(), "Cl4Na4");
    }

    #[test]
    fn test_parse_poscar_with_scale() {
        let content = r#"Si
2.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
Si
2
Direct
0.0 0.0 0.0
0.5 0.5 0.5
"#;
        let atoms = parse_poscar_content(content, "Si").unwrap();

        // 2.0 * 2.0 = 4.0
        assert!((atoms.cell.matrix[0][0] - 4.0).abs() < 1e-9);
        assert!((atoms.positions[1][2] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_poscar_negative_scale_is_volume() {
        let content = r#"Si
-64.0
1.0 0.0 0.0
0.0 1.0 0.0
0.0 0.0 1.0
Si
1
Cartesian
0.5 0.5 0.5
"#;
        let atoms = parse_poscar_content(content, "Si").unwrap();
        assert!((atoms.cell.volume() - 64.0).abs() < 1e-9);
        assert!((atoms.positions[0][0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_poscar_cartesian_scaled() {
        let content = r#"H2
1.5
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
H
2
Cartesian
0.0 0.0 0.0
0.0 0.0 0.5
"#;
        let atoms = parse_poscar_content(content, "H2").unwrap();
        assert!((atoms.positions[1][2] - 0.75).abs() < 1e-9);
        assert!((atoms.cell.matrix[2][2] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_poscar_selective_dynamics() {
        let content = r#"Fe with selective
1.0
2.87 0.0 0.0
0.0 2.87 0.0
0.0 0.0 2.87
Fe_pv
2
Selective dynamics
Direct
0.0 0.0 0.0 T T T
0.5 0.5 0.5 F F F
"#;
        let atoms = parse_poscar_content(content, "Fe").unwrap();
        assert_eq!(atoms.numbers, vec![26, 26]);
        assert!((atoms.positions[1][0] - 1.435).abs() < 1e-9);
    }

    #[test]
    fn test_parse_poscar_vasp4_rejected() {
        let content = r#"old
1.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
2
Direct
0.0 0.0 0.0
0.5 0.5 0.5
"#;
        let err = parse_poscar_content(content, "old").unwrap_err();
        assert!(err.to_string().contains("VASP 5"));
    }

    #[test]
    fn test_parse_poscar_truncated_positions() {
        let content = r#"Si
1.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
Si
3
Direct
0.0 0.0 0.0
0.5 0.5 0.5
"#;
        assert!(matches!(
            parse_poscar_content(content, "Si"),
            Err(DftioError::ParseError { .. })
        ));
    }
}
