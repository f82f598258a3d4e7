//! # 文本数组写出
//!
//! 与 `numpy.savetxt` 默认输出逐字节一致：浮点数 `%.18e`（指数至少两位、带符号），
//! 列之间单个空格，每行以 `\n` 结尾；整数用 `%d`。
//!
//! ## 依赖关系
//! - 被 `writers/directory.rs` 使用

use crate::data::keys::*;
use crate::data::{Field, Record};
use crate::error::{DftioError, Result};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 按 `%.18e` 格式化浮点数
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let raw = format!("{:.18e}", value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => raw,
    }
}

/// 把数组按 `n_cols` 列写成文本（`reshape(-1, n_cols)` 后逐行）
pub fn write_float_rows<I>(path: &Path, values: I, n_cols: usize) -> Result<()>
where
    I: IntoIterator<Item = f64>,
{
    write_lines(path, |out| {
        let mut column = 0;
        for value in values {
            if column > 0 {
                out.write_all(b" ")?;
            }
            out.write_all(format_float(value).as_bytes())?;
            column += 1;
            if column == n_cols {
                out.write_all(b"\n")?;
                column = 0;
            }
        }
        if column > 0 {
            out.write_all(b"\n")?;
        }
        Ok(())
    })
}

/// 每行一个整数
pub fn write_int_lines<I>(path: &Path, values: I) -> Result<()>
where
    I: IntoIterator<Item = i64>,
{
    write_lines(path, |out| {
        for value in values {
            writeln!(out, "{}", value)?;
        }
        Ok(())
    })
}

/// 写出结构记录的四个文本文件：`cell.dat`, `positions.dat`, `atomic_numbers.dat`, `pbc.dat`
pub fn write_structure_text(structure: &Record, out_dir: &Path) -> Result<()> {
    let cell = structure[CELL_KEY].expect_f32(CELL_KEY)?;
    let pos = structure[POSITIONS_KEY].expect_f32(POSITIONS_KEY)?;
    let numbers = structure[ATOMIC_NUMBERS_KEY].expect_i32(ATOMIC_NUMBERS_KEY)?;

    write_float_rows(&out_dir.join("cell.dat"), cell.iter().map(|&v| v as f64), 3)?;
    write_float_rows(&out_dir.join("positions.dat"), pos.iter().map(|&v| v as f64), 3)?;
    write_int_lines(
        &out_dir.join("atomic_numbers.dat"),
        numbers.iter().map(|&z| z as i64),
    )?;
    write_float_rows(&out_dir.join("pbc.dat"), bool_values(&structure[PBC_KEY])?, 1)?;
    Ok(())
}

fn bool_values(field: &Field) -> Result<Vec<f64>> {
    let flags = field.expect_bool(PBC_KEY)?;
    Ok(flags.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect())
}

fn write_lines<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let to_error = |e| DftioError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    };
    let file = File::create(path).map_err(to_error)?;
    let mut out = BufWriter::new(file);
    body(&mut out).map_err(to_error)?;
    out.flush().map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_format_float_matches_savetxt() {
        assert_eq!(format_float(1.0), "1.000000000000000000e+00");
        assert_eq!(format_float(0.0), "0.000000000000000000e+00");
        assert_eq!(format_float(-2.5e-3), "-2.500000000000000052e-03");
        assert_eq!(format_float(1.5e120), "1.500000000000000113e+120");
        assert_eq!(format_float(f64::NAN), "nan");
    }

    #[test]
    fn test_float32_value_is_widened() {
        // float32 的 0.1 在 numpy.savetxt 中显示为其精确十进制展开
        assert_eq!(format_float(0.1f32 as f64), "1.000000014901161194e-01");
    }

    #[test]
    fn test_write_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cell.dat");
        write_float_rows(&path, vec![1.0, 0.0, 0.0, 0.0, 2.0, 0.0], 3).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "0.000000000000000000e+00 2.000000000000000000e+00 0.000000000000000000e+00"
        );
    }

    #[test]
    fn test_write_int_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atomic_numbers.dat");
        write_int_lines(&path, vec![14, 8, 8]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "14\n8\n8\n");
    }
}
