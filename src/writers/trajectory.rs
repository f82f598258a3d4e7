//! # 扩展 XYZ 轨迹写出
//!
//! 多帧结构逐帧写入同一个文件，通过一个带缓冲的句柄完成，最后一帧后刷新并关闭。
//!
//! ## 单帧格式
//! ```text
//! 2
//! Lattice="a1 a2 a3 b1 b2 b3 c1 c2 c3" Properties=species:S:1:pos:R:3 pbc="T T T"
//! Si       0.00000000       0.00000000       0.00000000
//! Si       1.35750000       1.35750000       1.35750000
//! ```
//!
//! ## 依赖关系
//! - 被 `writers/directory.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{DftioError, Result};
use crate::models::Atoms;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 轨迹写出器
pub struct TrajectoryWriter {
    path: String,
    out: BufWriter<File>,
    frames: usize,
}

impl TrajectoryWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| DftioError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(TrajectoryWriter {
            path: path.display().to_string(),
            out: BufWriter::new(file),
            frames: 0,
        })
    }

    /// 追加一帧
    pub fn write_frame(&mut self, atoms: &Atoms) -> Result<()> {
        let text = format_frame(atoms);
        self.out
            .write_all(text.as_bytes())
            .map_err(|e| self.io_error(e))?;
        self.frames += 1;
        Ok(())
    }

    /// 刷新并关闭，返回写入的帧数
    pub fn close(mut self) -> Result<usize> {
        self.out.flush().map_err(|e| self.io_error(e))?;
        Ok(self.frames)
    }

    fn io_error(&self, source: std::io::Error) -> DftioError {
        DftioError::FileWriteError {
            path: self.path.clone(),
            source,
        }
    }
}

/// 把全部帧写入一个轨迹文件
pub fn write_trajectory(frames: &[Atoms], path: &Path) -> Result<usize> {
    let mut writer = TrajectoryWriter::create(path)?;
    for atoms in frames {
        writer.write_frame(atoms)?;
    }
    writer.close()
}

fn format_frame(atoms: &Atoms) -> String {
    let mut text = String::new();
    text.push_str(&format!("{}\n", atoms.len()));

    let mut comment = Vec::new();
    if atoms.cell.magnitude() > 0.0 {
        let lattice: Vec<String> = atoms
            .cell
            .matrix
            .iter()
            .flatten()
            .map(|v| v.to_string())
            .collect();
        comment.push(format!("Lattice=\"{}\"", lattice.join(" ")));
    }
    comment.push("Properties=species:S:1:pos:R:3".to_string());
    let pbc: Vec<&str> = atoms
        .pbc
        .iter()
        .map(|&p| if p { "T" } else { "F" })
        .collect();
    comment.push(format!("pbc=\"{}\"", pbc.join(" ")));
    text.push_str(&comment.join(" "));
    text.push('\n');

    for (symbol, pos) in atoms.symbols().iter().zip(&atoms.positions) {
        text.push_str(&format!(
            "{:<2} {:16.8} {:16.8} {:16.8}\n",
            symbol, pos[0], pos[1], pos[2]
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Lattice;
    use std::fs;

    fn silicon(shift: f64) -> Atoms {
        Atoms::new(
            vec![14, 14],
            vec![[0.0, 0.0, 0.0], [1.3575 + shift, 1.3575, 1.3575]],
            Lattice::from_vectors([[0.0, 2.715, 2.715], [2.715, 0.0, 2.715], [2.715, 2.715, 0.0]]),
            [true, true, true],
        )
    }

    #[test]
    fn test_write_trajectory_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xdat.xyz");

        let n = write_trajectory(&[silicon(0.0), silicon(0.1)], &path).unwrap();
        assert_eq!(n, 2);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "2");
        assert!(lines[1].starts_with("Lattice=\"0 2.715 2.715 2.715 0 2.715"));
        assert!(lines[1].ends_with("pbc=\"T T T\""));
        assert!(lines[7].starts_with("Si"));
        assert!(lines[7].contains("1.45750000"));
    }

    #[test]
    fn test_non_periodic_frame_has_no_lattice() {
        let atoms = Atoms::new(vec![1], vec![[0.0; 3]], Lattice::zero(), [false; 3]);
        let text = format_frame(&atoms);
        assert!(!text.contains("Lattice"));
        assert!(text.contains("pbc=\"F F F\""));
    }
}
