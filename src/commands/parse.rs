//! # parse 命令实现
//!
//! 构建后端，对每个发现的下标并行写出，汇总结果。
//!
//! ## 功能
//! - 经注册表按名称构建后端
//! - 并行写出（`lmdb` 格式强制单作业）
//! - 可选 CSV 清单
//! - 任一帧失败时以非零状态退出
//!
//! ## 依赖关系
//! - 使用 `cli/parse.rs` 定义的参数
//! - 使用 `parsers/`, `writers/`, `batch/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::{BatchRunner, ManifestRow, ProcessResult};
use crate::cli::parse::ParseArgs;
use crate::error::{DftioError, Result};
use crate::parsers::{Parser, ParserRegistry, Root};
use crate::utils::{output, progress};
use crate::writers::OutputFormat;

use std::fs;
use std::path::Path;

/// 执行 parse 命令
pub fn execute(args: ParseArgs) -> Result<()> {
    output::print_header(&format!(
        "Parsing '{}' outputs to {} format",
        args.mode, args.format
    ));

    let registry = ParserRegistry::with_defaults();
    let root = match &args.root {
        Some(dir) if args.sources.is_empty() => Root::from(dir.as_path()),
        _ => Root::from(args.sources.clone()),
    };

    let spinner = progress::create_spinner("Reading frame sources");
    let parser = registry.build(&args.mode, root, &args.prefix);
    spinner.finish_and_clear();
    let parser = parser?;

    if parser.is_empty() {
        output::print_warning(&format!(
            "No frame sources matched '*{}*'",
            parser.sources().prefix()
        ));
        return Ok(());
    }
    output::print_info(&format!("Found {} frame source(s)", parser.len()));

    fs::create_dir_all(&args.outroot).map_err(|e| DftioError::FileWriteError {
        path: args.outroot.display().to_string(),
        source: e,
    })?;

    let jobs = effective_jobs(args.format, args.jobs);
    let options = args.write_options();
    let runner = BatchRunner::new(jobs);
    let result = runner.run(parser.len(), |idx| {
        ProcessResult::from_result(
            parser
                .write(idx, &args.outroot, &options)
                .map(|path| path.display().to_string()),
        )
    })?;

    if let Some(manifest) = &args.manifest {
        let rows = result.manifest(|idx| {
            parser
                .source(idx)
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        });
        write_manifest(manifest, &rows)?;
        output::print_success(&format!("Manifest saved to '{}'", manifest.display()));
    }

    output::print_separator();
    output::print_done(&format!(
        "Wrote {} of {} frame(s) to '{}'",
        result.success,
        result.total(),
        args.outroot.display()
    ));

    result.into_result().map(|_| ())
}

/// LMDB 存储只允许一个写入者
fn effective_jobs(format: OutputFormat, jobs: usize) -> usize {
    if format != OutputFormat::Lmdb {
        return jobs;
    }
    if jobs > 1 {
        output::print_warning(&format!(
            "lmdb output is written by a single job; ignoring --jobs {}",
            jobs
        ));
    }
    1
}

/// 写出 CSV 清单
pub fn write_manifest(path: &Path, rows: &[ManifestRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| DftioError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lmdb_forces_single_job() {
        assert_eq!(effective_jobs(OutputFormat::Lmdb, 8), 1);
        assert_eq!(effective_jobs(OutputFormat::Lmdb, 0), 1);
        assert_eq!(effective_jobs(OutputFormat::Dat, 8), 8);
        assert_eq!(effective_jobs(OutputFormat::Ase, 0), 0);
    }

    #[test]
    fn test_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.csv");
        let rows = vec![
            ManifestRow {
                idx: 0,
                source: "runs/Si".to_string(),
                status: "ok",
                message: "out/Si2.0".to_string(),
            },
            ManifestRow {
                idx: 1,
                source: "runs/NaCl".to_string(),
                status: "failed",
                message: "Missing required field 'pos'".to_string(),
            },
        ];
        write_manifest(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "idx,source,status,message");
        assert_eq!(lines[1], "0,runs/Si,ok,out/Si2.0");
        assert_eq!(lines[2], "1,runs/NaCl,failed,Missing required field 'pos'");
    }
}
