//! # 批量执行器
//!
//! 对后端的全部下标并行执行写出任务。
//!
//! ## 功能
//! - 基于 rayon 的局部线程池
//! - 进度条显示
//! - 按下标收集结果，失败不打断其余帧
//!
//! ## 依赖关系
//! - 被 `commands/parse.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{DftioError, Result};
use crate::utils::{output, progress};

use rayon::prelude::*;
use serde::Serialize;

/// 单个下标的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessResult {
    /// 处理成功，附输出位置
    Success(String),
    /// 处理失败，附错误信息
    Failed(String),
}

impl ProcessResult {
    pub fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(v) => ProcessResult::Success(v),
            Err(e) => ProcessResult::Failed(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessResult::Success(_))
    }
}

/// 清单中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestRow {
    pub idx: usize,
    pub source: String,
    pub status: &'static str,
    pub message: String,
}

/// 批量处理结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    pub success: usize,
    pub failed: usize,
    /// 按下标排序的结果
    pub outcomes: Vec<(usize, ProcessResult)>,
}

impl BatchResult {
    /// 合并处理结果
    pub fn merge(&mut self, idx: usize, result: ProcessResult) {
        match &result {
            ProcessResult::Success(_) => self.success += 1,
            ProcessResult::Failed(_) => self.failed += 1,
        }
        self.outcomes.push((idx, result));
    }

    pub fn total(&self) -> usize {
        self.success + self.failed
    }

    /// 失败的下标与错误信息
    pub fn failures(&self) -> impl Iterator<Item = (usize, &str)> {
        self.outcomes.iter().filter_map(|(idx, r)| match r {
            ProcessResult::Failed(msg) => Some((*idx, msg.as_str())),
            ProcessResult::Success(_) => None,
        })
    }

    /// 清单行，`source` 由调用方按下标给出
    pub fn manifest<F>(&self, source: F) -> Vec<ManifestRow>
    where
        F: Fn(usize) -> String,
    {
        self.outcomes
            .iter()
            .map(|(idx, r)| {
                let (status, message) = match r {
                    ProcessResult::Success(out) => ("ok", out.clone()),
                    ProcessResult::Failed(err) => ("failed", err.clone()),
                };
                ManifestRow {
                    idx: *idx,
                    source: source(*idx),
                    status,
                    message,
                }
            })
            .collect()
    }

    /// 有失败时转为 `BatchFailed`
    pub fn into_result(self) -> Result<Self> {
        if self.failed > 0 {
            Err(DftioError::BatchFailed {
                failed: self.failed,
                total: self.total(),
            })
        } else {
            Ok(self)
        }
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    show_progress: bool,
}

impl BatchRunner {
    /// `jobs == 0` 时使用全部核心
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self {
            jobs,
            show_progress: true,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理 `0..total`
    pub fn run<F>(&self, total: usize, processor: F) -> Result<BatchResult>
    where
        F: Fn(usize) -> ProcessResult + Sync + Send,
    {
        let pb = if self.show_progress {
            progress::create_progress_bar(total as u64, "Writing")
        } else {
            indicatif::ProgressBar::hidden()
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| DftioError::Other(format!("Failed to build thread pool: {}", e)))?;

        let results: Vec<ProcessResult> = pool.install(|| {
            (0..total)
                .into_par_iter()
                .map(|idx| {
                    let result = processor(idx);
                    if let ProcessResult::Failed(msg) = &result {
                        pb.suspend(|| output::print_error(&format!("[{}] {}", idx, msg)));
                    }
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for (idx, result) in results.into_iter().enumerate() {
            batch_result.merge(idx, result);
        }

        Ok(batch_result)
    }
}
