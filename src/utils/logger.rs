//! # 终端日志
//!
//! 把 `log` 宏的记录按级别交给 `utils/output.rs` 的彩色前缀输出。
//!
//! | `-v` 次数 | 级别 |
//! |-----------|------|
//! | 0 | warn |
//! | 1 | info |
//! | 2 | debug |
//! | ≥3 | trace |
//!
//! ## 依赖关系
//! - 被 `main.rs` 安装
//! - 使用 `log`, `utils/output.rs`

use super::output;
use crate::error::{DftioError, Result};

use log::{Level, LevelFilter, Log, Metadata, Record};

struct TerminalLogger {
    level: LevelFilter,
}

impl Log for TerminalLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = record.args().to_string();
        match record.level() {
            Level::Error => output::print_error(&msg),
            Level::Warn => output::print_warning(&msg),
            Level::Info => output::print_info(&msg),
            Level::Debug | Level::Trace => {
                output::print_debug(&format!("{}: {}", record.target(), msg))
            }
        }
    }

    fn flush(&self) {}
}

/// 由 `-v` 次数得到日志级别
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// 安装全局日志器，只能调用一次
pub fn init(verbosity: u8) -> Result<()> {
    let level = level_for(verbosity);
    log::set_boxed_logger(Box::new(TerminalLogger { level }))
        .map_err(|e| DftioError::Other(format!("Failed to install logger: {}", e)))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }
}
