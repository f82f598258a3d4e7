//! # dftio - DFT 输出规范化工具
//!
//! ## 子命令
//! - `parse` - 用指定后端读取全部帧并写出 (hdf5, dat, ase, lmdb)
//! - `list`  - 列出已注册后端与输出格式
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   └── utils/      (日志与输出)
//! ```

use clap::Parser;
use dftio::cli::Cli;
use dftio::{commands, utils};

fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = utils::logger::init(cli.verbose) {
        utils::output::print_error(&format!("{}", e));
    }

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
