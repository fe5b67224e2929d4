// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use echo_dl::{cli::Cli, error::AppError, run_from_cli};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() {
    // 为 Windows 终端启用 ANSI 颜色支持。
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }
    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| "echo-dl".to_string());

    let after_help = format!(
        "示例:\n  # 列出所有课程\n  {bin} --list\n\n  # 下载两门课程的主视频源高清版本\n  {bin} -c COMP6843,COMP9417\n\n  # 同时下载两个视频源，保存到指定目录\n  {bin} -c COMP6843 -v 1:HD -v 2:HD -o ~/lectures\n\n  # 复用已登录的浏览器目录\n  {bin} --profile-dir ~/.echo-dl/chrome --list\n\n  # 查看登录说明\n  {bin} --login-help",
        bin = bin_name
    );

    let cmd = Cli::command().after_help(after_help);
    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };

    match run_from_cli(args).await {
        Ok(()) => {}
        Err(AppError::UserInterrupt) => {
            println!("\n{} 用户强制中断程序。", "[!]".yellow());
            std::process::exit(130);
        }
        Err(e) => {
            eprintln!("\n{} {}", "[X]".red(), format!("程序执行出错: {}", e).red());
            std::process::exit(1);
        }
    }
}
