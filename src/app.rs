use anyhow::{Context, Result};
use clap::Parser;
use sqllog_inject::{
    config::Config,
    process::{RenderOptions, process_all, process_with, read_input, render},
};
use std::path::PathBuf;

/// 从 SQLAlchemy 引擎日志中还原带参数的 SQL
#[derive(Debug, Parser)]
#[command(name = "sqllog-inject", version, about)]
pub struct Cli {
    /// 日志文件路径，省略或为 `-` 时读取标准输入
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// 处理所有日志条目，而不只是第一条
    #[arg(long)]
    pub all: bool,

    /// 以 JSON 输出完整的解析结果
    #[arg(long)]
    pub json: bool,

    /// 同时输出注入前的 SQL
    #[arg(long)]
    pub original: bool,

    /// TOML 配置文件
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 输出引擎调试日志
    #[arg(long)]
    pub debug: bool,

    /// 日志头之后查找 SQL 和参数的行数
    #[arg(long, value_name = "N")]
    pub lookahead: Option<usize>,

    /// 没有日志头时不按裸 SQL 处理
    #[arg(long)]
    pub no_headerless: bool,
}

impl Cli {
    /// 读取配置文件并叠加命令行参数
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match self.config.as_deref() {
            Some(path) => Config::from_file(path).with_context(|| {
                format!("读取配置文件失败: {}", path.display())
            })?,
            None => Config::default(),
        };

        if self.debug {
            config.engine.debug = true;
        }
        if let Some(lookahead) = self.lookahead {
            config.engine.lookahead = lookahead;
        }
        if self.no_headerless {
            config.engine.allow_headerless = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// 执行一次处理，返回是否产生了至少一条 SQL
pub fn run(cli: &Cli) -> Result<bool> {
    let config = cli.load_config()?;

    #[cfg(feature = "logging")]
    sqllog_inject::logging::init_logging(config.log_config())?;

    let text = read_input(cli.input.as_deref()).with_context(|| {
        cli.input.as_ref().map_or_else(
            || "读取标准输入失败".to_string(),
            |p| format!("读取输入失败: {}", p.display()),
        )
    })?;

    let results = if cli.all {
        process_all(&text, &config.engine)
    } else {
        process_with(&text, &config.engine).into_iter().collect()
    };

    #[cfg(feature = "logging")]
    tracing::debug!(statements = results.len(), "处理完成");

    if results.is_empty() {
        #[cfg(feature = "logging")]
        tracing::warn!("输入中没有找到可识别的 SQL");
        return Ok(false);
    }

    let options = RenderOptions { json: cli.json, show_original: cli.original };
    print!("{}", render(&results, options)?);
    Ok(true)
}
