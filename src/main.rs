//! webbaboon 命令行入口
//!
//! 示例：webbaboon -u example.com -m 5

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use webbaboon::{
    normalize_target_url, ConfigManager, CrawlOrchestrator, RuleLoader, StaticHttpService, TechDetector,
};

/// 网站技术栈检测
#[derive(Parser, Debug)]
#[command(name = "webbaboon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 目标URL（缺省协议时使用 https://）
    #[arg(short, long)]
    url: String,

    /// 最多访问的页面数
    #[arg(short = 'm', long = "max-depth", visible_alias = "max-pages", default_value_t = 1)]
    max_depth: usize,

    /// 技术特征库文件
    #[arg(short, long, default_value = "technologies.json")]
    technologies: PathBuf,

    /// 以JSON输出结果
    #[arg(long)]
    json: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,

    /// 页面间隔（毫秒）
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// 页面加载超时（秒）
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let target = normalize_target_url(&cli.url).context("目标URL无效")?;
    let config = ConfigManager::custom()
        .max_pages(cli.max_depth)
        .crawl_delay(Duration::from_millis(cli.delay_ms))
        .page_load_timeout(Duration::from_secs(cli.timeout))
        .technologies_path(cli.technologies)
        .build();

    let db = RuleLoader::load_file(&config.technologies_path)
        .await
        .with_context(|| format!("无法加载特征库 {}", config.technologies_path.display()))?;
    let detector = TechDetector::new(&db);
    let mut service = StaticHttpService::new(&config).context("无法创建页面服务")?;

    let report = CrawlOrchestrator::new(config, detector)
        .crawl(&target, &mut service)
        .await
        .into_report();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_empty() {
        println!("No technologies detected.");
    } else {
        for tech in &report {
            println!("{}", tech);
        }
    }

    Ok(())
}

// 日志写入 stderr，stdout 只输出报告
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
