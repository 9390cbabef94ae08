// ==========================================
// 测试结果导入系统 - 命令行主入口
// ==========================================
// 子命令:
// - serve    启动 HTTP 上传服务
// - import   导入本地文件（每个文件独立成批）
// - init-db  建表
// - history  查看最近导入批次
// - config   查看 / 写入运行时配置
// ==========================================

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use test_result_import::app::{get_default_db_path, open_import_api};
use test_result_import::config::ImportConfigReader;
use test_result_import::{logging, web, APP_NAME, VERSION};

#[derive(Debug, Parser)]
#[command(name = "test-result-import", version, about = "测试结果导入服务")]
struct Cli {
    /// 数据库文件路径（默认按环境变量 / 用户数据目录解析）
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 启动 HTTP 上传服务
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// 导入一个或多个文件，输出 JSON 结果
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// 建表（幂等）
    InitDb,
    /// 查看最近导入批次
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// 查看或写入配置（如 import.sheet_layout=V1）
    Config {
        key: Option<String>,
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(get_default_db_path);

    tracing::info!("{} v{}", APP_NAME, VERSION);

    let api = open_import_api(&db_path).context("无法打开数据库")?;

    match cli.command {
        Command::Serve { addr } => {
            web::serve(api, addr).await?;
        }
        Command::Import { files } => {
            let results = api.import_files(files.clone()).await;
            let mut failed = 0usize;

            for (path, result) in files.iter().zip(results) {
                match result {
                    Ok(response) => {
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    }
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {}", path.display(), e);
                    }
                }
            }

            if failed > 0 {
                bail!("{} 个文件导入失败", failed);
            }
        }
        Command::InitDb => {
            // open_import_api 已完成建表
            println!("数据库已就绪: {}", db_path);
        }
        Command::History { limit } => {
            let batches = api.recent_batches(limit)?;
            println!("{}", serde_json::to_string_pretty(&batches)?);
        }
        Command::Config { key, value } => match (key, value) {
            (Some(key), Some(value)) => {
                api.config().set_config_value(&key, &value)?;
                println!("{} = {}", key, value);
            }
            (Some(key), None) => {
                let value = api.config().get_global_config_value(&key)?;
                println!("{} = {}", key, value.unwrap_or_else(|| "(未设置)".to_string()));
            }
            _ => {
                let settings = api.config().get_import_settings().await?;
                println!("{}", serde_json::to_string_pretty(&settings)?);

                let stored = api.config().get_config_snapshot()?;
                if !stored.is_empty() {
                    println!("已写入的配置:");
                    for (key, value) in stored {
                        println!("  {} = {}", key, value);
                    }
                }
            }
        },
    }

    Ok(())
}
