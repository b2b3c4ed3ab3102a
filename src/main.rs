//! WebSage - 终端对话入口
//!
//! 初始化日志、加载配置、创建会话 Agent，然后逐行读取 stdin 对话。
//! 命令：`/new` 新对话（清空记忆），`/history` 查看历史，`/quit` 退出。

use std::io::Write;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use websage::config::{load_config, AppConfig};
use websage::tools::SearchClient;
use websage::{observability, Agent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    let mut agent = Agent::from_config(&cfg).context("Failed to create agent")?;

    let name = cfg.app.name.as_deref().unwrap_or("WebSage");
    println!("{} - type a message, /new for a new chat, /quit to exit", name);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                agent.clear_memory();
                println!("(new conversation)");
            }
            "/history" => println!("{}", agent.memory().get_formatted_history()),
            _ => {
                let reply = agent.process_message(input).await;
                println!("\n{}\n", reply.response);
                if let Some(results) = &reply.search_results {
                    println!("[search]\n{}", SearchClient::format_results(results));
                }
            }
        }
    }

    Ok(())
}
