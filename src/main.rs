use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use atlas::db::{self, DbPool};
use atlas::engine::{background, simulator};
use atlas::{AppConfig, AppError};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // .env is optional; a missing file is fine.
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let _log_guard = atlas::logging::init(&config.log_dir())?;
    atlas::logging::install_panic_hook();

    tracing::info!("Starting Atlas assistant v{}", env!("CARGO_PKG_VERSION"));

    let pool = db::init_db(&config.data_dir)?;

    let scheduler = Arc::new(background::SchedulerState::new());
    background::start_loops(scheduler.clone(), pool.clone(), config.bill_reminder_policy);

    println!("Atlas: assistente pessoal");
    println!("Envie mensagens como: <telefone> <texto>");
    println!("Exemplo: 5511999990000 pagar conta de luz dia 10");
    println!("Ctrl+C para sair.\n");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&pool, &line),
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    background::stop_loops(&scheduler);
    tracing::info!("Atlas assistant shut down");
    Ok(())
}

/// One line of input: `<phone> <message text>`.
fn handle_line(pool: &DbPool, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let (phone, text) = match line.split_once(char::is_whitespace) {
        Some(parts) => parts,
        None => {
            println!("Uso: <telefone> <mensagem>");
            return;
        }
    };

    match simulator::handle_inbound(pool, phone, text) {
        Ok(outcome) => println!("{}", outcome.reply),
        Err(e) => {
            tracing::error!("Failed to handle message: {}", e);
            println!("Erro ao processar a mensagem.");
        }
    }
}
