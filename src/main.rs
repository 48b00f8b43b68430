//! mendbot CLI
//!
//! Minimal stdin/stdout driver for the conversation engine. Real deployments
//! sit behind their own transport and call the command facade directly.

use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use mendbot::commands::{chat, ChatRequest};
use mendbot::services::EngineConfig;
use mendbot::AppState;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "mendbot.json".to_string());
    let config = EngineConfig::load_or_default(Path::new(&config_path));

    let state = AppState::new(&config);
    {
        let state = state.clone();
        tokio::spawn(async move { state.load_search(config).await });
    }

    let session_id = Uuid::new_v4().to_string();
    println!("mendbot - clothing repair ordering agent");
    println!("Describe what needs fixing, or type 'quit' to exit.\n");

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "quit" | "exit") {
            break;
        }

        let request = ChatRequest {
            session_id: session_id.clone(),
            user_input: input.to_string(),
        };
        match chat(&state, request).await {
            Ok(turn) => {
                println!("\n{}\n", turn.response);
                if turn.show_services {
                    for (index, service) in turn.services.iter().enumerate() {
                        println!(
                            "  {}. {} - ${:.0} ({})",
                            index + 1,
                            service.service,
                            service.price,
                            service.repairer_type
                        );
                    }
                    println!();
                }
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
}
