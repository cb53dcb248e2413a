//! Interactive RAG chat against a notarium backend.
//!
//! Usage:
//!   NOTARIUM_USERNAME=ada NOTARIUM_PASSWORD=secret cargo run --bin notarium
//!
//! Environment:
//!   NOTARIUM_API_BASE      backend base URL (default http://127.0.0.1:8080/api)
//!   NOTARIUM_USERNAME      account to sign in with
//!   NOTARIUM_PASSWORD      password for the account
//!   NOTARIUM_TOP_K         retrieval depth per question
//!   RUST_LOG               tracing filter (default "notarium=info")
//!
//! Inside the REPL, lines starting with `:` are commands; anything else is
//! sent as a question. Scope a question with `@Title` mentions, or set an
//! ambient scope with `:toggle <id>`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notarium_api::{ApiClient, AuthClient, ClientConfig, KnowledgeBaseClient, RagClient};
use notarium_chat::ChatSession;

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notarium=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_line() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(_) => None,
    }
}

fn print_bases(session: &ChatSession) {
    println!("Knowledge bases:");
    for kb in session.knowledge_bases() {
        let marker = if session.selection().contains(kb.id) {
            "*"
        } else {
            " "
        };
        println!("  {} [{}] {} ({} notes)", marker, kb.id, kb.title, kb.note_count);
    }
    println!("Scope: {}", session.selection_summary());
}

fn print_help() {
    println!("Commands:");
    println!("  :list          reload and show knowledge bases");
    println!("  :toggle <id>   toggle a knowledge base in the ambient scope");
    println!("  :scope         show the ambient scope");
    println!("  :help          this help");
    println!("  :quit          sign out and exit");
    println!("Anything else is sent as a question; @Title mentions scope it.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ClientConfig::from_env();
    let api = ApiClient::new(&config)?;
    let auth = AuthClient::new(api.clone());

    let username =
        std::env::var("NOTARIUM_USERNAME").context("NOTARIUM_USERNAME is not set")?;
    let password =
        std::env::var("NOTARIUM_PASSWORD").context("NOTARIUM_PASSWORD is not set")?;
    let login = auth.login(&username, &password).await?;
    println!("Signed in as {}", login.user.username);

    let directory = Arc::new(KnowledgeBaseClient::new(api.clone()));
    let rag = Arc::new(RagClient::new(api.clone()));
    let mut session = ChatSession::new(directory, rag, config.top_k);
    session.reload_directory().await?;
    print_bases(&session);
    println!("Type :help for commands.");

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = tokio::task::spawn_blocking(read_line).await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit" | ":q", _) => break,
            (":help", _) => print_help(),
            (":list", _) => {
                session.reload_directory().await?;
                print_bases(&session);
            }
            (":scope", _) => println!("Scope: {}", session.selection_summary()),
            (":toggle", rest) => match rest.trim().parse::<i64>() {
                Ok(id) => match session.toggle_selection(id) {
                    Ok(selected) => {
                        println!("{} {}", if selected { "Selected" } else { "Deselected" }, id);
                        println!("Scope: {}", session.selection_summary());
                    }
                    Err(e) => println!("{}", e),
                },
                Err(_) => println!("Usage: :toggle <id>"),
            },
            (command, _) if command.starts_with(':') => {
                println!("Unknown command {} (:help lists them)", command)
            }
            _ => match session.send(line).await {
                Ok(turn) => println!("{}", turn.rendered),
                Err(e) => println!("{}", e),
            },
        }
    }

    auth.logout().await.ok();
    println!("Signed out.");
    Ok(())
}
