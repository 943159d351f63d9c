//! `archmage-cli` – Archmage game server launcher
//!
//! This binary boots the gesture-to-spell game server. It:
//!
//! 1. Installs structured logging (and OTLP export when configured).
//! 2. Loads `~/.archmage/config.toml`, writing the defaults on first run.
//! 3. Builds the configured pose classifier, reporting a degraded model.
//! 4. Serves the HTTP + WebSocket game API until **Ctrl-C**.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use archmage_perception::{ClassifierStrategy, build_classifier};
use archmage_runtime::SessionRegistry;
use archmage_server::ArchmageServer;
use colored::Colorize;
use tokio::sync::Notify;
use tracing::{info, warn};

fn main() -> ExitCode {
    // Held for the whole process; flushes spans on drop.
    let _telemetry = archmage_runtime::init_tracing("archmage");

    print_banner();

    let cfg = load_config();
    print_summary(&cfg);

    let classifier = build_classifier(cfg.classifier, cfg.model_path.as_deref());
    if cfg.classifier == ClassifierStrategy::Model && classifier.strategy() != ClassifierStrategy::Model {
        println!(
            "  {} model unavailable, classifying with finger-curl rules",
            "⚠".yellow().bold()
        );
    }

    let registry = Arc::new(SessionRegistry::new(cfg.game_config(), classifier));

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(Notify::new());
    let shutdown_signal = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());
        // `notify_one` stores a permit if the server is not waiting yet.
        shutdown_signal.notify_one();
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: {}", "Failed to start async runtime".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let server = ArchmageServer::new(registry).with_port(cfg.port);
    println!(
        "  Listening on {}  (Ctrl-C to stop)\n",
        format!("http://localhost:{}", cfg.port).bold().cyan()
    );

    let result = runtime.block_on(server.run_until(async move { shutdown.notified().await }));
    match result {
        Ok(()) => {
            println!("{}", "  ✓ Archmage stopped.".green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}: {}", "Server error".red(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn print_summary(cfg: &config::Config) {
    info!(
        port = cfg.port,
        classifier = %cfg.classifier,
        cooldown_ms = cfg.cooldown_ms,
        max_mana = cfg.max_mana,
        "configuration resolved"
    );
    println!("  Classifier : {}", cfg.classifier.to_string().bold());
    println!("  Cooldown   : {} ms", cfg.cooldown_ms);
    println!(
        "  Mana       : {}/{} (+{}/s)",
        cfg.starting_mana, cfg.max_mana, cfg.mana_regen_per_sec
    );
    println!(
        "  Events     : every {}s, lasting {}s",
        cfg.event_cooldown_secs, cfg.event_duration_secs
    );
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"    _             _                          "#.bold().magenta());
    println!("{}", r#"   /_\  _ _ __| |_  _ __  __ _ __ _ ___     "#.bold().magenta());
    println!("{}", r#"  / _ \| '_/ _| ' \| '  \/ _` / _` / -_)    "#.bold().magenta());
    println!("{}", r#" /_/ \_\_| \__|_||_|_|_|_\__,_\__, \___|    "#.bold().magenta());
    println!("{}", r#"                              |___/          "#.bold().magenta());
    println!();
    println!(
        "  {} {}",
        "Archmage".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Hand-gesture spellcasting server");
    println!();
}
