use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use gmail_snooze::auth::{token_manager::TokenManager, token_store};
use gmail_snooze::config::{Config, load_config};
use gmail_snooze::daemon::{DaemonConfig, run_daemon};
use gmail_snooze::mail::gmail::GmailMailbox;
use gmail_snooze::snooze::resolver::ThreadSleeper;
use gmail_snooze::snooze::{Snoozer, Tick};

#[derive(Parser)]
#[command(name = "gmail_snooze")]
#[command(about = "Snooze Gmail threads with labels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the grouping label and the snooze labels
    Install,

    /// Run one tick now (for cron or other external schedulers)
    Run {
        #[arg(value_enum)]
        tick: Tick,
    },

    /// Run every tick on the local clock until Ctrl-C
    Daemon {
        /// Seconds between passes; cleanup runs on each pass
        #[arg(long, default_value_t = 60)]
        interval: u64,

        /// Don't raise desktop notifications for failed ticks
        #[arg(long)]
        no_notify: bool,
    },

    /// Store the OAuth client secret in keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },
}

fn load() -> Result<(Config, GmailMailbox)> {
    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
    let tokens = TokenManager::from_config(&cfg)?;
    let mailbox = GmailMailbox::new(cfg.imap_server(), cfg.user_email()?, tokens);
    Ok((cfg, mailbox))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::SetClientSecret { client_id } => {
            eprintln!("Paste client secret (end with Ctrl-D):");
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            token_store::save_client_secret(&client_id, secret.trim())?;
            println!("Saved client secret for client_id {client_id}");
            Ok(())
        }

        Command::Install => {
            let (cfg, mailbox) = load()?;
            Snoozer::new(&mailbox, &ThreadSleeper, &cfg.snooze)
                .install()
                .map_err(|e| anyhow!("install failed: {}", e.chain()))
        }

        Command::Run { tick } => {
            let (cfg, mailbox) = load()?;
            Snoozer::new(&mailbox, &ThreadSleeper, &cfg.snooze)
                .run(tick)
                .map_err(|e| anyhow!("{tick} run failed: {}", e.chain()))
        }

        Command::Daemon {
            interval,
            no_notify,
        } => {
            let (cfg, mailbox) = load()?;
            run_daemon(
                &mailbox,
                &cfg.snooze,
                DaemonConfig {
                    interval_secs: interval.max(1),
                    notify: !no_notify,
                },
            )
        }
    }
}
