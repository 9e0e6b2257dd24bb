//! NetHack assistant CLI
//!
//! Price identification and tedium removal for tty NetHack running in tmux.

#![forbid(unsafe_code)]

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use nha_core::abbrev::abbreviate;
use nha_core::catalog::ItemClass;
use nha_core::config::{Config, ConfigOverrides, LogFormat, Windowport};
use nha_core::logging::{LogConfig, init_logging};
use nha_core::monitor::{Monitor, MonitorSettings, TickOutcome};
use nha_core::persistence::PersistenceStore;
use nha_core::priceid::{TradeDirection, find_price_candidates};
use nha_core::tmux::{FrameBridge, TmuxClient, WaitStrategy};

/// Label budget used by the offline price lookup
const PRICE_LABEL_LENGTH: usize = 60;

/// NetHack assistant - price identification and tedium removal
#[derive(Parser)]
#[command(name = "nha")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(long, global = true, env = "NHA_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a tmux pane running NetHack
    Watch {
        /// Target pane (e.g. nethack:0.0)
        pane: String,

        /// Game windowport
        #[arg(short, long)]
        windowport: Option<Windowport>,

        /// Maximum length of call labels
        #[arg(short = 'a', long = "abbreviation-length")]
        abbreviation_length: Option<usize>,

        /// Save and quit after this many turns
        #[arg(short = 't', long = "turnlimit")]
        turn_limit: Option<u32>,

        /// Stop on multiples of the turn limit (500, 1000, 1500...)
        #[arg(short = 'A', long = "aligned-turnlimit")]
        aligned_turn_limit: bool,

        /// File keeping learned facts between sessions
        #[arg(short, long)]
        persistence: Option<String>,

        /// Append logs to this file
        #[arg(short, long)]
        logfile: Option<String>,

        /// Log format (pretty or json)
        #[arg(long)]
        log_format: Option<LogFormat>,

        /// Write Elbereth automatically when finger-engraving in dust
        #[arg(short = 'e', long = "auto-elbereth")]
        auto_elbereth: bool,

        /// How to wait for screen changes (poll or hook)
        #[arg(long)]
        wait_strategy: Option<WaitStrategy>,
    },

    /// Look up candidate identities for a shop price
    Price {
        /// Item class symbol: [ ? ! = / +
        symbol: char,

        /// Price asked or offered, in zorkmids
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        price: u32,

        /// Your charisma when buying
        #[arg(
            short,
            long,
            value_parser = clap::value_parser!(u32).range(3..=18),
            conflicts_with = "sell",
            required_unless_present = "sell"
        )]
        charisma: Option<u32>,

        /// The shopkeeper is offering to buy
        #[arg(long)]
        sell: bool,

        /// Tourist below XL 15 or wearing a dunce cap
        #[arg(long)]
        sucker: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        handle_fatal_error(&err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let Cli {
        verbose,
        config,
        command,
    } = Cli::parse();

    match command {
        Commands::Watch {
            pane,
            windowport,
            abbreviation_length,
            turn_limit,
            aligned_turn_limit,
            persistence,
            logfile,
            log_format,
            auto_elbereth,
            wait_strategy,
        } => {
            let overrides = ConfigOverrides {
                log_level: verbose.then(|| "debug".to_string()),
                log_format,
                log_file: logfile,
                windowport,
                max_label_length: abbreviation_length,
                turn_limit,
                aligned_turn_limit: aligned_turn_limit.then_some(true),
                auto_engrave: auto_elbereth.then_some(true),
                persistence_file: persistence,
                wait_strategy,
            };
            let config = Config::load_with_overrides(config.as_deref().map(Path::new), &overrides)?;
            init_logging(&LogConfig::from(&config.general))?;
            watch(&config, &pane).await
        }
        Commands::Price {
            symbol,
            price,
            charisma,
            sell: _,
            sucker,
        } => lookup_price(symbol, price, charisma, sucker),
        Commands::Config => {
            let config = Config::load_with_overrides(
                config.as_deref().map(Path::new),
                &ConfigOverrides::default(),
            )?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Why [`drive`] stopped ticking
#[derive(Debug, PartialEq, Eq)]
enum LoopExit {
    Shutdown,
    GameOver,
    Reset,
}

/// Tick until the game ends, a reset is requested or `shutdown` resolves
///
/// Ticks always run to completion; `shutdown` is only observed while
/// sleeping between them.
async fn drive<B, S>(
    monitor: &mut Monitor<B>,
    interval: Duration,
    mut shutdown: S,
) -> nha_core::Result<LoopExit>
where
    B: FrameBridge,
    S: Future + Unpin,
{
    loop {
        match monitor.tick().await? {
            TickOutcome::GameOver => {
                tracing::info!("Game over, exiting");
                return Ok(LoopExit::GameOver);
            }
            TickOutcome::Reset => return Ok(LoopExit::Reset),
            TickOutcome::Idle | TickOutcome::Handled(_) => {}
        }

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Received Ctrl+C, shutting down");
                return Ok(LoopExit::Shutdown);
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}

/// Tick the monitor until death, Ctrl+C or a fatal bridge error
async fn watch(config: &Config, pane: &str) -> anyhow::Result<()> {
    let bridge = TmuxClient::new(pane)
        .with_binary(&config.bridge.tmux_binary)
        .with_timeout(config.bridge.command_timeout_secs)
        .with_poll_interval(config.bridge.poll_interval())
        .with_wait_strategy(config.bridge.wait_strategy)
        .connect()
        .await?;

    let settings = MonitorSettings::from_config(config);
    let store = config.monitor.persistence_path().map(PersistenceStore::new);
    let mut monitor = Monitor::new(bridge, settings.clone(), store.clone())?;
    let interval = config.bridge.poll_interval();

    tracing::info!(
        pane,
        windowport = %config.monitor.windowport,
        max_label_length = settings.max_label_length,
        turn_limit = ?settings.turn_limit,
        auto_engrave = settings.auto_engrave,
        "Watching pane"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let result = loop {
        match drive(&mut monitor, interval, shutdown.as_mut()).await {
            Ok(LoopExit::Reset) => {
                tracing::info!("Rebuilding monitor from scratch");
                let bridge = monitor.into_bridge();
                monitor = Monitor::new(bridge, settings.clone(), store.clone())?;
            }
            Ok(LoopExit::Shutdown | LoopExit::GameOver) => break Ok(()),
            Err(err) => break Err(err),
        }
    };

    let mut bridge = monitor.into_bridge();
    if let Err(err) = bridge.disconnect().await {
        tracing::warn!(error = %err, "Failed to remove activity hook");
    }
    result.map_err(Into::into)
}

/// Print candidate identities for a price, one block per matching class
fn lookup_price(symbol: char, price: u32, charisma: Option<u32>, sucker: bool) -> anyhow::Result<()> {
    let classes = ItemClass::from_symbol(symbol);
    if classes.is_empty() {
        anyhow::bail!("Invalid item symbol '{symbol}', choose one of: [ ? ! = / +");
    }
    let direction = if charisma.is_some() {
        TradeDirection::Buying
    } else {
        TradeDirection::Selling
    };

    let mut matched = false;
    for &class in classes {
        let items = find_price_candidates(price, class, charisma.unwrap_or(0), Some(sucker), direction);
        if items.is_empty() {
            continue;
        }
        if !matched {
            println!("Items matching your query:\n");
            matched = true;
        }
        if classes.len() > 1 {
            println!("{class}:");
        }
        for item in &items {
            println!("{item}");
        }
        println!();
        println!("Call prompt name: {}\n", abbreviate(&items, PRICE_LABEL_LENGTH));
    }
    if !matched {
        println!("No items have matched your query");
    }
    Ok(())
}

fn handle_fatal_error(err: &anyhow::Error) {
    if let Some(core_err) = err.downcast_ref::<nha_core::Error>() {
        eprintln!(
            "{}",
            nha_core::error::format_error_with_remediation(core_err)
        );
    } else {
        eprintln!("Error: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use nha_core::frame::Frame;
    use nha_core::tmux::Key;
    use std::collections::VecDeque;

    /// Bridge replaying frames; every wait yields to the runtime first
    struct ReplayBridge {
        frames: VecDeque<Frame>,
        current: Frame,
        keys: Vec<Key>,
        waits: usize,
    }

    impl ReplayBridge {
        fn new(frames: Vec<Frame>) -> Self {
            Self {
                frames: frames.into(),
                current: Frame::default(),
                keys: Vec::new(),
                waits: 0,
            }
        }

        fn advance(&mut self) -> Frame {
            if let Some(frame) = self.frames.pop_front() {
                self.current = frame;
            }
            self.current.clone()
        }
    }

    impl FrameBridge for ReplayBridge {
        fn pane(&self) -> &str {
            "nethack:0.0"
        }

        fn current(&self) -> &Frame {
            &self.current
        }

        async fn capture(&mut self) -> nha_core::Result<Frame> {
            Ok(self.advance())
        }

        async fn wait_for_change(&mut self) -> nha_core::Result<Frame> {
            tokio::task::yield_now().await;
            self.waits += 1;
            Ok(self.advance())
        }

        async fn send_keys(&mut self, keys: &[Key]) -> nha_core::Result<()> {
            self.keys.extend_from_slice(keys);
            Ok(())
        }

        async fn display_message(
            &mut self,
            _text: &str,
            _duration: Duration,
            _modal: bool,
        ) -> nha_core::Result<()> {
            Ok(())
        }
    }

    fn screen(top: &str) -> Frame {
        Frame::from_lines(&[
            top,
            "",
            "[Wulfgar the Stripling   ] St:18 Dx:12 Co:16 In:8 Wi:10 Ch:11 Lawful",
            "Dlvl:2 $:300 HP:16(16) Pw:1(1) AC:6 Xp:2/25 T:40",
        ])
    }

    fn monitor(frames: Vec<Frame>) -> Monitor<ReplayBridge> {
        Monitor::new(ReplayBridge::new(frames), MonitorSettings::default(), None).unwrap()
    }

    #[tokio::test]
    async fn pending_shutdown_lets_the_tick_finish() {
        let mut monitor = monitor(vec![
            screen("You see here a ruby ring (for sale, 150 zorkmids)."),
            screen(""),
        ]);

        let exit = drive(&mut monitor, Duration::from_secs(3600), std::future::ready(()))
            .await
            .unwrap();

        assert_eq!(exit, LoopExit::Shutdown);
        assert!(monitor.price_ids().contains_key("ruby ring"));
        assert_eq!(monitor.bridge().waits, 1);
    }

    #[tokio::test]
    async fn death_stops_the_loop() {
        let mut monitor = monitor(vec![
            screen(""),
            screen("Do you want your possessions identified? [ynq] (n)"),
        ]);

        let exit = drive(&mut monitor, Duration::from_millis(1), std::future::pending::<()>())
            .await
            .unwrap();
        assert_eq!(exit, LoopExit::GameOver);
    }

    #[tokio::test]
    async fn reset_is_handed_back_for_rebuild() {
        let mut monitor = monitor(vec![screen(""), screen("# reset")]);

        let exit = drive(&mut monitor, Duration::from_millis(1), std::future::pending::<()>())
            .await
            .unwrap();
        assert_eq!(exit, LoopExit::Reset);
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn watch_flags_parse() {
        let cli = Cli::try_parse_from([
            "nha", "watch", "nethack:0.0", "-t", "500", "-A", "-e", "-a", "40",
        ])
        .unwrap();
        match cli.command {
            Commands::Watch {
                pane,
                turn_limit,
                aligned_turn_limit,
                auto_elbereth,
                abbreviation_length,
                ..
            } => {
                assert_eq!(pane, "nethack:0.0");
                assert_eq!(turn_limit, Some(500));
                assert!(aligned_turn_limit);
                assert!(auto_elbereth);
                assert_eq!(abbreviation_length, Some(40));
            }
            Commands::Price { .. } | Commands::Config => panic!("expected watch"),
        }
    }

    #[test]
    fn price_needs_charisma_or_sell() {
        assert!(Cli::try_parse_from(["nha", "price", "!", "100"]).is_err());
        assert!(Cli::try_parse_from(["nha", "price", "!", "100", "--sell"]).is_ok());
        assert!(Cli::try_parse_from(["nha", "price", "!", "100", "-c", "11"]).is_ok());
        assert!(Cli::try_parse_from(["nha", "price", "!", "100", "-c", "2"]).is_err());
        assert!(
            Cli::try_parse_from(["nha", "price", "!", "100", "-c", "11", "--sell"]).is_err()
        );
    }

    #[test]
    fn config_subcommand_parses() {
        let cli = Cli::try_parse_from(["nha", "--config", "/tmp/nha.toml", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config));
        assert_eq!(cli.config.as_deref(), Some("/tmp/nha.toml"));
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        assert!(lookup_price('x', 100, Some(11), false).is_err());
        assert!(lookup_price('/', 150, Some(11), false).is_ok());
    }
}
