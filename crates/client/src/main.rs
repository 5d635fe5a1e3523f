mod game;
mod lan;
mod render;
mod tui;

use std::net::{IpAddr, SocketAddr};

use anyhow::Result;
use clap::Parser;
use cubestorm::{GameConfig, NetConfig, SessionMode};

use tui::Settings;

#[derive(Parser)]
#[command(name = "cubestorm")]
#[command(about = "Arcade cube shooter with a two-player LAN mode")]
struct Args {
    #[arg(long, conflicts_with_all = ["host", "join"], help = "Start a single-player game")]
    local: bool,

    #[arg(long, conflicts_with = "join", help = "Host a two-player game")]
    host: bool,

    #[arg(
        short,
        long,
        value_name = "ADDR",
        help = "Join a host by IP or hostname (e.g., 192.168.1.20)"
    )]
    join: Option<String>,

    #[arg(short, long, default_value_t = cubestorm::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value = "0.0.0.0", help = "Address to listen on when hosting")]
    bind: IpAddr,

    #[arg(long, help = "Seed for enemy placement (random if omitted)")]
    seed: Option<u64>,

    #[arg(short, long, default_value_t = cubestorm::DEFAULT_TICK_RATE)]
    tick_rate: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let net = NetConfig {
        port: args.port,
        tick_rate: args.tick_rate,
        ..Default::default()
    };
    net.validate()?;

    let game = GameConfig::default().with_seed(args.seed.unwrap_or_else(rand::random));
    game.validate()?;

    let direct = if args.local {
        Some(SessionMode::Local)
    } else if args.host {
        Some(SessionMode::Host {
            bind: SocketAddr::new(args.bind, args.port),
        })
    } else {
        args.join.map(|target| SessionMode::Join { target })
    };

    let settings = Settings {
        game,
        net,
        bind: args.bind,
    };

    if let Err(e) = tui::run(settings, direct) {
        eprintln!("TUI error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
