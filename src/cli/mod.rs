use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cadence", about = "Cadence: local-first habit consistency tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List {
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Archive {
        id: i64,
    },
    Restore {
        id: i64,
    },
    Delete {
        id: i64,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    Move {
        id: i64,
        position: usize,
    },
    Toggle {
        id: i64,
        #[arg(long)]
        date: Option<String>,
    },
    Today,
    Stats {
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    History {
        #[arg(long)]
        days: Option<u32>,
    },
    Serve,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}
