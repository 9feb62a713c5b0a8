use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jiff::Timestamp;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const COUNT_ENV: &str = "FLAKEID_COUNT";
pub const WORKERS_ENV: &str = "FLAKEID_WORKERS";
pub const MACHINE_ID_SOURCE_ENV: &str = "FLAKEID_MACHINE_ID_SOURCE";
pub const MACHINE_ID_ENV: &str = "FLAKEID_MACHINE_ID";
pub const START_TIME_ENV: &str = "FLAKEID_START_TIME";
pub const OUTPUT_ENV: &str = "FLAKEID_OUTPUT";

pub const DEFAULT_COUNT: usize = 10;
pub const MAX_COUNT: u64 = 100_000_000;
pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_MACHINE_ID: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MachineIdSourceArg {
    #[value(name = "static")]
    Static,
    #[value(name = "hostname")]
    Hostname,
}

impl Display for MachineIdSourceArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineIdSourceArg::Static => write!(f, "static"),
            MachineIdSourceArg::Hostname => write!(f, "hostname"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "flakeid", about = "Mint and inspect Sonyflake-style 64-bit ids")]
pub struct CLI {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mint ids and write them one per line.
    Generate(GenerateArgs),
    /// Split ids into their time, machine id and sequence fields.
    Decompose(DecomposeArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[arg(
        long,
        short = 'n',
        env = COUNT_ENV,
        default_value_t = DEFAULT_COUNT,
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_COUNT)
    )]
    pub count: usize,

    /// Threads sharing one generator. Output is sorted when greater than one.
    #[arg(
        long,
        env = WORKERS_ENV,
        default_value_t = DEFAULT_WORKERS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub workers: usize,

    #[arg(
        long,
        env = MACHINE_ID_SOURCE_ENV,
        value_enum,
        default_value_t = MachineIdSourceArg::Static
    )]
    pub machine_id_source: MachineIdSourceArg,

    /// Used when the machine id source is `static`.
    #[arg(long, env = MACHINE_ID_ENV, default_value_t = DEFAULT_MACHINE_ID)]
    pub machine_id: u16,

    /// RFC 3339 start epoch, e.g. `2024-01-01T00:00:00Z`.
    #[arg(long, env = START_TIME_ENV)]
    pub start_time: Option<Timestamp>,

    /// Write ids to this file instead of stdout.
    #[arg(long, short = 'o', env = OUTPUT_ENV)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DecomposeArgs {
    #[arg(required = true)]
    pub ids: Vec<u64>,

    /// Start epoch the ids were minted against.
    #[arg(long, env = START_TIME_ENV)]
    pub start_time: Option<Timestamp>,
}
