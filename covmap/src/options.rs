use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand};
use coverage::{
    propah::terrain::{geo::Coord, FoliageSpacing},
    ExecutionMode, Request,
};
use std::{path::PathBuf, str::FromStr};

/// Render RF coverage maps and link profiles over LiDAR terrain and
/// canopy.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Directory holding metadata.json and the quantized grids.
    #[arg(short, long)]
    pub data_dir: PathBuf,

    /// Memory map grids instead of reading them into memory.
    #[arg(long, default_value_t = false)]
    pub mem_map: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a coverage PNG and its JSON legend.
    Render(Render),

    /// Analyze a single link.
    Link(Link),
}

/// A projected "x,y" coordinate, in the dataset's CRS.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct XY(pub Coord<f64>);

impl FromStr for XY {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (x_str, y_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid x,y"))?;
        let x = f64::from_str(x_str.trim())?;
        let y = f64::from_str(y_str.trim())?;
        Ok(Self(Coord { x, y }))
    }
}

/// Radio and tracing parameters shared by all commands.
#[derive(Args, Debug, Clone)]
pub struct Radio {
    /// Frequency, in GHz.
    #[arg(short, long, default_value_t = 0.868)]
    pub freq: f64,

    /// Transmitter antenna height above ground, in meters.
    #[arg(long, default_value_t = 2.0)]
    pub tx_alt: f64,

    /// Receiver antenna height above ground, in meters.
    #[arg(long, default_value_t = 1.0)]
    pub rx_alt: f64,

    /// Transmit power, in dBm.
    #[arg(long, default_value_t = 14.0, allow_hyphen_values = true)]
    pub tx_power: f64,

    /// Receiver sensitivity, in dBm.
    #[arg(long, default_value_t = -137.0, allow_hyphen_values = true)]
    pub rx_threshold: f64,

    /// Fade margin, in dB.
    #[arg(long, default_value_t = 0.0)]
    pub reliability: f64,

    /// Ray-march step size, in meters.
    #[arg(short, long, default_value_t = 10.0)]
    pub step: f64,

    /// Credit foliage with the marched step length instead of the
    /// requested step size.
    #[arg(long, default_value_t = false)]
    pub actual_spacing: bool,
}

impl Radio {
    pub fn foliage_spacing(&self) -> FoliageSpacing {
        if self.actual_spacing {
            FoliageSpacing::Actual
        } else {
            FoliageSpacing::Nominal
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct Render {
    /// Transmitter "x,y".
    #[arg(long)]
    pub tx: XY,

    #[command(flatten)]
    pub radio: Radio,

    /// Output cells per axis.
    #[arg(short, long, default_value_t = 256)]
    pub resolution: usize,

    /// Scales normalized margin before coloring.
    #[arg(long, default_value_t = 1.0)]
    pub boost: f64,

    /// Exponent applied to normalized margin before coloring.
    #[arg(long, default_value_t = 0.7)]
    pub gamma: f64,

    /// Worker threads (defaults to one per core).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Output PNG. A JSON legend is written next to it.
    #[arg(short, long)]
    pub out: PathBuf,
}

impl Render {
    pub fn request(&self) -> Request {
        Request {
            tx: self.tx.0,
            freq_ghz: self.radio.freq,
            tx_alt_m: self.radio.tx_alt,
            rx_alt_m: self.radio.rx_alt,
            tx_power_dbm: self.radio.tx_power,
            rx_threshold_dbm: self.radio.rx_threshold,
            reliability_db: self.radio.reliability,
            step_m: self.radio.step,
            resolution: self.resolution,
            boost: self.boost,
            gamma: self.gamma,
            foliage_spacing: self.radio.foliage_spacing(),
            execution: self
                .threads
                .map_or(ExecutionMode::Parallel, ExecutionMode::Threads),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct Link {
    /// Transmitter "x,y".
    #[arg(long)]
    pub tx: XY,

    /// Receiver "x,y".
    #[arg(long)]
    pub rx: XY,

    #[command(flatten)]
    pub radio: Radio,

    #[command(subcommand)]
    pub format: LinkFormat,
}

#[derive(Debug, Subcommand, Clone, Copy)]
pub enum LinkFormat {
    /// Print profile values to stdout.
    Csv,

    /// Print profile values and losses to stdout.
    Json,

    /// Plot to terminal.
    Plot,

    /// Print the loss breakdown.
    Summary,
}
