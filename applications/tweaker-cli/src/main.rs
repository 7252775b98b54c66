/// Speaker Tweaker - real-time speaker correction host
use clap::{Parser, Subcommand};
use speaker_tweaker::{
    admin,
    config::{HostConfig, HostOverrides, STDIO},
    host,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "speaker-tweaker")]
#[command(about = "Speaker correction filter host and filter file tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create (or reset) a filter file with no active stages
    Init {
        /// Filter file path
        path: PathBuf,
        /// Sampling rate the file is designed for
        #[arg(short, long, default_value_t = 48_000)]
        rate: u32,
    },
    /// Publish a design file into a filter file
    Publish {
        /// Filter file path
        path: PathBuf,
        /// TOML design file
        design: PathBuf,
    },
    /// Show the contents of a filter file
    Inspect {
        /// Filter file path
        path: PathBuf,
    },
    /// Filter interleaved f32 samples from an input to the sink
    Process {
        /// Host configuration file
        #[arg(short, long, env = "SPEAKER_TWEAKER_CONFIG")]
        config: Option<PathBuf>,
        /// Raw input, `-` for stdin
        #[arg(short, long, default_value = STDIO)]
        input: String,
        /// Raw output, `-` for stdout
        #[arg(short, long)]
        sink: Option<String>,
        /// Filter file to map
        #[arg(short, long)]
        filterfile: Option<PathBuf>,
        /// Interleaved channel count
        #[arg(long)]
        channels: Option<usize>,
        /// Frames per engine call
        #[arg(long)]
        period_frames: Option<usize>,
        /// Stream sampling rate
        #[arg(short, long)]
        rate: Option<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    // Samples may go to stdout, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "speaker_tweaker=info,tweaker_audio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path, rate } => {
            let revision = admin::init(&path, rate)?;
            println!("{}: initialised at {} Hz, revision {}", path.display(), rate, revision);
        }
        Commands::Publish { path, design } => {
            let revision = admin::publish(&path, &design)?;
            println!("{}: published revision {}", path.display(), revision);
        }
        Commands::Inspect { path } => {
            let inspection = admin::inspect(&path)?;
            print!("{}", inspection);
        }
        Commands::Process {
            config,
            input,
            sink,
            filterfile,
            channels,
            period_frames,
            rate,
        } => {
            let mut host_config = HostConfig::load(config.as_deref())?;
            host_config.apply(HostOverrides {
                filterfile,
                channels,
                sink,
                period_frames,
                sample_rate: rate,
            });
            host_config.validate()?;

            tracing::info!("Filter file: {}", host_config.filterfile.display());
            tracing::info!("Sink: {}", host_config.sink);

            let reader = host::open_input(&input)?;
            let writer = host::open_sink(&host_config)?;
            host::run(&host_config, reader, writer)?;
        }
    }

    Ok(())
}
