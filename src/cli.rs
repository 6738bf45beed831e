// thumbnailer/src/cli.rs
use crate::core::{PassthroughNaming, ResizeAlgorithm};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "thumbnailer")]
#[command(about = "Generate thumbnails from one source image into local or S3 storage")]
#[command(version)]
pub struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate every thumbnail of a job and print the results as JSON
    Run {
        /// Job document (JSON), or "-" for stdin
        job: PathBuf,

        /// Worker threads (0 = one per CPU)
        #[arg(short, long, default_value = "0")]
        workers: usize,

        /// Resize filter
        #[arg(short, long, value_enum, default_value = "bicubic")]
        algorithm: Algorithm,

        /// File name for options that neither crop nor resize
        #[arg(long, value_enum, default_value = "bare-stem")]
        passthrough_naming: Naming,

        /// Resize each thumbnail straight from the source
        #[arg(long)]
        no_shared_resize: bool,

        /// Connect to S3 even when the job names no s3:// location
        #[arg(long)]
        s3: bool,
    },
    /// Delete the source image of a job
    Delete {
        /// Job document (JSON), or "-" for stdin
        job: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Naming {
    BareStem,
    KeepExtension,
    Sized,
}

impl From<Naming> for PassthroughNaming {
    fn from(naming: Naming) -> Self {
        match naming {
            Naming::BareStem => PassthroughNaming::BareStem,
            Naming::KeepExtension => PassthroughNaming::KeepExtension,
            Naming::Sized => PassthroughNaming::Sized,
        }
    }
}
