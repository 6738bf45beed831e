// thumbnailer/src/main.rs
use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use std::io::Read;
use std::path::Path;
use thumbnailer::store::OBJECT_SCHEME;
use thumbnailer::{Cli, Commands, Job, ObjectStoreConfig, Thumbnailer, ThumbnailerConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Run {
            job,
            workers,
            algorithm,
            passthrough_naming,
            no_shared_resize,
            s3,
        } => {
            let job = read_job(&job)?;
            let config = ThumbnailerConfig {
                max_workers: workers,
                algorithm: algorithm.into(),
                shared_pre_resize: !no_shared_resize,
                passthrough_naming: passthrough_naming.into(),
                object_storage: (s3 || uses_object_storage(&job)).then(ObjectStoreConfig::from_env),
            };
            process_run(&job, config)?;
        }
        Commands::Delete { job } => {
            let job = read_job(&job)?;
            let config = ThumbnailerConfig {
                object_storage: uses_object_storage(&job).then(ObjectStoreConfig::from_env),
                ..Default::default()
            };
            let thumbnailer = Thumbnailer::new(config)?;
            thumbnailer
                .delete_source(&job)
                .with_context(|| format!("Failed to delete {}", job.src_image))?;
            println!("Deleted {}", job.src_image);
        }
    }

    Ok(())
}

fn process_run(job: &Job, config: ThumbnailerConfig) -> anyhow::Result<()> {
    let thumbnailer = Thumbnailer::new(config)?;
    let report = thumbnailer
        .process(job)
        .with_context(|| format!("Failed to generate thumbnails for {}", job.src_image))?;

    println!("{}", serde_json::to_string_pretty(&report.results)?);

    let failed = report.failures().count();
    if failed > 0 {
        bail!(
            "{} of {} thumbnail(s) failed for {}",
            failed,
            report.results.len(),
            job.src_image
        );
    }
    if let Some(e) = report.delete_error {
        bail!("Thumbnails generated but {} was not deleted: {}", job.src_image, e);
    }

    Ok(())
}

fn read_job(path: &Path) -> anyhow::Result<Job> {
    let data = if path == Path::new("-") {
        let mut data = String::new();
        std::io::stdin()
            .read_to_string(&mut data)
            .context("Failed to read job from stdin")?;
        data
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file: {}", path.display()))?
    };

    Job::from_json(&data).context("Invalid job document")
}

fn uses_object_storage(job: &Job) -> bool {
    let is_object = |location: &str| {
        location
            .split_once(':')
            .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case(OBJECT_SCHEME))
    };

    is_object(&job.src_image)
        || is_object(&job.dst_folder)
        || job
            .opts
            .iter()
            .filter_map(|opt| opt.explicit_destination())
            .any(is_object)
}
