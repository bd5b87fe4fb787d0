//! Unmix command line
//!
//! Usage:
//!   unmix separate song.mp3 karaoke.wav --method vocal_removal --quality high
//!   unmix separate song.wav vocals.flac --method neural:vocals --model htdemucs.onnx
//!   unmix batch a.wav b.flac --out-dir stems/ --method harmonic_percussive
//!   unmix info song.flac --analyze
//!   unmix methods

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use unmix_offline::{AudioDecoder, BatchSeparator, SeparationJob, run_job};
use unmix_separation::{
    EngineConfig, InferenceConfig, NeuralBackend, QualityLevel, SeparationEngine, SeparationMethod,
    StemType, audio_fingerprint, detect_audio_properties, estimate_vocal_presence,
};

#[derive(Parser)]
#[command(name = "unmix", version, about = "Stereo music separation")]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by `separate` and `batch`
#[derive(clap::Args)]
struct EngineArgs {
    /// vocal_removal, instrumental_isolation, harmonic_percussive or neural:<stem>
    #[arg(short, long, default_value = "vocal_removal")]
    method: String,

    /// low, medium or high (anything else means medium)
    #[arg(short, long, default_value = "medium")]
    quality: String,

    /// JSON file overriding the DSP constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// ONNX stem model enabling neural:<stem> methods
    #[arg(long)]
    model: Option<PathBuf>,

    /// Model exports six stems (adds piano and guitar)
    #[arg(long, requires = "model")]
    six_stems: bool,

    /// Output bit depth (16, 24 or 32)
    #[arg(long)]
    bit_depth: Option<u8>,
}

#[derive(Subcommand)]
enum Commands {
    /// Separate one file
    Separate {
        input: PathBuf,
        /// Output path; .flac writes FLAC, anything else WAV
        output: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Separate several files in parallel
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory receiving `<name>_<method>.wav` per input (FLAC inputs stay FLAC)
        #[arg(short, long)]
        out_dir: PathBuf,
        /// Parallel jobs (defaults to the CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Show audio file information
    Info {
        file: PathBuf,
        /// Decode and report features, vocal presence and chroma fingerprint
        #[arg(short, long)]
        analyze: bool,
    },
    /// List separation methods
    Methods,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Separate {
            input,
            output,
            engine,
        } => separate(&input, &output, &engine),
        Commands::Batch {
            inputs,
            out_dir,
            jobs,
            engine,
        } => batch(&inputs, &out_dir, jobs, &engine),
        Commands::Info { file, analyze } => info(&file, analyze),
        Commands::Methods => {
            list_methods();
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn build_engine(args: &EngineArgs) -> Result<SeparationEngine> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let mut engine = SeparationEngine::with_config(config);
    if let Some(model) = &args.model {
        let inference = InferenceConfig {
            six_stems: args.six_stems,
            ..InferenceConfig::default()
        };
        engine.register_backend(Box::new(NeuralBackend::onnx(model.clone(), inference)));
    }
    log::debug!("Backends: {}", engine.backend_names().join(", "));
    Ok(engine)
}

fn build_job(input: &Path, output: &Path, args: &EngineArgs) -> Result<SeparationJob> {
    let method: SeparationMethod = args.method.parse()?;
    let mut builder = SeparationJob::builder()
        .input(input)
        .output(output)
        .method(method)
        .quality(QualityLevel::resolve(&args.quality));
    if let Some(bits) = args.bit_depth {
        builder = builder.bit_depth(bits);
    }
    Ok(builder.build()?)
}

fn separate(input: &Path, output: &Path, args: &EngineArgs) -> Result<()> {
    let engine = build_engine(args)?;
    let job = build_job(input, output, args)?;

    if !engine.supports(&job.method) {
        bail!(
            "'{}' needs a model, pass --model <onnx> (loaded backends: {})",
            job.method,
            engine.backend_names().join(", ")
        );
    }

    let mut last_step = -1;
    let mut report = |fraction: f64| {
        let step = (fraction * 10.0).floor() as i32;
        if step != last_step {
            last_step = step;
            eprint!("\r{:>3}%", step * 10);
        }
    };

    let result = run_job(&engine, &job, &mut report)?;
    eprintln!();

    println!(
        "{} -> {} ({} frames, {} Hz, peak {:.1} dBFS, {:.2}s)",
        input.display(),
        result
            .output_path
            .as_deref()
            .unwrap_or(output)
            .display(),
        result.frames,
        result.sample_rate,
        result.peak_db,
        result.duration.as_secs_f64()
    );
    Ok(())
}

fn batch(inputs: &[PathBuf], out_dir: &Path, jobs: Option<usize>, args: &EngineArgs) -> Result<()> {
    let engine = Arc::new(build_engine(args)?);
    let method: SeparationMethod = args.method.parse()?;
    let suffix = method.to_string().replace(':', "_");

    let jobs_list = inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "output".to_string());
            let flac = input.extension().is_some_and(|e| e.eq_ignore_ascii_case("flac"));
            let ext = if flac { "flac" } else { "wav" };
            build_job(input, &out_dir.join(format!("{}_{}.{}", stem, suffix, ext)), args)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut separator = BatchSeparator::new(engine);
    if let Some(n) = jobs {
        separator = separator.with_max_parallel(n);
    }

    let results = separator.process_all(&jobs_list);
    let failed = results.iter().filter(|r| !r.is_success()).count();

    println!("{}", serde_json::to_string_pretty(&results)?);
    if failed > 0 {
        bail!("{} of {} jobs failed", failed, results.len());
    }
    Ok(())
}

fn info(file: &Path, analyze: bool) -> Result<()> {
    let info = AudioDecoder::probe(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let tag = |value: &Option<String>| value.clone().unwrap_or_else(|| "Unknown".to_string());

    println!("File:        {}", info.path.display());
    println!("Size:        {:.2} MB", info.file_size as f64 / (1024.0 * 1024.0));
    println!("Format:      {} {}-bit", info.format, info.bit_depth);
    println!("Channels:    {}", info.channels);
    println!("Sample Rate: {} Hz", info.sample_rate);
    println!("Duration:    {} ({} frames)", info.duration_str(), info.frames);
    println!("Title:       {}", tag(&info.tags.title));
    println!("Artist:      {}", tag(&info.tags.artist));
    println!("Album:       {}", tag(&info.tags.album));

    if !analyze {
        return Ok(());
    }

    let buffer = AudioDecoder::decode(file)?;
    let mono = buffer.mono_mix();
    let props = detect_audio_properties(&mono, buffer.sample_rate())?;
    let vocals = estimate_vocal_presence(&buffer)?;
    let fingerprint = audio_fingerprint(&mono, buffer.sample_rate())?;

    println!();
    println!("RMS (mean):        {:.4}", props.mean_rms());
    println!("Zero crossings:    {:.4}", props.mean_zero_crossing_rate());
    println!("Centroid (mean):   {:.0} Hz", props.mean_centroid());
    println!(
        "Harmonic / perc.:  {:.2} / {:.2}",
        props.harmonic_ratio, props.percussive_ratio
    );
    println!("Vocal presence:    {:.1}", vocals);
    let chroma: Vec<String> = fingerprint.iter().map(|v| format!("{:.2}", v)).collect();
    println!("Chroma (C..B):     {}", chroma.join(" "));
    Ok(())
}

fn list_methods() {
    for method in SeparationMethod::DSP {
        println!("{:<24} {}", method.to_string(), method.description());
    }

    let mut neural: Vec<String> = StemType::extended_6()
        .iter()
        .map(|stem| format!("neural:{}", stem))
        .collect();
    neural.push("neural:instrumental".to_string());
    println!("{:<24} needs --model", neural.join(", "));
}
