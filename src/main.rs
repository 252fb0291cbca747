use anyhow::{Context, Result};
use chainbench::cli::{
    Cli, Command, ConvertArgs, GenerateArgs, ReportArgs, RunArgs, VerifyArgs,
};
use chainbench::convert::{self, ConverterInput};
use chainbench::dataset::{self, DatasetParams};
use chainbench::impact::ImpactConfig;
use chainbench::report::{self, DatasetSnapshot, ReportInputs};
use chainbench::runner::{self, ImplSpec, RunConfig, RunnerSummary};
use chainbench::stats;
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn verify(dir: &Path) -> Result<()> {
    let outcome = dataset::verify_dataset(dir);
    if outcome.valid {
        println!(
            "✓ Dataset verified: {}",
            outcome.hash.as_deref().unwrap_or_default()
        );
        Ok(())
    } else {
        anyhow::bail!(
            "Dataset verification failed: {}",
            outcome.reason.as_deref().unwrap_or("unknown reason")
        );
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let params = DatasetParams {
        n: args.n,
        m: args.m,
        d: args.d,
        seed: args.seed,
    };
    println!(
        "Generating dataset: N={}, M={}, D={}, seed={}",
        params.n, params.m, params.d, params.seed
    );
    let metadata = dataset::generate_dataset(&params, &args.output, args.force)
        .with_context(|| format!("Failed to generate dataset in {}", args.output.display()))?;
    println!("  Hash: {}", metadata.hash_sha256);
    println!("  Size: {} bytes", metadata.size_bytes.total);

    verify(&args.output)
}

fn run(args: RunArgs) -> Result<()> {
    let metadata = dataset::load_metadata(&args.metadata)
        .with_context(|| format!("Failed to load {}", args.metadata.display()))?;
    println!(
        "Dataset: N={}, M={}, D={} ({}...)",
        metadata.n,
        metadata.m,
        metadata.d,
        metadata.hash_sha256.get(..16).unwrap_or(&metadata.hash_sha256)
    );
    let data_dir = args
        .metadata
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let impls = runner::parse_impls(&args.impls)?;

    // Fail on a broken lock before spending time on the stability wait
    dataset::verify_dataset_lock(&metadata, data_dir).context("Dataset lock check failed")?;

    let waited_seconds = if args.stability_enable {
        runner::check_stability(
            Duration::from_secs(args.stability_timeout),
            args.stability_mode,
        )
    } else {
        0.0
    };

    let config = RunConfig {
        warmup: args.warmup,
        runs: args.runs,
        repeat: args.repeat,
        stability_enabled: args.stability_enable,
        stability_mode: args.stability_mode,
        waited_seconds,
        cpu_affinity: args.cpu_affinity,
        enforce_single_thread: args.enforce_single_thread,
        ebpf_agent: args.ebpf_agent,
        profile_resources: args.profile_resources,
    };

    println!("Benchmarking {} implementations:", impls.len());
    for spec in &impls {
        println!("  - {}", spec.key());
    }

    let results = runner::run_benchmarks(&metadata, data_dir, &impls, &config)?;
    let saved = runner::save_results(&results, &args.output, &metadata, &config)
        .with_context(|| format!("Failed to save results to {}", args.output.display()))?;

    if results.entries.len() >= 2 {
        let baseline = &results.entries[0].samples;
        let optimized = &results.entries[1].samples;
        let comparison = stats::compare(baseline, optimized);
        println!();
        println!("Baseline:  {:.1}ms (median)", comparison.baseline.median);
        println!("Optimized: {:.1}ms (median)", comparison.optimized.median);
        println!("Delta:     {:.1}ms", comparison.delta_ms);
        println!("Gain:      {:.1}%", comparison.gain_pct);
        println!("Verdict:   {}", comparison.verdict);
    }

    println!();
    println!("✓ Results: {}", saved.results_csv.display());
    println!("✓ Summary: {}", saved.summary_json.display());
    Ok(())
}

fn build_report(args: ReportArgs) -> Result<()> {
    let summary = RunnerSummary::load(&args.runner_summary)
        .with_context(|| format!("Failed to load {}", args.runner_summary.display()))?;
    let metadata = dataset::load_metadata(&args.metadata)
        .with_context(|| format!("Failed to load {}", args.metadata.display()))?;
    let evidence = report::load_evidence(args.ebpf_evidence.as_deref())
        .context("Failed to load evidence")?;
    let impact = match &args.impact_config {
        Some(path) => ImpactConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ImpactConfig::default(),
    };

    let mut inputs = ReportInputs::new(
        &summary,
        DatasetSnapshot::from(&metadata),
        ImplSpec::new(args.baseline_impl, args.baseline_variant),
        ImplSpec::new(args.optimized_impl, args.optimized_variant),
    );
    inputs.evidence = Some(evidence);
    inputs.command_line = args.command_line;
    inputs.impact = impact;

    let report = report::build_report(inputs);
    report
        .write_json(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("✓ Report generated: {}", args.output.display());
    print!("{}", report.headline());
    Ok(())
}

fn convert(args: ConvertArgs) -> Result<()> {
    let input = ConverterInput::load(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let dataset = match &args.metadata {
        Some(path) => Some(DatasetSnapshot::from(&dataset::load_metadata(path)?)),
        None => None,
    };

    let report = convert::convert_to_report(&input, &args.baseline, &args.optimized, dataset)?;
    report
        .write_json(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("✓ Report generated: {}", args.output.display());
    print!("{}", report.headline());
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match args.command {
        Command::Generate(args) => generate(args),
        Command::Verify(VerifyArgs { output }) => verify(&output),
        Command::Run(args) => run(args),
        Command::Report(args) => build_report(args),
        Command::Convert(args) => convert(args),
    }
}
