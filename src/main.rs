//! slang-batch CLI
//!
//! Entry point for the `slang-batch` command-line tool.

use clap::Parser;
use slang_batch::job::PathContext;
use slang_batch::runner::default_workers;
use slang_batch::summary::EXIT_FAILURE;
use slang_batch::{logging, IncludeFlagTemplate, Pipeline, PipelineConfig, RunSummary, TimeoutConfig};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "slang-batch")]
#[command(about = "Compile a manifest of Slang shaders in parallel", version)]
struct Cli {
    /// Path to the shader compiler (relative paths resolve next to this tool)
    compiler: PathBuf,

    /// Output directory for compiled shaders (relative to the working directory)
    output_dir: PathBuf,

    /// Shader manifest (JSON, relative to the working directory)
    manifest: PathBuf,

    /// Number of shaders to compile in parallel (default: CPU count)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Per-shader compile timeout in seconds
    #[arg(long, value_name = "SECS")]
    compile_timeout: Option<u64>,

    /// Timeout for the compiler version check in seconds
    #[arg(long, value_name = "SECS")]
    verify_timeout: Option<u64>,

    /// Include flag format; {path} is replaced by the absolute include directory
    #[arg(long, value_name = "TEMPLATE", default_value = slang_batch::compiler::DEFAULT_INCLUDE_FLAG)]
    include_flag_template: String,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "PATH")]
    summary_json: Option<PathBuf>,

    /// More diagnostic logging (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print the final report
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let include_flag = match IncludeFlagTemplate::new(cli.include_flag_template.as_str()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    let ctx = match PathContext::from_env() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error resolving working directory: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    let workers = cli.jobs.unwrap_or_else(default_workers);
    let config = PipelineConfig {
        compiler: cli.compiler,
        output_dir: cli.output_dir,
        manifest: cli.manifest,
        workers,
        timeouts: TimeoutConfig::from_overrides(cli.verify_timeout, cli.compile_timeout),
        include_flag,
        summary_path: cli.summary_json,
        quiet: cli.quiet,
    };

    if !config.quiet {
        print_header(&config, &ctx);
    }

    let pipeline = Pipeline::new(config, ctx);
    match pipeline.execute() {
        Ok(summary) => {
            print_report(&summary);
            process::exit(summary.exit_code());
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn print_header(config: &PipelineConfig, ctx: &PathContext) {
    println!("{}", "=".repeat(50));
    println!("Slang shader batch compiler");
    println!("{}", "=".repeat(50));
    println!("Compiler:    {}", config.compiler.display());
    println!("Output dir:  {}", ctx.absolute(&config.output_dir).display());
    println!("Manifest:    {}", ctx.absolute(&config.manifest).display());
    println!("Parallelism: {}", config.workers);
    println!("{}", "-".repeat(50));
}

fn print_report(summary: &RunSummary) {
    println!();
    println!("{}", "=".repeat(50));
    println!("Summary:");
    println!("  Succeeded: {}", summary.success_count);
    println!("  Failed:    {}", summary.failure_count);
    println!("  Total:     {}", summary.total);

    if summary.is_success() {
        println!();
        println!("✓ {}", summary.human_summary());
    } else {
        println!();
        println!("✗ {}", summary.human_summary());
        for failure in &summary.failures {
            println!("  - {} [{}]", failure.alias, failure.kind.description());
        }
        if summary.failures.iter().any(|f| f.kind.was_submitted()) {
            println!("Artifacts of failed compiles were removed.");
        }
    }
}
