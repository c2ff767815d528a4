// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Sriweave CLI - Subresource Integrity for build output directories

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use sriweave::{
    compute_integrity, load_output_dir, Bundle, HashAlgorithm, Pipeline, SriConfig, SriOptions,
};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "apply" => match ApplyArgs::parse(&args[2..]) {
            Ok(apply) => {
                init_logging(apply.verbose);
                run_apply(apply).await
            }
            Err(e) => Err(e),
        },
        "hash" => {
            init_logging(false);
            run_hash(&args[2..])
        }
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("sriweave {}", sriweave::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sriweave=debug" } else { "sriweave=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn print_usage() {
    println!(
        r#"Sriweave - Subresource Integrity for bundled web apps

USAGE:
    sriweave <COMMAND> [OPTIONS]

COMMANDS:
    apply <dist>        Add integrity to a build output directory in place
    hash <file>...      Print the integrity token of each file
    help                Show this help message
    version             Show version information

APPLY OPTIONS:
    --manifest <path>       Vite manifest (default: <dist>/.vite/manifest.json)
    --config <file>         JSON options file
    --base <path>           Public base path
    --algorithm <alg>       sha256, sha384 (default) or sha512
    --crossorigin <value>   anonymous or use-credentials
    --no-runtime            Do not inject the browser runtime
    --no-preload            Do not add modulepreload links
    --ssr                   Server-rendering build
    --verbose               Log every element decision

HASH OPTIONS:
    --algorithm <alg>       sha256, sha384 (default) or sha512

EXAMPLES:
    sriweave apply dist
    sriweave apply dist --base /app/ --crossorigin anonymous
    sriweave hash --algorithm sha512 dist/assets/index.js
"#
    );
}

#[derive(Debug, Default)]
struct ApplyArgs {
    dist: PathBuf,
    manifest: Option<PathBuf>,
    config: Option<PathBuf>,
    base: Option<String>,
    algorithm: Option<String>,
    crossorigin: Option<String>,
    no_runtime: bool,
    no_preload: bool,
    ssr: bool,
    verbose: bool,
}

impl ApplyArgs {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut parsed = ApplyArgs::default();
        let mut dist = None;
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--manifest" => parsed.manifest = Some(PathBuf::from(value(&mut iter, arg)?)),
                "--config" => parsed.config = Some(PathBuf::from(value(&mut iter, arg)?)),
                "--base" => parsed.base = Some(value(&mut iter, arg)?),
                "--algorithm" => parsed.algorithm = Some(value(&mut iter, arg)?),
                "--crossorigin" => parsed.crossorigin = Some(value(&mut iter, arg)?),
                "--no-runtime" => parsed.no_runtime = true,
                "--no-preload" => parsed.no_preload = true,
                "--ssr" => parsed.ssr = true,
                "--verbose" => parsed.verbose = true,
                flag if flag.starts_with("--") => bail!("unknown option: {}", flag),
                path => {
                    if dist.is_some() {
                        bail!("unexpected argument: {}", path);
                    }
                    dist = Some(PathBuf::from(path));
                }
            }
        }

        parsed.dist = dist.context("usage: sriweave apply <dist> [OPTIONS]")?;
        Ok(parsed)
    }

    /// Options file overlaid with command line flags
    fn options(&self) -> anyhow::Result<SriOptions> {
        let mut options = match self.config {
            Some(ref path) => SriOptions::from_file(path)
                .with_context(|| format!("reading options from {}", path.display()))?,
            None => SriOptions::default(),
        };

        if let Some(ref base) = self.base {
            options.base = base.clone();
        }
        if let Some(ref algorithm) = self.algorithm {
            options.algorithm = Some(algorithm.clone());
        }
        if let Some(ref crossorigin) = self.crossorigin {
            options.crossorigin = Some(crossorigin.clone());
        }
        if self.no_runtime {
            options.runtime_patch_dynamic_links = false;
        }
        if self.no_preload {
            options.preload_dynamic_chunks = false;
        }
        options.ssr_build |= self.ssr;
        options.verbose_logging |= self.verbose;

        Ok(options)
    }
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> anyhow::Result<String> {
    iter.next()
        .cloned()
        .with_context(|| format!("{} requires a value", flag))
}

async fn run_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let config = SriConfig::from_options(&args.options()?)?;

    let original = load_output_dir(&args.dist, args.manifest.as_deref())
        .with_context(|| format!("loading {}", args.dist.display()))?;
    let mut bundle = original.clone();

    let mut pipeline = Pipeline::new(config)?;
    let summary = pipeline.run(&mut bundle).await?;

    let written = write_changes(&args.dist, &original, &bundle)?;

    println!("\n=== SRI ===");
    println!("Algorithm: {}", pipeline.config().algorithm);
    println!("Assets hashed: {}", summary.assets_hashed);
    println!("Dynamic chunks: {}", summary.dynamic_chunks);
    println!("Runtime injected: {} entry chunk(s)", summary.runtime_injected);
    println!("HTML updated: {}", summary.html_updated);
    println!("Preloads injected: {}", summary.preloads_injected);
    println!("Files written: {}", written);

    Ok(())
}

/// Write back every artifact whose content changed
fn write_changes(dist: &Path, original: &Bundle, processed: &Bundle) -> anyhow::Result<usize> {
    let mut written = 0;

    for (key, artifact) in processed.iter() {
        let unchanged = original
            .get(key)
            .map(|before| before.content() == artifact.content())
            .unwrap_or(false);
        if unchanged {
            continue;
        }

        let path = dist.join(key);
        fs::write(&path, artifact.content())
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(file = %key, "Wrote");
        written += 1;
    }

    Ok(written)
}

fn run_hash(args: &[String]) -> anyhow::Result<()> {
    let mut algorithm = HashAlgorithm::default();
    let mut files = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--algorithm" => algorithm = value(&mut iter, arg)?.parse()?,
            flag if flag.starts_with("--") => bail!("unknown option: {}", flag),
            file => files.push(PathBuf::from(file)),
        }
    }

    if files.is_empty() {
        bail!("usage: sriweave hash [--algorithm <alg>] <file>...");
    }

    for file in files {
        let content = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
        println!("{}  {}", compute_integrity(&content, algorithm), file.display());
    }

    Ok(())
}
