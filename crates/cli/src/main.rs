//! Tarn command line front end.
//!
//! Drives the language service the way an editor host would: sources are
//! opened, analysis is requested, and a manual component manager stands in
//! for the host's idle loop.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tarn_analysis::{
	AnalysisKind, AnalysisReason, AuthoringScope, DocumentHandle, LanguageService, ManualComponentManager, ManualSite,
	ServiceConfig, Source,
};
use tarn_language::colorable_item;
use tarn_language::preferences::matches_path;
use tracing::{debug, info};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "tarn")]
#[command(about = "Incremental checker and colorizer for Boo sources")]
struct Args {
	/// Service configuration (TOML)
	#[arg(short, long, value_name = "PATH", global = true)]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run a full check and print diagnostics
	Check {
		/// Files or directories; directories are searched for Boo sources
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Also print declarations
		#[arg(long)]
		symbols: bool,

		/// Give up on a file after this many milliseconds
		#[arg(long, default_value_t = 5000)]
		timeout_ms: u64,
	},
	/// Print the colorizer's tokens for each line
	Tokens {
		file: PathBuf,

		/// First line to print (1-based)
		#[arg(long, default_value_t = 1)]
		from: usize,
	},
	/// Print the colorable-item table
	Colors,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	let config = match &args.config {
		Some(path) => ServiceConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => ServiceConfig::default(),
	};
	debug!(?config, "configuration loaded");
	let service = LanguageService::new(config);

	match args.command {
		Command::Check {
			files,
			symbols,
			timeout_ms,
		} => check(&service, &files, symbols, Duration::from_millis(timeout_ms)).await,
		Command::Tokens { file, from } => {
			tokens(&service, &file, from.saturating_sub(1))?;
			Ok(ExitCode::SUCCESS)
		}
		Command::Colors => {
			colors(&service);
			Ok(ExitCode::SUCCESS)
		}
	}
}

async fn check(service: &LanguageService, files: &[PathBuf], symbols: bool, limit: Duration) -> anyhow::Result<ExitCode> {
	let manager = Arc::new(ManualComponentManager::new());
	let site = ManualSite::new(manager);
	let id = service.start(&site)?;
	info!(component_id = id.0, "idle scheduler registered");

	let files = collect_inputs(files)?;
	if files.is_empty() {
		bail!("no Boo sources found");
	}

	let mut errors = 0;
	for path in &files {
		let source = open(service, path)?;
		service.request_analysis(&source, AnalysisReason::ExplicitCheck);
		let scope = settle(service, &source, limit)
			.await
			.with_context(|| format!("checking {}", path.display()))?;

		for d in scope.diagnostics() {
			println!(
				"{}:{}:{}: {}[{}]: {}",
				path.display(),
				d.range.start.line + 1,
				d.range.start.col + 1,
				d.severity.as_str(),
				d.code,
				d.message
			);
		}
		if symbols {
			for symbol in scope.declarations() {
				println!("{}:{}: {} {}", path.display(), symbol.line() + 1, symbol.kind.as_str(), symbol.name);
			}
		}
		errors += scope.diagnostics().iter().filter(|d| d.is_error()).count();
		source.close();
	}

	service.stop(&site);
	let metrics = service.metrics();
	debug!(
		full_runs = metrics.runs(AnalysisKind::FullCheck),
		avg = ?metrics.avg_duration(AnalysisKind::FullCheck),
		"check finished"
	);
	Ok(if errors > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Expands directories into the Boo sources beneath them, sorted by path.
///
/// Files named explicitly are kept whatever their extension.
fn collect_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
	let mut out = Vec::new();
	for path in paths {
		if path.is_dir() {
			let mut found = Vec::new();
			walk(path, &mut found).with_context(|| format!("reading {}", path.display()))?;
			found.sort();
			out.extend(found);
		} else {
			out.push(path.clone());
		}
	}
	Ok(out)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_dir() {
			walk(&path, out)?;
		} else if matches_path(&path) {
			out.push(path);
		}
	}
	Ok(())
}

/// Ticks the service until the source's full check for its current version
/// lands, or fails as soon as that check faults.
async fn settle(service: &LanguageService, source: &Source, limit: Duration) -> anyhow::Result<AuthoringScope> {
	let wanted = source.version();
	let ticks = async {
		loop {
			let report = service.on_idle(false);
			let scope = service.scope(source.id());
			if scope.snapshot_version() == Some(wanted) && scope.kind() == Some(AnalysisKind::FullCheck) {
				return Ok(scope);
			}
			if report.faulted > 0
				&& let Some((version, fault)) = service.last_fault(source.id())
				&& version == wanted
			{
				return Err(anyhow::Error::new(fault).context(format!("analysis of version {version} failed")));
			}
			tokio::time::sleep(Duration::from_millis(2)).await;
		}
	};
	match tokio::time::timeout(limit, ticks).await {
		Ok(result) => result,
		Err(_) => bail!("no result after {limit:?}"),
	}
}

fn open(service: &LanguageService, path: &Path) -> anyhow::Result<Source> {
	let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	Ok(service.create_source(DocumentHandle::new(text).with_path(path)))
}

fn tokens(service: &LanguageService, path: &Path, from: usize) -> anyhow::Result<()> {
	let mut source = open(service, path)?;
	let snapshot = source.snapshot();
	let mut scanner = service.create_scanner(&source);
	let mut state = source.line_state(from);

	for (line, text) in snapshot.lines().enumerate().skip(from) {
		scanner.set_source(&text, 0);
		while let Some(token) = scanner.scan_token(&mut state) {
			let name = colorable_item(token.kind).name;
			println!(
				"{}:{}-{} {:?} {} {:?}",
				line + 1,
				token.span.start + 1,
				token.span.end,
				token.kind,
				name,
				&text[token.span.clone()]
			);
		}
	}
	source.close();
	Ok(())
}

fn colors(service: &LanguageService) {
	println!("{} ({})", service.name(), service.format_filter_list());
	for index in 1..=service.classification_kind_count() {
		if let Some(item) = service.classification_kind(index) {
			println!(
				"{index:>2} {:<16} fg={:?} bg={:?} style={:?}",
				item.name, item.foreground, item.background, item.style
			);
		}
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("tarn_analysis=trace,tarn_language=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
		.init();
}
