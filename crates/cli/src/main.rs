//! poimap binary.
//!
//! Loads a JSON-lines restaurant file, subscribes a pipeline to it, applies
//! the filters given on the command line and reports every changeset as it
//! is replayed onto an in-memory map surface.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use poimap_diff::Change;
use poimap_filter::{FilterSnapshot, FilterState, catalog};
use poimap_pipeline::{ChangeApplier, Changeset, ChangesetStream, InMemorySurface, Item, PipelineConfig, ReactivePipeline, Trigger};
use poimap_source::{DataSource, JsonLinesFile, Place};
use tracing::info;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "poimap")]
#[command(about = "Incrementally reconcile filtered restaurant data into map changesets")]
struct Args {
	/// JSON-lines data file (one restaurant per line)
	#[arg(short, long, value_name = "FILE")]
	data: PathBuf,

	/// Pipeline configuration (TOML)
	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Keep only these cuisines (repeatable)
	#[arg(long, value_name = "CUISINE")]
	cuisine: Vec<String>,

	/// Keep only these grades (repeatable)
	#[arg(long, value_name = "GRADE")]
	grade: Vec<String>,

	/// Print every displayed place at the end
	#[arg(short, long)]
	list: bool,

	/// Verbose logging (repeat for trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let subscriber = tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_max_level(match args.verbose {
			0 => tracing::Level::INFO,
			1 => tracing::Level::DEBUG,
			_ => tracing::Level::TRACE,
		})
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	let config = match &args.config {
		Some(path) => PipelineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => PipelineConfig::default(),
	};

	let source = DataSource::new(JsonLinesFile::new(&args.data));
	let version = source.refresh_now().await.with_context(|| format!("reading {}", args.data.display()))?;
	let snapshot = source.current();
	info!(version, records = snapshot.records.len(), malformed = snapshot.malformed, "data loaded");

	let filters = Arc::new(FilterState::restaurants()?);
	let pipeline = ReactivePipeline::new(source.clone(), Arc::clone(&filters), config);
	let applier = ChangeApplier::new(pipeline.config().apply);
	let mut surface = InMemorySurface::new();
	let mut stream = pipeline.subscribe();

	// The initial fold already covers the snapshot loaded above.
	let Some(initial) = stream.recv().await else {
		bail!("pipeline stopped before its first changeset");
	};
	replay(&applier, &mut surface, &initial).await;

	restrict(&filters, catalog::CUISINE, &args.cuisine)?;
	restrict(&filters, catalog::GRADE, &args.grade)?;

	let target = filters.snapshot();
	if initial.filters != target {
		info!(debounce_ms = pipeline.config().debounce_ms, "waiting for filters to settle");
		await_selection(&mut stream, &target, &applier, &mut surface).await?;
	}

	let stats = stream.stats();
	println!(
		"displayed {} places ({} recomputations, {} emissions, {} skipped)",
		surface.len(),
		stats.recomputations(),
		stats.emissions(),
		stats.skipped()
	);
	if args.list {
		for place in surface.items() {
			println!("{}", describe(place));
		}
	}

	stream.unsubscribe().await;
	source.cancel_refresh();
	Ok(())
}

/// Replays changesets until one was evaluated with `target`.
///
/// Either trigger can deliver it: a data fold that runs after the edit
/// already sees the new selection, and the debounced filter wake-up that
/// follows is then skipped.
async fn await_selection(stream: &mut ChangesetStream, target: &FilterSnapshot, applier: &ChangeApplier, surface: &mut InMemorySurface<Item>) -> anyhow::Result<()> {
	loop {
		let Some(changeset) = stream.recv().await else {
			bail!("pipeline stopped before filters settled");
		};
		replay(applier, surface, &changeset).await;
		if changeset.filters == *target {
			return Ok(());
		}
	}
}

/// Selects exactly `values` in `dimension`; an empty list leaves it untouched.
fn restrict(filters: &FilterState, dimension: &str, values: &[String]) -> anyhow::Result<()> {
	if values.is_empty() {
		return Ok(());
	}
	let Some(set) = filters.dimension(dimension) else {
		bail!("unknown filter dimension {dimension}");
	};
	set.select_none();
	for value in values {
		set.select(value, true).with_context(|| format!("--{dimension} {value}"))?;
	}
	Ok(())
}

async fn replay(applier: &ChangeApplier, surface: &mut InMemorySurface<Item>, changeset: &Changeset) {
	let report = applier.apply(surface, &changeset.changes).await;
	let counts = changeset.counts();
	println!(
		"#{} {:<8} +{} -{} ~{} => {} displayed",
		changeset.generation,
		trigger_label(changeset.trigger),
		counts.inserts,
		counts.deletes,
		counts.replaces,
		surface.len()
	);
	for change in changeset.changes.iter().filter(|c| matches!(c, Change::Replace { .. })) {
		tracing::debug!(id = change.item().id(), "replaced");
	}
	tracing::debug!(chunks = report.chunks, moves_ignored = report.moves_ignored, "changeset applied");
}

fn trigger_label(trigger: Trigger) -> &'static str {
	match trigger {
		Trigger::Initial => "initial",
		Trigger::Data { .. } => "data",
		Trigger::Filter => "filter",
	}
}

fn describe(place: &Place) -> String {
	format!(
		"{:<10} {:<40} {:<24} {:<14} {}",
		place.id(),
		place.name(),
		place.cuisine(),
		place.latest_grade().unwrap_or("-"),
		place.subtitle()
	)
}
