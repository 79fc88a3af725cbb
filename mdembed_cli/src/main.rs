use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use mdembed_cli::Commands;
use mdembed_cli::EmbedCli;
use mdembed_cli::OutputFormat;
use mdembed_core::project::CheckResult;
use mdembed_core::project::ProjectContext;
use mdembed_core::project::StaleEntry;
use mdembed_core::project::check_project;
use mdembed_core::project::compute_updates;
use mdembed_core::project::scan_project_with_config;
use mdembed_core::project::write_updates;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = EmbedCli::parse();
	init_tracing();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Check {
			diff,
			format,
			watch,
		}) => run_check(&args, diff, format, watch),
		Some(Commands::Update { dry_run, watch }) => run_update(&args, dry_run, watch),
		Some(Commands::List) => run_list(&args),
		None => {
			eprintln!("No subcommand specified. Run `mdembed --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<mdembed_core::EmbedError>() {
			Ok(embed_err) => {
				let report: miette::Report = (*embed_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Route core tracing output to stderr, controlled by `MDEMBED_LOG`.
fn init_tracing() {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("MDEMBED_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn resolve_root(args: &EmbedCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn run_init(args: &EmbedCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config_path = root.join("mdembed.toml");

	if config_path.exists() {
		println!("Config file already exists: {}", config_path.display());
		return Ok(());
	}

	let sample_config = "# mdembed configuration\n\n# Directory that referenced files must live \
	                     under. Must be absolute; defaults to the\n# project root.\n# root_dir = \
	                     \"/absolute/path/to/project\"\n\n# Permit references outside root_dir \
	                     (off by default).\n# allow_importing_from_outside = false\n\n# Keep the \
	                     trailing blank line of files that end with a newline.\n# \
	                     preserve_trailing_newline = false\n\n# Strip the common leading \
	                     indentation from whole-file extractions.\n# remove_redundant_indentations \
	                     = false\n\n# Gitignore-style patterns to skip while scanning.\n# \
	                     [exclude]\n# patterns = [\"vendor/\", \"*.generated.md\"]\n";

	std::fs::write(&config_path, sample_config)?;
	println!("Created mdembed.toml");
	println!();
	println!("Next steps:");
	println!("  1. Annotate a fenced code block in your markdown:");
	println!("     ```rust file=./src/lib.rs#L1-L10");
	println!("     ```");
	println!("  2. Run `mdembed update` to pull in the referenced lines");
	println!("  3. Run `mdembed check` in CI to catch drift");

	Ok(())
}

fn scan_and_report(args: &EmbedCli) -> Result<ProjectContext, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let ctx = scan_project_with_config(&root)?;

	if args.verbose {
		println!(
			"Scanned project: {} annotated block(s) in {} document(s)",
			ctx.project.import_count(),
			ctx.project.documents.len()
		);

		for document in &ctx.project.documents {
			let rel = make_relative(&document.file, &root);
			println!("  {rel} ({} block(s))", document.imports.len());
		}
	}

	Ok(ctx)
}

fn run_check(
	args: &EmbedCli,
	show_diff: bool,
	format: OutputFormat,
	watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	// Run the initial check.
	let is_stale = run_check_once(args, show_diff, format)?;

	if !watch {
		if is_stale {
			process::exit(1);
		}
		return Ok(());
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let root = resolve_root(args);
	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_) | notify::EventKind::Create(_)
				) {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&root, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, checking...");
		if let Err(e) = run_check_once(args, show_diff, format) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

/// Run a single check and return whether any blocks are stale (true = stale).
fn run_check_once(
	args: &EmbedCli,
	show_diff: bool,
	format: OutputFormat,
) -> Result<bool, Box<dyn std::error::Error>> {
	let ctx = scan_and_report(args)?;
	let root = resolve_root(args);
	let result = check_project(&ctx)?;

	if result.is_ok() {
		match format {
			OutputFormat::Json => {
				println!("{{\"ok\":true,\"stale\":[]}}");
			}
			OutputFormat::Github => {
				println!("All annotated code blocks are up to date.");
			}
			OutputFormat::Text => {
				println!("Check passed: all annotated code blocks are up to date.");
			}
		}
		return Ok(false);
	}

	match format {
		OutputFormat::Json => {
			let stale_entries: Vec<serde_json::Value> = result
				.stale
				.iter()
				.map(|entry| {
					let rel = make_relative(&entry.file, &root);
					serde_json::json!({
						"file": rel,
						"annotation": entry.annotation,
						"line": entry.line,
						"column": entry.column,
					})
				})
				.collect();
			let output = serde_json::json!({
				"ok": false,
				"stale": stale_entries,
			});
			println!("{output}");
		}
		OutputFormat::Github => {
			for entry in &result.stale {
				let rel = make_relative(&entry.file, &root);
				println!(
					"::warning file={rel},line={},col={}::Code block `{}` is out of date",
					entry.line, entry.column, entry.annotation
				);
			}
			eprintln!("{}", check_summary(&result));
		}
		OutputFormat::Text => {
			eprintln!("Check failed.");
			eprintln!("  stale blocks: {}", result.stale.len());
			eprintln!();
			eprintln!("Stale blocks:");
			for entry in sorted_stale_entries(&result, &root) {
				let rel = make_relative(&entry.file, &root);
				eprintln!(
					"  `{}` at {rel}:{}:{}",
					entry.annotation, entry.line, entry.column
				);

				if show_diff {
					print_diff(&entry.current_content, &entry.expected_content);
				}
			}
			eprintln!();
			eprintln!("{}", check_summary(&result));
		}
	}

	Ok(true)
}

fn check_summary(result: &CheckResult) -> String {
	format!(
		"{} code block(s) are out of date. Run `mdembed update` to fix.",
		result.stale.len()
	)
}

fn sorted_stale_entries<'a>(result: &'a CheckResult, root: &Path) -> Vec<&'a StaleEntry> {
	let mut stale_entries: Vec<_> = result.stale.iter().collect();
	stale_entries.sort_by(|a, b| {
		make_relative(&a.file, root)
			.cmp(&make_relative(&b.file, root))
			.then_with(|| a.line.cmp(&b.line))
			.then_with(|| a.column.cmp(&b.column))
	});
	stale_entries
}

fn run_update(
	args: &EmbedCli,
	dry_run: bool,
	watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	// Run the initial update.
	run_update_once(args, dry_run)?;

	if !watch || dry_run {
		return Ok(());
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let root = resolve_root(args);
	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_) | notify::EventKind::Create(_)
				) {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&root, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, updating...");
		if let Err(e) = run_update_once(args, false) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn run_update_once(args: &EmbedCli, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
	let ctx = scan_and_report(args)?;
	let root = resolve_root(args);
	let updates = compute_updates(&ctx)?;

	if updates.updated_count == 0 {
		println!("All annotated code blocks are already up to date.");
		return Ok(());
	}

	if dry_run {
		println!(
			"Dry run: would update {} block(s) in {} file(s):",
			updates.updated_count,
			updates.updated_files.len()
		);
		let mut paths: Vec<_> = updates.updated_files.keys().collect();
		paths.sort();
		for path in paths {
			let rel = make_relative(path, &root);
			println!("  {rel}");
		}
	} else {
		write_updates(&updates)?;
		println!(
			"Updated {} block(s) in {} file(s).",
			updates.updated_count,
			updates.updated_files.len()
		);

		if args.verbose {
			let mut paths: Vec<_> = updates.updated_files.keys().collect();
			paths.sort();
			for path in paths {
				let rel = make_relative(path, &root);
				println!("  {rel}");
			}
		}
	}

	Ok(())
}

fn run_list(args: &EmbedCli) -> Result<(), Box<dyn std::error::Error>> {
	let ctx = scan_and_report(args)?;
	let root = resolve_root(args);

	if ctx.project.documents.is_empty() {
		println!("No annotated code blocks found.");
		return Ok(());
	}

	println!("{}", colored!("Annotated blocks:", bold));
	for document in &ctx.project.documents {
		let rel = make_relative(&document.file, &root);
		for import in &document.imports {
			println!(
				"  {rel}:{}:{} {}{}",
				import.line, import.column, import.reference.path, import.reference.range
			);
		}
	}

	// Summary
	println!(
		"\n{} annotated block(s) in {} document(s)",
		ctx.project.import_count(),
		ctx.project.documents.len()
	);

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
