use std::{io, path::{Path, PathBuf}, process};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand, ValueEnum};
use eyre::Result;
use quizmaster::{Expression, Item, ItemDb, ItemKind, ParseError, ParseFailure, config::QuizConfig, importer::{self, ImportReport}, logging, matches, parse, print_item_debug};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "quizmaster", version, about = "Check, import and filter quiz and flashcard files")]
struct Cli {
	/// Config file (defaults to ./quizmaster.toml when present)
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Log filter, e.g. `debug` or `quizmaster=trace`
	#[arg(long, global = true)]
	log_level: Option<String>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Parse one file and report the first error, if any
	Check { file: PathBuf },

	/// Import every quiz file in a directory and summarize the result
	Import { dir: Option<PathBuf> },

	/// List imported items, optionally filtered by a tag expression
	List {
		dir: Option<PathBuf>,

		/// Tag expression such as "(math OR physics) AND NOT hard"
		#[arg(short, long)]
		filter: Option<String>,

		#[arg(short, long, value_enum)]
		kind: Option<KindArg>,

		#[arg(long)]
		json: bool,
	},

	/// Print the tags available for filtering quizzes
	Tags { dir: Option<PathBuf> },

	/// Evaluate a tag expression against the given tags
	Eval { expression: String, tags: Vec<String> },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
	Quiz,
	Flashcard,
}

impl From<KindArg> for ItemKind {
	fn from(kind: KindArg) -> Self {
		match kind {
			KindArg::Quiz => ItemKind::Quiz,
			KindArg::Flashcard => ItemKind::Flashcard,
		}
	}
}

fn report_parse_failure(path: &Path, content: &str, failure: &ParseFailure) -> io::Result<()> {
	if failure.kind == ParseError::Empty {
		eprintln!("{}: error {}: {}", path.display(), failure.kind.code(), failure.kind);
		return Ok(());
	}

	let name = path.display().to_string();
	Report::build(ReportKind::Error, (name.clone(), failure.span.clone()))
		.with_code(failure.kind.code())
		.with_message(failure.kind.to_string())
		.with_label(
			Label::new((name.clone(), failure.span.clone()))
				.with_message(format!("parsing stopped at line {}", failure.line))
				.with_color(Color::Red),
		)
		.finish()
		.eprint((name, Source::from(content)))
}

fn check(path: &Path) -> Result<()> {
	let content = fs_err::read_to_string(path)?;

	match parse(&content).into_result() {
		Ok(items) => {
			for item in items.values() {
				print_item_debug(item);
			}
			println!("{}: {} items", path.display(), items.len());
			Ok(())
		}
		Err(failure) => {
			report_parse_failure(path, &content, &failure)?;
			process::exit(i32::from(failure.kind.code()));
		}
	}
}

fn import(dir: &Path, config: &QuizConfig) -> Result<ImportReport> {
	let report = importer::import_dir(dir, &config.extensions)?;
	for failed in &report.failures {
		warn!("{}: error {}: {}", failed.path.display(), failed.failure.kind.code(), failed.failure.kind);
	}
	Ok(report)
}

fn print_summary(report: &ImportReport) {
	for failed in &report.failures {
		println!(
			"{} : Error {} : {} (line {})",
			failed.path.display(),
			failed.failure.kind.code(),
			failed.failure.kind,
			failed.failure.line
		);
	}
	println!(
		"{} files imported, {} failed, {} items available",
		report.imported,
		report.failures.len(),
		report.items.len()
	);
}

fn print_item(item: &Item) {
	let label = match item.kind() {
		ItemKind::Quiz => "quiz",
		ItemKind::Flashcard => "flashcard",
	};
	println!("[{}] {}", label, item.prompt());
	if let Item::Quiz(quiz) = item {
		for (key, text) in quiz.options.iter() {
			println!("  {}. {}", key, text);
		}
	}
	println!("  answer: {}", item.answer());
	if let Some(explanation) = item.explanation() {
		println!("  explanation: {}", explanation);
	}
	if !item.tags().is_empty() {
		println!("  tags: {}", item.tags().join(", "));
	}
}

#[cfg(feature = "serde")]
fn print_json<'a>(items: impl Iterator<Item = (&'a uuid::Uuid, &'a Item)>) -> Result<()> {
	let entries: Vec<_> = items.map(|(id, item)| serde_json::json!({ "id": id, "item": item })).collect();
	println!("{}", serde_json::to_string_pretty(&entries)?);
	Ok(())
}

#[cfg(not(feature = "serde"))]
fn print_json<'a>(_items: impl Iterator<Item = (&'a uuid::Uuid, &'a Item)>) -> Result<()> {
	eyre::bail!("JSON output requires the `serde` feature")
}

fn list(db: &ItemDb, filter: Option<&str>, kind: Option<ItemKind>, json: bool) -> Result<()> {
	// No filter means every item matches
	let expression = filter.map(Expression::parse).transpose()?;
	let selected: Vec<_> = match &expression {
		Some(expression) => db.filter(expression, kind).collect(),
		None => db.iter().filter(|(_, item)| kind.is_none_or(|kind| item.kind() == kind)).collect(),
	};
	info!("{} of {} items selected", selected.len(), db.len());

	if json {
		return print_json(selected.into_iter());
	}
	for (_, item) in selected {
		print_item(item);
	}
	Ok(())
}

fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();
	let config = QuizConfig::load(cli.config.as_deref())?;
	let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
	logging::init_logging(level, cli.log_level.is_some());

	let quizzes_dir = |dir: Option<PathBuf>| dir.unwrap_or_else(|| config.quizzes_dir.clone());

	match cli.command {
		Commands::Check { file } => check(&file)?,
		Commands::Import { dir } => print_summary(&import(&quizzes_dir(dir), &config)?),
		Commands::List { dir, filter, kind, json } => {
			let report = import(&quizzes_dir(dir), &config)?;
			list(&report.items, filter.as_deref(), kind.map(ItemKind::from), json)?;
		}
		Commands::Tags { dir } => {
			let report = import(&quizzes_dir(dir), &config)?;
			for tag in report.items.quiz_tags() {
				println!("{}", tag);
			}
		}
		Commands::Eval { expression, tags } => println!("{}", matches(&expression, tags.as_slice())?),
	}

	Ok(())
}
