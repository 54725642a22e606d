use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::{error::{ParseFailure, QuizError}, parse::{Parsed, parse}, quiz_locator::find_quiz_files, types::item::ItemDb};

/// A quiz file that could not be imported
#[derive(Debug, Clone)]
pub struct ImportFailure {
	pub path:    PathBuf,
	pub failure: ParseFailure,
}

/// What came out of importing a directory of quiz files
#[derive(Debug, Default)]
pub struct ImportReport {
	/// Items from every file that parsed cleanly
	pub items:    ItemDb,
	pub failures: Vec<ImportFailure>,
	/// Number of files whose items were merged into `items`
	pub imported: usize,
}

#[instrument]
pub fn import_file(path: &Path) -> Result<Parsed, QuizError> {
	let content = fs_err::read_to_string(path)?;
	Ok(parse(&content))
}

/// Parses every quiz file under `dir`.
///
/// A file is all-or-nothing: if it fails to parse, none of its items are
/// kept, and the failure is recorded instead. I/O errors abort the import.
#[instrument(skip(extensions))]
pub fn import_dir(dir: &Path, extensions: &[String]) -> Result<ImportReport, QuizError> {
	let files = find_quiz_files(dir, extensions)?;
	info!("Importing {} quiz files", files.len());

	let mut report = ImportReport::default();

	for path in files {
		match import_file(&path)?.into_result() {
			Ok(items) => {
				info!("Imported {} items from {:?}", items.len(), path);
				report.items.merge(items);
				report.imported += 1;
			}
			Err(failure) => {
				warn!("Skipping {:?}: {}", path, failure);
				report.failures.push(ImportFailure { path, failure });
			}
		}
	}

	info!("Imported {} files, {} failed, {} items", report.imported, report.failures.len(), report.items.len());
	Ok(report)
}
