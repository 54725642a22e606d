use std::path::{Path, PathBuf};

use tracing::{debug, error, info, instrument};

use crate::error::QuizError;

fn has_quiz_extension(path: &Path, extensions: &[String]) -> bool {
	path
		.extension()
		.and_then(|e| e.to_str())
		.is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
}

/// Collects every file under `dir`, at any depth, whose extension is one of
/// `extensions`. The result is sorted so imports run in a stable order.
#[instrument(skip(extensions))]
pub fn find_quiz_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, QuizError> {
	info!("Searching for quiz files in {:?}", dir);

	if !dir.is_dir() {
		error!("Quiz directory not found");
		return Err(QuizError::QuizDirNotFound(dir.to_path_buf()));
	}

	let mut files = Vec::new();
	let mut pending = vec![dir.to_path_buf()];

	while let Some(current) = pending.pop() {
		for entry in fs_err::read_dir(&current)? {
			let path = entry?.path();

			if path.is_dir() {
				pending.push(path);
			} else if path.is_file() && has_quiz_extension(&path, extensions) {
				debug!("Found quiz file: {:?}", path);
				files.push(path);
			}
		}
	}

	files.sort();
	info!("Found {} quiz files", files.len());
	Ok(files)
}
