use std::{ops::Range, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
	#[error("Quiz directory '{0}' not found")]
	QuizDirNotFound(PathBuf),

	#[error("Config file '{0}' not found")]
	ConfigNotFound(PathBuf),

	#[error("Invalid config: {0}")]
	Config(#[from] toml::de::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// The closed set of reasons an item file can be rejected. Each variant maps
/// to a stable status code (see [`ParseError::code`]); zero is reserved for
/// success.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseError {
	#[error("An unexpected error occurred.")]
	Internal,

	#[error("An item was not properly ended.")]
	Unterminated,

	#[error("Flashcards cannot have options.")]
	OptionsInFlashcard,

	#[error("Unknown line argument.")]
	UnknownCommand,

	#[error("An item is missing required fields.")]
	MissingFields,

	#[error("Answer not in options.")]
	AnswerNotInOptions,

	#[error("Arguments must be between Q or F and END.")]
	OutsideItem,

	#[error("No content.")]
	Empty,
}

impl ParseError {
	pub fn code(self) -> u8 {
		match self {
			ParseError::Internal => 1,
			ParseError::Unterminated => 2,
			ParseError::OptionsInFlashcard => 3,
			ParseError::UnknownCommand => 4,
			ParseError::MissingFields => 5,
			ParseError::AnswerNotInOptions => 6,
			ParseError::OutsideItem => 7,
			ParseError::Empty => 8,
		}
	}
}

/// A parse error pinned to the line that triggered it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: error {}: {kind}", .kind.code())]
pub struct ParseFailure {
	pub kind: ParseError,
	/// One-based line number; zero when the failure has no line (empty input)
	pub line: usize,
	/// Byte range of the offending line within the parsed content
	pub span: Range<usize>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
	#[error("Malformed expression: {0}")]
	MalformedExpression(String),
}
