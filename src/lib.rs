use tracing::{info, instrument};

pub mod config;
pub mod error;
pub mod filter;
pub mod importer;
pub mod logging;
pub mod parse;
pub mod quiz_locator;
pub mod types;
pub mod uuid_generator;

pub use error::{FilterError, ParseError, ParseFailure, QuizError};
pub use filter::{Expression, matches};
pub use parse::{Parsed, parse};
pub use types::item::{Flashcard, Item, ItemDb, ItemKind, Options, Quiz};

#[instrument(skip(item))]
pub fn print_item_debug(item: &Item) {
	info!("{:?}: {}", item.kind(), item.prompt());
	if let Item::Quiz(quiz) = item {
		for (key, text) in quiz.options.iter() {
			info!("  {}. {}", key, text);
		}
	}
	info!("Answer: {}", item.answer());
	if let Some(explanation) = item.explanation() {
		info!("Explanation: {}", explanation);
	}
	if !item.tags().is_empty() {
		info!("Tags: {:?}", item.tags());
	}
}
