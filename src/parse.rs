use std::ops::Range;

use tracing::{debug, instrument, warn};

use crate::{error::{ParseError, ParseFailure}, types::{item::{Flashcard, Item, ItemDb, Options, Quiz}, parser::{Command, ItemLine, ParserMode}}, uuid_generator};

/// Outcome of parsing one piece of item text.
///
/// On failure `items` still holds every item closed before the offending
/// line.
#[derive(Debug, Clone)]
pub struct Parsed {
	pub items:   ItemDb,
	pub failure: Option<ParseFailure>,
}

impl Parsed {
	/// Zero on success, otherwise the code of the failure
	pub fn status(&self) -> u8 { self.failure.as_ref().map_or(0, |failure| failure.kind.code()) }

	pub fn is_success(&self) -> bool { self.failure.is_none() }

	pub fn into_result(self) -> Result<ItemDb, ParseFailure> {
		match self.failure {
			Some(failure) => Err(failure),
			None => Ok(self.items),
		}
	}
}

#[derive(Debug)]
enum PendingKind {
	Quiz { question: String, options: Option<Options> },
	Flashcard { fact: String },
}

#[derive(Debug)]
struct PendingItem {
	kind:        PendingKind,
	answer:      Option<String>,
	explanation: Option<String>,
	tags:        Vec<String>,
	// Where the item was opened, for unterminated-item reports
	line:        usize,
	span:        Range<usize>,
}

impl PendingItem {
	fn new(kind: PendingKind, line: usize, span: Range<usize>) -> Self {
		Self { kind, answer: None, explanation: None, tags: Vec::new(), line, span }
	}

	fn is_flashcard(&self) -> bool { matches!(self.kind, PendingKind::Flashcard { .. }) }

	fn into_item(self) -> Result<Item, ParseError> {
		let answer = self.answer.ok_or(ParseError::MissingFields)?;

		match self.kind {
			PendingKind::Quiz { question, options } => {
				let options = options.ok_or(ParseError::MissingFields)?;
				Ok(Item::Quiz(Quiz { question, options, answer, explanation: self.explanation, tags: self.tags }))
			}
			PendingKind::Flashcard { fact } => {
				Ok(Item::Flashcard(Flashcard { fact, answer, explanation: self.explanation, tags: self.tags }))
			}
		}
	}
}

/// State machine for building items from classified lines
#[derive(Default)]
struct ItemBuilder {
	mode:    ParserMode,
	pending: Option<PendingItem>,
	// Options declared since the last `O:` line; attached to a quiz by `A:`
	options: Options,
	items:   ItemDb,
}

impl ItemBuilder {
	fn has_pending_item(&self) -> bool { self.pending.is_some() }

	fn pending_mut(&mut self) -> Result<&mut PendingItem, ParseError> {
		self.pending.as_mut().ok_or(ParseError::OutsideItem)
	}

	fn open(&mut self, kind: PendingKind, line: usize, span: Range<usize>) -> Result<(), ParseError> {
		if self.has_pending_item() {
			return Err(ParseError::Unterminated);
		}
		self.pending = Some(PendingItem::new(kind, line, span));
		self.mode = ParserMode::InItem;
		Ok(())
	}

	fn begin_options(&mut self) -> Result<(), ParseError> {
		if self.pending_mut()?.is_flashcard() {
			return Err(ParseError::OptionsInFlashcard);
		}
		self.options = Options::default();
		self.mode = ParserMode::InOptions;
		Ok(())
	}

	fn set_answer(&mut self, answer: &str) -> Result<(), ParseError> {
		let declared = self.options.clone();
		let pending = self.pending.as_mut().ok_or(ParseError::OutsideItem)?;

		if let PendingKind::Quiz { options, .. } = &mut pending.kind {
			self.mode = ParserMode::InItem;
			let valid = declared.contains_key(answer);
			*options = Some(declared);
			if !valid {
				return Err(ParseError::AnswerNotInOptions);
			}
		}

		pending.answer = Some(answer.to_string());
		Ok(())
	}

	fn finalize_item(&mut self) -> Result<(), ParseError> {
		let pending = self.pending.take().ok_or(ParseError::OutsideItem)?;
		let item = pending.into_item()?;
		let id = uuid_generator::generate_item_id();

		debug!("Closed {:?} item {}", item.kind(), id);
		self.items.insert(id, item);
		self.options = Options::default();
		self.mode = ParserMode::Outside;
		Ok(())
	}

	fn process_line(&mut self, line: &str, number: usize, span: Range<usize>) -> Result<(), ParseError> {
		let ItemLine { command, content } = classify_line(&mut self.mode, line)?;

		if !self.has_pending_item() && !matches!(command, Command::Question | Command::Fact) {
			return Err(ParseError::OutsideItem);
		}

		match command {
			Command::Question => {
				self.open(PendingKind::Quiz { question: content.to_string(), options: None }, number, span)
			}
			Command::Fact => self.open(PendingKind::Flashcard { fact: content.to_string() }, number, span),
			Command::Options => self.begin_options(),
			Command::Choice(key) => {
				self.options.insert(key, content);
				Ok(())
			}
			Command::Answer => self.set_answer(content),
			Command::Explanation => {
				self.pending_mut()?.explanation = Some(content.to_string());
				Ok(())
			}
			Command::Tags => {
				self.pending_mut()?.tags = content.split(',').map(|tag| tag.trim().to_string()).collect();
				Ok(())
			}
			Command::End => self.finalize_item(),
			Command::Unknown(_) => Err(ParseError::UnknownCommand),
		}
	}
}

/// Splits one trimmed, non-empty line into its command and content.
///
/// Inside an options block lines are `<key>.<text>`; everywhere else they are
/// `<command>:<content>`. An options line whose second character is a colon
/// ends the block and is read as a regular command line instead. Only `Q`,
/// `F` and `O` keep their meaning inside an options block; any other first
/// token, `A`, `E` and `END` included, is an option key.
pub fn classify_line<'a>(mode: &mut ParserMode, line: &'a str) -> Result<ItemLine<'a>, ParseError> {
	if *mode == ParserMode::InOptions {
		match line.chars().nth(1) {
			Some(':') => *mode = ParserMode::InItem,
			Some(_) => {}
			// A single character cannot be told apart as a command or a key
			None => return Err(ParseError::Internal),
		}
	}

	let in_options = *mode == ParserMode::InOptions;
	let delimiter = if in_options { '.' } else { ':' };
	let (command, content) = line.split_once(delimiter).unwrap_or((line, ""));
	let content = content.trim();

	let command = match command {
		"Q" => Command::Question,
		"F" => Command::Fact,
		"O" => Command::Options,
		key if in_options => Command::Choice(key),
		"END" => Command::End,
		"A" => Command::Answer,
		"E" => Command::Explanation,
		"T" => Command::Tags,
		other => Command::Unknown(other),
	};

	Ok(ItemLine { command, content })
}

/// Parses quiz and flashcard blocks.
///
/// Processing stops at the first offending line. Only text with no characters
/// at all is rejected as [`ParseError::Empty`]; blank lines are skipped, so
/// whitespace alone parses to no items.
#[instrument(skip(content), fields(len = content.len()))]
pub fn parse(content: &str) -> Parsed {
	if content.is_empty() {
		warn!("No content to parse");
		return Parsed {
			items:   ItemDb::default(),
			failure: Some(ParseFailure { kind: ParseError::Empty, line: 0, span: 0..0 }),
		};
	}

	let mut builder = ItemBuilder::default();
	let mut offset = 0;

	for (index, raw) in content.split_inclusive('\n').enumerate() {
		let start = offset;
		offset += raw.len();

		let line = raw.trim();
		if line.is_empty() {
			continue;
		}

		let leading = raw.len() - raw.trim_start().len();
		let span = start + leading..start + leading + line.len();
		let number = index + 1;

		if let Err(kind) = builder.process_line(line, number, span.clone()) {
			return fail(builder.items, kind, number, span);
		}
	}

	if let Some(pending) = builder.pending {
		return fail(builder.items, ParseError::Unterminated, pending.line, pending.span);
	}

	debug!("Parsed {} items", builder.items.len());
	Parsed { items: builder.items, failure: None }
}

fn fail(items: ItemDb, kind: ParseError, line: usize, span: Range<usize>) -> Parsed {
	warn!("Parsing stopped at line {}: {} (error {})", line, kind, kind.code());
	Parsed { items, failure: Some(ParseFailure { kind, line, span }) }
}
