use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer, ser::SerializeMap};
use uuid::Uuid;

use crate::filter::Expression;

#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
	Quiz(Quiz),
	Flashcard(Flashcard),
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
	pub question:    String,
	pub options:     Options,
	// Always one of the keys of `options`
	pub answer:      String,
	#[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
	pub explanation: Option<String>,
	pub tags:        Vec<String>,
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
	pub fact:        String,
	pub answer:      String,
	#[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
	pub explanation: Option<String>,
	pub tags:        Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
	Quiz,
	Flashcard,
}

impl Item {
	pub fn kind(&self) -> ItemKind {
		match self {
			Item::Quiz(_) => ItemKind::Quiz,
			Item::Flashcard(_) => ItemKind::Flashcard,
		}
	}

	/// The question of a quiz or the fact of a flashcard
	pub fn prompt(&self) -> &str {
		match self {
			Item::Quiz(quiz) => &quiz.question,
			Item::Flashcard(card) => &card.fact,
		}
	}

	/// For a quiz this is the option key, not the option text
	pub fn answer(&self) -> &str {
		match self {
			Item::Quiz(quiz) => &quiz.answer,
			Item::Flashcard(card) => &card.answer,
		}
	}

	pub fn explanation(&self) -> Option<&str> {
		match self {
			Item::Quiz(quiz) => quiz.explanation.as_deref(),
			Item::Flashcard(card) => card.explanation.as_deref(),
		}
	}

	pub fn tags(&self) -> &[String] {
		match self {
			Item::Quiz(quiz) => &quiz.tags,
			Item::Flashcard(card) => &card.tags,
		}
	}
}

/// Multiple-choice options of a quiz, kept in declaration order. Declaring a
/// key twice replaces its text but keeps its original position.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Options(Vec<(String, String)>);

impl Options {
	pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
		let key = key.into();
		let text = text.into();
		match self.0.iter_mut().find(|(k, _)| *k == key) {
			Some((_, existing)) => *existing = text,
			None => self.0.push((key, text)),
		}
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.iter().find(|(k, _)| k == key).map(|(_, text)| text.as_str())
	}

	pub fn contains_key(&self, key: &str) -> bool { self.get(key).is_some() }

	pub fn len(&self) -> usize { self.0.len() }

	pub fn is_empty(&self) -> bool { self.0.is_empty() }

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(key, text)| (key.as_str(), text.as_str()))
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut options = Options::default();
		for (key, text) in iter {
			options.insert(key, text);
		}
		options
	}
}

#[cfg(feature = "serde")]
impl Serialize for Options {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.len()))?;
		for (key, text) in self.iter() {
			map.serialize_entry(key, text)?;
		}
		map.end()
	}
}

/// The caller-owned collection of parsed items, keyed by identifier.
///
/// Iteration follows insertion order so listings match the order items were
/// declared in their files.
#[derive(Debug, Default, Clone)]
pub struct ItemDb {
	order: Vec<Uuid>,
	items: HashMap<Uuid, Item>,
}

impl ItemDb {
	pub fn new() -> Self { Self::default() }

	/// Inserts an item, replacing any item already stored under `id`
	pub fn insert(&mut self, id: Uuid, item: Item) {
		if self.items.insert(id, item).is_none() {
			self.order.push(id);
		}
	}

	pub fn get(&self, id: &Uuid) -> Option<&Item> { self.items.get(id) }

	pub fn len(&self) -> usize { self.items.len() }

	pub fn is_empty(&self) -> bool { self.items.is_empty() }

	pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &Item)> {
		self.order.iter().filter_map(|id| self.items.get_key_value(id))
	}

	pub fn values(&self) -> impl Iterator<Item = &Item> { self.iter().map(|(_, item)| item) }

	/// Set union keyed by identifier; on collision the incoming item wins.
	pub fn merge(&mut self, other: ItemDb) {
		let ItemDb { order, mut items } = other;
		for id in order {
			if let Some(item) = items.remove(&id) {
				self.insert(id, item);
			}
		}
	}

	/// Distinct tags attached to quiz items, sorted. These are the tags a quiz
	/// filter can usefully refer to.
	pub fn quiz_tags(&self) -> Vec<&str> {
		let mut tags: Vec<&str> = self
			.values()
			.filter(|item| item.kind() == ItemKind::Quiz)
			.flat_map(|item| item.tags().iter().map(String::as_str))
			.collect();
		tags.sort_unstable();
		tags.dedup();
		tags
	}

	/// Items whose tags satisfy `expression`, optionally restricted to one kind.
	pub fn filter<'a>(
		&'a self,
		expression: &'a Expression,
		kind: Option<ItemKind>,
	) -> impl Iterator<Item = (&'a Uuid, &'a Item)> + 'a {
		self
			.iter()
			.filter(move |(_, item)| kind.is_none_or(|kind| item.kind() == kind))
			.filter(move |(_, item)| expression.evaluate(item.tags()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn quiz(question: &str, tags: &[&str]) -> Item {
		Item::Quiz(Quiz {
			question:    question.to_string(),
			options:     [("A", "yes"), ("B", "no")].into_iter().collect(),
			answer:      "A".to_string(),
			explanation: None,
			tags:        tags.iter().map(|t| t.to_string()).collect(),
		})
	}

	fn flashcard(fact: &str, tags: &[&str]) -> Item {
		Item::Flashcard(Flashcard {
			fact:        fact.to_string(),
			answer:      "yes".to_string(),
			explanation: Some("because".to_string()),
			tags:        tags.iter().map(|t| t.to_string()).collect(),
		})
	}

	#[test]
	fn options_keep_first_position_on_redeclaration() {
		let mut options = Options::default();
		options.insert("A", "Paris");
		options.insert("B", "London");
		options.insert("A", "Lyon");

		let collected: Vec<_> = options.iter().collect();
		assert_eq!(collected, vec![("A", "Lyon"), ("B", "London")]);
	}

	#[test]
	fn merge_is_a_union_keyed_by_id() {
		let shared = Uuid::new_v4();
		let mut left = ItemDb::new();
		left.insert(shared, quiz("old", &[]));
		left.insert(Uuid::new_v4(), quiz("kept", &[]));

		let mut right = ItemDb::new();
		right.insert(shared, quiz("new", &[]));
		right.insert(Uuid::new_v4(), flashcard("added", &[]));

		left.merge(right);

		assert_eq!(left.len(), 3);
		assert_eq!(left.get(&shared).map(Item::prompt), Some("new"));
		let prompts: Vec<_> = left.values().map(Item::prompt).collect();
		assert_eq!(prompts, vec!["new", "kept", "added"]);
	}

	#[test]
	fn quiz_tags_ignore_flashcards() {
		let mut db = ItemDb::new();
		db.insert(Uuid::new_v4(), quiz("q1", &["math", "easy"]));
		db.insert(Uuid::new_v4(), quiz("q2", &["math"]));
		db.insert(Uuid::new_v4(), flashcard("f1", &["french"]));

		assert_eq!(db.quiz_tags(), vec!["easy", "math"]);
	}

	#[test]
	fn filter_applies_expression_and_kind() {
		let mut db = ItemDb::new();
		db.insert(Uuid::new_v4(), quiz("q1", &["Math", "easy"]));
		db.insert(Uuid::new_v4(), quiz("q2", &["math"]));
		db.insert(Uuid::new_v4(), flashcard("f1", &["math", "easy"]));

		let expression: Expression = "math and not easy".parse().unwrap();
		let prompts: Vec<_> = db.filter(&expression, None).map(|(_, item)| item.prompt()).collect();
		assert_eq!(prompts, vec!["q2"]);

		let expression: Expression = "easy".parse().unwrap();
		let prompts: Vec<_> =
			db.filter(&expression, Some(ItemKind::Flashcard)).map(|(_, item)| item.prompt()).collect();
		assert_eq!(prompts, vec!["f1"]);
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serializes_with_type_tag() {
		let json = serde_json::to_value(quiz("2+2?", &["math"])).unwrap();
		assert_eq!(json["type"], "quiz");
		assert_eq!(json["options"]["A"], "yes");
		assert!(json.get("explanation").is_none());
	}
}
