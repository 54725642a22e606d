/// Where the item parser currently is relative to an item block
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ParserMode {
	#[default]
	Outside,
	InItem,
	InOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
	Question,
	Fact,
	Options,
	Answer,
	Explanation,
	Tags,
	End,
	/// A `<key>.<text>` line inside an options block, carrying the key
	Choice(&'a str),
	Unknown(&'a str),
}

/// One classified line of item text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLine<'a> {
	pub command: Command<'a>,
	pub content: &'a str,
}
