//! Boolean tag filters such as `(geography OR history) AND NOT hard`.
//!
//! An expression goes through four stages: operator spellings are normalized
//! to `AND`/`OR`/`NOT`, the text is split into tokens, the tokens are
//! rearranged into postfix order and the postfix sequence is evaluated
//! against a set of tags. Tags compare case-insensitively.

use std::{collections::HashSet, str::FromStr};

use logos::Logos;
use tracing::{debug, instrument};

use crate::error::FilterError;

/// Alternate operator spellings and their canonical form, applied in order as
/// plain substring replacements. Only these exact casings are recognized.
const SPELLINGS: [(&str, &str); 10] = [
	("&&", "AND"),
	("&", "AND"),
	("||", "OR"),
	("|", "OR"),
	("not", "NOT"),
	("Not", "NOT"),
	("and", "AND"),
	("And", "AND"),
	("or", "OR"),
	("Or", "OR"),
];

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"\s+")]
pub enum Token {
	#[token("AND")]
	And,

	#[token("OR")]
	Or,

	#[token("NOT")]
	Not,

	#[token("(")]
	Open,

	#[token(")")]
	Close,

	#[regex(r"[^\s()]+", |lex| lex.slice().to_string())]
	Tag(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Not,
	And,
	Or,
}

impl Operator {
	fn precedence(self) -> u8 {
		match self {
			Operator::Not => 3,
			Operator::And => 2,
			Operator::Or => 1,
		}
	}
}

/// One element of a compiled expression, in postfix order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postfix {
	/// Lower-cased tag literal
	Tag(String),
	Operator(Operator),
}

// Entries of the operator stack while compiling
#[derive(Debug, Clone, Copy)]
enum Pending {
	Group,
	Operator(Operator),
}

fn malformed(reason: impl Into<String>) -> FilterError { FilterError::MalformedExpression(reason.into()) }

/// Rewrites `&&`, `|`, `and`, `Or`, ... to the canonical operator keywords
pub fn normalize(expression: &str) -> String {
	SPELLINGS.iter().fold(expression.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Splits an already normalized expression into tokens
pub fn tokenize(expression: &str) -> Result<Vec<Token>, FilterError> {
	Token::lexer(expression)
		.spanned()
		.map(|(token, span)| {
			token.map_err(|_| malformed(format!("unrecognized input at {}..{}", span.start, span.end)))
		})
		.collect()
}

/// Converts infix tokens to postfix order with the shunting-yard algorithm.
///
/// `NOT` binds tighter than `AND`, which binds tighter than `OR`. Operators of
/// equal precedence associate to the left.
pub fn compile(tokens: Vec<Token>) -> Result<Vec<Postfix>, FilterError> {
	let mut output = Vec::with_capacity(tokens.len());
	let mut stack: Vec<Pending> = Vec::new();

	for token in tokens {
		let operator = match token {
			Token::Tag(tag) => {
				output.push(Postfix::Tag(tag.to_lowercase()));
				continue;
			}
			Token::Open => {
				stack.push(Pending::Group);
				continue;
			}
			Token::Close => {
				loop {
					match stack.pop() {
						Some(Pending::Operator(operator)) => output.push(Postfix::Operator(operator)),
						Some(Pending::Group) => break,
						None => return Err(malformed("unmatched ')'")),
					}
				}
				continue;
			}
			Token::And => Operator::And,
			Token::Or => Operator::Or,
			Token::Not => Operator::Not,
		};

		while let Some(Pending::Operator(top)) = stack.last().copied() {
			if top.precedence() < operator.precedence() {
				break;
			}
			output.push(Postfix::Operator(top));
			stack.pop();
		}
		stack.push(Pending::Operator(operator));
	}

	while let Some(pending) = stack.pop() {
		match pending {
			Pending::Operator(operator) => output.push(Postfix::Operator(operator)),
			Pending::Group => return Err(malformed("unmatched '('")),
		}
	}

	Ok(output)
}

// Operator tree of a well-formed postfix sequence
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
	Tag(String),
	Not(Box<Node>),
	And(Box<Node>, Box<Node>),
	Or(Box<Node>, Box<Node>),
}

impl Node {
	fn evaluate(&self, tags: &HashSet<String>) -> bool {
		match self {
			Node::Tag(tag) => tags.contains(tag),
			Node::Not(operand) => !operand.evaluate(tags),
			Node::And(left, right) => left.evaluate(tags) && right.evaluate(tags),
			Node::Or(left, right) => left.evaluate(tags) || right.evaluate(tags),
		}
	}
}

/// Runs the postfix stack machine over operator trees instead of values.
///
/// Operand counts do not depend on tag values, so this is where every arity
/// error surfaces: `NOT` pops one, `AND`/`OR` pop right then left, and
/// exactly one tree must remain.
fn build_tree(postfix: &[Postfix]) -> Result<Node, FilterError> {
	let mut stack: Vec<Node> = Vec::with_capacity(postfix.len());
	let pop = |stack: &mut Vec<Node>| {
		stack.pop().map(Box::new).ok_or_else(|| malformed("operator is missing an operand"))
	};

	for element in postfix {
		let node = match element {
			Postfix::Tag(tag) => Node::Tag(tag.clone()),
			Postfix::Operator(Operator::Not) => Node::Not(pop(&mut stack)?),
			Postfix::Operator(Operator::And) => {
				let right = pop(&mut stack)?;
				Node::And(pop(&mut stack)?, right)
			}
			Postfix::Operator(Operator::Or) => {
				let right = pop(&mut stack)?;
				Node::Or(pop(&mut stack)?, right)
			}
		};
		stack.push(node);
	}

	match (stack.pop(), stack.is_empty()) {
		(Some(root), true) => Ok(root),
		(None, _) => Err(malformed("expression is empty")),
		(Some(_), false) => Err(malformed("operands are missing an operator")),
	}
}

/// Runs a postfix sequence against a set of lower-cased tags
pub fn evaluate_postfix(postfix: &[Postfix], tags: &HashSet<String>) -> Result<bool, FilterError> {
	Ok(build_tree(postfix)?.evaluate(tags))
}

fn tag_set<S: AsRef<str>>(tags: &[S]) -> HashSet<String> {
	tags.iter().map(|tag| tag.as_ref().to_lowercase()).collect()
}

/// A compiled tag filter, reusable across many tag sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
	source:  String,
	postfix: Vec<Postfix>,
	root:    Node,
}

impl Expression {
	/// Compiles `source`, rejecting it if it is not well formed.
	#[instrument]
	pub fn parse(source: &str) -> Result<Self, FilterError> {
		let postfix = compile(tokenize(&normalize(source))?)?;
		let root = build_tree(&postfix)?;

		debug!("Compiled filter to {:?}", postfix);
		Ok(Self { source: source.to_string(), postfix, root })
	}

	pub fn source(&self) -> &str { &self.source }

	pub fn postfix(&self) -> &[Postfix] { &self.postfix }

	/// Whether `tags` satisfy the expression
	pub fn evaluate<S: AsRef<str>>(&self, tags: &[S]) -> bool { self.root.evaluate(&tag_set(tags)) }
}

impl FromStr for Expression {
	type Err = FilterError;

	fn from_str(source: &str) -> Result<Self, Self::Err> { Self::parse(source) }
}

/// Evaluates `expression` against `tags` in one step
pub fn matches<S: AsRef<str>>(expression: &str, tags: &[S]) -> Result<bool, FilterError> {
	Ok(Expression::parse(expression)?.evaluate(tags))
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	fn tag(name: &str) -> Postfix { Postfix::Tag(name.to_string()) }

	#[rstest]
	#[case("A AND B", &["a", "b"], true)]
	#[case("A AND NOT B", &["a", "b"], false)]
	#[case("A OR B", &["c"], false)]
	#[case("(A OR B) AND NOT C", &["b"], true)]
	#[case("(A OR B) AND NOT C", &["b", "c"], false)]
	#[case("a OR b AND c", &["a"], true)]
	#[case("a OR b AND c", &["b"], false)]
	#[case("NOT a AND b", &["b"], true)]
	#[case("NOT (a AND b)", &["a", "b"], false)]
	#[case("a OR NOT b", &[], true)]
	#[case("Math", &["MATH"], true)]
	fn evaluates_against_tags(#[case] expression: &str, #[case] tags: &[&str], #[case] expected: bool) {
		assert_eq!(matches(expression, tags), Ok(expected));
	}

	#[rstest]
	#[case("a && b", "a AND b")]
	#[case("a & b", "a AND b")]
	#[case("a || b", "a OR b")]
	#[case("a | b", "a OR b")]
	#[case("not a and b or c", "NOT a AND b OR c")]
	#[case("Not a And b Or c", "NOT a AND b OR c")]
	#[case("NoT a", "NoT a")]
	#[case("history", "histORy")]
	fn normalizes_spellings(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize(input), expected);
	}

	#[test]
	fn words_containing_keywords_stay_tags() {
		assert_eq!(matches("android and history", &["Android", "history"]), Ok(true));
		assert_eq!(matches("cannot", &["cannot"]), Ok(true));
	}

	#[test]
	fn tokenizes_parentheses_without_spaces() {
		let tokens = tokenize("(a OR b)AND NOT(c)").unwrap();
		assert_eq!(tokens, vec![
			Token::Open,
			Token::Tag("a".to_string()),
			Token::Or,
			Token::Tag("b".to_string()),
			Token::Close,
			Token::And,
			Token::Not,
			Token::Open,
			Token::Tag("c".to_string()),
			Token::Close,
		]);
	}

	#[test]
	fn compiles_to_postfix() {
		let expression = Expression::parse("(A OR B) AND NOT C").unwrap();
		assert_eq!(expression.postfix(), &[
			tag("a"),
			tag("b"),
			Postfix::Operator(Operator::Or),
			tag("c"),
			Postfix::Operator(Operator::Not),
			Postfix::Operator(Operator::And),
		]);
	}

	#[test]
	fn equal_precedence_associates_left() {
		let expression = Expression::parse("a AND b AND c").unwrap();
		assert_eq!(expression.postfix(), &[
			tag("a"),
			tag("b"),
			Postfix::Operator(Operator::And),
			tag("c"),
			Postfix::Operator(Operator::And),
		]);
	}

	#[rstest]
	#[case::unclosed_group("(a OR b")]
	#[case::unopened_group("a OR b)")]
	#[case::dangling_operator("a AND")]
	#[case::lone_operator("OR")]
	#[case::empty("")]
	#[case::empty_group("()")]
	#[case::missing_operator("a b")]
	#[case::unnormalized_casing("NoT a")]
	fn rejects_malformed_expressions(#[case] expression: &str) {
		assert!(matches!(Expression::parse(expression), Err(FilterError::MalformedExpression(_))));
		assert!(super::matches(expression, &["a"]).is_err());
	}

	#[test]
	fn compiled_expression_is_reusable() {
		let expression: Expression = "geography | history".parse().unwrap();
		assert!(expression.evaluate(&["Geography"]));
		assert!(!expression.evaluate(&["math"]));
		assert!(expression.evaluate(&["history".to_string()]));
		assert_eq!(expression.source(), "geography | history");
	}

	#[rstest]
	#[case::underflow(vec![tag("a"), Postfix::Operator(Operator::And)])]
	#[case::leftover(vec![tag("a"), tag("b")])]
	#[case::empty(vec![])]
	fn postfix_arity_is_checked(#[case] postfix: Vec<Postfix>) {
		let tags = HashSet::from(["a".to_string(), "b".to_string()]);
		assert!(matches!(evaluate_postfix(&postfix, &tags), Err(FilterError::MalformedExpression(_))));
	}

	#[test]
	fn parsed_expression_evaluates_without_errors() {
		let expression = Expression::parse("NOT (a OR b) AND c").unwrap();
		assert_eq!(
			evaluate_postfix(expression.postfix(), &HashSet::from(["c".to_string()])),
			Ok(expression.evaluate(&["c"]))
		);
		assert!(expression.evaluate(&["c"]));
		assert!(!expression.evaluate(&["a", "c"]));
	}
}
