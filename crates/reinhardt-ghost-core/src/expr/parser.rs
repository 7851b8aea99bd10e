//! Recursive-descent parser producing the expression tree.

use crate::error::EvalError;
use crate::expr::lexer::{Lexer, Token};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
	Not,
	Negate,
	Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
	Add,
	Subtract,
	Multiply,
	Divide,
	Remainder,
	Less,
	LessEqual,
	Greater,
	GreaterEqual,
	LooseEqual,
	LooseNotEqual,
	StrictEqual,
	StrictNotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
	And,
	Or,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
	Literal(Literal),
	Identifier(String),
	Member {
		object: Box<Expr>,
		property: String,
	},
	Index {
		object: Box<Expr>,
		index: Box<Expr>,
	},
	Unary {
		op: UnaryOp,
		operand: Box<Expr>,
	},
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Logical {
		op: LogicalOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Conditional {
		test: Box<Expr>,
		consequent: Box<Expr>,
		alternate: Box<Expr>,
	},
}

/// Maximum nesting of parentheses, index brackets, unary operators and
/// conditional branches.
pub(crate) const MAX_NESTING_DEPTH: usize = 64;

const EQUALITY: &[(&str, BinaryOp)] = &[
	("===", BinaryOp::StrictEqual),
	("!==", BinaryOp::StrictNotEqual),
	("==", BinaryOp::LooseEqual),
	("!=", BinaryOp::LooseNotEqual),
];

const RELATIONAL: &[(&str, BinaryOp)] = &[
	("<=", BinaryOp::LessEqual),
	(">=", BinaryOp::GreaterEqual),
	("<", BinaryOp::Less),
	(">", BinaryOp::Greater),
];

const ADDITIVE: &[(&str, BinaryOp)] = &[("+", BinaryOp::Add), ("-", BinaryOp::Subtract)];

const MULTIPLICATIVE: &[(&str, BinaryOp)] = &[
	("*", BinaryOp::Multiply),
	("/", BinaryOp::Divide),
	("%", BinaryOp::Remainder),
];

/// Parses a complete expression.
pub(crate) fn parse(source: &str) -> Result<Expr, EvalError> {
	let tokens = Lexer::new(source).tokenize()?;
	let mut parser = Parser {
		source,
		tokens,
		position: 0,
		depth: 0,
	};
	if parser.tokens.is_empty() {
		return Err(parser.error("empty expression"));
	}
	let expr = parser.conditional()?;
	if let Some(token) = parser.peek() {
		let message = format!("unexpected {}", describe(token));
		return Err(parser.error(message));
	}
	Ok(expr)
}

fn describe(token: &Token) -> String {
	match token {
		Token::Number(number) => format!("number {number}"),
		Token::String(text) => format!("string '{text}'"),
		Token::Identifier(name) => format!("identifier '{name}'"),
		Token::Punct(punct) => format!("token '{punct}'"),
	}
}

struct Parser<'a> {
	source: &'a str,
	tokens: Vec<Token>,
	position: usize,
	depth: usize,
}

impl Parser<'_> {
	fn error(&self, message: impl Into<String>) -> EvalError {
		EvalError::Parse {
			expression: self.source.to_string(),
			message: message.into(),
		}
	}

	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.position)
	}

	fn advance(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.position).cloned();
		if token.is_some() {
			self.position += 1;
		}
		token
	}

	fn eat(&mut self, punct: &str) -> bool {
		if matches!(self.peek(), Some(Token::Punct(found)) if *found == punct) {
			self.position += 1;
			return true;
		}
		false
	}

	fn expect(&mut self, punct: &str) -> Result<(), EvalError> {
		if self.eat(punct) {
			return Ok(());
		}
		let found = self
			.peek()
			.map(describe)
			.unwrap_or_else(|| "end of expression".to_string());
		Err(self.error(format!("expected '{punct}', found {found}")))
	}

	fn nested(
		&mut self,
		parse: impl FnOnce(&mut Self) -> Result<Expr, EvalError>,
	) -> Result<Expr, EvalError> {
		if self.depth >= MAX_NESTING_DEPTH {
			return Err(self.error("expression nesting depth exceeded"));
		}
		self.depth += 1;
		let result = parse(self);
		self.depth -= 1;
		result
	}

	fn conditional(&mut self) -> Result<Expr, EvalError> {
		let test = self.logical_or()?;
		if !self.eat("?") {
			return Ok(test);
		}
		let consequent = self.nested(Self::conditional)?;
		self.expect(":")?;
		let alternate = self.nested(Self::conditional)?;
		Ok(Expr::Conditional {
			test: Box::new(test),
			consequent: Box::new(consequent),
			alternate: Box::new(alternate),
		})
	}

	fn logical_or(&mut self) -> Result<Expr, EvalError> {
		let mut left = self.logical_and()?;
		while self.eat("||") {
			let right = self.logical_and()?;
			left = Expr::Logical {
				op: LogicalOp::Or,
				left: Box::new(left),
				right: Box::new(right),
			};
		}
		Ok(left)
	}

	fn logical_and(&mut self) -> Result<Expr, EvalError> {
		let mut left = self.equality()?;
		while self.eat("&&") {
			let right = self.equality()?;
			left = Expr::Logical {
				op: LogicalOp::And,
				left: Box::new(left),
				right: Box::new(right),
			};
		}
		Ok(left)
	}

	fn binary_level(
		&mut self,
		operators: &[(&str, BinaryOp)],
		next: fn(&mut Self) -> Result<Expr, EvalError>,
	) -> Result<Expr, EvalError> {
		let mut left = next(self)?;
		'outer: loop {
			for (punct, op) in operators {
				if self.eat(punct) {
					let right = next(self)?;
					left = Expr::Binary {
						op: *op,
						left: Box::new(left),
						right: Box::new(right),
					};
					continue 'outer;
				}
			}
			return Ok(left);
		}
	}

	fn equality(&mut self) -> Result<Expr, EvalError> {
		self.binary_level(EQUALITY, Self::relational)
	}

	fn relational(&mut self) -> Result<Expr, EvalError> {
		self.binary_level(RELATIONAL, Self::additive)
	}

	fn additive(&mut self) -> Result<Expr, EvalError> {
		self.binary_level(ADDITIVE, Self::multiplicative)
	}

	fn multiplicative(&mut self) -> Result<Expr, EvalError> {
		self.binary_level(MULTIPLICATIVE, Self::unary)
	}

	fn unary(&mut self) -> Result<Expr, EvalError> {
		let op = if self.eat("!") {
			UnaryOp::Not
		} else if self.eat("-") {
			UnaryOp::Negate
		} else if self.eat("+") {
			UnaryOp::Plus
		} else {
			return self.postfix();
		};
		let operand = self.nested(Self::unary)?;
		Ok(Expr::Unary {
			op,
			operand: Box::new(operand),
		})
	}

	fn postfix(&mut self) -> Result<Expr, EvalError> {
		let mut expr = self.primary()?;
		loop {
			if self.eat(".") {
				let property = match self.advance() {
					Some(Token::Identifier(name)) => name,
					Some(other) => {
						let message = format!("expected property name, found {}", describe(&other));
						return Err(self.error(message));
					}
					None => return Err(self.error("expected property name after '.'")),
				};
				expr = Expr::Member {
					object: Box::new(expr),
					property,
				};
			} else if self.eat("[") {
				let index = self.nested(Self::conditional)?;
				self.expect("]")?;
				expr = Expr::Index {
					object: Box::new(expr),
					index: Box::new(index),
				};
			} else {
				return Ok(expr);
			}
		}
	}

	fn primary(&mut self) -> Result<Expr, EvalError> {
		match self.advance() {
			Some(Token::Number(number)) => Ok(Expr::Literal(Literal::Number(number))),
			Some(Token::String(text)) => Ok(Expr::Literal(Literal::String(text))),
			Some(Token::Identifier(name)) => Ok(match name.as_str() {
				"true" => Expr::Literal(Literal::Bool(true)),
				"false" => Expr::Literal(Literal::Bool(false)),
				"null" => Expr::Literal(Literal::Null),
				"undefined" => Expr::Literal(Literal::Undefined),
				_ => Expr::Identifier(name),
			}),
			Some(Token::Punct("(")) => {
				let inner = self.nested(Self::conditional)?;
				self.expect(")")?;
				Ok(inner)
			}
			Some(other) => {
				let message = format!("unexpected {}", describe(&other));
				Err(self.error(message))
			}
			None => Err(self.error("unexpected end of expression")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn ident(name: &str) -> Box<Expr> {
		Box::new(Expr::Identifier(name.to_string()))
	}

	fn number(value: f64) -> Box<Expr> {
		Box::new(Expr::Literal(Literal::Number(value)))
	}

	#[rstest]
	fn test_multiplication_binds_tighter_than_addition() {
		assert_eq!(
			parse("a + b * 2").unwrap(),
			Expr::Binary {
				op: BinaryOp::Add,
				left: ident("a"),
				right: Box::new(Expr::Binary {
					op: BinaryOp::Multiply,
					left: ident("b"),
					right: number(2.0),
				}),
			}
		);
	}

	#[rstest]
	fn test_subtraction_is_left_associative() {
		assert_eq!(
			parse("10 - 4 - 3").unwrap(),
			Expr::Binary {
				op: BinaryOp::Subtract,
				left: Box::new(Expr::Binary {
					op: BinaryOp::Subtract,
					left: number(10.0),
					right: number(4.0),
				}),
				right: number(3.0),
			}
		);
	}

	#[rstest]
	fn test_member_and_index_chain() {
		assert_eq!(
			parse("user.tags[0]").unwrap(),
			Expr::Index {
				object: Box::new(Expr::Member {
					object: ident("user"),
					property: "tags".to_string(),
				}),
				index: number(0.0),
			}
		);
	}

	#[rstest]
	fn test_conditional_is_right_associative() {
		let Expr::Conditional { alternate, .. } = parse("a ? 1 : b ? 2 : 3").unwrap() else {
			panic!("expected a conditional");
		};

		assert!(matches!(*alternate, Expr::Conditional { .. }));
	}

	#[rstest]
	fn test_keywords_are_literals() {
		assert_eq!(
			parse("!undefined").unwrap(),
			Expr::Unary {
				op: UnaryOp::Not,
				operand: Box::new(Expr::Literal(Literal::Undefined)),
			}
		);
	}

	#[rstest]
	#[case("")]
	#[case("a +")]
	#[case("(a")]
	#[case("a b")]
	#[case("a ? b")]
	#[case("user.")]
	#[case("user.'x'")]
	#[case(format!("{}a{}", "(".repeat(3_000), ")".repeat(3_000)))]
	#[case(format!("{}a", "!".repeat(3_000)))]
	#[case(format!("a{}", "[0".repeat(3_000) + &"]".repeat(3_000)))]
	#[case(format!("{}1 : 2", "a ? ".repeat(3_000)) + &" : 3".repeat(2_999))]
	fn test_malformed_expressions(#[case] source: String) {
		assert!(matches!(parse(&source), Err(EvalError::Parse { .. })));
	}

	#[rstest]
	fn test_nesting_depth_limit() {
		// Arrange
		let at_limit = format!(
			"{}a{}",
			"(".repeat(MAX_NESTING_DEPTH),
			")".repeat(MAX_NESTING_DEPTH)
		);
		let over_limit = format!(
			"{}a{}",
			"(".repeat(MAX_NESTING_DEPTH + 1),
			")".repeat(MAX_NESTING_DEPTH + 1)
		);

		// Act
		let accepted = parse(&at_limit);
		let rejected = parse(&over_limit);

		// Assert
		assert_eq!(accepted.unwrap(), Expr::Identifier("a".to_string()));
		let Err(EvalError::Parse { message, .. }) = rejected else {
			panic!("expected a parse error");
		};
		assert_eq!(message, "expression nesting depth exceeded");
	}
}
