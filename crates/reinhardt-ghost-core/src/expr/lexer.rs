//! Tokenizer for binding expressions.

use crate::error::EvalError;

/// Operators and punctuation, longest first so that `===` wins over `==`.
const PUNCTUATORS: &[&str] = &[
	"===", "!==", "==", "!=", "<=", ">=", "&&", "||", "<", ">", "+", "-", "*", "/", "%", "!", "?",
	":", ".", "[", "]", "(", ")",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
	Number(f64),
	String(String),
	Identifier(String),
	Punct(&'static str),
}

pub(crate) struct Lexer<'a> {
	source: &'a str,
	position: usize,
	previous: Option<Token>,
}

impl<'a> Lexer<'a> {
	pub(crate) fn new(source: &'a str) -> Self {
		Self {
			source,
			position: 0,
			previous: None,
		}
	}

	fn rest(&self) -> &'a str {
		&self.source[self.position..]
	}

	fn peek_char(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn after_operand(&self) -> bool {
		matches!(
			self.previous,
			Some(Token::Number(_) | Token::String(_) | Token::Identifier(_) | Token::Punct(")" | "]"))
		)
	}

	fn error(&self, message: impl Into<String>) -> EvalError {
		EvalError::Parse {
			expression: self.source.to_string(),
			message: format!("{} at offset {}", message.into(), self.position),
		}
	}

	pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, EvalError> {
		let mut tokens = Vec::new();
		while let Some(token) = self.next_token()? {
			self.previous = Some(token.clone());
			tokens.push(token);
		}
		Ok(tokens)
	}

	fn next_token(&mut self) -> Result<Option<Token>, EvalError> {
		let trimmed = self.rest().trim_start();
		self.position = self.source.len() - trimmed.len();

		let Some(current) = self.peek_char() else {
			return Ok(None);
		};

		// `tags.0` reads key "0" rather than the number `.0`.
		if self.previous == Some(Token::Punct(".")) && current.is_ascii_digit() {
			let length = self
				.rest()
				.find(|c: char| !c.is_ascii_digit())
				.unwrap_or(self.rest().len());
			let key = self.rest()[..length].to_string();
			self.position += length;
			return Ok(Some(Token::Identifier(key)));
		}
		let fraction = current == '.'
			&& !self.after_operand()
			&& self.rest()[1..].starts_with(|c: char| c.is_ascii_digit());
		if current.is_ascii_digit() || fraction {
			return self.number().map(Some);
		}
		if current == '"' || current == '\'' {
			return self.string(current).map(Some);
		}
		if current.is_alphabetic() || current == '_' || current == '$' {
			let length = self
				.rest()
				.find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
				.unwrap_or(self.rest().len());
			let name = self.rest()[..length].to_string();
			self.position += length;
			return Ok(Some(Token::Identifier(name)));
		}
		for punct in PUNCTUATORS {
			if self.rest().starts_with(punct) {
				self.position += punct.len();
				return Ok(Some(Token::Punct(*punct)));
			}
		}
		if current == '=' {
			return Err(self.error("assignment is not allowed in binding expressions"));
		}
		Err(self.error(format!("unexpected character '{current}'")))
	}

	fn number(&mut self) -> Result<Token, EvalError> {
		let rest = self.rest();
		let bytes = rest.as_bytes();
		let mut end = 0;
		while end < bytes.len() && bytes[end].is_ascii_digit() {
			end += 1;
		}
		if end < bytes.len() && bytes[end] == b'.' {
			end += 1;
			while end < bytes.len() && bytes[end].is_ascii_digit() {
				end += 1;
			}
		}
		if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
			let mut exponent = end + 1;
			if exponent < bytes.len() && (bytes[exponent] == b'+' || bytes[exponent] == b'-') {
				exponent += 1;
			}
			if exponent < bytes.len() && bytes[exponent].is_ascii_digit() {
				while exponent < bytes.len() && bytes[exponent].is_ascii_digit() {
					exponent += 1;
				}
				end = exponent;
			}
		}

		let literal = &rest[..end];
		let number = literal
			.parse::<f64>()
			.map_err(|_| self.error(format!("invalid number '{literal}'")))?;
		self.position += end;

		if self
			.peek_char()
			.is_some_and(|c| c.is_alphanumeric() || c == '_')
		{
			return Err(self.error("identifier starts immediately after numeric literal"));
		}
		Ok(Token::Number(number))
	}

	fn string(&mut self, quote: char) -> Result<Token, EvalError> {
		let start = self.position;
		self.position += quote.len_utf8();
		let mut value = String::new();
		let mut chars = self.rest().char_indices();
		while let Some((offset, c)) = chars.next() {
			match c {
				c if c == quote => {
					self.position += offset + c.len_utf8();
					return Ok(Token::String(value));
				}
				'\\' => {
					let Some((_, escaped)) = chars.next() else {
						break;
					};
					value.push(match escaped {
						'n' => '\n',
						't' => '\t',
						'r' => '\r',
						'0' => '\0',
						other => other,
					});
				}
				other => value.push(other),
			}
		}
		self.position = start;
		Err(self.error("unterminated string literal"))
	}
}
