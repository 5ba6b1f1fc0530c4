// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use reifydb_policy::CollaboratorError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
	Int(i64),
	Float(f64),
	Text(String),
	Identifier(String),
	Parameter(String),
	Operator(&'static str),
	OpenParen,
	CloseParen,
	Comma,
	Dot,
}

impl Token {
	pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
		matches!(self, Token::Identifier(name) if name.eq_ignore_ascii_case(keyword))
	}
}

impl Display for Token {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Token::Int(v) => write!(f, "{}", v),
			Token::Float(v) => write!(f, "{}", v),
			Token::Text(v) => write!(f, "'{}'", v),
			Token::Identifier(v) => f.write_str(v),
			Token::Parameter(v) => write!(f, "${}", v),
			Token::Operator(v) => f.write_str(v),
			Token::OpenParen => f.write_str("("),
			Token::CloseParen => f.write_str(")"),
			Token::Comma => f.write_str(","),
			Token::Dot => f.write_str("."),
		}
	}
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, CollaboratorError> {
	let chars: Vec<char> = source.chars().collect();
	let mut result = Vec::new();
	let mut pos = 0;

	while pos < chars.len() {
		let c = chars[pos];
		let next = chars.get(pos + 1).copied();

		if c.is_whitespace() {
			pos += 1;
			continue;
		}

		let (token, len) = match c {
			'(' => (Token::OpenParen, 1),
			')' => (Token::CloseParen, 1),
			',' => (Token::Comma, 1),
			'.' => (Token::Dot, 1),
			'+' => (Token::Operator("+"), 1),
			'-' => (Token::Operator("-"), 1),
			'*' => (Token::Operator("*"), 1),
			'/' => (Token::Operator("/"), 1),
			'=' if next == Some('=') => (Token::Operator("=="), 2),
			'=' => (Token::Operator("=="), 1),
			'!' if next == Some('=') => (Token::Operator("!="), 2),
			'<' if next == Some('=') => (Token::Operator("<="), 2),
			'<' if next == Some('>') => (Token::Operator("!="), 2),
			'<' => (Token::Operator("<"), 1),
			'>' if next == Some('=') => (Token::Operator(">="), 2),
			'>' => (Token::Operator(">"), 1),
			'\'' => scan_text(&chars, pos)?,
			'$' => {
				let len = scan_while(&chars, pos + 1, |c| c.is_alphanumeric() || c == '_');
				if len == 0 {
					return Err(CollaboratorError::Parse(format!("empty parameter name at offset {}", pos)));
				}
				let name: String = chars[pos + 1..pos + 1 + len].iter().collect();
				(Token::Parameter(name), len + 1)
			}
			c if c.is_ascii_digit() => scan_number(&chars, pos)?,
			c if c.is_alphabetic() || c == '_' => {
				let len = scan_while(&chars, pos, |c| c.is_alphanumeric() || c == '_');
				(Token::Identifier(chars[pos..pos + len].iter().collect()), len)
			}
			c => {
				return Err(CollaboratorError::Parse(format!(
					"unexpected character '{}' at offset {}",
					c, pos
				)));
			}
		};

		result.push(token);
		pos += len;
	}

	Ok(result)
}

fn scan_while(chars: &[char], start: usize, predicate: impl Fn(char) -> bool) -> usize {
	chars[start..].iter().take_while(|c| predicate(**c)).count()
}

fn scan_number(chars: &[char], start: usize) -> Result<(Token, usize), CollaboratorError> {
	let mut len = scan_while(chars, start, |c| c.is_ascii_digit());
	let fraction = chars.get(start + len) == Some(&'.')
		&& chars.get(start + len + 1).map(|c| c.is_ascii_digit()).unwrap_or(false);
	if fraction {
		len += 1 + scan_while(chars, start + len + 1, |c| c.is_ascii_digit());
	}

	let text: String = chars[start..start + len].iter().collect();
	let token = if fraction {
		Token::Float(text.parse().map_err(|_| CollaboratorError::Parse(format!("invalid number {}", text)))?)
	} else {
		Token::Int(text.parse().map_err(|_| CollaboratorError::Parse(format!("invalid number {}", text)))?)
	};
	Ok((token, len))
}

/// Single quoted text; a doubled quote stands for one quote.
fn scan_text(chars: &[char], start: usize) -> Result<(Token, usize), CollaboratorError> {
	let mut text = String::new();
	let mut pos = start + 1;
	loop {
		match chars.get(pos) {
			None => {
				return Err(CollaboratorError::Parse(format!("unterminated text starting at offset {}", start)));
			}
			Some('\'') if chars.get(pos + 1) == Some(&'\'') => {
				text.push('\'');
				pos += 2;
			}
			Some('\'') => return Ok((Token::Text(text), pos + 1 - start)),
			Some(c) => {
				text.push(*c);
				pos += 1;
			}
		}
	}
}
