// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Recursive descent parser for policy conditions.
//!
//! Precedence from loosest to tightest: `or`, `and`, `not`, comparisons and
//! `is [not] undefined`, `+ -`, `* /`, unary `-`.

use reifydb_policy::CollaboratorError;
use reifydb_rql::{
	Determinism, Expression, SourceIdentifier,
	expression::{IsUndefinedExpression, PrefixExpression, PrefixOperator},
};
use reifydb_type::Value;

use crate::compiler::lexer::{Token, tokenize};

type Result<T> = std::result::Result<T, CollaboratorError>;

pub(crate) fn parse(source: &str) -> Result<Expression> {
	let mut parser = Parser {
		tokens: tokenize(source)?,
		pos: 0,
	};
	if parser.tokens.is_empty() {
		return Err(CollaboratorError::Parse("empty condition".to_string()));
	}

	let result = parser.parse_or()?;
	if let Some(token) = parser.peek() {
		return Err(CollaboratorError::Parse(format!("unexpected token '{}'", token)));
	}
	Ok(result)
}

struct Parser {
	tokens: Vec<Token>,
	pos: usize,
}

impl Parser {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	fn advance(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.pos).cloned();
		if token.is_some() {
			self.pos += 1;
		}
		token
	}

	fn eat_keyword(&mut self, keyword: &str) -> bool {
		if self.peek().map(|t| t.is_keyword(keyword)).unwrap_or(false) {
			self.pos += 1;
			return true;
		}
		false
	}

	fn eat(&mut self, expected: &Token) -> bool {
		if self.peek() == Some(expected) {
			self.pos += 1;
			return true;
		}
		false
	}

	fn expect(&mut self, expected: &Token) -> Result<()> {
		if self.eat(expected) {
			return Ok(());
		}
		Err(self.unexpected(&format!("'{}'", expected)))
	}

	fn unexpected(&self, expected: &str) -> CollaboratorError {
		match self.peek() {
			Some(token) => CollaboratorError::Parse(format!("expected {} but found '{}'", expected, token)),
			None => CollaboratorError::Parse(format!("expected {} but reached end of condition", expected)),
		}
	}

	fn parse_or(&mut self) -> Result<Expression> {
		let mut operands = vec![self.parse_and()?];
		while self.eat_keyword("or") {
			operands.push(self.parse_and()?);
		}
		Ok(Expression::or(operands))
	}

	fn parse_and(&mut self) -> Result<Expression> {
		let mut operands = vec![self.parse_not()?];
		while self.eat_keyword("and") {
			operands.push(self.parse_not()?);
		}
		Ok(Expression::and(operands))
	}

	fn parse_not(&mut self) -> Result<Expression> {
		if self.eat_keyword("not") {
			return Ok(Expression::not(self.parse_not()?));
		}
		self.parse_comparison()
	}

	fn parse_comparison(&mut self) -> Result<Expression> {
		let left = self.parse_additive()?;

		if self.eat_keyword("is") {
			let negated = self.eat_keyword("not");
			if !self.eat_keyword("undefined") {
				return Err(self.unexpected("'undefined'"));
			}
			return Ok(Expression::IsUndefined(IsUndefinedExpression {
				expression: Box::new(left),
				negated,
			}));
		}

		let ctor: fn(_) -> Expression = match self.peek() {
			Some(Token::Operator("==")) => Expression::Equal,
			Some(Token::Operator("!=")) => Expression::NotEqual,
			Some(Token::Operator("<")) => Expression::LessThan,
			Some(Token::Operator("<=")) => Expression::LessThanEqual,
			Some(Token::Operator(">")) => Expression::GreaterThan,
			Some(Token::Operator(">=")) => Expression::GreaterThanEqual,
			_ => return Ok(left),
		};
		self.pos += 1;

		let right = self.parse_additive()?;
		Ok(ctor(Expression::binary(left, right)))
	}

	fn parse_additive(&mut self) -> Result<Expression> {
		let mut result = self.parse_multiplicative()?;
		loop {
			let ctor: fn(_) -> Expression = match self.peek() {
				Some(Token::Operator("+")) => Expression::Add,
				Some(Token::Operator("-")) => Expression::Sub,
				_ => return Ok(result),
			};
			self.pos += 1;
			let right = self.parse_multiplicative()?;
			result = ctor(Expression::binary(result, right));
		}
	}

	fn parse_multiplicative(&mut self) -> Result<Expression> {
		let mut result = self.parse_unary()?;
		loop {
			let ctor: fn(_) -> Expression = match self.peek() {
				Some(Token::Operator("*")) => Expression::Mul,
				Some(Token::Operator("/")) => Expression::Div,
				_ => return Ok(result),
			};
			self.pos += 1;
			let right = self.parse_unary()?;
			result = ctor(Expression::binary(result, right));
		}
	}

	fn parse_unary(&mut self) -> Result<Expression> {
		if !self.eat(&Token::Operator("-")) {
			return self.parse_primary();
		}

		let operand = self.parse_unary()?;
		Ok(match operand.as_constant() {
			Some(Value::Int8(v)) if *v != i64::MIN => Expression::constant(-*v),
			Some(Value::Float8(v)) => Expression::constant(-v.value()),
			_ => Expression::Prefix(PrefixExpression {
				operator: PrefixOperator::Minus,
				expression: Box::new(operand),
			}),
		})
	}

	fn parse_primary(&mut self) -> Result<Expression> {
		let Some(token) = self.advance() else {
			return Err(self.unexpected("an expression"));
		};

		match token {
			Token::Int(v) => Ok(Expression::constant(v)),
			Token::Float(v) => Ok(Expression::constant(v)),
			Token::Text(v) => Ok(Expression::constant(v)),
			Token::Parameter(name) => Ok(Expression::parameter(name)),
			Token::OpenParen => {
				let result = self.parse_or()?;
				self.expect(&Token::CloseParen)?;
				Ok(result)
			}
			Token::Identifier(name) if name.eq_ignore_ascii_case("true") => Ok(Expression::constant(true)),
			Token::Identifier(name) if name.eq_ignore_ascii_case("false") => Ok(Expression::constant(false)),
			Token::Identifier(name) if name.eq_ignore_ascii_case("undefined") => Ok(Expression::undefined()),
			Token::Identifier(name) => {
				if self.eat(&Token::OpenParen) {
					return self.parse_call(name);
				}
				self.parse_column(name)
			}
			token => {
				self.pos -= 1;
				Err(CollaboratorError::Parse(format!("unexpected token '{}'", token)))
			}
		}
	}

	fn parse_call(&mut self, function: String) -> Result<Expression> {
		let mut args = Vec::new();
		if !self.eat(&Token::CloseParen) {
			loop {
				args.push(self.parse_or()?);
				if self.eat(&Token::CloseParen) {
					break;
				}
				self.expect(&Token::Comma)?;
			}
		}
		// determinism is only known once the function is resolved
		Ok(Expression::call(function, args, Determinism::Nondeterministic))
	}

	/// `column`, `source.column` or `namespace.table.column`.
	fn parse_column(&mut self, first: String) -> Result<Expression> {
		let mut parts = vec![first];
		while self.eat(&Token::Dot) {
			match self.advance() {
				Some(Token::Identifier(name)) => parts.push(name),
				_ => {
					self.pos -= 1;
					return Err(self.unexpected("a name"));
				}
			}
		}

		let name = parts.pop().unwrap_or_default();
		Ok(Expression::column(SourceIdentifier::new(parts.join(".")), name))
	}
}
