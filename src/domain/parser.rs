//! Arithmetic expression parser for the formula fallback path.
//!
//! Formulas that are not a single aggregate call are reduced to plain
//! arithmetic: cell references are substituted with numbers and the result is
//! passed through [`sanitize`], which keeps only digits, the four operators,
//! parentheses, the decimal point and spaces. What survives is parsed here by
//! a recursive descent parser.
//!
//! # BNF Grammar
//!
//! ```bnf
//! Expression     ::= Addition
//! Addition       ::= Multiplication ( ( "+" | "-" ) Multiplication )*
//! Multiplication ::= Unary ( ( "*" | "/" ) Unary )*
//! Unary          ::= ( "+" | "-" ) Unary | Primary
//! Primary        ::= Number | "(" Expression ")"
//! Number         ::= [0-9]* ( "." [0-9]* )?
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("expected {expected:?}, found {found:?}")]
    Expected { expected: Token, found: Token },
    #[error("unexpected token {0:?}")]
    UnexpectedToken(Token),
}

/// Represents a token in the expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Plus,
    Minus,
    Multiply,
    Divide,
    LeftParen,
    RightParen,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },
    Negate(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Expr {
    /// Evaluates the tree. Division by zero follows IEEE rules; callers
    /// reject non-finite results.
    pub fn evaluate(&self) -> f64 {
        match self {
            Expr::Number(value) => *value,
            Expr::Negate(operand) => -operand.evaluate(),
            Expr::Binary { left, operator, right } => {
                let (l, r) = (left.evaluate(), right.evaluate());
                match operator {
                    BinaryOp::Add => l + r,
                    BinaryOp::Subtract => l - r,
                    BinaryOp::Multiply => l * r,
                    BinaryOp::Divide => l / r,
                }
            }
        }
    }
}

/// Drops every character the arithmetic grammar does not accept.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '*' | '/' | '(' | ')' | '.' | ' '))
        .collect()
}

/// Lexical analyzer for tokenizing expressions.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    /// Reads an integer or decimal literal. `.5` and `5.` are accepted.
    fn read_number(&mut self) -> Result<f64, ParseError> {
        let start = self.position;
        let mut seen_dot = false;
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                self.position += 1;
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                self.position += 1;
            } else {
                break;
            }
        }
        let text: String = self.input[start..self.position].iter().collect();
        text.parse::<f64>().map_err(|_| ParseError::InvalidNumber(text))
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        let Some(ch) = self.current() else {
            return Ok(Token::Eof);
        };

        if ch.is_ascii_digit() || ch == '.' {
            return self.read_number().map(Token::Number);
        }

        let token = match ch {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Multiply,
            '/' => Token::Divide,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            other => return Err(ParseError::UnexpectedChar(other)),
        };
        self.position += 1;
        Ok(token)
    }
}

/// Recursive descent parser for arithmetic expressions.
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        Ok(Self { lexer, current_token })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.current_token == expected {
            self.advance()
        } else {
            Err(ParseError::Expected {
                expected,
                found: self.current_token.clone(),
            })
        }
    }

    /// Parses the whole input; trailing tokens are an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_addition()?;
        if self.current_token != Token::Eof {
            return Err(ParseError::UnexpectedToken(self.current_token.clone()));
        }
        Ok(expr)
    }

    fn parse_addition(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplication()?;

        loop {
            let operator = match self.current_token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplication()?;
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplication(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let operator = match self.current_token {
                Token::Multiply => BinaryOp::Multiply,
                Token::Divide => BinaryOp::Divide,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.current_token {
            Token::Plus => {
                self.advance()?;
                self.parse_unary()
            }
            Token::Minus => {
                self.advance()?;
                Ok(Expr::Negate(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current_token {
            Token::Number(value) => {
                self.advance()?;
                Ok(Expr::Number(value))
            }
            Token::LeftParen => {
                self.advance()?;
                let expr = self.parse_addition()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            _ => Err(ParseError::UnexpectedToken(self.current_token.clone())),
        }
    }
}

/// Sanitizes, parses and evaluates `input` in one step.
pub fn evaluate_arithmetic(input: &str) -> Result<f64, ParseError> {
    let sanitized = sanitize(input);
    Parser::new(&sanitized)?.parse().map(|expr| expr.evaluate())
}
