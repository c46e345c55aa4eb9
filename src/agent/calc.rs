//! Arithmetic evaluator behind the `calculate_expression` tool.
//!
//! Supports `+ - * / // % **`, parentheses, unary signs and the functions
//! `abs round min max sum pow`. Nothing else is reachable from an
//! expression, so model-supplied input cannot do more than arithmetic.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    LParen,
    RParen,
    Comma,
}

/// Evaluation failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct CalcError(String);

fn err<T>(msg: impl Into<String>) -> Result<T, CalcError> {
    Err(CalcError(msg.into()))
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '_') {
                    i += 1;
                }
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    i += 1;
                    if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
                        i += 1;
                    }
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                match text.parse::<f64>() {
                    Ok(n) => tokens.push(Token::Num(n)),
                    Err(_) => return err(format!("invalid number '{}'", text)),
                }
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::StarStar);
                i += 2;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::SlashSlash);
                i += 2;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => return err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

/// Nesting bound for parentheses, calls, signs and exponents.
const MAX_DEPTH: usize = 100;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, want: Token) -> Result<(), CalcError> {
        match self.next() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => err(format!("expected {:?}, found {:?}", want, tok)),
            None => err(format!("expected {:?}, found end of input", want)),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := unary (('*' | '/' | '//' | '%') unary)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return err("division by zero");
                    }
                    value /= rhs;
                }
                Some(Token::SlashSlash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return err("integer division or modulo by zero");
                    }
                    value = (value / rhs).floor();
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return err("integer division or modulo by zero");
                    }
                    // Result takes the sign of the divisor.
                    value = value - rhs * (value / rhs).floor();
                }
                _ => return Ok(value),
            }
        }
    }

    // Every recursive path passes through here, so this is where nesting is bounded.
    fn unary(&mut self) -> Result<f64, CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return err("expression too deeply nested");
        }
        let value = self.signed();
        self.depth -= 1;
        value
    }

    // unary := ('+' | '-') unary | power
    fn signed(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' unary)?   (right associative)
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.atom()?;
        if let Some(Token::StarStar) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                self.expect(Token::LParen)?;
                let args = self.args()?;
                call(&name, &args)
            }
            Some(tok) => err(format!("unexpected token {:?}", tok)),
            None => err("unexpected end of input"),
        }
    }

    fn args(&mut self) -> Result<Vec<f64>, CalcError> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                _ => return err("expected ',' or ')' in argument list"),
            }
        }
    }
}

fn call(name: &str, args: &[f64]) -> Result<f64, CalcError> {
    match (name, args) {
        ("abs", [x]) => Ok(x.abs()),
        ("round", [x]) => Ok(round_half_even(*x)),
        ("round", [x, digits]) => {
            let factor = 10f64.powi(*digits as i32);
            Ok(round_half_even(x * factor) / factor)
        }
        ("pow", [x, y]) => Ok(x.powf(*y)),
        ("min", [_, ..]) => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
        ("max", [_, ..]) => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        ("sum", _) => Ok(args.iter().sum()),
        ("abs" | "round" | "pow" | "min" | "max", _) => {
            err(format!("wrong number of arguments for {}()", name))
        }
        _ => err(format!("name '{}' is not defined", name)),
    }
}

fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 && rounded % 2.0 != 0.0 {
        rounded - x.signum()
    } else {
        rounded
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return err("empty expression");
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return err(format!("unexpected token {:?}", parser.tokens[parser.pos]));
    }
    if !value.is_finite() {
        return err("result is not a finite number");
    }
    Ok(value)
}

/// Format a result, dropping the fraction for whole numbers.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("1234 * 5678 + 999").unwrap(), 7007651.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("-2 ** 2").unwrap(), -4.0);
        assert_eq!(evaluate("2 ** 3 ** 2").unwrap(), 512.0);
    }

    #[test]
    fn test_division_and_modulo() {
        assert_eq!(evaluate("7 / 2").unwrap(), 3.5);
        assert_eq!(evaluate("7 // 2").unwrap(), 3.0);
        assert_eq!(evaluate("-7 % 3").unwrap(), 2.0);
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn test_functions() {
        assert_eq!(evaluate("abs(-5)").unwrap(), 5.0);
        assert_eq!(evaluate("max(1, 9, 4)").unwrap(), 9.0);
        assert_eq!(evaluate("min(3, -1)").unwrap(), -1.0);
        assert_eq!(evaluate("pow(2, 10)").unwrap(), 1024.0);
        assert_eq!(evaluate("round(2.5)").unwrap(), 2.0);
        assert_eq!(evaluate("sum(1, 2, 3)").unwrap(), 6.0);
    }

    #[test]
    fn test_rejects_names_and_garbage() {
        assert!(evaluate("__import__('os')").is_err());
        assert!(evaluate("open(1)").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("1 2").is_err());
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            evaluate(&parens).unwrap_err().to_string(),
            "expression too deeply nested"
        );
        assert!(evaluate(&format!("{}1", "-".repeat(10_000))).is_err());
        assert!(evaluate(&format!("{}1{}", "abs(".repeat(10_000), ")".repeat(10_000))).is_err());
        assert!(evaluate(&vec!["2"; 10_000].join(" ** ")).is_err());

        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(500.0), "500");
        assert_eq!(format_number(3.5), "3.5");
    }
}
