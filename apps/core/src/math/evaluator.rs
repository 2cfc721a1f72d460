//! Expression parsing and evaluation.
//!
//! Recursive descent over the normalized notation: `+ - * / **` (and `^`),
//! parentheses or brackets, juxtaposition as multiplication, the functions
//! in [`Function`] and the constants `pi` and `oo`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::{format_number, EvalError};

/// Digits kept when rendering literals back to text
const DISPLAY_PRECISION: usize = 10;

/// Words the normalizer emits that have no numeric meaning here
const UNSUPPORTED_FUNCTIONS: &[&str] = &["integral", "sum", "product"];

/// Deepest parenthesis, sign or exponent nesting the parser accepts
const MAX_NESTING: usize = 256;

/// Longest token stream accepted; bounds the depth of left-leaning operator chains
const MAX_TOKENS: usize = 1024;

/// Built-in single-argument functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Log,
    Ln,
    Exp,
    Abs,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Self::Sqrt),
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "log" => Some(Self::Log),
            "ln" => Some(Self::Ln),
            "exp" => Some(Self::Exp),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sqrt => "sqrt",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Log => "log",
            Self::Ln => "ln",
            Self::Exp => "exp",
            Self::Abs => "abs",
        }
    }

    /// `log` is the natural logarithm, like `ln`.
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sqrt => x.sqrt(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Log | Self::Ln => x.ln(),
            Self::Exp => x.exp(),
            Self::Abs => x.abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 4,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Add => " + ",
            Self::Sub => " - ",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "**",
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Pow => lhs.powf(rhs),
        }
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Pi,
    Infinity,
    Variable(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        argument: Box<Expr>,
    },
}

const NEG_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 5;

impl Expr {
    /// Evaluate with the given variable bindings. Domain errors produce NaN.
    pub fn eval(&self, bindings: &HashMap<String, f64>) -> Result<f64, EvalError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Pi => Ok(std::f64::consts::PI),
            Expr::Infinity => Ok(f64::INFINITY),
            Expr::Variable(name) => bindings
                .get(name)
                .copied()
                .ok_or_else(|| EvalError::UnboundVariable(name.clone())),
            Expr::Neg(inner) => Ok(-inner.eval(bindings)?),
            Expr::Binary { op, lhs, rhs } => Ok(op.apply(lhs.eval(bindings)?, rhs.eval(bindings)?)),
            Expr::Call { function, argument } => Ok(function.apply(argument.eval(bindings)?)),
        }
    }

    /// Names of all free variables.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Expr::Variable(name) => {
                names.insert(name.clone());
            }
            Expr::Neg(inner) => inner.collect_variables(names),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
            Expr::Call { argument, .. } => argument.collect_variables(names),
            Expr::Number(_) | Expr::Pi | Expr::Infinity => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Neg(_) => NEG_PRECEDENCE,
            Expr::Number(value) if *value < 0.0 => NEG_PRECEDENCE,
            _ => ATOM_PRECEDENCE,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{}", format_number(*value, DISPLAY_PRECISION)),
            Expr::Pi => write!(f, "pi"),
            Expr::Infinity => write!(f, "oo"),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Neg(inner) => {
                write!(f, "-")?;
                inner.fmt_child(f, NEG_PRECEDENCE)
            }
            Expr::Binary { op, lhs, rhs } => {
                let precedence = op.precedence();
                // `**` groups to the right, `-` and `/` to the left
                let (lhs_min, rhs_min) = match op {
                    BinaryOp::Pow => (precedence + 1, precedence),
                    BinaryOp::Sub | BinaryOp::Div => (precedence, precedence + 1),
                    BinaryOp::Add | BinaryOp::Mul => (precedence, precedence),
                };
                lhs.fmt_child(f, lhs_min)?;
                write!(f, "{}", op.symbol())?;
                rhs.fmt_child(f, rhs_min)
            }
            Expr::Call { function, argument } => write!(f, "{}({})", function.name(), argument),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    Open(char),
    Close(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{}", value),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Power => write!(f, "**"),
            Token::Open(c) | Token::Close(c) => write!(f, "{}", c),
        }
    }
}

fn parse_error(position: usize, message: impl Into<String>) -> EvalError {
    EvalError::Parse {
        position,
        message: message.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, EvalError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (position, c) = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| parse_error(position, format!("invalid number '{}'", literal)))?;
                tokens.push((position, Token::Number(value)));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                tokens.push((position, Token::Ident(name)));
            }
            '*' if chars.get(i + 1).map(|(_, c)| *c) == Some('*') => {
                tokens.push((position, Token::Power));
                i += 2;
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '^' => Token::Power,
                    '(' | '[' => Token::Open(c),
                    ')' | ']' => Token::Close(c),
                    other => return Err(parse_error(position, format!("unexpected character '{}'", other))),
                };
                tokens.push((position, token));
                i += 1;
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    index: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(_, token)| token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.index).map_or(self.end, |(position, _)| *position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|(_, token)| token.clone());
        self.index += 1;
        token
    }

    fn expression(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    lhs = binary(BinaryOp::Mul, lhs, self.unary()?);
                }
                Some(Token::Slash) => {
                    self.advance();
                    lhs = binary(BinaryOp::Div, lhs, self.unary()?);
                }
                // Juxtaposition: "2(x + 1)", "(a)(b)"
                Some(Token::Number(_) | Token::Ident(_) | Token::Open(_)) => {
                    lhs = binary(BinaryOp::Mul, lhs, self.power()?);
                }
                _ => return Ok(lhs),
            }
        }
    }

    /// Every recursive path (groups, calls, signs, exponents) passes through here.
    fn unary(&mut self) -> Result<Expr, EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(parse_error(self.position(), "expression nested too deeply"));
        }
        self.depth += 1;
        let result = self.signed();
        self.depth -= 1;
        result
    }

    fn signed(&mut self) -> Result<Expr, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Power) {
            self.advance();
            let exponent = self.unary()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Open(open)) => {
                let inner = self.expression()?;
                self.close(open)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.identifier(name, position),
            Some(other) => Err(parse_error(position, format!("unexpected '{}'", other))),
            None => Err(parse_error(position, "unexpected end of expression")),
        }
    }

    fn identifier(&mut self, name: String, position: usize) -> Result<Expr, EvalError> {
        if UNSUPPORTED_FUNCTIONS.contains(&name.as_str()) {
            return Err(EvalError::UnsupportedFunction(name));
        }
        if let Some(function) = Function::from_name(&name) {
            let open = match self.advance() {
                Some(Token::Open(open)) => open,
                _ => return Err(parse_error(position, format!("expected '(' after {}", name))),
            };
            let argument = self.expression()?;
            self.close(open)?;
            return Ok(Expr::Call {
                function,
                argument: Box::new(argument),
            });
        }
        Ok(match name.as_str() {
            "pi" => Expr::Pi,
            "oo" => Expr::Infinity,
            _ => Expr::Variable(name),
        })
    }

    fn close(&mut self, open: char) -> Result<(), EvalError> {
        let expected = if open == '[' { ']' } else { ')' };
        let position = self.position();
        match self.advance() {
            Some(Token::Close(c)) if c == expected => Ok(()),
            _ => Err(parse_error(position, format!("expected '{}'", expected))),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

/// Parse a normalized expression.
pub fn parse(input: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(parse_error(0, "empty expression"));
    }
    if tokens.len() > MAX_TOKENS {
        return Err(parse_error(tokens[MAX_TOKENS].0, "expression too long"));
    }

    let mut parser = Parser {
        tokens,
        index: 0,
        end: input.len(),
        depth: 0,
    };
    let expr = parser.expression()?;

    if let Some(token) = parser.peek() {
        let message = format!("unexpected '{}'", token);
        return Err(parse_error(parser.position(), message));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(input: &str) -> f64 {
        parse(input).unwrap().eval(&HashMap::new()).unwrap()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(value("2 + 3*4"), 14.0);
        assert_eq!(value("(2 + 3)*4"), 20.0);
        assert_eq!(value("2**3**2"), 512.0);
        assert_eq!(value("-2**2"), -4.0);
        assert_eq!(value("2^3"), 8.0);
        assert_eq!(value("10 - 4 - 3"), 3.0);
        assert_eq!(value("8/4/2"), 1.0);
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(value("sqrt(16) + abs(-3)"), 7.0);
        assert!((value("sin(pi/2)") - 1.0).abs() < 1e-12);
        assert!((value("ln(exp(2))") - 2.0).abs() < 1e-12);
        assert_eq!(value("oo"), f64::INFINITY);
    }

    #[test]
    fn test_brackets_and_juxtaposition() {
        assert_eq!(value("[1 + 2]*3"), 9.0);
        assert_eq!(value("2(3)"), 6.0);
        assert_eq!(value("(1 + 1)(2 + 2)"), 8.0);
    }

    #[test]
    fn test_variables() {
        let expr = parse("2*x + y**2").unwrap();
        assert_eq!(
            expr.variables().into_iter().collect::<Vec<_>>(),
            vec!["x".to_string(), "y".to_string()]
        );

        let bindings = HashMap::from([("x".to_string(), 3.0), ("y".to_string(), 2.0)]);
        assert_eq!(expr.eval(&bindings).unwrap(), 10.0);

        assert_eq!(
            expr.eval(&HashMap::new()),
            Err(EvalError::UnboundVariable("x".to_string()))
        );
    }

    #[test]
    fn test_display_round_trips_structure() {
        for input in ["2*x + 5", "x**2 - 4", "-(x + 1)", "a - b - c", "a - (b - c)", "(-x)**2", "sqrt(x)/2"] {
            let expr = parse(input).unwrap();
            assert_eq!(expr.to_string(), input);
            assert_eq!(parse(&expr.to_string()).unwrap(), expr);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse(""), Err(EvalError::Parse { .. })));
        assert!(matches!(parse("(1 + 2"), Err(EvalError::Parse { .. })));
        assert!(matches!(parse("(1 + 2]"), Err(EvalError::Parse { .. })));
        assert!(matches!(parse("1 + 2)"), Err(EvalError::Parse { .. })));
        assert!(matches!(parse("sqrt 4"), Err(EvalError::Parse { .. })));
        assert!(matches!(parse("1 $ 2"), Err(EvalError::Parse { position: 2, .. })));
        assert!(matches!(parse("3 +"), Err(EvalError::Parse { .. })));
        assert_eq!(
            parse("integral(x)"),
            Err(EvalError::UnsupportedFunction("integral".to_string()))
        );
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let grouped = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(parse(&grouped), Err(EvalError::Parse { .. })));

        let nested = format!("{}x{}", "(".repeat(300), ")".repeat(300));
        assert_eq!(
            parse(&nested),
            Err(EvalError::Parse {
                position: MAX_NESTING,
                message: "expression nested too deeply".to_string(),
            })
        );

        let signs = format!("{}1", "-".repeat(400));
        assert!(matches!(parse(&signs), Err(EvalError::Parse { .. })));

        let tower = vec!["2"; 400].join("**");
        assert!(matches!(parse(&tower), Err(EvalError::Parse { .. })));

        let moderate = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse(&moderate).unwrap(), Expr::Variable("x".to_string()));
    }

    #[test]
    fn test_long_chains_are_rejected() {
        let chain = vec!["1"; 5_000].join(" + ");
        assert!(matches!(parse(&chain), Err(EvalError::Parse { .. })));

        let short = vec!["1"; 100].join(" + ");
        assert_eq!(value(&short), 100.0);
    }
}
