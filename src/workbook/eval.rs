//! Evaluator for the formula subset the workbook builder emits.
//!
//! Results are stored as each formula's cached value when the workbook is
//! written, and let tests assert on computed numbers without a spreadsheet
//! application. Semantics follow Excel: blanks act as `0` or `""` depending on
//! the other operand, range arguments skip text, and errors propagate.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use super::model::{CellValue, Formula};
use super::sheet::Sheet;

/// Nesting limit for formulas that reference other formula cells.
const MAX_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorValue {
    Div0,
    Value,
    Ref,
    Name,
    Na,
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorValue::Div0 => "#DIV/0!",
            ErrorValue::Value => "#VALUE!",
            ErrorValue::Ref => "#REF!",
            ErrorValue::Name => "#NAME?",
            ErrorValue::Na => "#N/A",
        })
    }
}

/// Result of evaluating a formula or reading a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Blank,
    Error(ErrorValue),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The text Excel would store as the formula's cached result.
    pub fn display(&self) -> String {
        match self {
            Value::Number(number) => format_number(*number),
            Value::Text(text) => text.clone(),
            Value::Bool(true) => "TRUE".to_owned(),
            Value::Bool(false) => "FALSE".to_owned(),
            Value::Blank => String::new(),
            Value::Error(error) => error.to_string(),
        }
    }
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        let text = format!("{:.10}", number);
        text.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("unexpected {found} at offset {offset} in formula")]
    Unexpected { found: String, offset: usize },
    #[error("unterminated string literal in formula")]
    UnterminatedString,
    #[error("formula ended early")]
    UnexpectedEnd,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Ident(String),
    Ref(u32, u16),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
    Colon,
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        let start = index;
        match ch {
            ' ' | '\t' | '\n' => {
                index += 1;
                continue;
            }
            '"' => {
                let mut text = String::new();
                index += 1;
                loop {
                    match chars.get(index) {
                        None => return Err(FormulaError::UnterminatedString),
                        Some('"') if chars.get(index + 1) == Some(&'"') => {
                            text.push('"');
                            index += 2;
                        }
                        Some('"') => {
                            index += 1;
                            break;
                        }
                        Some(other) => {
                            text.push(*other);
                            index += 1;
                        }
                    }
                }
                tokens.push((Token::Text(text), start));
                continue;
            }
            '0'..='9' | '.' => {
                while index < chars.len() && (chars[index].is_ascii_digit() || chars[index] == '.') {
                    index += 1;
                }
                let literal: String = chars[start..index].iter().collect();
                let number = literal.parse().map_err(|_| FormulaError::Unexpected {
                    found: literal.clone(),
                    offset: start,
                })?;
                tokens.push((Token::Number(number), start));
                continue;
            }
            '(' => tokens.push((Token::LParen, start)),
            ')' => tokens.push((Token::RParen, start)),
            ',' | ';' => tokens.push((Token::Comma, start)),
            ':' => tokens.push((Token::Colon, start)),
            '+' => tokens.push((Token::Op("+"), start)),
            '-' => tokens.push((Token::Op("-"), start)),
            '*' => tokens.push((Token::Op("*"), start)),
            '/' => tokens.push((Token::Op("/"), start)),
            '&' => tokens.push((Token::Op("&"), start)),
            '=' => tokens.push((Token::Op("="), start)),
            '<' | '>' => {
                let op = match (ch, chars.get(index + 1)) {
                    ('<', Some('=')) => "<=",
                    ('<', Some('>')) => "<>",
                    ('>', Some('=')) => ">=",
                    ('<', _) => "<",
                    _ => ">",
                };
                index += op.len();
                tokens.push((Token::Op(op), start));
                continue;
            }
            _ if ch.is_alphabetic() || ch == '$' || ch == '_' => {
                while index < chars.len()
                    && (chars[index].is_alphanumeric() || matches!(chars[index], '$' | '_' | '.'))
                {
                    index += 1;
                }
                let word: String = chars[start..index].iter().collect();
                tokens.push((classify_word(&word), start));
                continue;
            }
            other => {
                return Err(FormulaError::Unexpected {
                    found: other.to_string(),
                    offset: start,
                })
            }
        }
        index += 1;
    }
    Ok(tokens)
}

fn classify_word(word: &str) -> Token {
    let plain: String = word.chars().filter(|ch| *ch != '$').collect();
    let letters: String = plain.chars().take_while(|ch| ch.is_ascii_uppercase()).collect();
    let digits = &plain[letters.len()..];
    if !letters.is_empty()
        && letters.len() <= 3
        && !digits.is_empty()
        && digits.chars().all(|ch| ch.is_ascii_digit())
    {
        if let Ok(row) = digits.parse::<u32>() {
            let column = letters
                .bytes()
                .fold(0u32, |acc, byte| acc * 26 + u32::from(byte - b'A') + 1);
            if row > 0 && column > 0 && column <= u32::from(u16::MAX) {
                return Token::Ref(row, (column - 1) as u16);
            }
        }
    }
    Token::Ident(word.to_ascii_uppercase())
}

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Ref(u32, u16),
    Range((u32, u16), (u32, u16)),
    Negate(Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(token, _)| token)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).map(|(token, _)| token.clone());
        self.position += 1;
        token
    }

    fn unexpected(&self) -> FormulaError {
        match self.tokens.get(self.position) {
            Some((token, offset)) => FormulaError::Unexpected {
                found: format!("{:?}", token),
                offset: *offset,
            },
            None => FormulaError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), FormulaError> {
        if self.peek() == Some(expected) {
            self.position += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn binary_level(
        &mut self,
        ops: &[&'static str],
        next: fn(&mut Self) -> Result<Expr, FormulaError>,
    ) -> Result<Expr, FormulaError> {
        let mut left = next(self)?;
        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if !ops.contains(&op) {
                break;
            }
            self.position += 1;
            let right = next(self)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(&["=", "<>", "<", "<=", ">", ">="], Self::concat)
    }

    fn concat(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(&["&"], Self::additive)
    }

    fn additive(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(&["+", "-"], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(&["*", "/"], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Op("-")) => {
                self.position += 1;
                Ok(Expr::Negate(Box::new(self.unary()?)))
            }
            Some(Token::Op("+")) => {
                self.position += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Number(number)) => Ok(Expr::Number(number)),
            Some(Token::Text(text)) => Ok(Expr::Text(text)),
            Some(Token::Ref(row, column)) => {
                if self.peek() == Some(&Token::Colon) {
                    self.position += 1;
                    match self.next() {
                        Some(Token::Ref(end_row, end_column)) => {
                            Ok(Expr::Range((row, column), (end_row, end_column)))
                        }
                        _ => {
                            self.position -= 1;
                            Err(self.unexpected())
                        }
                    }
                } else {
                    Ok(Expr::Ref(row, column))
                }
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.position += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.comparison()?);
                            if self.peek() == Some(&Token::Comma) {
                                self.position += 1;
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    match name.as_str() {
                        "TRUE" => Ok(Expr::Bool(true)),
                        "FALSE" => Ok(Expr::Bool(false)),
                        _ => Ok(Expr::Call(name, Vec::new())),
                    }
                }
            }
            Some(Token::LParen) => {
                let inner = self.comparison()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(_) => {
                self.position -= 1;
                Err(self.unexpected())
            }
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

fn parse(formula: &str) -> Result<Expr, FormulaError> {
    let source = formula.trim().strip_prefix('=').unwrap_or(formula.trim());
    let mut parser = Parser {
        tokens: tokenize(source)?,
        position: 0,
    };
    let expr = parser.comparison()?;
    if parser.position < parser.tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

/// Evaluates `formula` against the cells of `sheet`.
pub fn evaluate(sheet: &Sheet, formula: &Formula) -> Result<Value, FormulaError> {
    Evaluator { sheet }.formula(formula.as_str(), 0)
}

/// Value of the cell at `row` (1-based) and `column` (0-based), evaluating
/// formulas. Unparseable formulas read as `#NAME?`.
pub fn evaluate_cell(sheet: &Sheet, row: u32, column: u16) -> Value {
    Evaluator { sheet }.cell(row, column, 0)
}

struct Evaluator<'a> {
    sheet: &'a Sheet,
}

/// Argument after range expansion; `from_range` controls how text is treated.
struct Arg {
    value: Value,
    from_range: bool,
}

impl Evaluator<'_> {
    fn formula(&self, formula: &str, depth: usize) -> Result<Value, FormulaError> {
        let expr = parse(formula)?;
        Ok(self.eval(&expr, depth))
    }

    fn cell(&self, row: u32, column: u16, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return Value::Error(ErrorValue::Ref);
        }
        match self.sheet.cell(row, column).map(|cell| &cell.value) {
            None | Some(CellValue::Empty) => Value::Blank,
            Some(CellValue::Text(text)) => Value::Text(text.clone()),
            Some(CellValue::Number(number)) => Value::Number(*number),
            Some(CellValue::Formula(formula)) => self
                .formula(formula.as_str(), depth + 1)
                .unwrap_or(Value::Error(ErrorValue::Name)),
        }
    }

    fn eval(&self, expr: &Expr, depth: usize) -> Value {
        match expr {
            Expr::Number(number) => Value::Number(*number),
            Expr::Text(text) => Value::Text(text.clone()),
            Expr::Bool(value) => Value::Bool(*value),
            Expr::Ref(row, column) => self.cell(*row, *column, depth),
            // A bare range outside a function argument has no single value.
            Expr::Range(..) => Value::Error(ErrorValue::Value),
            Expr::Negate(inner) => match to_number(&self.eval(inner, depth)) {
                Ok(number) => Value::Number(-number),
                Err(error) => Value::Error(error),
            },
            Expr::Binary(op, left, right) => {
                let left = self.eval(left, depth);
                let right = self.eval(right, depth);
                binary(op, left, right)
            }
            Expr::Call(name, args) => self.call(name, args, depth),
        }
    }

    fn expand(&self, args: &[Expr], depth: usize) -> Vec<Arg> {
        let mut out = Vec::new();
        for arg in args {
            match arg {
                Expr::Range((r1, c1), (r2, c2)) => {
                    for row in *r1.min(r2)..=*r1.max(r2) {
                        for column in *c1.min(c2)..=*c1.max(c2) {
                            out.push(Arg {
                                value: self.cell(row, column, depth),
                                from_range: true,
                            });
                        }
                    }
                }
                Expr::Ref(row, column) => out.push(Arg {
                    value: self.cell(*row, *column, depth),
                    from_range: true,
                }),
                other => out.push(Arg {
                    value: self.eval(other, depth),
                    from_range: false,
                }),
            }
        }
        out
    }

    /// Numbers for SUM, AVERAGE, COUNT, MAX and MIN. References contribute
    /// only numeric cells; literal arguments are coerced.
    fn numbers(&self, args: &[Expr], depth: usize) -> Result<Vec<f64>, ErrorValue> {
        let mut numbers = Vec::new();
        for arg in self.expand(args, depth) {
            match (arg.value, arg.from_range) {
                (Value::Error(error), _) => return Err(error),
                (Value::Number(number), _) => numbers.push(number),
                (_, true) => {}
                (Value::Blank, false) => numbers.push(0.0),
                (other, false) => numbers.push(to_number(&other)?),
            }
        }
        Ok(numbers)
    }

    fn call(&self, name: &str, args: &[Expr], depth: usize) -> Value {
        let result = match name {
            "SUM" => self.numbers(args, depth).map(|n| Value::Number(n.iter().sum())),
            "AVERAGE" => self.numbers(args, depth).and_then(|n| {
                if n.is_empty() {
                    Err(ErrorValue::Div0)
                } else {
                    Ok(Value::Number(n.iter().sum::<f64>() / n.len() as f64))
                }
            }),
            "MAX" => self
                .numbers(args, depth)
                .map(|n| Value::Number(n.iter().copied().reduce(f64::max).unwrap_or(0.0))),
            "MIN" => self
                .numbers(args, depth)
                .map(|n| Value::Number(n.iter().copied().reduce(f64::min).unwrap_or(0.0))),
            "COUNT" => Ok(Value::Number(
                self.expand(args, depth)
                    .iter()
                    .filter(|arg| matches!(arg.value, Value::Number(_)))
                    .count() as f64,
            )),
            "COUNTA" => Ok(Value::Number(
                self.expand(args, depth)
                    .iter()
                    .filter(|arg| arg.value != Value::Blank)
                    .count() as f64,
            )),
            "COUNTIF" => self.countif(args, depth),
            "IF" => self.if_(args, depth),
            "IFERROR" => match args {
                [value, fallback] => {
                    let value = self.eval(value, depth);
                    if value.is_error() {
                        Ok(self.eval(fallback, depth))
                    } else {
                        Ok(value)
                    }
                }
                _ => Err(ErrorValue::Value),
            },
            "AND" | "OR" => self.logical(name == "AND", args, depth),
            "ROUND" => match args {
                [value, digits] => to_number(&self.eval(value, depth)).and_then(|value| {
                    let digits = to_number(&self.eval(digits, depth))?.trunc() as i32;
                    let factor = 10f64.powi(digits);
                    Ok(Value::Number((value * factor).round() / factor))
                }),
                _ => Err(ErrorValue::Value),
            },
            _ => Err(ErrorValue::Name),
        };
        result.unwrap_or_else(Value::Error)
    }

    fn if_(&self, args: &[Expr], depth: usize) -> Result<Value, ErrorValue> {
        let (condition, then, otherwise) = match args {
            [c, t] => (c, t, None),
            [c, t, e] => (c, t, Some(e)),
            _ => return Err(ErrorValue::Value),
        };
        if truthy(&self.eval(condition, depth))? {
            Ok(self.eval(then, depth))
        } else {
            Ok(otherwise.map_or(Value::Bool(false), |e| self.eval(e, depth)))
        }
    }

    fn logical(&self, all: bool, args: &[Expr], depth: usize) -> Result<Value, ErrorValue> {
        let mut seen = false;
        let mut result = all;
        for arg in self.expand(args, depth) {
            let flag = match (&arg.value, arg.from_range) {
                (Value::Error(error), _) => return Err(*error),
                (Value::Blank, _) | (Value::Text(_), true) => continue,
                (value, _) => truthy(value)?,
            };
            seen = true;
            result = if all { result && flag } else { result || flag };
        }
        if seen {
            Ok(Value::Bool(result))
        } else {
            Err(ErrorValue::Value)
        }
    }

    fn countif(&self, args: &[Expr], depth: usize) -> Result<Value, ErrorValue> {
        let [range, criterion] = args else {
            return Err(ErrorValue::Value);
        };
        let criterion = self.eval(criterion, depth);
        let (op, operand) = match &criterion {
            Value::Text(text) => split_criterion(text),
            other => ("=", other.clone()),
        };
        let count = self
            .expand(std::slice::from_ref(range), depth)
            .into_iter()
            .filter(|arg| criterion_matches(op, &arg.value, &operand))
            .count();
        Ok(Value::Number(count as f64))
    }
}

fn split_criterion(text: &str) -> (&'static str, Value) {
    let (op, rest) = [">=", "<=", "<>", ">", "<", "="]
        .iter()
        .find_map(|op| text.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("=", text));
    let operand = match rest.trim().parse::<f64>() {
        Ok(number) => Value::Number(number),
        Err(_) if rest.is_empty() => Value::Blank,
        Err(_) => Value::Text(rest.to_owned()),
    };
    (op, operand)
}

fn criterion_matches(op: &str, value: &Value, operand: &Value) -> bool {
    match (value, operand) {
        (Value::Error(_), _) => false,
        (Value::Blank, Value::Blank) => op == "=",
        (_, Value::Blank) => op == "<>",
        (Value::Number(_), Value::Number(_)) | (Value::Text(_), Value::Text(_)) => {
            compare_op(op, compare(value, operand))
        }
        _ => op == "<>",
    }
}

fn truthy(value: &Value) -> Result<bool, ErrorValue> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => Ok(*number != 0.0),
        Value::Blank => Ok(false),
        Value::Text(text) if text.eq_ignore_ascii_case("TRUE") => Ok(true),
        Value::Text(text) if text.eq_ignore_ascii_case("FALSE") => Ok(false),
        Value::Text(_) => Err(ErrorValue::Value),
        Value::Error(error) => Err(*error),
    }
}

fn to_number(value: &Value) -> Result<f64, ErrorValue> {
    match value {
        Value::Number(number) => Ok(*number),
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        Value::Blank => Ok(0.0),
        Value::Text(text) => text.trim().parse().map_err(|_| ErrorValue::Value),
        Value::Error(error) => Err(*error),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) | Value::Blank => 0,
        Value::Text(_) => 1,
        Value::Bool(_) => 2,
        Value::Error(_) => 3,
    }
}

/// Excel ordering: numbers < text < booleans; text compares case-insensitively.
/// A blank takes the type of the other operand.
fn compare(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Blank, Value::Text(_)) => compare(&Value::Text(String::new()), right),
        (Value::Text(_), Value::Blank) => compare(left, &Value::Text(String::new())),
        (Value::Blank, Value::Bool(_)) => compare(&Value::Bool(false), right),
        (Value::Bool(_), Value::Blank) => compare(left, &Value::Bool(false)),
        (Value::Number(_) | Value::Blank, Value::Number(_) | Value::Blank) => {
            let a = to_number(left).unwrap_or(0.0);
            let b = to_number(right).unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Text(a), Value::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn compare_op(op: &str, ordering: Ordering) -> bool {
    match op {
        "=" => ordering == Ordering::Equal,
        "<>" => ordering != Ordering::Equal,
        "<" => ordering == Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        ">" => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }
}

fn binary(op: &str, left: Value, right: Value) -> Value {
    if let Value::Error(error) = left {
        return Value::Error(error);
    }
    if let Value::Error(error) = right {
        return Value::Error(error);
    }
    match op {
        "&" => Value::Text(format!("{}{}", left.display(), right.display())),
        "=" | "<>" | "<" | "<=" | ">" | ">=" => Value::Bool(compare_op(op, compare(&left, &right))),
        _ => {
            let (a, b) = match (to_number(&left), to_number(&right)) {
                (Ok(a), Ok(b)) => (a, b),
                (Err(error), _) | (_, Err(error)) => return Value::Error(error),
            };
            match op {
                "+" => Value::Number(a + b),
                "-" => Value::Number(a - b),
                "*" => Value::Number(a * b),
                _ if b == 0.0 => Value::Error(ErrorValue::Div0),
                _ => Value::Number(a / b),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::model::CellFormat;

    fn sheet() -> Sheet {
        let mut sheet = Sheet::new("Test", 4);
        for (row, value) in [(2, 10.0), (3, 20.0), (4, 30.0)] {
            sheet.set_cell(row, 1, value, CellFormat::default());
        }
        sheet.set_cell(5, 1, "not a number", CellFormat::default());
        sheet.set_cell(2, 2, Formula::new("=B2*2"), CellFormat::default());
        sheet.set_cell(3, 2, Formula::new("=C2+1"), CellFormat::default());
        sheet.set_cell(2, 3, "Kritik", CellFormat::default());
        sheet
    }

    fn eval(formula: &str) -> Value {
        evaluate(&sheet(), &Formula::new(formula)).unwrap()
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval("=1+2*3"), Value::Number(7.0));
        assert_eq!(eval("=(1+2)*3"), Value::Number(9.0));
        assert_eq!(eval("=-B2+5"), Value::Number(-5.0));
        assert_eq!(eval("=B2/0"), Value::Error(ErrorValue::Div0));
        assert_eq!(eval("=\"a\"&1&\"b\""), Value::Text("a1b".into()));
    }

    #[test]
    fn aggregates_skip_text_in_ranges() {
        assert_eq!(eval("=SUM(B2:B5)"), Value::Number(60.0));
        assert_eq!(eval("=AVERAGE(B2:B5)"), Value::Number(20.0));
        assert_eq!(eval("=COUNT(B2:B5)"), Value::Number(3.0));
        assert_eq!(eval("=COUNTA(B2:B9)"), Value::Number(4.0));
        assert_eq!(eval("=MAX($B$2:$B$5)"), Value::Number(30.0));
        assert_eq!(eval("=MIN(B2:B4)"), Value::Number(10.0));
    }

    #[test]
    fn empty_ranges_are_guarded() {
        assert_eq!(eval("=AVERAGE(B10:B12)"), Value::Error(ErrorValue::Div0));
        assert_eq!(eval("=IFERROR(AVERAGE(B10:B12),\"\")"), Value::Text(String::new()));
        assert_eq!(eval("=IF(COUNT(B10:B12)=0,\"\",MAX(B10:B12))"), Value::Text(String::new()));
        assert_eq!(eval("=IF(OR(B10=0,B10=\"\"),\"\",B2/B10*100)"), Value::Text(String::new()));
    }

    #[test]
    fn formulas_reference_formula_cells() {
        assert_eq!(evaluate_cell(&sheet(), 3, 2), Value::Number(21.0));
    }

    #[test]
    fn circular_references_stop() {
        let mut sheet = Sheet::new("Loop", 1);
        sheet.set_cell(1, 0, Formula::new("=A1+1"), CellFormat::default());
        assert!(evaluate_cell(&sheet, 1, 0).is_error());
    }

    #[test]
    fn comparisons_follow_spreadsheet_rules() {
        assert_eq!(eval("=B10=0"), Value::Bool(true));
        assert_eq!(eval("=B10=\"\""), Value::Bool(true));
        assert_eq!(eval("=D2=\"kritik\""), Value::Bool(true));
        assert_eq!(eval("=\"a\">5"), Value::Bool(true));
        assert_eq!(eval("=IF(B2>=10,\"ok\",\"no\")"), Value::Text("ok".into()));
    }

    #[test]
    fn countif_and_round() {
        assert_eq!(eval("=COUNTIF(B2:B5,\">=20\")"), Value::Number(2.0));
        assert_eq!(eval("=COUNTIF(D2:D3,\"Kritik\")"), Value::Number(1.0));
        assert_eq!(eval("=ROUND(2/3,2)"), Value::Number(0.67));
    }

    #[test]
    fn unknown_functions_are_name_errors() {
        assert_eq!(eval("=FOO(1)"), Value::Error(ErrorValue::Name));
    }

    #[test]
    fn malformed_formulas_fail_to_parse() {
        assert!(evaluate(&sheet(), &Formula::new("=SUM(B2:B3")).is_err());
        assert!(evaluate(&sheet(), &Formula::new("=\"open")).is_err());
        assert!(evaluate(&sheet(), &Formula::new("=1 2")).is_err());
    }

    #[test]
    fn cached_result_text() {
        assert_eq!(Value::Number(46000.0).display(), "46000");
        assert_eq!(Value::Number(0.5).display(), "0.5");
        assert_eq!(Value::Error(ErrorValue::Div0).display(), "#DIV/0!");
    }
}
