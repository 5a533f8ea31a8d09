use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use crate::arith;
use crate::error::{SchemeError, SchemeResult};
use crate::symbol::{sym, SymbolTable};
use crate::value::{self, Value};

/// Host callback that supplies one line of source text at a time.
/// `None` means the host's input stream is exhausted. Reading blocks;
/// there are no background threads behind this.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Plain stdin, prompting on stdout. The default host.
pub struct StdinSource;

impl LineSource for StdinSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        use std::io::Write;
        if !prompt.is_empty() {
            print!("{}", prompt);
            io::stdout().flush()?;
        }
        let mut line = String::new();
        match io::stdin().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

/// Replays pre-supplied lines, then reports end of input. Used for
/// piped input and tests.
pub struct QueuedLines {
    lines: VecDeque<String>,
}

impl QueuedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueuedLines {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for QueuedLines {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Split source text into tokens, line by line. String literals are cut
/// out first (each one queued with its opening quote still attached and
/// a `#s` placeholder left in the code stream), so comment and paren
/// handling never see their contents.
pub fn tokenize(source: &str, out: &mut VecDeque<String>) {
    let mut literals: VecDeque<String> = VecDeque::new();
    let mut raw: Vec<String> = Vec::new();

    for line in source.split('\n') {
        let line = line.trim_end_matches('\r');
        let mut code = String::new();
        for (i, segment) in line.split('"').enumerate() {
            if i % 2 == 0 {
                code.push_str(segment);
            } else {
                literals.push_back(format!("\"{}", segment));
                code.push_str(" #s ");
            }
        }
        let code = code.split(';').next().unwrap_or("");
        let padded = code
            .replace('\'', " ' ")
            .replace('(', " ( ")
            .replace(')', " ) ");
        for token in padded.split(|c: char| matches!(c, ' ' | '\t' | '\x0b' | '\x0c')) {
            if !token.is_empty() {
                raw.push(token.to_string());
            }
        }
    }

    for token in raw {
        if token == "#s" {
            out.push_back(literals.pop_front().unwrap_or(token));
        } else {
            out.push_back(token);
        }
    }
}

/// Why read_from_tokens stopped without producing an expression.
enum TokenError {
    /// The buffer ran out mid-expression; more input may complete it.
    Underflow,
    /// The input is malformed no matter what follows.
    Bad(SchemeError),
}

/// Parse one expression off the front of the token buffer. Consumed
/// tokens are removed; on underflow the caller restores the buffer.
fn read_from_tokens(
    tokens: &mut VecDeque<String>,
    symbols: &mut SymbolTable,
) -> Result<Value, TokenError> {
    let token = tokens.pop_front().ok_or(TokenError::Underflow)?;
    match token.as_str() {
        "(" => read_list(tokens, symbols),
        ")" => Err(TokenError::Bad(SchemeError::Reader(
            "unexpected ')'".into(),
        ))),
        "'" => {
            let quoted = read_from_tokens(tokens, symbols)?;
            Ok(value::list(&[Value::Sym(sym::QUOTE), quoted]))
        }
        "#t" => Ok(Value::Bool(true)),
        "#f" => Ok(Value::Bool(false)),
        _ => {
            if let Some(rest) = token.strip_prefix('"') {
                return Ok(Value::Str(Rc::new(rest.to_string())));
            }
            Ok(arith::parse(&token)
                .unwrap_or_else(|| Value::Sym(symbols.intern(&token))))
        }
    }
}

/// Elements up to `)`, with dotted-tail support.
fn read_list(
    tokens: &mut VecDeque<String>,
    symbols: &mut SymbolTable,
) -> Result<Value, TokenError> {
    let mut elements: Vec<Value> = Vec::new();
    loop {
        let token = tokens.front().cloned().ok_or(TokenError::Underflow)?;
        match token.as_str() {
            ")" => {
                tokens.pop_front();
                return Ok(value::list(&elements));
            }
            "." => {
                tokens.pop_front();
                let tail = read_from_tokens(tokens, symbols)?;
                match tokens.pop_front() {
                    Some(t) if t == ")" => {
                        let mut result = tail;
                        for item in elements.into_iter().rev() {
                            result = value::cons(item, result);
                        }
                        return Ok(result);
                    }
                    Some(_) => {
                        return Err(TokenError::Bad(SchemeError::Reader(
                            "expected ')' after dotted tail".into(),
                        )))
                    }
                    None => return Err(TokenError::Underflow),
                }
            }
            _ => elements.push(read_from_tokens(tokens, symbols)?),
        }
    }
}

/// Parse the next expression from a standalone token buffer (a loaded
/// file, piped input). `None` when the buffer is empty; running out
/// mid-expression is a reader error here, since no more input is
/// coming. The buffer is cleared on any error.
pub fn next_datum(
    tokens: &mut VecDeque<String>,
    symbols: &mut SymbolTable,
) -> SchemeResult<Option<Value>> {
    if tokens.is_empty() {
        return Ok(None);
    }
    match read_from_tokens(tokens, symbols) {
        Ok(v) => Ok(Some(v)),
        Err(TokenError::Underflow) => {
            tokens.clear();
            Err(SchemeError::Reader("unexpected end of input".into()))
        }
        Err(TokenError::Bad(e)) => {
            tokens.clear();
            Err(e)
        }
    }
}

/// Pulls lines from the host and hands out one parsed expression at a
/// time, buffering leftover tokens between calls.
pub struct ExprReader {
    tokens: VecDeque<String>,
    source: Box<dyn LineSource>,
}

impl ExprReader {
    pub fn new(source: Box<dyn LineSource>) -> Self {
        ExprReader {
            tokens: VecDeque::new(),
            source,
        }
    }

    /// Queue a chunk of source text on the host-facing buffer.
    fn feed(&mut self, text: &str) {
        tokenize(text, &mut self.tokens);
    }

    /// Read one complete expression, pulling additional lines from the
    /// host until the parse succeeds. `prompt1` announces a fresh
    /// expression, `prompt2` a continuation line. Returns `Eof` when the
    /// host signals end of stream.
    pub fn read_expression(
        &mut self,
        symbols: &mut SymbolTable,
        prompt1: &str,
        prompt2: &str,
    ) -> SchemeResult<Value> {
        loop {
            let saved = self.tokens.clone();
            match read_from_tokens(&mut self.tokens, symbols) {
                Ok(v) => return Ok(v),
                Err(TokenError::Underflow) => {
                    let prompt = if saved.is_empty() { prompt1 } else { prompt2 };
                    match self
                        .source
                        .read_line(prompt)
                        .map_err(|e| SchemeError::Io(e.to_string()))?
                    {
                        Some(line) => {
                            self.tokens = saved;
                            self.feed(&line);
                        }
                        None => return Ok(Value::Eof),
                    }
                }
                Err(TokenError::Bad(e)) => {
                    self.tokens.clear();
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer;
    use crate::value::Value;

    fn parse_one(src: &str) -> (Value, SymbolTable) {
        let mut symbols = SymbolTable::new();
        let mut tokens = VecDeque::new();
        tokenize(src, &mut tokens);
        let v = match read_from_tokens(&mut tokens, &mut symbols) {
            Ok(v) => v,
            Err(TokenError::Bad(e)) => panic!("parse failed: {}", e),
            Err(TokenError::Underflow) => panic!("token underflow"),
        };
        (v, symbols)
    }

    fn round_trip(src: &str) -> String {
        let (v, symbols) = parse_one(src);
        printer::stringify(&v, &symbols, true)
    }

    #[test]
    fn tokenize_pads_and_strips_comments() {
        let mut tokens = VecDeque::new();
        tokenize("(+ 1 2) ; add\n'x", &mut tokens);
        let tokens: Vec<String> = tokens.into_iter().collect();
        assert_eq!(tokens, ["(", "+", "1", "2", ")", "'", "x"]);
    }

    #[test]
    fn string_literals_survive_parens_and_semicolons() {
        let mut tokens = VecDeque::new();
        tokenize("(display \"a;b(c)\")", &mut tokens);
        let tokens: Vec<String> = tokens.into_iter().collect();
        assert_eq!(tokens, ["(", "display", "\"a;b(c)", ")"]);
    }

    #[test]
    fn parses_atoms_lists_and_sugar() {
        assert_eq!(round_trip("(list 1 2 3)"), "(list 1 2 3)");
        assert_eq!(round_trip("'foo"), "(quote foo)");
        assert_eq!(round_trip("#t"), "#t");
        assert_eq!(round_trip("\"hi there\""), "\"hi there\"");
        assert_eq!(round_trip("()"), "()");
    }

    #[test]
    fn parses_dotted_pairs() {
        assert_eq!(round_trip("(a . b)"), "(a . b)");
        assert_eq!(round_trip("(a b . c)"), "(a b . c)");
    }

    #[test]
    fn unbalanced_close_paren_is_an_error() {
        let mut symbols = SymbolTable::new();
        let mut tokens = VecDeque::new();
        tokenize(")", &mut tokens);
        assert!(matches!(
            read_from_tokens(&mut tokens, &mut symbols),
            Err(TokenError::Bad(SchemeError::Reader(_)))
        ));
    }

    #[test]
    fn junk_after_dotted_tail_is_an_error() {
        let mut symbols = SymbolTable::new();
        let mut tokens = VecDeque::new();
        tokenize("(a . b c)", &mut tokens);
        assert!(matches!(
            read_from_tokens(&mut tokens, &mut symbols),
            Err(TokenError::Bad(SchemeError::Reader(_)))
        ));
    }

    #[test]
    fn read_expression_spans_lines_and_prompts() {
        let source = QueuedLines::new(["(+ 1", "2)", ""]);
        let mut reader = ExprReader::new(Box::new(source));
        let mut symbols = SymbolTable::new();
        let v = reader.read_expression(&mut symbols, "> ", "| ").unwrap();
        assert_eq!(printer::stringify(&v, &symbols, true), "(+ 1 2)");
        let end = reader.read_expression(&mut symbols, "> ", "| ").unwrap();
        assert!(matches!(end, Value::Eof));
    }

    #[test]
    fn numbers_fall_back_to_symbols() {
        let (v, _) = parse_one("12345678901234567890");
        assert!(matches!(v, Value::BigInt(_)));
        let (v, _) = parse_one("12x");
        assert!(matches!(v, Value::Sym(_)));
    }
}
