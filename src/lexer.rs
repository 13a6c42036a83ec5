use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(i64),
    String(String),
    Id(String),
    Char(char),
    Class,
    Return,
    If,
    Else,
    Def,
    Print,
    And,
    Or,
    Not,
    None,
    True,
    False,
    Eq,
    NotEq,
    LessOrEq,
    GreaterOrEq,
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "Number{{{}}}", n),
            Token::String(s) => write!(f, "String{{{}}}", s),
            Token::Id(s) => write!(f, "Id{{{}}}", s),
            Token::Char(c) => write!(f, "Char{{{}}}", c),
            Token::Class => write!(f, "Class"),
            Token::Return => write!(f, "Return"),
            Token::If => write!(f, "If"),
            Token::Else => write!(f, "Else"),
            Token::Def => write!(f, "Def"),
            Token::Print => write!(f, "Print"),
            Token::And => write!(f, "And"),
            Token::Or => write!(f, "Or"),
            Token::Not => write!(f, "Not"),
            Token::None => write!(f, "None"),
            Token::True => write!(f, "True"),
            Token::False => write!(f, "False"),
            Token::Eq => write!(f, "Eq"),
            Token::NotEq => write!(f, "NotEq"),
            Token::LessOrEq => write!(f, "LessOrEq"),
            Token::GreaterOrEq => write!(f, "GreaterOrEq"),
            Token::Newline => write!(f, "Newline"),
            Token::Indent => write!(f, "Indent"),
            Token::Dedent => write!(f, "Dedent"),
            Token::Eof => write!(f, "Eof"),
        }
    }
}

fn keyword_or_id(word: String) -> Token {
    match word.as_str() {
        "class" => Token::Class,
        "def" => Token::Def,
        "print" => Token::Print,
        "return" => Token::Return,
        "if" => Token::If,
        "else" => Token::Else,
        "or" => Token::Or,
        "and" => Token::And,
        "not" => Token::Not,
        "None" => Token::None,
        "True" => Token::True,
        "False" => Token::False,
        _ => Token::Id(word),
    }
}

/// Indentation-aware tokenizer with one token of lookahead. `Indent`,
/// `Dedent` and `Newline` are synthesized from whitespace; one indentation
/// level is exactly two spaces.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    current: Token,
    // open indentation levels, and the level a multi-level dedent is
    // unwinding towards
    dent: usize,
    dent_buf: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Lexer {
        let mut lexer = Lexer {
            chars: input.chars().collect(),
            pos: 0,
            current: Token::Newline,
            dent: 0,
            dent_buf: 0,
        };
        lexer.current = lexer.load_token();
        lexer
    }

    pub fn current_token(&self) -> &Token {
        &self.current
    }

    pub fn next_token(&mut self) -> &Token {
        self.current = self.load_token();
        &self.current
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.advance() {
            if c == '\n' {
                break;
            }
        }
    }

    // Decisions here depend on the previously emitted token, so `current`
    // must not be reassigned until the new token is fully decided.
    fn load_token(&mut self) -> Token {
        if self.peek().is_none() {
            return self.wind_down();
        }

        if self.peek() == Some('\n') {
            if self.current != Token::Newline {
                self.advance();
                return Token::Newline;
            }
            // collapse runs of blank lines into the Newline already emitted
            while self.peek() == Some('\n') {
                self.advance();
            }
            if self.peek().is_none() {
                return self.wind_down();
            }
        }

        if self.current == Token::Newline {
            if self.peek() == Some(' ') {
                let mut spaces = 0usize;
                while self.peek() == Some(' ') {
                    self.advance();
                    spaces += 1;
                }
                if matches!(self.peek(), Some('#') | Some('\n')) {
                    // indented blank or comment line: no structural tokens
                    self.skip_line();
                    return self.load_token();
                }
                if spaces / 2 == self.dent + 1 {
                    self.dent += 1;
                    return Token::Indent;
                }
                if spaces / 2 < self.dent {
                    self.dent -= 1;
                    self.dent_buf = spaces / 2;
                    return Token::Dedent;
                }
            } else if self.dent > 0 {
                self.dent -= 1;
                self.dent_buf = 0;
                return Token::Dedent;
            }
        }

        // a multi-level dedent emits one Dedent per call until the buffered
        // target level is reached
        if self.current == Token::Dedent && self.dent_buf < self.dent {
            self.dent -= 1;
            return Token::Dedent;
        }

        while self.peek() == Some(' ') {
            self.advance();
        }

        let c = match self.peek() {
            Some(c) => c,
            None => return Token::Eof,
        };

        if c.is_ascii_punctuation() && c != '_' {
            self.advance();
            return match c {
                '"' | '\'' => Token::String(self.read_string(c)),
                '#' => {
                    self.skip_line();
                    if self.current != Token::Newline {
                        Token::Newline
                    } else {
                        self.load_token()
                    }
                }
                '=' => {
                    if self.peek() == Some('=') {
                        self.advance();
                        Token::Eq
                    } else {
                        Token::Char('=')
                    }
                }
                '!' => {
                    if self.peek() == Some('=') {
                        self.advance();
                        Token::NotEq
                    } else {
                        Token::Char('!')
                    }
                }
                '<' => {
                    if self.peek() == Some('=') {
                        self.advance();
                        Token::LessOrEq
                    } else {
                        Token::Char('<')
                    }
                }
                '>' => {
                    if self.peek() == Some('=') {
                        self.advance();
                        Token::GreaterOrEq
                    } else {
                        Token::Char('>')
                    }
                }
                _ => Token::Char(c),
            };
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let mut word = String::new();
            while let Some(c) = self.peek() {
                if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                word.push(c);
                self.advance();
            }
            return keyword_or_id(word);
        }

        if c.is_ascii_digit() {
            let mut value: i64 = 0;
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
                value = value * 10 + i64::from(digit);
                self.advance();
            }
            return Token::Number(value);
        }

        Token::Eof
    }

    // End of input: drain open indentation levels one Dedent at a time,
    // then terminate the last logical line before reporting Eof.
    fn wind_down(&mut self) -> Token {
        if self.dent > 0 {
            self.dent -= 1;
            self.dent_buf = 0;
            return Token::Dedent;
        }
        match self.current {
            Token::Newline | Token::Eof | Token::Dedent => Token::Eof,
            _ => Token::Newline,
        }
    }

    // String literal body; the opening quote is already consumed. An
    // unterminated literal yields everything up to end of input.
    fn read_string(&mut self, delim: char) -> String {
        let mut text = String::new();
        while let Some(c) = self.advance() {
            if c == '\\' {
                match self.advance() {
                    Some('t') => text.push('\t'),
                    Some('n') => text.push('\n'),
                    Some('\\') => text.push('\\'),
                    Some(other) => text.push(other),
                    None => break,
                }
            } else if c == delim {
                break;
            } else {
                text.push(c);
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = vec![lexer.current_token().clone()];
        while *lexer.current_token() != Token::Eof {
            out.push(lexer.next_token().clone());
        }
        out
    }

    fn id(name: &str) -> Token {
        Token::Id(name.to_string())
    }

    #[test]
    fn test_simple_assignment() {
        assert_eq!(
            tokens("x = 1\n"),
            vec![
                id("x"),
                Token::Char('='),
                Token::Number(1),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokens(""), vec![Token::Eof]);
    }

    #[test]
    fn test_missing_final_newline_is_synthesized() {
        assert_eq!(tokens("x"), vec![id("x"), Token::Newline, Token::Eof]);
    }

    #[test]
    fn test_leading_indent_closes_at_eof() {
        assert_eq!(
            tokens("  y = 2\n"),
            vec![
                Token::Indent,
                id("y"),
                Token::Char('='),
                Token::Number(2),
                Token::Newline,
                Token::Dedent,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            tokens("a == b\nc != d\n"),
            vec![
                id("a"),
                Token::Eq,
                id("b"),
                Token::Newline,
                id("c"),
                Token::NotEq,
                id("d"),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_single_and_double_char_operators() {
        assert_eq!(
            tokens("a=b==c<=d<e>=f>g!h\n"),
            vec![
                id("a"),
                Token::Char('='),
                id("b"),
                Token::Eq,
                id("c"),
                Token::LessOrEq,
                id("d"),
                Token::Char('<'),
                id("e"),
                Token::GreaterOrEq,
                id("f"),
                Token::Char('>'),
                id("g"),
                Token::Char('!'),
                id("h"),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens("s = \"he said \\\"hi\\\"\"\n"),
            vec![
                id("s"),
                Token::Char('='),
                Token::String("he said \"hi\"".to_string()),
                Token::Newline,
                Token::Eof,
            ]
        );
        assert_eq!(
            tokens("'tab\\there\\nnext\\\\q\\q'\n"),
            vec![
                Token::String("tab\there\nnext\\q".to_string()),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_returns_prefix() {
        assert_eq!(
            tokens("'oops"),
            vec![Token::String("oops".to_string()), Token::Newline, Token::Eof]
        );
    }

    #[test]
    fn test_keywords_require_full_spelling() {
        assert_eq!(
            tokens("class classes None Nones return returned _if\n"),
            vec![
                Token::Class,
                id("classes"),
                Token::None,
                id("Nones"),
                Token::Return,
                id("returned"),
                id("_if"),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_all_keywords() {
        assert_eq!(
            tokens("class def print return if else or and not None True False\n"),
            vec![
                Token::Class,
                Token::Def,
                Token::Print,
                Token::Return,
                Token::If,
                Token::Else,
                Token::Or,
                Token::And,
                Token::Not,
                Token::None,
                Token::True,
                Token::False,
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_number_is_maximal_munch() {
        assert_eq!(
            tokens("1234 5\n"),
            vec![
                Token::Number(1234),
                Token::Number(5),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_blank_lines_are_collapsed() {
        assert_eq!(
            tokens("a\n\n\n\nb\n"),
            vec![id("a"), Token::Newline, id("b"), Token::Newline, Token::Eof]
        );
    }

    #[test]
    fn test_trailing_blank_lines_produce_nothing() {
        assert_eq!(tokens("a\n\n\n"), vec![id("a"), Token::Newline, Token::Eof]);
    }

    #[test]
    fn test_comment_after_code_terminates_line() {
        assert_eq!(
            tokens("x # note\n"),
            vec![id("x"), Token::Newline, Token::Eof]
        );
    }

    #[test]
    fn test_comment_only_lines_produce_no_tokens() {
        assert_eq!(
            tokens("# one\nx\n# two\n  # indented\ny\n"),
            vec![id("x"), Token::Newline, id("y"), Token::Newline, Token::Eof]
        );
    }

    #[test]
    fn test_indented_blank_line_produces_no_tokens() {
        assert_eq!(
            tokens("a\n   \nb\n"),
            vec![id("a"), Token::Newline, id("b"), Token::Newline, Token::Eof]
        );
    }

    #[test]
    fn test_nested_blocks_unwind_one_dedent_per_level() {
        assert_eq!(
            tokens("a\n  b\n    c\nd\n"),
            vec![
                id("a"),
                Token::Newline,
                Token::Indent,
                id("b"),
                Token::Newline,
                Token::Indent,
                id("c"),
                Token::Newline,
                Token::Dedent,
                Token::Dedent,
                id("d"),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_partial_dedent_to_intermediate_level() {
        assert_eq!(
            tokens("a\n  b\n    c\n  d\n"),
            vec![
                id("a"),
                Token::Newline,
                Token::Indent,
                id("b"),
                Token::Newline,
                Token::Indent,
                id("c"),
                Token::Newline,
                Token::Dedent,
                id("d"),
                Token::Newline,
                Token::Dedent,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_open_levels_drain_at_eof() {
        assert_eq!(
            tokens("a\n  b\n    c\n"),
            vec![
                id("a"),
                Token::Newline,
                Token::Indent,
                id("b"),
                Token::Newline,
                Token::Indent,
                id("c"),
                Token::Newline,
                Token::Dedent,
                Token::Dedent,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_indent_dedent_balance() {
        let samples = [
            "a\n",
            "a\n  b\n",
            "a\n  b\n    c\n  d\ne\n",
            "if x:\n  if y:\n    z\n",
            "a\n  b\n# comment\n  c\n",
            "a\n  b\n    c",
        ];
        for sample in samples {
            let mut opened = 0i64;
            let mut closed = 0i64;
            for token in tokens(sample) {
                match token {
                    Token::Indent => opened += 1,
                    Token::Dedent => closed += 1,
                    _ => {}
                }
                assert!(
                    closed <= opened,
                    "dedent before matching indent in {:?}",
                    sample
                );
            }
            assert_eq!(opened, closed, "unbalanced blocks in {:?}", sample);
        }
    }

    #[test]
    fn test_no_consecutive_newlines() {
        let samples = ["a\n\n\nb\n", "a\n# c\n\nb\n", "\n\na\n", "a\n\n  b\n\nc\n"];
        for sample in samples {
            let toks = tokens(sample);
            for pair in toks.windows(2) {
                assert!(
                    !(pair[0] == Token::Newline && pair[1] == Token::Newline),
                    "consecutive newlines in {:?}: {:?}",
                    sample,
                    toks
                );
            }
        }
    }

    #[test]
    fn test_comment_between_indented_lines_keeps_depth() {
        assert_eq!(
            tokens("a\n  b\n  # note\n  c\n"),
            vec![
                id("a"),
                Token::Newline,
                Token::Indent,
                id("b"),
                Token::Newline,
                id("c"),
                Token::Newline,
                Token::Dedent,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_trailing_spaces_run_straight_to_eof() {
        assert_eq!(
            tokens("x = 1   "),
            vec![id("x"), Token::Char('='), Token::Number(1), Token::Eof]
        );
    }

    #[test]
    fn test_display_rendering() {
        assert_eq!(Token::Number(42).to_string(), "Number{42}");
        assert_eq!(id("spam").to_string(), "Id{spam}");
        assert_eq!(Token::String("eggs".to_string()).to_string(), "String{eggs}");
        assert_eq!(Token::Char('=').to_string(), "Char{=}");
        assert_eq!(Token::Dedent.to_string(), "Dedent");
    }

    #[test]
    fn test_punctuation_chars() {
        assert_eq!(
            tokens("f(a, b).c: d + e - g * h / i\n"),
            vec![
                id("f"),
                Token::Char('('),
                id("a"),
                Token::Char(','),
                id("b"),
                Token::Char(')'),
                Token::Char('.'),
                id("c"),
                Token::Char(':'),
                id("d"),
                Token::Char('+'),
                id("e"),
                Token::Char('-'),
                id("g"),
                Token::Char('*'),
                id("h"),
                Token::Char('/'),
                id("i"),
                Token::Newline,
                Token::Eof,
            ]
        );
    }
}
