/* Recursive descent parser for the regex dialect understood by the
 * Thompson builder. Grammar, lowest to highest precedence:
 *   or     := concat ('|' concat)*
 *   concat := star+                (implicit, left associative)
 *   star   := base ('*' | '+')*
 *   base   := '(' or ')' | 'ε' | '\e' | CHAR
 * The grammar is LL(1), so a single forward cursor suffices. */

use std::fmt;

use color_eyre::{Report, Result};

/// Regex AST node. Ephemeral: it only exists between parsing and
/// Thompson's construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexNode {
    Char(char),
    Epsilon,
    Concat(Box<RegexNode>, Box<RegexNode>),
    Or(Box<RegexNode>, Box<RegexNode>),
    Star(Box<RegexNode>),
    Plus(Box<RegexNode>),
}

#[derive(Debug)]
pub enum RegexError {
    UnclosedGroup(usize),
    UnexpectedToken(char, usize),
    UnexpectedEndOfPattern,
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegexError::UnclosedGroup(pos) => {
                write!(f, "Error: Expected ) at position {}!", pos)
            }
            RegexError::UnexpectedToken(ch, pos) => {
                write!(f, "Error: Unexpected character {} at position {}!", ch, pos)
            }
            RegexError::UnexpectedEndOfPattern => {
                write!(f, "Error: Unexpected end of pattern!")
            }
        }
    }
}

impl std::error::Error for RegexError {}

/// Single forward cursor over the pattern; no backtracking is ever needed.
struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(pattern: &str) -> Self {
        Cursor {
            chars: pattern.chars().filter(|c| !c.is_whitespace()).collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_ahead(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn consume(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

fn parse_or(cursor: &mut Cursor) -> Result<RegexNode> {
    let mut left = parse_concat(cursor)?;

    while cursor.peek() == Some('|') {
        cursor.consume();
        let right = parse_concat(cursor)?;
        left = RegexNode::Or(Box::new(left), Box::new(right));
    }

    Ok(left)
}

fn parse_concat(cursor: &mut Cursor) -> Result<RegexNode> {
    let mut nodes = Vec::new();

    while let Some(ch) = cursor.peek() {
        if ch == ')' || ch == '|' {
            break;
        }
        nodes.push(parse_star(cursor)?);
    }

    // An empty alternative or an empty group reads as epsilon
    let mut nodes = nodes.into_iter();
    let first = match nodes.next() {
        Some(first) => first,
        None => return Ok(RegexNode::Epsilon),
    };

    Ok(nodes.fold(first, |left, right| {
        RegexNode::Concat(Box::new(left), Box::new(right))
    }))
}

fn parse_star(cursor: &mut Cursor) -> Result<RegexNode> {
    let mut node = parse_base(cursor)?;

    while let Some(ch) = cursor.peek() {
        match ch {
            '*' => {
                cursor.consume();
                node = RegexNode::Star(Box::new(node));
            }
            '+' => {
                cursor.consume();
                node = RegexNode::Plus(Box::new(node));
            }
            _ => break,
        }
    }

    Ok(node)
}

fn parse_base(cursor: &mut Cursor) -> Result<RegexNode> {
    let ch = match cursor.peek() {
        Some(ch) => ch,
        None => return Err(Report::new(RegexError::UnexpectedEndOfPattern)),
    };

    if ch == '(' {
        cursor.consume();
        let node = parse_or(cursor)?;
        if cursor.peek() == Some(')') {
            cursor.consume();
        } else {
            return Err(Report::new(RegexError::UnclosedGroup(cursor.pos)));
        }
        Ok(node)
    } else if ch == 'ε' {
        cursor.consume();
        Ok(RegexNode::Epsilon)
    } else if ch == '\\' && cursor.peek_ahead() == Some('e') {
        cursor.consume();
        cursor.consume();
        Ok(RegexNode::Epsilon)
    } else if !matches!(ch, ')' | '|' | '*' | '+') {
        cursor.consume();
        Ok(RegexNode::Char(ch))
    } else {
        Err(Report::new(RegexError::UnexpectedToken(ch, cursor.pos)))
    }
}

/// Parse a regular expression into an AST. Whitespace is stripped first;
/// an empty pattern yields an epsilon node.
///
/// Supported operators: `*`, `+`, `|`, grouping with `()`, `ε` (or `\e`)
/// and implicit concatenation.
pub fn parse_regex(pattern: &str) -> Result<RegexNode> {
    let mut cursor = Cursor::new(pattern);

    if cursor.at_end() {
        return Ok(RegexNode::Epsilon);
    }

    let node = parse_or(&mut cursor)?;

    // Anything left over can only be a stray ')'
    if let Some(ch) = cursor.peek() {
        return Err(Report::new(RegexError::UnexpectedToken(ch, cursor.pos)));
    }

    Ok(node)
}

#[cfg(test)]
mod regex_tests {
    use super::*;

    fn assert_char(node: &RegexNode, expected: char) {
        match node {
            RegexNode::Char(c) if *c == expected => {}
            other => panic!("Expected char '{}', got {:?}", expected, other),
        }
    }

    #[test]
    fn test_single_char() {
        let node = parse_regex("a").unwrap();
        assert_char(&node, 'a');
    }

    #[test]
    fn test_empty_pattern_is_epsilon() {
        assert_eq!(parse_regex("").unwrap(), RegexNode::Epsilon);
        assert_eq!(parse_regex("   ").unwrap(), RegexNode::Epsilon);
    }

    #[test]
    fn test_empty_group_is_epsilon() {
        assert_eq!(parse_regex("()").unwrap(), RegexNode::Epsilon);
    }

    #[test]
    fn test_epsilon_tokens() {
        assert_eq!(parse_regex("ε").unwrap(), RegexNode::Epsilon);
        assert_eq!(parse_regex("\\e").unwrap(), RegexNode::Epsilon);
    }

    #[test]
    fn test_concat_left_associative() {
        let node = parse_regex("abc").unwrap();
        match node {
            RegexNode::Concat(left, right) => {
                assert_char(&right, 'c');
                match *left {
                    RegexNode::Concat(l, r) => {
                        assert_char(&l, 'a');
                        assert_char(&r, 'b');
                    }
                    other => panic!("Expected nested concat, got {:?}", other),
                }
            }
            other => panic!("Expected concat, got {:?}", other),
        }
    }

    #[test]
    fn test_alternation_precedence() {
        // Concatenation binds tighter than '|'
        let node = parse_regex("ab|c").unwrap();
        match node {
            RegexNode::Or(left, right) => {
                assert_char(&right, 'c');
                assert!(matches!(*left, RegexNode::Concat(_, _)));
            }
            other => panic!("Expected or, got {:?}", other),
        }
    }

    #[test]
    fn test_star_and_plus_bind_tightest() {
        let node = parse_regex("ab*").unwrap();
        match node {
            RegexNode::Concat(left, right) => {
                assert_char(&left, 'a');
                match *right {
                    RegexNode::Star(inner) => assert_char(&inner, 'b'),
                    other => panic!("Expected star, got {:?}", other),
                }
            }
            other => panic!("Expected concat, got {:?}", other),
        }

        let node = parse_regex("a+").unwrap();
        assert!(matches!(node, RegexNode::Plus(_)));
    }

    #[test]
    fn test_stacked_quantifiers() {
        let node = parse_regex("a*+").unwrap();
        match node {
            RegexNode::Plus(inner) => assert!(matches!(*inner, RegexNode::Star(_))),
            other => panic!("Expected plus over star, got {:?}", other),
        }
    }

    #[test]
    fn test_grouping() {
        let node = parse_regex("(a|b)c").unwrap();
        match node {
            RegexNode::Concat(left, right) => {
                assert_char(&right, 'c');
                assert!(matches!(*left, RegexNode::Or(_, _)));
            }
            other => panic!("Expected concat, got {:?}", other),
        }
    }

    #[test]
    fn test_whitespace_stripped() {
        let spaced = parse_regex("( a | b ) * a b b").unwrap();
        let dense = parse_regex("(a|b)*abb").unwrap();
        assert_eq!(spaced, dense);
    }

    #[test]
    fn test_unclosed_group() {
        let result = parse_regex("(ab");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref().unwrap() {
            RegexError::UnclosedGroup(_) => {}
            err => panic!("Expected UnclosedGroup, got {:?}", err),
        }
    }

    #[test]
    fn test_dangling_operator() {
        let result = parse_regex("a|*");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref().unwrap() {
            RegexError::UnexpectedToken('*', _) => {}
            err => panic!("Expected UnexpectedToken, got {:?}", err),
        }
    }

    #[test]
    fn test_stray_close_paren() {
        let result = parse_regex("a)b");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref().unwrap() {
            RegexError::UnexpectedToken(')', _) => {}
            err => panic!("Expected UnexpectedToken, got {:?}", err),
        }
    }
}
