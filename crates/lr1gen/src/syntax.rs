//! Reader for the line-oriented grammar format.
//!
//! Each non-blank line holds one production:
//!
//! ```text
//! program : stmt_list
//! stmt_list : stmt stmt_list
//! stmt_list : EPSILON
//! stmt : IDENTIFIER ASSIGN expr NEWLINE
//! ```
//!
//! Lines starting with `#` are comments.

use crate::grammar::GrammarError;

/// The reserved right-hand side marker for an empty production.
pub const EPSILON: &str = "EPSILON";

/// The reserved name of the augmented start symbol.
pub const START: &str = "S'";

/// The reserved name of the end-of-input marker.
pub const EOI: &str = "$";

/// A production as written in the source, before symbol resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProduction<'s> {
    /// 1-based line number.
    pub line: usize,
    pub left: &'s str,
    /// Empty when the source wrote `EPSILON`.
    pub right: Vec<&'s str>,
}

/// Whether `name` is classified as a terminal symbol.
///
/// Tokens without any lowercase character (`IDENTIFIER`, `NUM_2`, `+`) are
/// terminals, everything else is a nonterminal.
pub fn is_terminal_name(name: &str) -> bool {
    !name.chars().any(char::is_lowercase)
}

pub fn parse(source: &str) -> Result<Vec<RawProduction<'_>>, GrammarError> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let mut productions = vec![];
    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let production = parse_line(line_no, line)?;
        tracing::trace!("line {}: {:?}", line_no, production);
        productions.push(production);
    }

    Ok(productions)
}

fn parse_line(line: usize, text: &str) -> Result<RawProduction<'_>, GrammarError> {
    let malformed = |msg: String| GrammarError::Malformed { line, msg };

    let (left, right) = text.split_once(':').ok_or_else(|| {
        malformed("missing `:' between the left-hand side and the right-hand side".into())
    })?;

    let left = match left.split_whitespace().collect::<Vec<_>>()[..] {
        [left] => left,
        [] => return Err(malformed("empty left-hand side".into())),
        _ => {
            return Err(malformed(
                "expected exactly one symbol on the left-hand side".into(),
            ))
        }
    };
    check_reserved(left).map_err(malformed)?;
    if left == EPSILON || is_terminal_name(left) {
        return Err(malformed(format!(
            "the left-hand side `{}' is not a nonterminal symbol",
            left
        )));
    }

    let right: Vec<&str> = right.split_whitespace().collect();
    for symbol in &right {
        check_reserved(symbol).map_err(malformed)?;
    }
    if right.is_empty() {
        return Err(malformed(format!(
            "empty right-hand side (write `{}' for an empty production)",
            EPSILON
        )));
    }
    let right = if right == [EPSILON] {
        vec![]
    } else if right.contains(&EPSILON) {
        return Err(malformed(format!(
            "`{}' must be the only symbol on its right-hand side",
            EPSILON
        )));
    } else {
        right
    };

    Ok(RawProduction { line, left, right })
}

fn check_reserved(symbol: &str) -> Result<(), String> {
    if symbol == START || symbol == EOI {
        return Err(format!("the symbol `{}' is reserved", symbol));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed_line(source: &str) -> usize {
        match parse(source) {
            Err(GrammarError::Malformed { line, .. }) => line,
            other => panic!("expected a malformed grammar error, got {:?}", other),
        }
    }

    #[test]
    fn classification() {
        assert!(is_terminal_name("IDENTIFIER"));
        assert!(is_terminal_name("NUM_2"));
        assert!(is_terminal_name("+"));
        assert!(!is_terminal_name("stmt"));
        assert!(!is_terminal_name("Expr"));
    }

    #[test]
    fn parse_productions() {
        let productions = parse(
            "
            # statements
            program : stmt_list

            stmt_list : stmt stmt_list
            stmt_list :   EPSILON
            ",
        )
        .unwrap();
        assert_eq!(
            productions,
            vec![
                RawProduction {
                    line: 3,
                    left: "program",
                    right: vec!["stmt_list"],
                },
                RawProduction {
                    line: 5,
                    left: "stmt_list",
                    right: vec!["stmt", "stmt_list"],
                },
                RawProduction {
                    line: 6,
                    left: "stmt_list",
                    right: vec![],
                },
            ]
        );
    }

    #[test]
    fn missing_colon() {
        assert_eq!(malformed_line("program : stmt\nstmt IDENTIFIER\n"), 2);
    }

    #[test]
    fn bad_left_hand_side() {
        assert_eq!(malformed_line(" : IDENTIFIER"), 1);
        assert_eq!(malformed_line("a b : IDENTIFIER"), 1);
        assert_eq!(malformed_line("IDENTIFIER : a"), 1);
        assert_eq!(malformed_line("EPSILON : a"), 1);
    }

    #[test]
    fn bad_right_hand_side() {
        assert_eq!(malformed_line("a :"), 1);
        assert_eq!(malformed_line("a : b EPSILON"), 1);
    }

    #[test]
    fn reserved_symbols() {
        assert_eq!(malformed_line("S' : a"), 1);
        assert_eq!(malformed_line("a : b $"), 1);
    }
}
