//! Clause scanning primitives.
//!
//! The rule language is parsed from flat ASCII text. Everything here works
//! at "top level" - parenthesized sub-clauses are protected spans that
//! splitting never descends into, so a comma inside `c(t:Creature,x:2)`
//! never splits the command that contains it.
//!
//! All whitespace (including line breaks) is stripped before any parsing.

use crate::core::error::ScriptError;

/// Remove every whitespace character.
#[must_use]
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Check that parentheses nest properly.
#[must_use]
pub fn balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Split on any of `separators`, ignoring separators inside parentheses.
///
/// Empty segments are dropped (trailing `;`, doubled separators).
#[must_use]
pub fn split_top_level<'a>(text: &'a str, separators: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 && separators.contains(&c) => {
                if i > start {
                    parts.push(&text[start..i]);
                }
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if text.len() > start {
        parts.push(&text[start..]);
    }
    parts
}

/// Find the first top-level occurrence of `needle` at or after `from`.
#[must_use]
pub fn find_top_level(text: &str, needle: char, from: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 && i >= from && c == needle => return Some(i),
            _ => {}
        }
    }
    None
}

/// Index of the `)` matching the `(` at `open`, if any.
#[must_use]
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices().skip_while(|&(i, _)| i < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Is the whole text a single `( ... )` group?
#[must_use]
pub fn is_wrapped(text: &str) -> bool {
    text.starts_with('(') && matching_paren(text, 0) == Some(text.len() - 1)
}

/// Split `Keyword(arg1,arg2,...)` into the keyword and its argument list.
///
/// A bare keyword (no parentheses) yields an empty argument list. Nested
/// parentheses inside arguments are respected.
pub fn head_and_args(clause: &str) -> Result<(&str, Vec<&str>), ScriptError> {
    let Some(open) = clause.find('(') else {
        if clause.is_empty() {
            return Err(ScriptError::EmptyClause);
        }
        return Ok((clause, Vec::new()));
    };

    let close =
        matching_paren(clause, open).ok_or_else(|| ScriptError::UnbalancedParens(clause.to_string()))?;
    if close != clause.len() - 1 {
        return Err(ScriptError::UnbalancedParens(clause.to_string()));
    }

    let keyword = &clause[..open];
    if keyword.is_empty() {
        return Err(ScriptError::EmptyClause);
    }

    let inner = &clause[open + 1..close];
    let args = if inner.is_empty() {
        Vec::new()
    } else {
        split_top_level(inner, &[','])
    };
    Ok((keyword, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace("a & b\n | c"), "a&b|c");
        assert_eq!(strip_whitespace("  "), "");
    }

    #[test]
    fn test_balanced() {
        assert!(balanced("c(t:Creature)"));
        assert!(balanced(""));
        assert!(!balanced("c(t:Creature"));
        assert!(!balanced("a)b("));
    }

    #[test]
    fn test_split_top_level_respects_nesting() {
        let parts = split_top_level("MoveComponentToZone(c(t:A,x:2),z(t:Play))", &[';']);
        assert_eq!(parts, vec!["MoveComponentToZone(c(t:A,x:2),z(t:Play))"]);

        let parts = split_top_level("c(t:A,x:2),z(t:Play)", &[',']);
        assert_eq!(parts, vec!["c(t:A,x:2)", "z(t:Play)"]);
    }

    #[test]
    fn test_split_top_level_drops_empty() {
        let parts = split_top_level("a;;b;", &[';']);
        assert_eq!(parts, vec!["a", "b"]);
    }

    #[test]
    fn test_split_multiple_separators() {
        let parts = split_top_level("z:Play&t:Creature,f:Power>=3", &['&', ',']);
        assert_eq!(parts, vec!["z:Play", "t:Creature", "f:Power>=3"]);
    }

    #[test]
    fn test_matching_paren() {
        assert_eq!(matching_paren("(ab(c)d)e", 0), Some(7));
        assert_eq!(matching_paren("(ab(c)d)e", 3), Some(5));
        assert_eq!(matching_paren("(abc", 0), None);
    }

    #[test]
    fn test_is_wrapped() {
        assert!(is_wrapped("(a&b)"));
        assert!(!is_wrapped("(a)&(b)"));
        assert!(!is_wrapped("a&b"));
    }

    #[test]
    fn test_head_and_args() {
        let (head, args) = head_and_args("SetVariable(score,+5)").unwrap();
        assert_eq!(head, "SetVariable");
        assert_eq!(args, vec!["score", "+5"]);

        let (head, args) = head_and_args("EndCurrentPhase").unwrap();
        assert_eq!(head, "EndCurrentPhase");
        assert!(args.is_empty());

        let (head, args) = head_and_args("Shuffle(z(t:Deck))").unwrap();
        assert_eq!(head, "Shuffle");
        assert_eq!(args, vec!["z(t:Deck)"]);

        let (_, args) = head_and_args("Move(c(t:A,x:1),z(t:B))").unwrap();
        assert_eq!(args, vec!["c(t:A,x:1)", "z(t:B)"]);
    }

    #[test]
    fn test_head_and_args_errors() {
        assert_eq!(
            head_and_args("Foo(a"),
            Err(ScriptError::UnbalancedParens("Foo(a".to_string()))
        );
        assert_eq!(
            head_and_args("Foo(a)b"),
            Err(ScriptError::UnbalancedParens("Foo(a)b".to_string()))
        );
        assert_eq!(head_and_args(""), Err(ScriptError::EmptyClause));
        assert_eq!(head_and_args("(a)"), Err(ScriptError::EmptyClause));
    }

    #[test]
    fn test_find_top_level() {
        assert_eq!(find_top_level("a=b", '=', 0), Some(1));
        assert_eq!(find_top_level("c(f:P=3)=x", '=', 0), Some(8));
        assert_eq!(find_top_level("c(f:P=3)", '=', 0), None);
    }
}
