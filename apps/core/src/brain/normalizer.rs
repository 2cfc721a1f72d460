//! Expression normalization.
//!
//! Rewrites informal math notation (unicode operators, caret powers, implicit
//! multiplication) into the canonical form consumed by the symbolic evaluator.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Literal substitutions, applied in order before multiplication insertion.
const SYMBOL_REPLACEMENTS: &[(&str, &str)] = &[
    ("×", "*"),
    ("÷", "/"),
    ("^", "**"),
    ("−", "-"), // Unicode minus sign
    ("–", "-"), // En dash
    ("—", "-"), // Em dash
    ("π", "pi"),
    ("∞", "oo"),
    ("√", "sqrt"),
    ("∫", "integral"),
    ("∑", "sum"),
    ("∏", "product"),
];

/// Letter sequences never split by implicit multiplication. Longest first.
const ATOMIC_WORDS: &[&str] = &[
    "integral", "product", "sqrt", "sum", "sin", "cos", "tan", "log", "exp", "abs", "ln", "pi",
    "oo",
];

static LATEX_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(sqrt|pi|oo)\b").expect("Invalid regex: latex word pattern")
});

/// A lexical piece of an expression: a letter word or any other single char.
#[derive(Debug, Clone, Copy)]
enum Piece<'a> {
    Word(&'a str),
    Char(char),
}

/// Normalize a raw expression into evaluator-ready form.
///
/// Collapses whitespace, substitutes unicode math symbols, then makes implicit
/// multiplication explicit (`2x` → `2*x`, `xy` → `x*y`, `2(` → `2*(`,
/// `)2` → `)*2`). Known function and constant names such as `sqrt` or `pi`
/// are kept whole, which keeps the operation idempotent.
pub fn normalize(raw: &str) -> String {
    let mut expression = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    for (symbol, replacement) in SYMBOL_REPLACEMENTS {
        if expression.contains(symbol) {
            expression = expression.replace(symbol, replacement);
        }
    }

    insert_implicit_multiplication(&expression)
}

/// Render a normalized expression as inline LaTeX.
pub fn to_latex(expression: &str) -> String {
    let latex = expression.replace("**", "^").replace('*', "\\cdot ");
    let latex = LATEX_WORDS.replace_all(&latex, |caps: &Captures| match &caps[1] {
        "sqrt" => "\\sqrt".to_string(),
        "pi" => "\\pi".to_string(),
        _ => "\\infty".to_string(),
    });

    if latex.starts_with('$') {
        latex.into_owned()
    } else {
        format!("${}$", latex)
    }
}

fn insert_implicit_multiplication(expression: &str) -> String {
    let pieces = split_pieces(expression);
    let mut out = String::with_capacity(expression.len() + pieces.len());
    let mut prev: Option<Piece> = None;

    for piece in pieces {
        if let Some(prev) = prev {
            if needs_multiplication(prev, piece) {
                out.push('*');
            }
        }
        match piece {
            Piece::Word(word) => out.push_str(word),
            Piece::Char(c) => out.push(c),
        }
        prev = Some(piece);
    }

    out
}

fn split_pieces(expression: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut run_start: Option<usize> = None;

    for (idx, c) in expression.char_indices() {
        if c.is_ascii_alphabetic() {
            if run_start.is_none() {
                run_start = Some(idx);
            }
            continue;
        }
        if let Some(start) = run_start.take() {
            split_letter_run(&expression[start..idx], &mut pieces);
        }
        pieces.push(Piece::Char(c));
    }
    if let Some(start) = run_start {
        split_letter_run(&expression[start..], &mut pieces);
    }

    pieces
}

/// Greedily decompose an ASCII letter run into known words and single letters.
fn split_letter_run<'a>(run: &'a str, pieces: &mut Vec<Piece<'a>>) {
    let mut rest = run;
    while !rest.is_empty() {
        let len = ATOMIC_WORDS
            .iter()
            .find(|word| rest.starts_with(*word))
            .map_or(1, |word| word.len());
        pieces.push(Piece::Word(&rest[..len]));
        rest = &rest[len..];
    }
}

fn needs_multiplication(prev: Piece, next: Piece) -> bool {
    match (prev, next) {
        (Piece::Word(_), Piece::Word(_)) => true,
        (Piece::Char(c), Piece::Word(_)) | (Piece::Word(_), Piece::Char(c)) => c.is_ascii_digit(),
        (Piece::Char(a), Piece::Char(b)) => {
            (a.is_ascii_digit() && b == '(') || (a == ')' && b.is_ascii_digit())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(normalize("  1 +   2  "), "1 + 2");
        assert_eq!(normalize("1\t+\n2"), "1 + 2");
    }

    #[test]
    fn test_symbol_substitution() {
        assert_eq!(normalize("6 × 7"), "6 * 7");
        assert_eq!(normalize("8 ÷ 2"), "8 / 2");
        assert_eq!(normalize("5 − 3 – 1 — 0"), "5 - 3 - 1 - 0");
        assert_eq!(normalize("x^2"), "x**2");
        assert_eq!(normalize("2π"), "2*pi");
        assert_eq!(normalize("√(4)"), "sqrt(4)");
        assert_eq!(normalize("∞"), "oo");
        assert_eq!(normalize("∑ ∏ ∫"), "sum product integral");
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(normalize("2x + 5 = 13"), "2*x + 5 = 13");
        assert_eq!(normalize("x2"), "x*2");
        assert_eq!(normalize("xy"), "x*y");
        assert_eq!(normalize("abc"), "a*b*c");
        assert_eq!(normalize("3(x+1)"), "3*(x+1)");
        assert_eq!(normalize("(x+1)2"), "(x+1)*2");
        assert_eq!(normalize("3.5x"), "3.5*x");
    }

    #[test]
    fn test_known_words_stay_whole() {
        assert_eq!(normalize("sqrt(x)"), "sqrt(x)");
        assert_eq!(normalize("xsqrt(2)"), "x*sqrt(2)");
        assert_eq!(normalize("2sin(x)"), "2*sin(x)");
        assert_eq!(normalize("√x"), "sqrt*x");
    }

    #[test]
    fn test_unmapped_symbols_pass_through() {
        assert_eq!(normalize("x ≤ 3"), "x ≤ 3");
        assert_eq!(normalize("€5"), "€5");
    }

    #[test]
    fn test_idempotent_on_samples() {
        for raw in ["2x^2 + 3x − 1", "√(π r²)", "abc(2)3", "3(x)(y)4", "∫ x dx", "sinx cosx"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for '{}'", raw);
        }
    }

    #[test]
    fn test_to_latex() {
        assert_eq!(to_latex("2*x**2"), "$2\\cdot x^2$");
        assert_eq!(to_latex("sqrt(pi)"), "$\\sqrt(\\pi)$");
        assert_eq!(to_latex("x + oo"), "$x + \\infty$");
        assert_eq!(to_latex("$x$"), "$x$");
    }
}
