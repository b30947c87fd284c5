//! String patterns for `$like` and `$regex`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum LikeToken {
    Literal(char),
    /// `_`
    One,
    /// `%`
    Any,
}

/// SQL LIKE pattern: `%` matches any run, `_` exactly one character and `\`
/// escapes the next character. Matching is case-sensitive and whole-string.
#[derive(Clone, PartialEq, Eq)]
pub struct LikePattern {
    source: String,
    tokens: Vec<LikeToken>,
}

impl LikePattern {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut tokens = Vec::new();
        let mut chars = source.chars();
        while let Some(c) = chars.next() {
            match c {
                '%' => {
                    if tokens.last() != Some(&LikeToken::Any) {
                        tokens.push(LikeToken::Any);
                    }
                }
                '_' => tokens.push(LikeToken::One),
                '\\' => tokens.push(LikeToken::Literal(chars.next().unwrap_or('\\'))),
                other => tokens.push(LikeToken::Literal(other)),
            }
        }
        Self { source: source.to_string(), tokens }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Greedy wildcard match with single-point backtracking on the last `%`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let (mut t, mut p) = (0usize, 0usize);
        let mut star: Option<(usize, usize)> = None;
        while t < text.len() {
            match self.tokens.get(p) {
                Some(LikeToken::Any) => {
                    star = Some((p, t));
                    p += 1;
                }
                Some(LikeToken::One) => {
                    t += 1;
                    p += 1;
                }
                Some(LikeToken::Literal(c)) if *c == text[t] => {
                    t += 1;
                    p += 1;
                }
                _ => match star {
                    Some((sp, st)) => {
                        p = sp + 1;
                        t = st + 1;
                        star = Some((sp, st + 1));
                    }
                    None => return false,
                },
            }
        }
        self.tokens[p..].iter().all(|tok| *tok == LikeToken::Any)
    }
}

impl fmt::Debug for LikePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LikePattern").field(&self.source).finish()
    }
}

/// A `$regex` pattern compiled once at parse time.
#[cfg(feature = "regex")]
#[derive(Clone)]
pub struct RegexPattern {
    re: regex::Regex,
}

#[cfg(feature = "regex")]
impl RegexPattern {
    /// # Errors
    /// Returns the compiler's message when `source` is not a valid pattern.
    pub fn new(source: &str) -> Result<Self, String> {
        regex::Regex::new(source).map(|re| Self { re }).map_err(|e| e.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.re.as_str()
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.re.is_match(text)
    }
}

#[cfg(feature = "regex")]
impl fmt::Debug for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegexPattern").field(&self.as_str()).finish()
    }
}
