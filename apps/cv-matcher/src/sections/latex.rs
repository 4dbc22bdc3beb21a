/// Net brace depth of a LaTeX fragment: `{` counts +1, `}` counts -1.
///
/// Escaped braces (`\{`, `\}`) and anything after an unescaped `%` on the same
/// line are ignored. A section's content may legitimately be unbalanced (the
/// `mainbar` region swallows its own closing brace), so callers compare
/// balances rather than expecting zero.
pub fn brace_balance(text: &str) -> i64 {
    let mut depth = 0i64;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '%' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
    }

    depth
}
