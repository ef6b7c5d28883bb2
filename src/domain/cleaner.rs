//! Label cleaner: turns a raw scraped label into a display label or rejects it.
//!
//! Every step is a total transform on a working string; the order matters
//! because earlier strips can expose new trailing noise (a role suffix
//! hiding a possessive, a possessive hiding punctuation).

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

/// Organizational role words stripped from the end of a label.
pub const ROLE_SUFFIXES: [&str; 6] = [
    "team",
    "group",
    "org",
    "organization",
    "department",
    "division",
];

lazy_static! {
    static ref TRAILING_POSSESSIVE: Regex = Regex::new(r"'[sS]$").unwrap();
    static ref TRAILING_SENTENCE_PUNCT: Regex = Regex::new(r"[,.!]+\)*$").unwrap();
    static ref TRAILING_ACRONYM: Regex = Regex::new(r"\s+\([A-Z&]+\)$").unwrap();
    static ref TRAILING_CLOSE_PARENS: Regex = Regex::new(r"\)+$").unwrap();
    static ref TRAILING_ROLE_SUFFIX: Regex = Regex::new(&format!(
        r"(?i)\s+(?:{})$",
        ROLE_SUFFIXES.join("|")
    ))
    .unwrap();
    static ref TRAILING_PUNCT: Regex = Regex::new(r#"[,.!)"]+$"#).unwrap();
}

/// Clean a raw label into its canonical display form.
///
/// Returns `None` when the label is noise (punctuation-only, a stray letter,
/// or nothing left after stripping). `None` means "drop this node", it is
/// not an error.
///
/// ```
/// use orgtidy::domain::clean;
///
/// assert_eq!(clean("Engineering Team").as_deref(), Some("Engineering"));
/// assert_eq!(clean("AI").as_deref(), Some("AI"));
/// assert_eq!(clean(")"), None);
/// ```
pub fn clean(raw: &str) -> Option<String> {
    let s = normalize_typography(raw.trim());

    let s = strip(&TRAILING_POSSESSIVE, &s);
    let s = strip(&TRAILING_SENTENCE_PUNCT, &s);

    if is_noise(&s) {
        trace!("clean: rejected {:?} (noise)", raw);
        return None;
    }

    let s = strip(&TRAILING_ACRONYM, &s);
    let s = strip(&TRAILING_CLOSE_PARENS, &s);
    let s = strip(&TRAILING_ROLE_SUFFIX, &s);
    let s = strip(&TRAILING_POSSESSIVE, &s);
    let s = strip(&TRAILING_PUNCT, &s);

    if s.is_empty() {
        trace!("clean: rejected {:?} (empty)", raw);
        return None;
    }

    Some(title_case(&s))
}

/// Remove a trailing regex match and any whitespace it leaves behind.
fn strip(re: &Regex, s: &str) -> String {
    re.replace(s, "").trim_end().to_string()
}

/// Two characters or fewer is noise, unless it is a two-character acronym.
fn is_noise(s: &str) -> bool {
    let len = s.chars().count();
    len <= 2 && !(len == 2 && s.chars().all(char::is_alphanumeric))
}

/// Map typographic characters to ASCII, drop unprintables, collapse whitespace.
fn normalize_typography(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => {}
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            c if c.is_whitespace() => out.push(' '),
            c if is_unprintable(c) => {}
            c => out.push(c),
        }
    }

    let collapsed = collapse_whitespace(&out);
    let unquoted = collapsed
        .strip_prefix(|c: char| c == '"' || c == '\'')
        .unwrap_or(&collapsed);
    let unquoted = unquoted
        .strip_suffix(|c: char| c == '"' || c == '\'')
        .unwrap_or(unquoted);
    collapse_whitespace(unquoted)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}

fn is_unprintable(c: char) -> bool {
    c.is_control()
        || matches!(c,
            '\u{00AD}'
            | '\u{200B}'..='\u{200F}'
            | '\u{2060}'..='\u{2064}'
            | '\u{FEFF}'
            // private use areas
            | '\u{E000}'..='\u{F8FF}'
            | '\u{F0000}'..='\u{FFFFD}'
            | '\u{100000}'..='\u{10FFFD}'
            // specials block
            | '\u{FFF0}'..='\u{FFFF}')
}

/// Capitalize each token; all-uppercase tokens are acronyms and stay as-is.
///
/// Mixed-case brand tokens are flattened ("iPhone" becomes "Iphone").
fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|token| {
            if token == token.to_uppercase() {
                return token.to_string();
            }
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
