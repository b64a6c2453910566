//! Text-cleaning rules applied to submitted fields before storage, plus the
//! email-format check.
//!
//! Cleaning never enforces lengths: the validator checks the RAW byte length
//! before these functions shrink the input, so stripped characters cannot be
//! used to sneak past a field's ceiling.

/// Remove complete `<...>` tag spans. A stray `<` with no closing `>` is kept.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('<') {
        let (before, from_open) = rest.split_at(open);
        out.push_str(before);
        match from_open.find('>') {
            Some(close) => rest = &from_open[close + 1..],
            None => {
                out.push_str(from_open);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Clean a single-line field: strip tags, drop control characters, collapse
/// whitespace runs (including newlines) to single spaces, and trim.
pub fn text_field(raw: &str) -> String {
    let stripped = strip_tags(raw);
    let cleaned: String = stripped
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a multi-line field: strip tags and control characters but preserve
/// line breaks and tabs, then trim.
pub fn textarea_field(raw: &str) -> String {
    let normalized = strip_tags(raw).replace("\r\n", "\n").replace('\r', "\n");
    let cleaned: String = normalized
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    cleaned.trim().to_owned()
}

/// Drop characters that cannot appear in an email address.
pub fn email_field(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.@-".contains(*c))
        .collect()
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c)
}

/// Format-check an email address.
///
/// Accepts addresses of at least six characters with a non-empty local part
/// of permitted characters, an `@` that is not the first character, and a
/// domain of at least two dot-separated labels, none empty or hyphen-edged.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 6 {
        return false;
    }
    let Some(at) = email
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '@')
        .map(|(i, _)| i)
    else {
        return false;
    };
    let local = &email[..at];
    let domain = &email[at + 1..];
    if local.is_empty() || !local.chars().all(is_local_char) {
        return false;
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return false;
    }
    let mut labels = 0usize;
    for label in domain.split('.') {
        labels += 1;
        let valid = !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return false;
        }
    }
    labels >= 2
}
