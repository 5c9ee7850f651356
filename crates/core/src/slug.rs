//! URL slugs.
//!
//! User slugs are derived from the email address:
//! `john.doe@example.com` becomes `johndoe-at-examplecom`. When a slug is
//! already taken, numbered variants (`-1`, `-2`, ...) are tried in order.
//!
//! Slugs are ASCII only and never longer than [`MAX_LEN`], suffix included.

const SEPARATOR: char = '-';

/// Longest slug the `users.slug` column holds.
pub const MAX_LEN: usize = 255;

/// Room kept free for a `-N` suffix (`-` plus a `u32`).
const SUFFIX_LEN: usize = 11;

/// Longest base slug, so that every candidate fits in [`MAX_LEN`].
pub const MAX_BASE_LEN: usize = MAX_LEN - SUFFIX_LEN;

/// Slug used when the source contains no letters or digits.
pub const FALLBACK_SLUG: &str = "user";

/// Convert text into a lowercase, hyphen-separated ASCII slug.
///
/// Only ASCII letters and digits are kept. `@` is spelled out as `at` and
/// `_` acts as a separator. Other characters are dropped without leaving a
/// gap, runs of whitespace and
/// separators collapse to a single hyphen, and leading or trailing hyphens
/// are trimmed.
///
/// ```
/// use stockroom_core::slug::slugify;
///
/// assert_eq!(slugify("john.doe@example.com"), "johndoe-at-examplecom");
/// assert_eq!(slugify("  Hello   World_2 "), "hello-world-2");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars() {
        if c == '@' {
            pending_separator = true;
            push_word(&mut slug, &mut pending_separator, "at");
            pending_separator = true;
        } else if c == SEPARATOR || c == '_' || c.is_whitespace() {
            pending_separator = true;
        } else if c.is_ascii_alphanumeric() {
            let mut buf = [0; 4];
            push_word(
                &mut slug,
                &mut pending_separator,
                c.to_ascii_lowercase().encode_utf8(&mut buf),
            );
        }
    }

    slug
}

fn push_word(slug: &mut String, pending_separator: &mut bool, word: &str) {
    if *pending_separator && !slug.is_empty() {
        slug.push(SEPARATOR);
    }
    *pending_separator = false;
    slug.push_str(word);
}

/// Slug for a user with the given email.
///
/// Cut to [`MAX_BASE_LEN`] characters. Falls back to [`FALLBACK_SLUG`] when
/// the email yields nothing.
#[must_use]
pub fn user_slug(email: &str) -> String {
    let mut slug = slugify(email);
    // ASCII only, so any byte index is a char boundary
    slug.truncate(MAX_BASE_LEN);
    let trimmed = slug.trim_end_matches(SEPARATOR).len();
    slug.truncate(trimmed);
    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug
    }
}

/// Candidate slugs in the order they should be tried: `base`, `base-1`,
/// `base-2`, ...
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    core::iter::once(base.to_owned()).chain((1_u32..).map(move |n| format!("{base}{SEPARATOR}{n}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_slugs() {
        assert_eq!(slugify("testuser@example.com"), "testuser-at-examplecom");
        assert_eq!(slugify("email.test@example.com"), "emailtest-at-examplecom");
        assert_eq!(slugify("John.Doe+Shop@Example.co.uk"), "johndoeshop-at-examplecouk");
    }

    #[test]
    fn test_separators_collapse_and_trim() {
        assert_eq!(slugify("--a__b  c--"), "a-b-c");
        assert_eq!(slugify("@example.com"), "at-examplecom");
    }

    #[test]
    fn test_empty_source_falls_back() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(user_slug("..."), FALLBACK_SLUG);
    }

    #[test]
    fn test_non_ascii_letters_are_dropped() {
        assert_eq!(slugify("josé@x.com"), "jos-at-xcom");
        assert_eq!(slugify("Ünïcode"), "ncode");
        assert!(user_slug("日本@例え.jp").is_ascii());
    }

    #[test]
    fn test_longest_email_fits_with_suffix() {
        let email = format!("{}@a.com", "x".repeat(249));
        assert_eq!(email.len(), 255);

        let base = user_slug(&email);
        assert_eq!(base.len(), MAX_BASE_LEN);
        assert!(candidates(&base).take(12).all(|slug| slug.len() <= MAX_LEN));
        assert_eq!(format!("{base}-{}", u32::MAX).len(), MAX_LEN);
    }

    #[test]
    fn test_truncation_does_not_end_on_separator() {
        // the cut lands on the hyphen before "at"
        let email = format!("{}@example.com", "x".repeat(MAX_BASE_LEN - 1));
        let slug = user_slug(&email);
        assert!(!slug.ends_with('-'));
        assert_eq!(slug.len(), MAX_BASE_LEN - 1);
    }

    #[test]
    fn test_candidates_are_numbered() {
        let list: Vec<String> = candidates("jane-at-examplecom").take(3).collect();
        assert_eq!(
            list,
            ["jane-at-examplecom", "jane-at-examplecom-1", "jane-at-examplecom-2"]
        );
    }
}
