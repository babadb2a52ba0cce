//! Slug derivation and duplicate resolution for restaurant names.

use regex::RegexBuilder;

/// Lowercase, hyphenated form of a display name.
///
/// Apostrophes are dropped rather than turned into separators, so
/// "Joe's Pizza" becomes `joes-pizza`.
pub fn slugify(name: &str) -> String {
    let without_apostrophes: String = name
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '`'))
        .collect();
    let slug = ::slug::slugify(without_apostrophes);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Used when a name has no characters that survive slugification.
const FALLBACK_SLUG: &str = "restaurant";

/// Pattern matching a slug and any numbered variant of it (`base`, `base-2`, `base-13`).
fn variant_pattern(base: &str) -> regex::Regex {
    RegexBuilder::new(&format!("^({})((-[0-9]*)?)$", regex::escape(base)))
        .case_insensitive(true)
        .build()
        .expect("escaped slug is always a valid pattern")
}

/// Pick the stored slug for `base` given the slugs already in use.
///
/// When `n` existing slugs collide with `base`, the result is `base-(n+1)`.
pub fn resolve_slug<'a, I>(base: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let pattern = variant_pattern(base);
    let collisions = existing.into_iter().filter(|s| pattern.is_match(s)).count();
    if collisions == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, collisions + 1)
    }
}
