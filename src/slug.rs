//! Slug derivation and collection-wide uniqueness assignment for posts.

use async_trait::async_trait;

use crate::error::AppError;

pub use crate::db::models::POSTS_COLLECTION;

/// Exact-match slug lookup against a single collection.
///
/// Implemented by the MongoDB layer; abstracted as a trait so the assigner
/// can be tested without a database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlugLookup: Send + Sync {
    /// Number of records in `collection` whose `slug` equals `slug` exactly.
    async fn count_matching_slug(&self, collection: &str, slug: &str) -> Result<u64, AppError>;
}

/// Derive a URL-safe slug from a human-entered title.
///
/// The title is transliterated (`å` → `a`, `ö` → `oe`, `&` → `and`, ...),
/// camelCase boundaries are split, everything is lowercased, and runs of
/// anything that is not an ASCII letter or digit collapse into a single
/// hyphen. Leading and trailing hyphens are dropped.
///
/// Re-slugifying the output always yields the same string.
///
/// ```
/// use salen::slug::slugify;
///
/// assert_eq!(slugify("Årsmöte 2024"), "arsmoete-2024");
/// assert_eq!(slugify("Vatten & avlopp"), "vatten-and-avlopp");
/// assert_eq!(slugify("   "), "");
/// ```
pub fn slugify(title: &str) -> String {
    let title = drop_contraction_apostrophes(title);
    let mut expanded = String::with_capacity(title.len());
    for c in title.chars() {
        match transliterate(c) {
            Some(replacement) => expanded.push_str(replacement),
            None => expanded.push(c),
        }
    }

    decamelize(&expanded)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Remove the apostrophe in contractions and possessives such as `don't`
/// and `it's`, so they slug as one word. Only an apostrophe between an
/// ASCII letter or digit and a word-final `t` or `s` is dropped.
fn drop_contraction_apostrophes(title: &str) -> String {
    let chars: Vec<char> = title.chars().collect();
    let mut out = String::with_capacity(title.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '\'' || c == '\u{2019}' {
            let after_word = i > 0 && chars[i - 1].is_ascii_alphanumeric();
            let contraction = matches!(chars.get(i + 1), Some('t' | 's'))
                && chars.get(i + 2).map_or(true, |n| n.is_whitespace());
            if after_word && contraction {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Replacement text for characters that would otherwise be stripped.
fn transliterate(c: char) -> Option<&'static str> {
    let replacement = match c {
        '&' => " and ",
        '♥' => " love ",
        'Å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ā' | 'Ą' => "A",
        'å' | 'à' | 'á' | 'â' | 'ã' | 'ā' | 'ą' => "a",
        'Ä' | 'Æ' => "Ae",
        'ä' | 'æ' => "ae",
        'Ö' => "Oe",
        'ö' | 'œ' => "oe",
        'Ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ō' => "O",
        'ø' | 'ò' | 'ó' | 'ô' | 'õ' | 'ō' => "o",
        'Ü' => "Ue",
        'ü' => "ue",
        'Ù' | 'Ú' | 'Û' | 'Ū' => "U",
        'ù' | 'ú' | 'û' | 'ū' => "u",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => "e",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ç' | 'Č' | 'Ć' => "C",
        'ç' | 'č' | 'ć' => "c",
        'Ñ' | 'Ń' => "N",
        'ñ' | 'ń' => "n",
        'Š' | 'Ś' => "S",
        'š' | 'ś' => "s",
        'Ž' | 'Ź' | 'Ż' => "Z",
        'ž' | 'ź' | 'ż' => "z",
        'Ł' => "L",
        'ł' => "l",
        'Ð' => "D",
        'ð' => "d",
        'Þ' => "Th",
        'þ' => "th",
        'ß' => "ss",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        _ => return None,
    };
    Some(replacement)
}

/// Insert a space at camelCase boundaries: `fooBar` → `foo Bar`,
/// `XMLHttp` → `XML Http`.
fn decamelize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                out.push(' ');
            }
        }
        out.push(c);
    }

    out
}

/// Derive a slug for `title` that is unique within `collection`.
///
/// Returns `Ok(None)` when the title derives to an empty slug; callers must
/// then leave any previously stored slug untouched.
///
/// When `existing_slug` already equals the derived base, the base is
/// returned without consulting `lookup`. Otherwise candidates `base`,
/// `base-1`, `base-2`, ... are probed one at a time and the first one with no
/// matches wins. Uniqueness is only as strong as the moment of the check:
/// two concurrent writers can both observe a free candidate.
///
/// Lookup failures are returned as-is and abort the enclosing write.
pub async fn assign_slug(
    title: &str,
    existing_slug: Option<&str>,
    collection: &str,
    lookup: &dyn SlugLookup,
) -> Result<Option<String>, AppError> {
    let base = slugify(title);
    if base.is_empty() {
        return Ok(None);
    }

    if existing_slug == Some(base.as_str()) {
        return Ok(Some(base));
    }

    let mut candidate = base.clone();
    let mut suffix: u32 = 0;
    loop {
        let matches = lookup.count_matching_slug(collection, &candidate).await?;
        tracing::debug!(collection, slug = %candidate, matches, "probed slug candidate");
        if matches == 0 {
            return Ok(Some(candidate));
        }

        suffix += 1;
        candidate = format!("{base}-{suffix}");
    }
}
