//! Slug and SKU derivation

use rand::Rng;
use rand::distributions::Alphanumeric;
use shared::util::{now_millis, to_base36};

/// Slug used when a name has no usable characters
pub const FALLBACK_SLUG: &str = "product";

const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Lowercase, strip diacritics, collapse every run of non-alphanumerics
/// into a single hyphen, trim hyphens at both ends.
///
/// ```
/// use catalog_server::catalog::slug::slugify;
/// assert_eq!(slugify("  Café Crème -- Deluxe! "), "cafe-creme-deluxe");
/// assert_eq!(slugify("***"), "product");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        // Combining diacritical marks: decomposed input keeps its base letter
        if COMBINING_MARKS.contains(&c) {
            continue;
        }
        let folded = fold_diacritic(c);
        for c in folded.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c);
            } else {
                pending_hyphen = true;
            }
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// ASCII replacement for common Latin letters with diacritics
fn fold_diacritic(c: char) -> String {
    let s = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        other => return other.to_string(),
    };
    s.to_string()
}

/// `PRD-<base36 epoch millis>-<4 random alphanumerics>`, uppercase
pub fn generate_sku() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();
    format!("PRD-{}-{}", to_base36(now_millis().max(0) as u64), suffix).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Widget"), "widget");
        assert_eq!(slugify("Blue Widget XL"), "blue-widget-xl");
        assert_eq!(slugify("  --Hello,   World!--  "), "hello-world");
    }

    #[test]
    fn test_slugify_diacritics() {
        assert_eq!(slugify("Jalapeño Piñata"), "jalapeno-pinata");
        assert_eq!(slugify("Ölfilter Größe 2"), "olfilter-grosse-2");
        assert_eq!(slugify("ÉCLAIR"), "eclair");
        // Decomposed forms
        assert_eq!(slugify("Cre\u{0300}me Bru\u{0302}le\u{0301}e"), "creme-brulee");
        assert_eq!(slugify("Jalapen\u{0303}o"), "jalapeno");
        assert_eq!(slugify("E\u{0301}CLAIR"), "eclair");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify(""), "product");
        assert_eq!(slugify("!!! ???"), "product");
        assert_eq!(slugify("日本"), "product");
    }

    #[test]
    fn test_generate_sku_format() {
        let sku = generate_sku();
        let parts: Vec<&str> = sku.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "PRD");
        assert!(!parts[1].is_empty());
        assert_eq!(parts[2].len(), 4);
        assert!(sku.chars().all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
