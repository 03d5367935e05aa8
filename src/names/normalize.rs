use regex::Regex;
use std::sync::OnceLock;

/// Tokens treated as generational suffixes rather than surnames
const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v", "tr"];

/// Result of normalizing a displayed name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
}

impl NormalizedName {
    pub fn into_parts(self) -> (String, String, String) {
        (self.first_name, self.last_name, self.full_name)
    }
}

fn life_span_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\d{4}-\d{4}\s*$").expect("valid life span pattern"))
}

fn date_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\s*(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},\s+\d{4}\s*$",
        )
        .expect("valid date pattern")
    })
}

fn nickname() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*[(\[].+?[)\]]\s*").expect("valid nickname pattern"))
}

/// Normalizes a displayed name into first name, last name and canonical full name
///
/// # Normalization Steps
///
/// 1. Strip a trailing `YYYY-YYYY` life span
/// 2. Strip a trailing `Month DD, YYYY` date
/// 3. Strip parenthesized or bracketed nicknames anywhere in the string
/// 4. Split on whitespace
/// 5. With fewer than two tokens, return the trimmed input unsplit
/// 6. A leading `Dr`/`Dr.` is skipped for the first name, unless the name has
///    only two tokens, in which case the title stays as the first name
/// 7. A trailing generational suffix (`Jr`, `Sr`, `II`, ...) or single letter
///    makes the second-to-last token the last name
/// 8. The full name is the remaining tokens joined by single spaces
///
/// Never fails: anything that cannot be split falls back to step 5.
///
/// # Examples
///
/// ```
/// use obit_harvest::names::normalize_name;
///
/// let name = normalize_name("John Smith Jr");
/// assert_eq!(name.first_name, "John");
/// assert_eq!(name.last_name, "Smith");
/// assert_eq!(name.full_name, "John Smith Jr");
/// ```
pub fn normalize_name(raw: &str) -> NormalizedName {
    let trimmed = raw.trim();

    let without_span = life_span_suffix().replace(trimmed, "");
    let without_date = date_suffix().replace(&without_span, "");
    // Replace with a space so "John (Jack) Smith" keeps two tokens
    let without_nickname = nickname().replace_all(&without_date, " ");

    let tokens: Vec<&str> = without_nickname.split_whitespace().collect();

    if tokens.len() < 2 {
        return NormalizedName {
            first_name: trimmed.to_string(),
            last_name: String::new(),
            full_name: trimmed.to_string(),
        };
    }

    let first_name = if is_doctor_title(tokens[0]) && tokens.len() > 2 {
        tokens[1]
    } else {
        tokens[0]
    };

    let last_token = tokens[tokens.len() - 1];
    let last_name = if is_suffix_like(last_token) {
        tokens[tokens.len() - 2]
    } else {
        last_token
    };

    NormalizedName {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        full_name: tokens.join(" "),
    }
}

fn is_doctor_title(token: &str) -> bool {
    token.replace('.', "").eq_ignore_ascii_case("dr")
}

fn is_suffix_like(token: &str) -> bool {
    let word = token.to_lowercase().replace('.', "");
    if NAME_SUFFIXES.contains(&word.as_str()) {
        return true;
    }

    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(raw: &str) -> (String, String, String) {
        normalize_name(raw).into_parts()
    }

    #[test]
    fn test_generational_suffix() {
        assert_eq!(
            triple("John Smith Jr"),
            (
                "John".to_string(),
                "Smith".to_string(),
                "John Smith Jr".to_string()
            )
        );
    }

    #[test]
    fn test_suffix_with_period_and_case() {
        let name = normalize_name("Robert Allen Brown SR.");
        assert_eq!(name.first_name, "Robert");
        assert_eq!(name.last_name, "Brown");
    }

    #[test]
    fn test_roman_numeral_suffix() {
        let name = normalize_name("William Henry Gates III");
        assert_eq!(name.last_name, "Gates");
    }

    #[test]
    fn test_doctor_title_dropped() {
        let name = normalize_name("Dr. Jane A. Doe");
        assert_eq!(name.first_name, "Jane");
        assert_eq!(name.last_name, "Doe");
        assert_eq!(name.full_name, "Dr. Jane A. Doe");
    }

    #[test]
    fn test_doctor_title_kept_with_two_tokens() {
        let name = normalize_name("Dr. Smith");
        assert_eq!(name.first_name, "Dr.");
        assert_eq!(name.last_name, "Smith");
    }

    #[test]
    fn test_single_word_passes_through() {
        assert_eq!(
            triple("Madonna"),
            ("Madonna".to_string(), String::new(), "Madonna".to_string())
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(triple("   "), (String::new(), String::new(), String::new()));
    }

    #[test]
    fn test_trailing_middle_initial() {
        let name = normalize_name("Mary Jones K.");
        assert_eq!(name.first_name, "Mary");
        assert_eq!(name.last_name, "Jones");
    }

    #[test]
    fn test_life_span_stripped() {
        let name = normalize_name("Alice Walker 1931-2024");
        assert_eq!(name.full_name, "Alice Walker");
        assert_eq!(name.last_name, "Walker");
    }

    #[test]
    fn test_date_suffix_stripped() {
        let name = normalize_name("Alice Walker March 3, 2024");
        assert_eq!(name.full_name, "Alice Walker");
    }

    #[test]
    fn test_nickname_stripped() {
        let name = normalize_name("James (Jim) Carter");
        assert_eq!(name.first_name, "James");
        assert_eq!(name.last_name, "Carter");
        assert_eq!(name.full_name, "James Carter");

        let name = normalize_name("Elizabeth [Betty] Ross");
        assert_eq!(name.full_name, "Elizabeth Ross");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let name = normalize_name("  John    Q   Public  ");
        assert_eq!(name.full_name, "John Q Public");
        assert_eq!(name.last_name, "Public");
    }

    #[test]
    fn test_single_token_after_stripping_keeps_raw() {
        let name = normalize_name("Cher 1946-2024");
        assert_eq!(name.first_name, "Cher 1946-2024");
        assert_eq!(name.last_name, "");
    }

    #[test]
    fn test_idempotent_on_canonical_output() {
        for raw in [
            "John Smith Jr",
            "Dr. Jane A. Doe",
            "Dr. Smith",
            "James (Jim) Carter 1950-2024",
            "Mary Jones K.",
            "Alice Walker March 3, 2024",
            "  Ana   Maria  de la Cruz ",
        ] {
            let once = normalize_name(raw);
            let twice = normalize_name(&once.full_name);
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }
}
