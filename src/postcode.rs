use regex::Regex;

/// Canonical postcode form used on both sides of every join: all whitespace
/// stripped, uppercased. Applied to index keys at load time and to sale
/// records before lookup, so lookups are plain map hits.
pub fn normalize(postcode: &str) -> String {
    postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Leading letters of a postcode ("SW1A 1AA" -> "SW"), the outward area code.
pub fn area_prefix(postcode: &str) -> Option<String> {
    let re = Regex::new(r"^[A-Za-z]+").unwrap();
    re.find(postcode.trim())
        .map(|matched| matched.as_str().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_spaces_and_uppercases() {
        assert_eq!(normalize("sw1a 1aa"), "SW1A1AA");
        assert_eq!(normalize("  M1  1AE "), "M11AE");
        assert_eq!(normalize("SW1A1AA"), "SW1A1AA");
    }

    #[test]
    fn normalize_handles_tabs_and_interior_runs() {
        assert_eq!(normalize("e1\t 6an"), "E16AN");
    }

    #[test]
    fn area_prefix_takes_leading_letters() {
        assert_eq!(area_prefix("SW1A 1AA").as_deref(), Some("SW"));
        assert_eq!(area_prefix(" m1 1ae").as_deref(), Some("M"));
        assert_eq!(area_prefix("1AA"), None);
    }
}
