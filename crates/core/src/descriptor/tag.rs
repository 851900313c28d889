//! Content tag extraction.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::ContentTag;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[[0-9A-F]{16}\]\[v\d+\]").expect("content tag pattern is valid")
});

/// Extract the `[ID][vN]` tag from a file name, exactly as it appears.
pub fn extract_tag(file_name: &str) -> Option<ContentTag> {
    TAG_PATTERN
        .find(file_name)
        .map(|m| ContentTag::new(m.as_str()))
}

/// First tag found across `names`, in order.
pub fn first_tag<I, S>(names: I) -> Option<ContentTag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .find_map(|name| extract_tag(name.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tag() {
        let tag = extract_tag("Game [0100ABCDEF123456][v0].nsp").unwrap();
        assert_eq!(tag.as_str(), "[0100ABCDEF123456][v0]");
    }

    #[test]
    fn test_extract_tag_keeps_original_case() {
        let tag = extract_tag("game [0100abcdef123456][V131072].xci").unwrap();
        assert_eq!(tag.as_str(), "[0100abcdef123456][V131072]");
    }

    #[test]
    fn test_extract_tag_first_match_wins() {
        let tag = extract_tag("[0100000000000001][v1] [0100000000000002][v2]").unwrap();
        assert_eq!(tag.as_str(), "[0100000000000001][v1]");
    }

    #[test]
    fn test_no_tag() {
        assert!(extract_tag("Game.nsp").is_none());
        assert!(extract_tag("Game [0100ABCDEF12345][v0].nsp").is_none()); // 15 digits
        assert!(extract_tag("Game [0100ABCDEF12345G][v0].nsp").is_none()); // not hex
        assert!(extract_tag("Game [0100ABCDEF123456] [v0].nsp").is_none()); // gap
        assert!(extract_tag("Game [0100ABCDEF123456][v].nsp").is_none());
        assert!(extract_tag("").is_none());
    }

    #[test]
    fn test_first_tag_across_names() {
        let names = ["readme.txt", "Game [0100ABCDEF123456][v0].nsp", "Game [0100ABCDEF123800][v1].nsp"];
        let tag = first_tag(names).unwrap();
        assert_eq!(tag.as_str(), "[0100ABCDEF123456][v0]");

        assert!(first_tag(["a", "b"]).is_none());
        assert!(first_tag(Vec::<String>::new()).is_none());
    }
}
