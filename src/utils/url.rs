// src/utils/url.rs

//! URL helpers for deadline deduplication.

use url::Url;

/// Normalize an activity URL down to its identity.
///
/// Moodle links the same activity with varying extra query parameters and
/// fragments. For deduplication only scheme, host, path and the `id`
/// parameter matter. Unparseable input is returned trimmed, so dedup still
/// works on exact matches.
pub fn normalize_activity_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.trim().to_string();
    };
    let id = url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned());
    url.set_fragment(None);
    match id {
        Some(id) => {
            url.query_pairs_mut().clear().append_pair("id", &id);
        }
        None => url.set_query(None),
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_only_the_id_parameter() {
        let normalized = normalize_activity_url(
            "https://moodle.tu-dortmund.de/mod/assign/view.php?id=42&forceview=1",
        );
        assert_eq!(
            normalized,
            "https://moodle.tu-dortmund.de/mod/assign/view.php?id=42"
        );
    }

    #[test]
    fn test_drops_fragments() {
        let normalized =
            normalize_activity_url("https://moodle.tu-dortmund.de/mod/quiz/view.php?id=7#section");
        assert_eq!(
            normalized,
            "https://moodle.tu-dortmund.de/mod/quiz/view.php?id=7"
        );
    }

    #[test]
    fn test_strips_query_entirely_without_id() {
        let normalized =
            normalize_activity_url("https://moodle.tu-dortmund.de/mod/forum/view.php?f=3");
        assert_eq!(
            normalized,
            "https://moodle.tu-dortmund.de/mod/forum/view.php"
        );
    }

    #[test]
    fn test_same_activity_with_different_noise_collapses() {
        let a = normalize_activity_url("https://m.example/mod/assign/view.php?id=9&lang=de");
        let b = normalize_activity_url("https://m.example/mod/assign/view.php?id=9#due");
        assert_eq!(a, b);
    }

    #[test]
    fn test_unparseable_input_is_returned_trimmed() {
        assert_eq!(normalize_activity_url("  not a url  "), "not a url");
    }
}
