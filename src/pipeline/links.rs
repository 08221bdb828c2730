use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, PartialEq)]
pub enum TextOrUrl {
    Text(String),
    Url(String),
}

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b((?:https?://|www\d{0,3}[.]|[a-z0-9.\-]+[.][a-z]{2,4}/)(?:[^\s()<>]+|\(([^\s()<>]+|(\([^\s()<>]+\)))*\))+(?:\(([^\s()<>]+|(\([^\s()<>]+\)))*\)|[^\s`!()\[\]{};:'".,<>?«»“”‘’]))"#).unwrap()
});

// Must match the whole token; a lobby link embedded in a longer word is
// left as plain text.
static STEAM_LOBBY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^steam://joinlobby/\d+/\d+/\d+$").unwrap());

/// Recognizes a `steam://joinlobby/<app>/<lobby>/<owner>` deep link token.
pub fn is_steam_lobby_link(token: &str) -> bool {
    STEAM_LOBBY_REGEX.is_match(token)
}

/// Splits surviving plain text into literal runs and clickable urls.
pub fn parse_text_for_urls(text: &str) -> Vec<TextOrUrl> {
    let mut result = Vec::new();
    let mut last_end = 0;

    for mat in URL_REGEX.find_iter(text) {
        if mat.start() > last_end {
            result.push(TextOrUrl::Text(text[last_end..mat.start()].to_string()));
        }
        let mut url = mat.as_str().to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            url = format!("http://{}", url);
        }
        result.push(TextOrUrl::Url(url));
        last_end = mat.end();
    }

    if last_end < text.len() {
        result.push(TextOrUrl::Text(text[last_end..].to_string()));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn steam_lobby_link_requires_exact_shape() {
        assert!(is_steam_lobby_link("steam://joinlobby/730/109775241/76561198"));
        assert!(!is_steam_lobby_link("steam://joinlobby/730/109775241"));
        assert!(!is_steam_lobby_link("xsteam://joinlobby/1/2/3"));
        assert!(!is_steam_lobby_link("steam://joinlobby/1/2/3x"));
        assert!(!is_steam_lobby_link("steam://joinlobby/a/b/c"));
    }

    #[test]
    fn plain_text_is_one_run() {
        assert_eq!(
            parse_text_for_urls("hello world"),
            vec![TextOrUrl::Text("hello world".to_string())]
        );
    }

    #[test]
    fn url_is_split_out_and_schemed() {
        assert_eq!(
            parse_text_for_urls("see www.example.com/x now"),
            vec![
                TextOrUrl::Text("see ".to_string()),
                TextOrUrl::Url("http://www.example.com/x".to_string()),
                TextOrUrl::Text(" now".to_string()),
            ]
        );
    }
}
