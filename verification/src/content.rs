//! Validation of rendered post pages.

use crate::VerifyError;
use scraper::{ElementRef, Html};

/// The part of the expected text that must appear in the page title.
///
/// Titles only carry the first line of a post.
pub fn title_phrase(expected_text: &str) -> &str {
    expected_text.split('\n').next().unwrap_or_default().trim()
}

/// Check that `markup` is the page of `post_url` and that it shows the
/// expected text.
pub fn validate_post_page(
    markup: &str,
    expected_text: &str,
    post_url: &str,
) -> Result<(), VerifyError> {
    if markup.trim().is_empty() {
        return Err(VerifyError::InvalidPageContent);
    }
    let document = Html::parse_document(markup);
    let phrase = title_phrase(expected_text);

    let mut text_found = false;
    let mut post_found = false;
    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if !text_found && !phrase.is_empty() && element.value().name() == "title" {
            text_found = element.text().collect::<String>().contains(phrase);
        }
        if !post_found {
            post_found = element.value().attr("href") == Some(post_url);
        }
        if text_found && post_found {
            break;
        }
    }

    if !text_found {
        return Err(VerifyError::TextNotFound);
    }
    if !post_found {
        return Err(VerifyError::PostNotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = "https://twitter.com/alice/status/1";

    fn page(title: &str, href: &str) -> String {
        format!(
            "<html><head><title>{title}</title></head>\
             <body><article><a href=\"{href}\">3:04 PM</a></article></body></html>"
        )
    }

    #[test]
    fn phrase_in_title_and_exact_link() {
        let markup = page("alice on X: \"Verifying my account for ice\" / X", POST);
        assert!(validate_post_page(&markup, "Verifying my account for ice\n#ice", POST).is_ok());
    }

    #[test]
    fn phrase_removed() {
        let markup = page("alice on X: \"hello world\" / X", POST);
        assert!(matches!(
            validate_post_page(&markup, "Verifying my account", POST),
            Err(VerifyError::TextNotFound)
        ));
    }

    #[test]
    fn link_changed() {
        let markup = page("Verifying my account", "https://twitter.com/alice/status/2");
        assert!(matches!(
            validate_post_page(&markup, "Verifying my account", POST),
            Err(VerifyError::PostNotFound)
        ));
    }

    #[test]
    fn blank_page() {
        assert!(matches!(
            validate_post_page("  \n", "Verifying", POST),
            Err(VerifyError::InvalidPageContent)
        ));
    }

    #[test]
    fn empty_phrase_never_matches() {
        let markup = page("anything", POST);
        assert!(matches!(
            validate_post_page(&markup, "\nsecond line", POST),
            Err(VerifyError::TextNotFound)
        ));
    }

    #[test]
    fn only_the_first_line_is_required() {
        assert_eq!(title_phrase("  first line \nsecond"), "first line");
        assert_eq!(title_phrase("single"), "single");
    }
}
