//! # nb-markup-regex
//!
//! Regex-driven implementation of `MarkupParser`.
//! Scans editor HTML for the first `<img>` tag, stepping over comments and
//! raw-text elements the way a browser tokenizer would, and reads its `src`.

use nb_core::models::ImageElement;
use nb_core::traits::MarkupParser;
use once_cell::sync::Lazy;
use regex::Regex;

/// Comments, `<script>`/`<style>` bodies, and every start tag.
/// Attribute values are matched whole, so neither a `>` nor markup inside
/// quotes is read as a tag of its own.
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>"#,
        r#"|<(?P<name>[a-z][^\s/>]*)(?:[^>"']|"[^"]*"|'[^']*')*>"#,
    ))
    .expect("token regex is valid")
});

/// One attribute: name, then an optional double-quoted, single-quoted or bare value.
static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#)
        .expect("attribute regex is valid")
});

const IMG_OPEN: &str = "<img";

#[derive(Debug, Default, Clone, Copy)]
pub struct RegexMarkupParser;

impl RegexMarkupParser {
    pub fn new() -> Self {
        Self
    }

    /// Reads the first `src` attribute of an `<img ...>` tag, entity-decoded.
    fn src_attribute(tag: &str) -> Option<String> {
        let body = tag
            .get(IMG_OPEN.len()..tag.len().saturating_sub(1))
            .unwrap_or_default();

        ATTRIBUTE_REGEX
            .captures_iter(body)
            .find(|caps| caps[1].eq_ignore_ascii_case("src"))
            .map(|caps| {
                let raw = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                html_escape::decode_html_entities(raw).into_owned()
            })
    }
}

impl MarkupParser for RegexMarkupParser {
    fn first_image(&self, html: &str) -> Option<ImageElement> {
        let tag = TOKEN_REGEX
            .captures_iter(html)
            .find(|caps| {
                caps.name("name")
                    .is_some_and(|name| name.as_str().eq_ignore_ascii_case("img"))
            })?
            .get(0)?;

        Some(ImageElement {
            span: tag.range(),
            src: Self::src_attribute(tag.as_str()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_core::separator::separate_content;

    const PNG_SRC: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==";

    #[test]
    fn finds_the_first_image_and_its_src() {
        let html = format!("<p>a</p><p><img src=\"{}\" alt=\"x\"></p>", PNG_SRC);
        let found = RegexMarkupParser.first_image(&html).unwrap();

        assert_eq!(&html[found.span.clone()], format!("<img src=\"{}\" alt=\"x\">", PNG_SRC));
        assert_eq!(found.src.as_deref(), Some(PNG_SRC));
    }

    #[test]
    fn no_image_yields_none() {
        assert!(RegexMarkupParser.first_image("<p>text only</p>").is_none());
        assert!(RegexMarkupParser.first_image("<p><imgx></p>").is_none());
    }

    #[test]
    fn handles_quoting_and_case() {
        let found = RegexMarkupParser
            .first_image("<IMG alt='a > b' SRC='data:image/gif;base64,R0lG'/>")
            .unwrap();
        assert_eq!(found.src.as_deref(), Some("data:image/gif;base64,R0lG"));
        assert_eq!(found.span, 0..51);

        let found = RegexMarkupParser.first_image("<img src=plain.png width=3>").unwrap();
        assert_eq!(found.src.as_deref(), Some("plain.png"));
    }

    #[test]
    fn data_src_is_not_src() {
        let found = RegexMarkupParser
            .first_image(r#"<img data-src="lazy.png" alt="src=fake">"#)
            .unwrap();
        assert!(found.src.is_none());
    }

    #[test]
    fn entities_in_src_are_decoded() {
        let found = RegexMarkupParser
            .first_image(r#"<img src="/a.png?x=1&amp;y=2">"#)
            .unwrap();
        assert_eq!(found.src.as_deref(), Some("/a.png?x=1&y=2"));
    }

    #[test]
    fn images_in_comments_and_scripts_are_skipped() {
        let html = concat!(
            r#"<!-- <img src="old.png"> -->"#,
            r#"<script>var s = "<img src=x>";</script>"#,
            r#"<img src="real.png">"#,
        );
        let found = RegexMarkupParser.first_image(html).unwrap();
        assert_eq!(found.src.as_deref(), Some("real.png"));
        assert_eq!(&html[found.span], r#"<img src="real.png">"#);
    }

    #[test]
    fn markup_inside_attribute_values_is_not_a_tag() {
        let html = format!(r#"<p title="<img src=x>">hi</p><img src="{}">"#, PNG_SRC);
        let found = RegexMarkupParser.first_image(&html).unwrap();

        assert_eq!(found.src.as_deref(), Some(PNG_SRC));
        assert_eq!(&html[found.span.clone()], format!(r#"<img src="{}">"#, PNG_SRC));

        let out = separate_content(&RegexMarkupParser, &html);
        assert_eq!(out.text, r#"<p title="<img src=x>">hi</p>"#);
        assert_eq!(out.image_data.as_deref(), Some(PNG_SRC));
    }

    #[test]
    fn attribute_markup_alone_yields_no_image() {
        let html = r##"<a href="#" data-tip='<img src="tip.png">'>link</a>"##;
        assert!(RegexMarkupParser.first_image(html).is_none());
    }

    #[test]
    fn separation_removes_only_the_first_image() {
        let html = format!(
            "<p>one<img src=\"{}\"></p><p>two<img src=\"{}\"></p>",
            PNG_SRC, PNG_SRC
        );
        let out = separate_content(&RegexMarkupParser, &html);

        assert_eq!(out.image_data.as_deref(), Some(PNG_SRC));
        assert_eq!(out.text, format!("<p>one</p><p>two<img src=\"{}\"></p>", PNG_SRC));
    }

    #[test]
    fn separation_drops_linked_images() {
        let out = separate_content(
            &RegexMarkupParser,
            "<p>hi</p><img src=\"https://example.com/cat.jpg\">",
        );
        assert_eq!(out.text, "<p>hi</p>");
        assert!(out.image_data.is_none());
    }
}
