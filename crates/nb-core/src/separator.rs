//! Detaches the embedded image from editor content.

use crate::models::{DataUri, SeparatedContent};
use crate::traits::MarkupParser;

/// Removes the first `<img>` from `html` and returns it alongside the rest.
///
/// The tag is always removed. Its `src` is only kept when it is a
/// `data:image` URI; linked images are dropped. Later images stay in the text.
pub fn separate_content(parser: &dyn MarkupParser, html: &str) -> SeparatedContent {
    let Some(element) = parser.first_image(html) else {
        return SeparatedContent {
            text: html.to_string(),
            image_data: None,
        };
    };

    let mut text = String::with_capacity(html.len());
    text.push_str(&html[..element.span.start]);
    text.push_str(&html[element.span.end..]);

    let image_data = match element.src {
        Some(src) if DataUri::is_embedded_image(&src) => Some(src),
        Some(src) => {
            tracing::warn!(src = %src, "dropping linked image, only embedded images are uploaded");
            None
        }
        None => None,
    };

    SeparatedContent { text, image_data }
}
