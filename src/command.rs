//! Turns a chat message into search tags.

/// Returns the raw tag string if `content` starts with `trigger`, or `None` if the message isn't
/// meant for us.
///
/// The trigger and exactly one following character are cut off, so `"!derpi safe"` gives
/// `"safe"`. A message that is nothing but the trigger gives the empty string.
pub(crate) fn parse_trigger<'a>(content: &'a str, trigger: &str) -> Option<&'a str> {
    let rest = content.strip_prefix(trigger)?;
    let mut chars = rest.chars();
    chars.next();
    Some(chars.as_str())
}

/// Splits on commas. Whitespace around each tag is kept as-is, and the empty string yields a
/// single empty tag.
pub(crate) fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}
