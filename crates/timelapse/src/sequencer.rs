//! Numbered filenames for consecutive frames.
//!
//! The frame number is the last run of decimal digits in the file stem of the
//! final path segment. `frame0007.jpg` at offset 3 becomes `frame0010.jpg`.

use crate::*;

/// Byte ranges of the final path segment: (segment start, stem end).
fn stem_bounds(template: &str) -> (usize, usize) {
    let segment_start = template
        .rfind(|c: char| c == '/' || c == std::path::MAIN_SEPARATOR)
        .map(|i| i + 1)
        .unwrap_or(0);
    let stem_end = template[segment_start..]
        .rfind('.')
        .map(|i| segment_start + i)
        .unwrap_or(template.len());
    (segment_start, stem_end)
}

/// Byte range of the frame number field, if the stem has one.
fn number_field(template: &str) -> Option<(usize, usize)> {
    let (segment_start, stem_end) = stem_bounds(template);
    let stem = &template.as_bytes()[segment_start..stem_end];
    let last = stem.iter().rposition(u8::is_ascii_digit)?;
    let first = stem[..last]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    Some((segment_start + first, segment_start + last + 1))
}

/// Whether `template` has a frame number to increment.
pub fn has_sequence(template: &str) -> bool {
    number_field(template).is_some()
}

/// The filename for frame `offset` of a sequence starting at `template`.
///
/// The number keeps at least its original width and grows when it has to.
/// A template without a frame number is returned unchanged for every offset.
pub fn generate(template: &str, offset: u64) -> Result<String, SequenceError> {
    if template.is_empty() {
        return Err(SequenceError::EmptyTemplate);
    }
    let Some((start, end)) = number_field(template) else {
        return Ok(template.to_string());
    };
    if offset == 0 {
        return Ok(template.to_string());
    }

    let field = &template[start..end];
    let number = field
        .parse::<u64>()
        .ok()
        .and_then(|number| number.checked_add(offset))
        .ok_or_else(|| SequenceError::Overflow(field.to_string()))?;

    Ok(format!(
        "{}{:0width$}{}",
        &template[..start],
        number,
        &template[end..],
        width = field.len()
    ))
}
