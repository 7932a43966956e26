use crate::error::FieldError;

/// Collect `required` violations for fields that arrived blank
///
/// Register passes every field; update passes only the fields present in
/// the request, so absent fields are never reported there.
pub fn blank_violations<'a, I>(fields: I) -> Vec<FieldError>
where
    I: IntoIterator<Item = (&'static str, Option<&'a str>)>,
{
    fields
        .into_iter()
        .filter_map(|(path, value)| match value {
            Some(value) if value.trim().is_empty() => Some(FieldError::required(path)),
            _ => None,
        })
        .collect()
}
