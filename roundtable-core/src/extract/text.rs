/// Decodes an uploaded text file, tolerating invalid UTF-8.
///
/// Returns the trimmed text; callers decide what an empty result means.
pub fn extract_text_file(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
