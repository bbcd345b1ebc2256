pub mod content_guard;
pub mod fetch;
pub mod gemini;
pub mod office;
pub mod pdf;
pub mod scratch_file;
pub mod youtube_search;

#[cfg(test)]
pub(crate) mod test_http;
