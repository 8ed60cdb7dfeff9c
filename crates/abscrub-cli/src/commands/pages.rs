use abscrub_core::error::AbscrubError;
use abscrub_core::locate::window::page_window;
use abscrub_core::wordfile::count_pages;
use std::path::Path;

pub fn run(word_file: &Path) -> Result<(), AbscrubError> {
    let pages = count_pages(word_file)?;
    let window: Vec<usize> = page_window(pages).into_iter().collect();
    let json = serde_json::json!({
        "pages": pages,
        "search_window": window,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
