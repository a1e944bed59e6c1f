use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

/// Download a standings report (e.g. a chat attachment URL) as text.
pub async fn fetch_report(url: &str) -> Result<String> {
    let client = reqwest::Client::new();

    info!("Fetching report: {}", url);
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .context("Failed to download report")?;

    info!("Downloaded report, size: {} characters", text.len());
    Ok(text)
}

fn has_txt_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// Standings exports are plain `.txt` files; anything else is rejected up front.
pub fn ensure_txt(path: &Path) -> Result<()> {
    if !has_txt_extension(path) {
        bail!(
            "{}: please provide a .txt file with the EventLink standings report",
            path.display()
        );
    }
    Ok(())
}

/// Same check for a download link; query string and fragment are ignored.
pub fn ensure_txt_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    if !has_txt_extension(Path::new(parsed.path())) {
        bail!("{}: please provide a .txt file with the EventLink standings report", url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_only() {
        assert!(ensure_txt(Path::new("standings.txt")).is_ok());
        assert!(ensure_txt(Path::new("reports/STANDINGS.TXT")).is_ok());
        assert!(ensure_txt(Path::new("standings.pdf")).is_err());
        assert!(ensure_txt(Path::new("standings")).is_err());
    }

    #[test]
    fn local_names_keep_hash_and_question_mark() {
        assert!(ensure_txt(Path::new("FNM #12.txt")).is_ok());
        assert!(ensure_txt(Path::new("reports/what?.txt")).is_ok());
        assert!(ensure_txt(Path::new("FNM #12.txt.bak")).is_err());
    }

    #[test]
    fn url_query_and_fragment_ignored() {
        assert!(ensure_txt_url("https://cdn.example.com/a/standings.txt?ex=1&hm=2").is_ok());
        assert!(ensure_txt_url("https://cdn.example.com/a/standings.txt#top").is_ok());
        assert!(ensure_txt_url("https://cdn.example.com/a/standings.pdf?x=.txt").is_err());
        assert!(ensure_txt_url("standings.txt").is_err());
    }
}
