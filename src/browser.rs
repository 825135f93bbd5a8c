//! Web page of the widget: the main webview itself navigates to the site.

use tauri::{AppHandle, Manager, Runtime};
use tracing::info;
use url::Url;

use crate::error::{AppError, Result};
use crate::windows;

const MAX_URL_LEN: usize = 2048;
pub const DEFAULT_URL: &str = "https://www.bing.com/";

/// Shell page the home button returns to. `#home` keeps it from resuming the last site.
#[cfg(windows)]
const SHELL_HOME: &str = "http://tauri.localhost/index.html#home";
#[cfg(not(windows))]
const SHELL_HOME: &str = "tauri://localhost/index.html#home";

/// Runs in every document the main webview loads. Links that would open a new
/// window load in place, and browsed sites get a button back to the shell.
pub fn same_window_script() -> String {
    format!(
        r#"
(() => {{
  window.open = (url) => {{ if (url) window.location.assign(url); return null; }};
  document.addEventListener('click', (event) => {{
    const link = event.target instanceof Element ? event.target.closest('a[target]') : null;
    if (link && link.target !== '_self') {{
      event.preventDefault();
      window.location.assign(link.href);
    }}
  }}, true);
  window.addEventListener('DOMContentLoaded', () => {{
    if (window.fisher || window.top !== window) return;
    const home = document.createElement('a');
    home.href = {home:?};
    home.textContent = '⌂';
    home.title = 'Fisher';
    home.style.cssText = 'position:fixed;top:4px;right:4px;z-index:2147483647;width:22px;height:22px;' +
      'line-height:22px;text-align:center;border-radius:11px;background:#2b303bcc;color:#d8dee9;' +
      'font:14px system-ui,sans-serif;text-decoration:none;';
    document.documentElement.appendChild(home);
  }});
}})();
"#,
        home = SHELL_HOME
    )
}

/// Accept `example.com` style input; only http(s) URLs with a host get through.
pub fn normalize_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("URL cannot be empty".into()));
    }
    if trimmed.len() > MAX_URL_LEN {
        return Err(AppError::InvalidInput("URL is too long".into()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = Url::parse(&candidate).map_err(|e| AppError::InvalidInput(format!("{candidate}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidInput("Only http and https URLs are allowed".into()));
    }
    if parsed.host_str().is_none() {
        return Err(AppError::InvalidInput("URL must include a host".into()));
    }
    Ok(parsed)
}

/// Load `url` in the main webview.
pub fn navigate<R: Runtime>(app: &AppHandle<R>, url: &Url) -> Result<()> {
    let Some(window) = app.get_webview_window(windows::MAIN) else {
        return Ok(());
    };
    info!(%url, "Browsing");
    window.navigate(url.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_host_gets_https() {
        let url = normalize_url("  example.com/path ").expect("url");
        assert_eq!(url.as_str(), "https://example.com/path");
    }

    #[test]
    fn explicit_http_is_kept() {
        assert_eq!(normalize_url("http://news.ycombinator.com").expect("url").scheme(), "http");
    }

    #[test]
    fn non_web_schemes_are_rejected() {
        assert!(normalize_url("file:///etc/passwd").is_err());
        assert!(normalize_url("javascript:alert(1)").is_err());
        assert!(normalize_url("").is_err());
        assert!(normalize_url(&"a".repeat(MAX_URL_LEN + 1)).is_err());
    }

    #[test]
    fn default_url_is_valid() {
        assert_eq!(normalize_url(DEFAULT_URL).expect("url").as_str(), DEFAULT_URL);
    }

    #[test]
    fn script_links_home_and_keeps_links_in_place() {
        let script = same_window_script();
        assert!(script.contains(&format!("{SHELL_HOME:?}")));
        assert!(script.contains("window.open = "));
        assert!(script.contains("a[target]"));
    }
}
