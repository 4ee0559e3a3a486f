// =============================================================================
// HTML Pages — input form and chart result
// =============================================================================
//
// Two pages only:
//   index  — ticker form, optionally with an error banner
//   result — the rendered chart embedded as a data URI, plus the ticker
//
// Every user-controlled value goes through `escape_html` before insertion.
// =============================================================================

use crate::chart::ChartImage;
use crate::types::Ticker;

const STYLE: &str = r#"
        body { font-family: 'Segoe UI', Arial, sans-serif; background: #f4f6f8; color: #222; margin: 0; }
        header { background: #1f3a5f; color: #fff; padding: 0.8rem; text-align: center; font-size: 1.3rem; }
        .container { max-width: 1260px; margin: 1.5rem auto; padding: 1rem 1.5rem; background: #fff; border-radius: 8px; box-shadow: 0 2px 8px #0002; }
        form { display: flex; gap: 0.5rem; align-items: center; }
        input[type=text] { padding: 0.4rem 0.6rem; font-size: 1rem; text-transform: uppercase; }
        button { padding: 0.4rem 1rem; font-size: 1rem; cursor: pointer; }
        .error { color: #b00020; background: #fde8ec; padding: 0.6rem; border-radius: 4px; margin-bottom: 1rem; }
        img { max-width: 100%; height: auto; }
"#;

/// Escape text for safe inclusion in HTML element content or a quoted
/// attribute value.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    <header>EMA Crossover Stock Chart</header>
    <div class="container">
{body}
    </div>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn ticker_form() -> &'static str {
    r#"        <form method="post" action="/">
            <label for="ticker">Ticker symbol</label>
            <input type="text" id="ticker" name="ticker" placeholder="e.g. AAPL" autofocus required>
            <button type="submit">Show chart</button>
        </form>"#
}

/// The input form, with an error banner when `error` is set.
pub fn render_index(error: Option<&str>) -> String {
    let banner = match error {
        Some(msg) => format!(
            "        <div class=\"error\" role=\"alert\">Error: {}</div>\n",
            escape_html(msg)
        ),
        None => String::new(),
    };
    page(
        "Stock EMA Strategy",
        &format!("{banner}        <h2>Stock Price with 100/200 EMA Signals</h2>\n{}", ticker_form()),
    )
}

/// The result page embedding `image` for `ticker`.
pub fn render_result(ticker: &Ticker, image: &ChartImage) -> String {
    let title = format!("{ticker} EMA Chart");
    let ticker = escape_html(ticker.as_str());
    let body = format!(
        r#"        <h2>{ticker} Stock Price with EMA Strategy</h2>
        <img src="{src}" alt="{ticker} price chart with 100 and 200 day EMA and buy/sell signals">
        <p>Green triangles mark buy signals (100 EMA crossing above 200 EMA); red triangles mark sell signals.</p>
        <p><a href="/">Analyze another ticker</a></p>
{form}"#,
        src = image.data_uri(),
        form = ticker_form(),
    );
    page(&title, &body)
}
