//! Minimal HTML for the pages.

use indoc::formatdoc;

use crate::page::Page;

/// Posts the prompt form and appends the streamed reply to the output element as it arrives.
const STREAM_SCRIPT: &str = r#"
const form = document.getElementById("prompt-form");
const output = document.getElementById("output");

form.addEventListener("submit", async (event) => {
  event.preventDefault();
  output.textContent = "";

  const response = await fetch(form.action, {
    method: "POST",
    body: new URLSearchParams(new FormData(form)),
  });

  const reader = response.body.getReader();
  const decoder = new TextDecoder();

  for (;;) {
    const { done, value } = await reader.read();
    if (done) break;
    output.textContent += decoder.decode(value, { stream: true });
  }
});
"#;

pub(crate) fn index(value: Option<&str>) -> String {
    let echo = match value {
        Some(value) => format!("<p>You wrote: <q>{}</q></p>", escape(value)),
        None => String::new(),
    };

    let body = formatdoc! {r#"
        <form method="post" action="/">
          <input type="text" name="user_input" autofocus>
          <button type="submit">Send</button>
        </form>
        {echo}
        <p><a href="/options">Get started</a></p>
    "#};

    layout("Promptcraft", &body)
}

pub(crate) fn options() -> String {
    let links: String = Page::ALL
        .iter()
        .map(|page| format!("  <li><a href=\"{}\">{}</a></li>\n", page.path(), page.title()))
        .collect();

    let body = formatdoc! {r#"
        <p>Pick a page.</p>
        <ul>
        {links}</ul>
    "#};

    layout("Options", &body)
}

pub(crate) fn page(page: Page) -> String {
    let intro = page.intro();

    let form = if page.streams() {
        formatdoc! {r#"
            <form id="prompt-form" method="post" action="{action}">
              <textarea name="prompt" rows="6" cols="80" placeholder="Write your prompt here"></textarea>
              <button type="submit">Submit</button>
            </form>
            <pre id="output"></pre>
            <script>{STREAM_SCRIPT}</script>
        "#, action = page.stream_path()}
    } else {
        String::new()
    };

    let next = match page.next() {
        Some(next) => format!(r#"<a href="{}">Next: {}</a>"#, next.path(), next.title()),
        None => r#"<a href="/">Start over</a>"#.to_string(),
    };

    let body = formatdoc! {r#"
        <p>{intro}</p>
        {form}
        <nav><a href="/options">All pages</a> | {next}</nav>
    "#};

    layout(page.title(), &body)
}

fn layout(title: &str, body: &str) -> String {
    formatdoc! {r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
          <meta charset="utf-8">
          <title>{title}</title>
          <link rel="stylesheet" href="/static/style.css">
        </head>
        <body>
        <h1>{title}</h1>
        {body}
        </body>
        </html>
    "#}
}

/// Escape text for use in HTML element content and quoted attributes.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }

    escaped
}
