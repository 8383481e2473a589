//! Server-rendered HTML
//!
//! Pages are assembled from small fragment builders. Every piece of text that
//! came from a remote API or the request is passed through [`escape_html`].

use crate::db::{AnimeSeries, Figure};
use crate::services::{AnimeListView, SeriesWithFigures};

/// Escape text for use in element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Shared page shell with the lookup form in the header
fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/maf.css">
</head>
<body>
    <header>
        <div class="header-content">
            <a class="brand" href="/">MyAnimeFigures</a>
            <form class="lookup" method="post" action="/user">
                <input type="text" name="malLookup" placeholder="MyAnimeList user or profile URL">
                <button type="submit">Look up</button>
            </form>
        </div>
    </header>
    <main class="container">
{body}
    </main>
    <footer>v{version}</footer>
</body>
</html>
"#,
        title = escape_html(title),
        body = body,
        version = env!("CARGO_PKG_VERSION"),
    )
}

/// Landing page, with an optional error banner
pub fn render_index(error: Option<&str>) -> String {
    let banner = match error.map(str::trim).filter(|e| !e.is_empty()) {
        Some(message) => format!(
            r#"        <div class="message error">{}</div>
"#,
            escape_html(message)
        ),
        None => String::new(),
    };

    let body = format!(
        r#"{banner}        <section class="intro">
            <h1>Figures for the anime you watch</h1>
            <p>Enter a MyAnimeList user name to see figures for the series they are
            watching and have recently completed.</p>
            <form method="post" action="/user">
                <input type="text" name="malLookup" autofocus>
                <button type="submit">Look up</button>
            </form>
        </section>"#,
        banner = banner
    );

    layout("MyAnimeFigures", &body)
}

/// One series tile
fn anime_gridobj(series: &AnimeSeries) -> String {
    let title = series.title.as_deref().unwrap_or("Untitled");
    let image = match &series.image_url {
        Some(url) => format!(
            r#"<img src="{}" alt="{}">"#,
            escape_html(url),
            escape_html(title)
        ),
        None => String::new(),
    };

    format!(
        r#"<div class="anime"><a href="{url}">{image}<span class="title">{title}</span></a></div>"#,
        url = escape_html(&series.mal_url()),
        image = image,
        title = escape_html(title),
    )
}

/// One figure tile
fn figure_gridobj(figure: &Figure, image_template: &str) -> String {
    let release = figure
        .release_date
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_else(|| "TBA".to_string());

    format!(
        r#"<div class="figure"><a href="{url}" title="{full_name}"><img src="{image}" alt="{full_name}"><span class="name">{name}</span><span class="release">{release}</span></a></div>"#,
        url = escape_html(&figure.mfc_url()),
        image = escape_html(&figure.image_url(image_template)),
        full_name = escape_html(&figure.name),
        name = escape_html(&figure.truncated_name()),
        release = release,
    )
}

fn figure_grid(figures: &[Figure], image_template: &str) -> String {
    let tiles: Vec<String> = figures
        .iter()
        .map(|f| figure_gridobj(f, image_template))
        .collect();
    format!(r#"<div class="figure-grid">{}</div>"#, tiles.join(""))
}

/// A section of series rows followed by the series with nothing found
fn content_rows(
    series_list: &[SeriesWithFigures],
    nofigs_list: &[SeriesWithFigures],
    image_template: &str,
) -> String {
    let mut html = String::new();

    for item in series_list {
        html.push_str(&format!(
            r#"<div class="series-row">{}{}</div>
"#,
            anime_gridobj(&item.series),
            figure_grid(&item.figures, image_template)
        ));
    }

    if !nofigs_list.is_empty() {
        let tiles: Vec<String> = nofigs_list.iter().map(|i| anime_gridobj(&i.series)).collect();
        html.push_str(&format!(
            r#"<div class="nofigs"><h3>No figures found</h3><div class="anime-grid">{}</div></div>
"#,
            tiles.join("")
        ));
    }

    if html.is_empty() {
        html.push_str(r#"<p class="empty">Nothing here.</p>"#);
    }

    html
}

/// Figure page for one user
pub fn render_user_page(view: &AnimeListView, image_template: &str) -> String {
    let recent = if view.recent_figures.is_empty() {
        r#"<p class="empty">No upcoming or recent figures.</p>"#.to_string()
    } else {
        figure_grid(&view.recent_figures, image_template)
    };

    let body = format!(
        r#"        <h1>{user}</h1>
        <section id="recent">
            <h2>Recent figures</h2>
            {recent}
        </section>
        <section id="watching">
            <h2>Currently watching</h2>
            {watching}
        </section>
        <section id="completed">
            <h2>Recently completed</h2>
            {completed}
        </section>"#,
        user = escape_html(&view.user),
        recent = recent,
        watching = content_rows(&view.watching, &view.watching_nofigs, image_template),
        completed = content_rows(
            &view.recently_completed,
            &view.completed_nofigs,
            image_template
        ),
    );

    layout(&format!("{} - MyAnimeFigures", view.user), &body)
}
