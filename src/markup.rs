//! Markup Emitter - Embeddable Figure Fragments

use crate::dimensions::PixelSize;
use crate::tag::FigureIndex;

/// `src` of a page asset, relative to the site root as the page sees it.
fn asset_src(page_url: &str, file_name: &str) -> String {
    format!(".{}/{}", page_url.trim_end_matches('/'), file_name)
}

fn alt_text(figure: FigureIndex) -> String {
    format!("Figure {}", figure.number())
}

/// Image tag for a rendered formula.
pub fn emit(page_url: &str, file_name: &str, figure: FigureIndex, size: PixelSize) -> String {
    format!(
        r#"<img src="{}" alt="{}" width="{}" height="{}" />"#,
        asset_src(page_url, file_name),
        alt_text(figure),
        size.width,
        size.height,
    )
}

/// Chart wrapper: the padding keeps the box at the chart's aspect ratio
/// while the image loads.
pub fn emit_chart(page_url: &str, file_name: &str, figure: FigureIndex, size: PixelSize) -> String {
    let aspect = 100.0 * f64::from(size.height) / f64::from(size.width);
    format!(
        r#"<figure class="fig-chart" style="padding-top: {}%;"><img src="{}" alt="{}" height="{}" width="{}" /></figure>"#,
        format_percent(aspect),
        asset_src(page_url, file_name),
        alt_text(figure),
        size.height,
        size.width,
    )
}

/// Up to four decimals, trailing zeros dropped.
fn format_percent(value: f64) -> String {
    let s = format!("{:.4}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
