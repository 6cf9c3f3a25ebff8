//! Dashboard page served to inbound peers
//!
//! A fixed-shape HTML document: a Chart.js line chart fed from the history
//! series, a 600 s refresh meta tag and a "Last Updated" footer. The series is
//! embedded in a JavaScript template literal, where the `\n` line markers
//! become real newlines and the chart script splits on them.
//!
//! Each line is escaped on its own and the markers are written between them,
//! so a backslash in logged text is data and never an escape sequence.

use alloc::string::String;
use core::fmt::Write;

use crate::constants::storage::{NO_DATA_SENTINEL, SERIES_LINE_MARKER};
use crate::history::Series;

/// Page title and heading
pub const PAGE_TITLE: &str = "Frostwatch Monitor";

/// Browser refresh period (seconds)
pub const REFRESH_SECONDS: u32 = 600;

const CHART_SCRIPT: &str = concat!(
    "const ctx = document.getElementById('dataChart').getContext('2d');",
    "const labels = []; const tempData = []; const humData = []; const rssiData = [];",
    "rawData.filter(line => line.includes(',')).forEach(line => {",
    "  const [time, temp, hum, uptime, rssi] = line.split(',');",
    "  labels.push(time.trim());",
    "  tempData.push(parseFloat(temp));",
    "  humData.push(parseFloat(hum));",
    "  rssiData.push(parseInt(rssi));",
    "});",
    "new Chart(ctx, {",
    "  type: 'line',",
    "  data: {",
    "    labels: labels,",
    "    datasets: [",
    "      { label: 'Temperature (°F)', data: tempData, borderColor: 'red', borderWidth: 1 },",
    "      { label: 'Humidity (%)', data: humData, borderColor: 'blue', borderWidth: 1 },",
    "      { label: 'RSSI (dBm)', data: rssiData, borderColor: 'green', borderWidth: 1 }",
    "    ]",
    "  },",
    "  options: { responsive: true, scales: { y: { beginAtZero: true } } }",
    "});",
);

/// Render the dashboard for a series
pub fn render(series: &Series, last_updated: &str) -> String {
    let mut html = String::with_capacity(2048 + series.len() * 48);
    // Writing into a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><title>{title}</title>\
         <meta charset='UTF-8'>\
         <meta http-equiv='refresh' content='{refresh}'>\
         <script src='https://cdn.jsdelivr.net/npm/chart.js'></script></head>\
         <body><h1>{title}</h1>\
         <canvas id='dataChart' width='400' height='200'></canvas>\
         <p style='text-align:right;'>Last Updated: ",
        title = PAGE_TITLE,
        refresh = REFRESH_SECONDS,
    );
    push_html_text(&mut html, last_updated);
    html.push_str("</p><script>const rawData = `");
    if series.is_sentinel() {
        push_template_literal(&mut html, NO_DATA_SENTINEL);
    }
    for (idx, line) in series.iter().enumerate() {
        if idx > 0 {
            html.push_str(SERIES_LINE_MARKER);
        }
        push_template_literal(&mut html, line);
    }
    html.push_str("`.split('\\n');");
    html.push_str(CHART_SCRIPT);
    html.push_str("</script></body></html>");
    html
}

/// Escape text so it reads back verbatim from a template literal
fn push_template_literal(out: &mut String, text: &str) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            '<' => out.push_str("\\x3c"),
            other => out.push(other),
        }
    }
}

fn push_html_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{HistoricalReader, HistoryQuery};
    use crate::store::MemoryLogStore;

    fn series_of(log: &str) -> Series {
        let store = MemoryLogStore::with_contents(log);
        HistoricalReader::new(HistoryQuery::default().with_skip_interval(1)).read_series(&store)
    }

    #[test]
    fn page_embeds_series_and_footer() {
        let html = render(&series_of("a,1.0,2.0,0.00,-60\nb,1.5,2.0,0.00,-61\n"), "2024-01-15 08:30:00");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<meta http-equiv='refresh' content='600'>"));
        assert!(html.contains("const rawData = `a,1.0,2.0,0.00,-60\\nb,1.5,2.0,0.00,-61`.split('\\n');"));
        assert!(html.contains("Last Updated: 2024-01-15 08:30:00</p>"));
        assert!(html.ends_with("</script></body></html>"));
    }

    #[test]
    fn empty_series_embeds_sentinel() {
        let html = render(&series_of(""), "t");
        assert!(html.contains("const rawData = `No data available`.split('\\n');"));
    }

    #[test]
    fn refresh_meta_is_inside_head() {
        let html = render(&series_of("x\n"), "t");
        let meta = html.find("http-equiv='refresh'").unwrap();
        assert!(meta < html.find("</head>").unwrap());
    }

    #[test]
    fn payload_cannot_break_out_of_script() {
        let html = render(&series_of("`${alert(1)}`</script>\n"), "<b>");
        assert!(html.contains("\\`\\${alert(1)}\\`\\x3c/script>"));
        assert!(html.contains("Last Updated: &lt;b&gt;"));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn backslash_cannot_unescape_backtick() {
        let html = render(&series_of("x\\`;alert(1);//\n"), "t");
        // Backslash doubled, backtick escaped: the literal runs on to the split
        assert!(html.contains("const rawData = `x\\\\\\`;alert(1);//`.split('\\n');"));
    }

    #[test]
    fn backslash_sequences_stay_literal() {
        let html = render(&series_of("C:\\u00\\new,1.0\nb\n"), "t");
        assert!(html.contains("const rawData = `C:\\\\u00\\\\new,1.0\\nb`.split"));
    }
}
