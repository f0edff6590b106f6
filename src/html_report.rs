use std::fs::File;
use std::io::{self, BufWriter, Write};
use crate::error::{Result, UniqError};
use crate::stats::RunStats;

pub fn write_html_report(path: &str, stats: &RunStats, title: &str) -> Result<()> {
    let f = File::create(path).map_err(|e| UniqError::io(path, e))?;
    let mut w = BufWriter::new(f);
    render(&mut w, stats, title)
        .and_then(|_| w.flush())
        .map_err(|e| UniqError::io(path, e))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn render<W: Write>(f: &mut W, stats: &RunStats, title: &str) -> io::Result<()> {
    let title = escape_html(title);
    writeln!(f, "<!DOCTYPE html>")?;
    writeln!(f, "<html>")?;
    writeln!(f, "<head>")?;
    writeln!(f, "<title>{}</title>", title)?;
    writeln!(f, "<style>")?;
    writeln!(f, "body {{ font-family: Arial, sans-serif; margin: 20px; }}")?;
    writeln!(f, "table {{ border-collapse: collapse; width: 100%; max-width: 800px; }}")?;
    writeln!(f, "th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}")?;
    writeln!(f, "th {{ background-color: #f2f2f2; }}")?;
    writeln!(f, "h1 {{ color: #333; }}")?;
    writeln!(f, "</style>")?;
    writeln!(f, "</head>")?;
    writeln!(f, "<body>")?;

    writeln!(f, "<h1>{}</h1>", title)?;

    writeln!(f, "<h2>Unique Sequences</h2>")?;
    writeln!(f, "<table>")?;
    writeln!(f, "<tr><th>Metric</th><th>Value</th></tr>")?;
    writeln!(f, "<tr><td>Total Input Sequences</td><td>{}</td></tr>", stats.total_input)?;
    writeln!(f, "<tr><td>Total Unique Sequences</td><td>{}</td></tr>", stats.total_unique)?;
    writeln!(f, "<tr><td>Percent Unique</td><td>{:.2}%</td></tr>", stats.percent_unique)?;
    writeln!(f, "</table>")?;

    writeln!(f, "<h2>Duplicates</h2>")?;
    writeln!(f, "<table>")?;
    writeln!(f, "<tr><th>Metric</th><th>Value</th></tr>")?;
    writeln!(f, "<tr><td>Within Chunk</td><td>{}</td></tr>", stats.local_duplicates)?;
    writeln!(f, "<tr><td>Across Chunks</td><td>{}</td></tr>", stats.cross_chunk_duplicates)?;
    writeln!(f, "</table>")?;

    writeln!(f, "<h2>Run</h2>")?;
    writeln!(f, "<table>")?;
    writeln!(f, "<tr><th>Metric</th><th>Value</th></tr>")?;
    writeln!(f, "<tr><td>Chunks</td><td>{}</td></tr>", stats.chunks)?;
    writeln!(f, "<tr><td>Time (s)</td><td>{:.2}</td></tr>", stats.elapsed_secs)?;
    writeln!(f, "</table>")?;

    writeln!(f, "</body>")?;
    writeln!(f, "</html>")?;

    Ok(())
}
