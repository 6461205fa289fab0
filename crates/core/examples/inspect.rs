use std::{fs, path::PathBuf, time::Instant};

use clap::Parser;
use mapview::{
    SourceMapBuffer, TextBuffer,
    sources::{DirectoryFetcher, FetchConfig, OriginalSources},
    view::{GeneratedView, OriginalView, Span, SpanKind},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "inspect")]
#[command(about = "Show generated code chunk by chunk with the sourcemap mappings covering it", long_about = None)]
struct Args {
    /// Path to the generated (bundled/minified) file
    input: PathBuf,

    /// Path to the sourcemap (defaults to <input>.map)
    #[arg(long, short)]
    map: Option<PathBuf>,

    /// 0-based generated line to show (defaults to printing index statistics only)
    #[arg(long, short)]
    line: Option<usize>,

    /// 0-based column chunk to show (defaults to every chunk of the line)
    #[arg(long, short)]
    chunk: Option<usize>,

    /// Show the original source around each mapped span, loading files missing from the map
    /// below this directory
    #[arg(long)]
    source_root: Option<PathBuf>,

    /// Prefix removed from source names before resolving them below --source-root
    #[arg(long)]
    strip_prefix: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let map_path = args
        .map
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.map", args.input.display())));

    let started = Instant::now();
    let code = fs::read_to_string(&args.input)?;
    let document = fs::read(&map_path)?;

    let pending = SourceMapBuffer::load(document);
    let text = TextBuffer::new(code);
    let map = pending.wait()?;

    println!(
        "indexed {} in {:?}",
        args.input.display(),
        started.elapsed()
    );
    println!(
        "lines: {}  max line length: {}  mapped lines: {}  chunks: {}  records: {}",
        text.line_count(),
        text.max_line_length(),
        map.line_count(),
        map.max_chunk_count(),
        map.record_count()
    );

    let Some(line) = args.line else {
        return Ok(());
    };

    let view = GeneratedView::new(&text, &map);
    let chunks = match args.chunk {
        Some(chunk) => chunk..chunk.saturating_add(1),
        None => 0..text.line_len(line)?.div_ceil(mapview::CHUNK_WIDTH as usize),
    };

    let mut sources = args.source_root.map(|root| {
        OriginalSources::new(
            &map,
            DirectoryFetcher::new(FetchConfig {
                root,
                strip_prefix: args.strip_prefix.clone(),
            }),
        )
    });

    for chunk in chunks {
        println!("-- line {line} chunk {chunk}");
        for span in view.chunk(line, chunk)? {
            print_span(&span);

            let (Some(sources), Some(record)) = (sources.as_mut(), span.kind.mapping()) else {
                continue;
            };
            let (Some(source), Some(focus)) = (record.source.as_deref(), record.focus()) else {
                continue;
            };
            let Some(original) = sources.load(source)? else {
                println!("      (no source text for {source})");
                continue;
            };
            let original_view = OriginalView::new(&original, Some(focus));
            if let Some((focus_line, focus_chunk)) = original_view.focus_cell() {
                let rendered: String = original_view
                    .chunk(focus_line, focus_chunk)?
                    .iter()
                    .map(|s| match s.kind {
                        SpanKind::Focused => format!("[{}]", s.text),
                        _ => s.text.to_owned(),
                    })
                    .collect();
                println!("      {}", rendered.trim_end());
            }
        }
    }

    Ok(())
}

fn print_span(span: &Span<'_>) {
    let label = match span.kind {
        SpanKind::Filler => "filler".to_owned(),
        SpanKind::Unknown => "unknown".to_owned(),
        SpanKind::Unmapped(_) => "unmapped".to_owned(),
        SpanKind::Mapped(record) => {
            let mut label = format!(
                "{}:{}:{}",
                record.source.as_deref().unwrap_or_default(),
                record.original_line.unwrap_or_default(),
                record.original_column.unwrap_or_default()
            );
            if let Some(name) = record.name.as_deref() {
                label.push_str(&format!(" ({name})"));
            }
            label
        }
        SpanKind::Source | SpanKind::Focused => "source".to_owned(),
    };
    println!(
        "  {:>5}..{:<5} {:<40} {:?}",
        span.columns.start, span.columns.end, label, span.text
    );
}
