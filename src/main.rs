use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde_json::{Value, json};
use simplelog::{Config, LevelFilter, WriteLogger};

use pageview::panic_handler;
use pageview::settings;
use pageview::view::{CharPosition, Command, LayoutMode, SizeF, SizingPolicy};
use pageview::{DocumentViewer, FixtureDocument};

const MODES: [LayoutMode; 6] = [
    LayoutMode::SinglePage,
    LayoutMode::Vertical,
    LayoutMode::Horizontal,
    LayoutMode::TilesVertical,
    LayoutMode::TilesHorizontal,
    LayoutMode::TilesLine,
];

const SIZINGS: [SizingPolicy; 4] = [
    SizingPolicy::FitWidth,
    SizingPolicy::FitHeight,
    SizingPolicy::FitBoth,
    SizingPolicy::FixedZoom,
];

#[derive(Parser, Debug)]
#[command(
    name = "pageview",
    version,
    about = "Lay out, select and render paginated documents"
)]
struct Cli {
    /// Document description in JSON
    document: PathBuf,

    /// Layout mode, e.g. vertical or tiles_line
    #[arg(long, value_parser = parse_mode)]
    mode: Option<LayoutMode>,

    /// Sizing policy, e.g. fit_width or fixed_zoom
    #[arg(long, value_parser = parse_sizing)]
    sizing: Option<SizingPolicy>,

    #[arg(long)]
    zoom: Option<f32>,

    /// Viewport in device pixels, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size, default_value = "800x600")]
    viewport: SizeF,

    /// Page to scroll to before running the command
    #[arg(long)]
    page: Option<usize>,

    /// Settings file to use instead of the user config
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "pageview.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print page rectangles and the scroll extent
    Layout,
    /// Select a run of text and print it with its rectangles
    Select {
        start_page: usize,
        start_index: usize,
        end_page: usize,
        end_index: usize,
    },
    /// Paint the visible pages until done and report progress
    Render {
        #[arg(long, default_value_t = 64)]
        max_ticks: usize,
    },
}

fn parse_mode(s: &str) -> Result<LayoutMode, String> {
    MODES
        .into_iter()
        .find(|mode| mode.as_str() == s)
        .ok_or_else(|| format!("unknown layout mode '{s}'"))
}

fn parse_sizing(s: &str) -> Result<SizingPolicy, String> {
    SIZINGS
        .into_iter()
        .find(|sizing| sizing.as_str() == s)
        .ok_or_else(|| format!("unknown sizing policy '{s}'"))
}

fn parse_size(s: &str) -> Result<SizeF, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width: f32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height: f32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok(SizeF::new(width, height))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("cannot create log file {}", cli.log_file.display()))?,
    )?;
    panic_handler::initialize_panic_handler();

    info!("Starting pageview");

    let result = run(&cli);
    if let Err(err) = &result {
        error!("Command failed: {err:?}");
    }
    info!("Shutting down pageview");
    result
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.config {
        Some(path) => settings::load_settings_from_path(path),
        None => settings::load_settings(),
    }

    let document = FixtureDocument::open(&cli.document)
        .with_context(|| format!("failed to open {}", cli.document.display()))?;

    let mut viewer: DocumentViewer<FixtureDocument> =
        DocumentViewer::with_settings(&settings::get_settings());
    if let Some(mode) = cli.mode {
        viewer.apply(Command::SetMode(mode));
    }
    if let Some(sizing) = cli.sizing {
        viewer.apply(Command::SetSizing(sizing));
    }
    if let Some(zoom) = cli.zoom {
        viewer.apply(Command::SetZoom(zoom));
    }
    viewer.apply(Command::SetViewportSize(cli.viewport));
    viewer.open(document);
    if let Some(page) = cli.page {
        viewer.scroll_to_page(page);
    }

    let output = match &cli.action {
        Action::Layout => layout_report(&mut viewer),
        Action::Select {
            start_page,
            start_index,
            end_page,
            end_index,
        } => {
            let start = CharPosition::new(*start_page, *start_index);
            let end = CharPosition::new(*end_page, *end_index);
            select_report(&mut viewer, start, end)?
        }
        Action::Render { max_ticks } => render_report(&mut viewer, *max_ticks)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn layout_report(viewer: &mut DocumentViewer<FixtureDocument>) -> Value {
    let extent = viewer.extent();
    let pages: Vec<Value> = viewer
        .page_rects()
        .iter()
        .enumerate()
        .map(|(page, rect)| {
            json!({
                "page": page,
                "rect": rect.rect,
                "exact": rect.is_computed,
            })
        })
        .collect();
    let visible = viewer
        .visible_range()
        .map(|range| json!([range.start(), range.end()]));
    let state = viewer.view_state();
    json!({
        "mode": state.layout.mode.as_str(),
        "sizing": state.layout.sizing.as_str(),
        "zoom": state.layout.zoom,
        "extent": extent,
        "offset": viewer.offset(),
        "current_page": viewer.current_page(),
        "visible": visible,
        "pages": pages,
    })
}

fn select_report(
    viewer: &mut DocumentViewer<FixtureDocument>,
    start: CharPosition,
    end: CharPosition,
) -> Result<Value> {
    viewer.select_text(start, end)?;
    let text = viewer.selected_text()?;
    let Some(span) = viewer.selection() else {
        return Ok(json!({ "text": text, "rects": [] }));
    };
    let rects: Vec<Value> = span
        .pages()
        .map(|page| json!({ "page": page, "rects": viewer.selected_rects(page) }))
        .collect();
    Ok(json!({
        "span": span.normalized(),
        "text": text,
        "rects": rects,
    }))
}

fn render_report(viewer: &mut DocumentViewer<FixtureDocument>, max_ticks: usize) -> Result<Value> {
    let mut ticks = 0;
    let mut rendered = Vec::new();
    let mut failures = Vec::new();
    let mut restarts = 0;
    let mut complete = false;
    while ticks < max_ticks {
        let report = viewer.paint()?;
        ticks += 1;
        rendered.extend(report.rendered);
        restarts += report.restarts;
        failures.extend(
            report
                .failures
                .into_iter()
                .map(|(page, fault)| json!({ "page": page, "error": fault.to_string() })),
        );
        complete = report.complete;
        if !report.needs_tick {
            break;
        }
    }
    if !complete {
        warn!("rendering not complete after {ticks} ticks");
    }
    let dimensions = viewer.canvas().map(|canvas| canvas.dimensions());
    Ok(json!({
        "ticks": ticks,
        "complete": complete,
        "restarts": restarts,
        "rendered": rendered,
        "failures": failures,
        "canvas": dimensions,
    }))
}
