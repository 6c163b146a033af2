//! SVG charts of the last month of prices

use crate::api::Quote;
use crate::error::{Result, StockError};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use ta::Next;
use ta::indicators::SimpleMovingAverage;
use tracing::info;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 450.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

/// Kind of chart to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Close price line
    Trend,
    /// Close price with 7 and 30 sample moving averages
    MovingAverage,
    /// Daily traded volume bars
    Volume,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Trend => "trend",
            ChartKind::MovingAverage => "moving_average",
            ChartKind::Volume => "volume",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ChartKind::Trend => "Stock Price Trend (1 Month)",
            ChartKind::MovingAverage => "Moving Averages (1 Month)",
            ChartKind::Volume => "Trading Volume Trend (1 Month)",
        }
    }
}

impl FromStr for ChartKind {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "trend" => Ok(Self::Trend),
            "moving_average" | "ma" => Ok(Self::MovingAverage),
            "volume" => Ok(Self::Volume),
            other => Err(StockError::InvalidInput(format!(
                "invalid chart kind '{other}', use 'trend', 'moving_average' or 'volume'"
            ))),
        }
    }
}

/// Simple moving average over `window` closes; `None` until the window is full
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let Ok(mut sma) = SimpleMovingAverage::new(window) else {
        return vec![None; values.len()];
    };
    values
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let average = sma.next(close);
            (i + 1 >= window).then_some(average)
        })
        .collect()
}

/// Chart file name for a symbol, e.g. `AAPL_trend.svg`
pub fn file_name(symbol: &str, kind: ChartKind) -> String {
    let safe: String = symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}.svg", safe.to_uppercase(), kind.as_str())
}

struct Plot {
    min: f64,
    max: f64,
    count: usize,
}

impl Plot {
    fn new(values: impl Iterator<Item = f64>, count: usize, from_zero: bool) -> Self {
        let (mut min, mut max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if from_zero {
            min = 0.0;
        }
        if (max - min).abs() < f64::EPSILON {
            max = min + 1.0;
        }
        Self { min, max, count }
    }

    fn x(&self, i: usize) -> f64 {
        let span = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        if self.count <= 1 {
            return MARGIN_LEFT + span / 2.0;
        }
        MARGIN_LEFT + span * i as f64 / (self.count - 1) as f64
    }

    fn y(&self, v: f64) -> f64 {
        let span = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        MARGIN_TOP + span * (1.0 - (v - self.min) / (self.max - self.min))
    }

    fn polyline(&self, points: &[Option<f64>], color: &str) -> String {
        let coords: Vec<String> = points
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| format!("{:.1},{:.1}", self.x(i), self.y(v))))
            .collect();
        if coords.is_empty() {
            return String::new();
        }
        format!(
            "<polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"2\" points=\"{}\"/>\n",
            coords.join(" ")
        )
    }
}

/// Render a chart as an SVG document
pub fn render_svg(symbol: &str, kind: ChartKind, quotes: &[Quote]) -> Result<String> {
    if quotes.is_empty() {
        return Err(StockError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "no historical data found for the stock".to_string(),
        });
    }

    let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
    let mut body = String::new();
    let mut legend: Vec<(&str, &str)> = Vec::new();

    let plot = match kind {
        ChartKind::Trend | ChartKind::MovingAverage => {
            let plot = Plot::new(closes.iter().copied(), closes.len(), false);
            let series: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
            body.push_str(&plot.polyline(&series, "#1f77b4"));
            legend.push(("Close Price", "#1f77b4"));

            if kind == ChartKind::MovingAverage {
                let ma7 = moving_average(&closes, 7);
                let ma30 = moving_average(&closes, 30);
                body.push_str(&plot.polyline(&ma7, "#ff7f0e"));
                body.push_str(&plot.polyline(&ma30, "#2ca02c"));
                legend.push(("7-Day MA", "#ff7f0e"));
                legend.push(("30-Day MA", "#2ca02c"));
            }
            plot
        }
        ChartKind::Volume => {
            let plot = Plot::new(quotes.iter().map(|q| q.volume as f64), quotes.len(), true);
            let slot = (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / quotes.len() as f64;
            let bar = (slot * 0.7).max(1.0);
            for (i, q) in quotes.iter().enumerate() {
                let top = plot.y(q.volume as f64);
                let x = MARGIN_LEFT + slot * i as f64 + (slot - bar) / 2.0;
                let _ = writeln!(
                    body,
                    "<rect x=\"{x:.1}\" y=\"{top:.1}\" width=\"{bar:.1}\" height=\"{:.1}\" fill=\"#1f77b4\"/>",
                    plot.y(0.0) - top
                );
            }
            legend.push(("Volume", "#1f77b4"));
            plot
        }
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\" font-family=\"sans-serif\" font-size=\"12\">"
    );
    let _ = writeln!(svg, "<rect width=\"100%\" height=\"100%\" fill=\"white\"/>");
    let _ = writeln!(
        svg,
        "<text x=\"{:.1}\" y=\"24\" text-anchor=\"middle\" font-size=\"16\">{} {}</text>",
        WIDTH / 2.0,
        escape(symbol),
        kind.title()
    );

    // Axes and value labels
    let (left, right) = (MARGIN_LEFT, WIDTH - MARGIN_RIGHT);
    let (top, bottom) = (MARGIN_TOP, HEIGHT - MARGIN_BOTTOM);
    let _ = writeln!(
        svg,
        "<path d=\"M{left},{top} L{left},{bottom} L{right},{bottom}\" stroke=\"#333\" fill=\"none\"/>"
    );
    for v in [plot.min, (plot.min + plot.max) / 2.0, plot.max] {
        let _ = writeln!(
            svg,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>",
            left - 6.0,
            plot.y(v) + 4.0,
            axis_label(v, kind)
        );
    }
    let first = quotes[0].timestamp.format("%Y-%m-%d");
    let last = quotes[quotes.len() - 1].timestamp.format("%Y-%m-%d");
    let _ = writeln!(svg, "<text x=\"{left}\" y=\"{:.1}\">{first}</text>", bottom + 20.0);
    let _ = writeln!(
        svg,
        "<text x=\"{right}\" y=\"{:.1}\" text-anchor=\"end\">{last}</text>",
        bottom + 20.0
    );
    let _ = writeln!(
        svg,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">Date</text>",
        (left + right) / 2.0,
        HEIGHT - 10.0
    );

    svg.push_str(&body);

    for (i, (label, color)) in legend.iter().enumerate() {
        let y = top + 10.0 + 18.0 * i as f64;
        let _ = writeln!(
            svg,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{color}\"/><text x=\"{:.1}\" y=\"{:.1}\">{label}</text>",
            left + 10.0,
            y - 10.0,
            left + 28.0,
            y
        );
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn axis_label(v: f64, kind: ChartKind) -> String {
    match kind {
        ChartKind::Volume if v >= 1e6 => format!("{:.1}M", v / 1e6),
        ChartKind::Volume => format!("{v:.0}"),
        _ => format!("{v:.2}"),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render and write a chart into `dir`, returning the file path
pub fn write_chart(dir: &Path, symbol: &str, kind: ChartKind, quotes: &[Quote]) -> Result<PathBuf> {
    let svg = render_svg(symbol, kind, quotes)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(symbol, kind));
    std::fs::write(&path, svg)?;
    info!(path = %path.display(), kind = kind.as_str(), "Chart written");
    Ok(path)
}
