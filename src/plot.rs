//! Scatter plots rendered in the terminal with `ratatui`.
//!
//! A [`ScatterPlot`] is a plain description (bounds, points, labels) built
//! from the track table; [`render`] draws it into any ratatui frame and
//! [`show`] opens it full screen until a key is pressed.

use std::io;

use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::canvas::{Canvas, Line as CanvasLine},
    widgets::{Block, Paragraph},
    Frame, Terminal,
};

use crate::error::Result;
use crate::report::popularity_extremes;
use crate::track::TrackRecord;

/// Glyphs for small, medium and large points.
const SIZE_GLYPHS: [&str; 3] = ["·", "•", "●"];

/// Viridis colour stops, dark purple to yellow.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

const AXIS_COLOR: Color = Color::DarkGray;

#[derive(Debug, Clone, PartialEq)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub glyph: &'static str,
    pub color: Color,
    /// Text drawn one unit above the point
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPlot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub points: Vec<PlotPoint>,
    pub legend: Option<String>,
}

// ── Scaling helpers ──────────────────────────────────────────────────────────

/// Data range padded by 10 % on each side. A flat range gets a fixed margin.
fn padded_bounds(values: impl Iterator<Item = f64>, flat_margin: f64) -> [f64; 2] {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let span = max - min;
    if span <= f64::EPSILON {
        [min - flat_margin, max + flat_margin]
    } else {
        [min - span * 0.1, max + span * 0.1]
    }
}

/// Popularity axis: padded range, never below zero, room above for labels.
fn popularity_bounds(records: &[TrackRecord]) -> [f64; 2] {
    let [lo, hi] = padded_bounds(records.iter().map(|r| r.popularity as f64), 5.0);
    [lo.max(0.0), hi.max(lo + 1.0) + 2.0]
}

/// Position of `value` within the min..max of `values`, 0.5 when flat.
fn normalize(value: f64, values: impl Iterator<Item = f64> + Clone) -> f64 {
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    if max - min <= f64::EPSILON {
        0.5
    } else {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    }
}

fn viridis(t: f64) -> Color {
    let scaled = t.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - i as f64;
    let (r0, g0, b0) = VIRIDIS[i];
    let (r1, g1, b1) = VIRIDIS[i + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    Color::Rgb(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

fn size_glyph(t: f64) -> &'static str {
    let tier = ((t * SIZE_GLYPHS.len() as f64) as usize).min(SIZE_GLYPHS.len() - 1);
    SIZE_GLYPHS[tier]
}

fn tick(value: f64, span: f64) -> String {
    if span >= 10.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

// ── Plot builders ────────────────────────────────────────────────────────────

/// Song duration against popularity, one uniform point per track.
pub fn duration_vs_popularity(records: &[TrackRecord]) -> ScatterPlot {
    ScatterPlot {
        title: "Song Duration vs Popularity".to_string(),
        x_label: "Duration (seconds)".to_string(),
        y_label: "Popularity".to_string(),
        x_bounds: padded_bounds(records.iter().map(|r| r.duration_seconds), 10.0),
        y_bounds: popularity_bounds(records),
        points: records
            .iter()
            .map(|r| PlotPoint {
                x: r.duration_seconds,
                y: r.popularity as f64,
                glyph: SIZE_GLYPHS[2],
                color: Color::LightBlue,
                label: None,
            })
            .collect(),
        legend: None,
    }
}

/// Valence against popularity. Point size follows energy, colour follows
/// popularity, and the most and least popular tracks are labelled.
pub fn valence_vs_popularity(records: &[TrackRecord]) -> ScatterPlot {
    let energies = records.iter().map(|r| r.energy);
    let popularities = records.iter().map(|r| r.popularity as f64);

    let mut points: Vec<PlotPoint> = records
        .iter()
        .map(|r| PlotPoint {
            x: r.valence,
            y: r.popularity as f64,
            glyph: size_glyph(normalize(r.energy, energies.clone())),
            color: viridis(normalize(r.popularity as f64, popularities.clone())),
            label: None,
        })
        .collect();

    if let Some(extremes) = popularity_extremes(records) {
        for index in [extremes.most_popular, extremes.least_popular] {
            points[index].label = Some(records[index].name.clone());
        }
    }

    ScatterPlot {
        title: "Song Valence vs Popularity with Enhanced Visualization".to_string(),
        x_label: "Valence (happiness)".to_string(),
        y_label: "Popularity".to_string(),
        x_bounds: padded_bounds(records.iter().map(|r| r.valence), 0.1),
        y_bounds: popularity_bounds(records),
        points,
        legend: Some("Popularity and Energy: size = energy, colour = popularity".to_string()),
    }
}

// ── Rendering ────────────────────────────────────────────────────────────────

/// Place `labels` at the left edge, centre and right edge of `width` columns.
fn spread_labels(width: usize, left: &str, middle: &str, right: &str) -> String {
    let mut row = vec![' '; width];
    let mut put = |start: usize, text: &str| {
        for (offset, c) in text.chars().enumerate() {
            if let Some(cell) = row.get_mut(start + offset) {
                *cell = c;
            }
        }
    };
    put(0, left);
    put((width / 2).saturating_sub(middle.chars().count() / 2), middle);
    put(width.saturating_sub(right.chars().count()), right);
    row.into_iter().collect()
}

/// Draw the plot, with axes and tick labels, into `area`.
pub fn render(frame: &mut Frame, area: Rect, plot: &ScatterPlot) {
    let mut block = Block::bordered()
        .title(Line::from(format!(" {} ", plot.title)).alignment(Alignment::Center))
        .title_bottom(Line::from(" q/Esc/Enter: close ").alignment(Alignment::Right));
    if let Some(legend) = &plot.legend {
        block = block.title_bottom(Line::from(format!(" {} ", legend)).alignment(Alignment::Left));
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [x_lo, x_hi] = plot.x_bounds;
    let [y_lo, y_hi] = plot.y_bounds;
    let (x_span, y_span) = (x_hi - x_lo, y_hi - y_lo);

    let y_ticks = [
        tick(y_hi, y_span),
        tick((y_lo + y_hi) / 2.0, y_span),
        tick(y_lo, y_span),
    ];
    let tick_width = y_ticks.iter().map(|t| t.len()).max().unwrap_or(1) as u16 + 1;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(tick_width), Constraint::Min(10)])
        .split(rows[1]);
    let (y_axis, chart) = (body[0], body[1]);

    frame.render_widget(Paragraph::new(plot.y_label.as_str()), rows[0]);

    let mut y_lines = vec![Line::from(""); y_axis.height as usize];
    if let Some(last) = y_lines.len().checked_sub(1) {
        y_lines[last / 2] = Line::from(y_ticks[1].clone());
        y_lines[0] = Line::from(y_ticks[0].clone());
        y_lines[last] = Line::from(y_ticks[2].clone());
    }
    frame.render_widget(
        Paragraph::new(y_lines).alignment(Alignment::Right),
        Rect { width: y_axis.width.saturating_sub(1), ..y_axis },
    );

    let x_axis = Rect { x: chart.x, width: chart.width, ..rows[2] };
    frame.render_widget(
        Paragraph::new(spread_labels(
            chart.width as usize,
            &tick(x_lo, x_span),
            &tick((x_lo + x_hi) / 2.0, x_span),
            &tick(x_hi, x_span),
        )),
        x_axis,
    );
    frame.render_widget(
        Paragraph::new(plot.x_label.as_str()).alignment(Alignment::Center),
        Rect { x: chart.x, width: chart.width, ..rows[3] },
    );

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds(plot.x_bounds)
        .y_bounds(plot.y_bounds)
        .paint(|ctx| {
            ctx.draw(&CanvasLine { x1: x_lo, y1: y_lo, x2: x_hi, y2: y_lo, color: AXIS_COLOR });
            ctx.draw(&CanvasLine { x1: x_lo, y1: y_lo, x2: x_lo, y2: y_hi, color: AXIS_COLOR });
            ctx.layer();
            for point in &plot.points {
                ctx.print(point.x, point.y, Span::styled(point.glyph, Style::default().fg(point.color)));
            }
            for point in &plot.points {
                if let Some(label) = &point.label {
                    ctx.print(
                        point.x,
                        point.y + 1.0,
                        Span::styled(label.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    );
                }
            }
        });
    frame.render_widget(canvas, chart);
}

/// Raw mode and the alternate screen, restored when dropped.
struct ScreenGuard;

impl ScreenGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        // from here on any early return restores the terminal
        let guard = ScreenGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = disable_raw_mode();
    }
}

/// Redraw on every event until q, Esc or Enter is pressed.
fn run_plot<B: Backend>(
    terminal: &mut Terminal<B>,
    plot: &ScatterPlot,
    mut next_event: impl FnMut() -> io::Result<Event>,
) -> Result<()> {
    loop {
        terminal
            .draw(|frame| render(frame, frame.area(), plot))
            .map_err(|e| io::Error::other(e.to_string()))?;
        match next_event()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter) {
                    return Ok(());
                }
            }
            // resize and everything else just redraws
            _ => {}
        }
    }
}

/// Show the plot full screen and block until q, Esc or Enter is pressed.
pub fn show(plot: &ScatterPlot) -> Result<()> {
    let _screen = ScreenGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    run_plot(&mut terminal, plot, event::read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};
    use crossterm::terminal::is_raw_mode_enabled;
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn example() -> Vec<TrackRecord> {
        vec![
            TrackRecord::new("Airbag", 50, 200_000, 0.8, 0.6),
            TrackRecord::new("Nude", 10, 180_000, 0.2, 0.3),
            TrackRecord::new("Creep", 90, 220_000, 0.5, 0.9),
        ]
    }

    fn draw(plot: &ScatterPlot) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, frame.area(), plot)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_duration_plot_points() {
        let plot = duration_vs_popularity(&example());
        let coords: Vec<(f64, f64)> = plot.points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(200.0, 50.0), (180.0, 10.0), (220.0, 90.0)]);
        assert!(plot.points.iter().all(|p| p.label.is_none()));
        assert_eq!(plot.x_label, "Duration (seconds)");
        assert!(plot.x_bounds[0] < 180.0 && plot.x_bounds[1] > 220.0);
        assert!(plot.y_bounds[0] >= 0.0 && plot.y_bounds[1] > 90.0);
    }

    #[test]
    fn test_valence_plot_labels_extremes() {
        let plot = valence_vs_popularity(&example());
        let labels: Vec<Option<&str>> = plot.points.iter().map(|p| p.label.as_deref()).collect();
        assert_eq!(labels, vec![None, Some("Nude"), Some("Creep")]);
    }

    #[test]
    fn test_valence_plot_size_and_colour() {
        let plot = valence_vs_popularity(&example());
        // lowest energy smallest, highest energy largest
        assert_eq!(plot.points[1].glyph, "·");
        assert_eq!(plot.points[2].glyph, "●");
        // colour ramp ends
        assert_eq!(plot.points[1].color, Color::Rgb(68, 1, 84));
        assert_eq!(plot.points[2].color, Color::Rgb(253, 231, 37));
    }

    #[test]
    fn test_single_track_labelled_once() {
        let records = vec![TrackRecord::new("Reckoner", 70, 290_000, 0.3, 0.5)];
        let plot = valence_vs_popularity(&records);
        assert_eq!(plot.points.len(), 1);
        assert_eq!(plot.points[0].label.as_deref(), Some("Reckoner"));
        assert!(plot.x_bounds[0] < 0.3 && plot.x_bounds[1] > 0.3);
        assert!(plot.y_bounds[0] < 70.0 && plot.y_bounds[1] > 70.0);
    }

    #[test]
    fn test_viridis_midpoint() {
        assert_eq!(viridis(0.5), Color::Rgb(33, 145, 140));
        assert_eq!(viridis(-1.0), Color::Rgb(68, 1, 84));
        assert_eq!(viridis(2.0), Color::Rgb(253, 231, 37));
    }

    #[test]
    fn test_spread_labels() {
        assert_eq!(spread_labels(11, "0", "5", "10"), "0    5   10");
        assert_eq!(spread_labels(2, "abc", "", ""), "ab");
    }

    #[test]
    fn test_render_shows_annotations_and_axes() {
        let text = draw(&valence_vs_popularity(&example()));
        assert!(text.contains("Song Valence vs Popularity"));
        assert!(text.contains("Valence (happiness)"));
        assert!(text.contains("Creep"));
        assert!(text.contains("Nude"));
        assert!(!text.contains("Airbag"));
    }

    #[test]
    fn test_render_duration_plot() {
        let text = draw(&duration_vs_popularity(&example()));
        assert!(text.contains("Song Duration vs Popularity"));
        assert!(text.contains("Duration (seconds)"));
        assert!(text.contains("Popularity"));
    }

    #[test]
    fn test_valence_plot_title_and_legend() {
        let plot = valence_vs_popularity(&example());
        assert_eq!(plot.title, "Song Valence vs Popularity with Enhanced Visualization");
        assert!(plot.legend.as_deref().unwrap().starts_with("Popularity and Energy"));

        let text = draw(&plot);
        assert!(text.contains("Song Valence vs Popularity with Enhanced Visualization"));
        assert!(text.contains("Popularity and Energy"));
    }

    #[test]
    fn test_plot_closes_on_key_press_only() {
        let mut events: VecDeque<Event> = VecDeque::from(vec![
            Event::Resize(100, 30),
            key(KeyCode::Char('x')),
            Event::Key(KeyEvent::new_with_kind(
                KeyCode::Char('q'),
                KeyModifiers::NONE,
                KeyEventKind::Release,
            )),
            key(KeyCode::Esc),
            key(KeyCode::Char('q')),
        ]);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let plot = duration_vs_popularity(&example());

        run_plot(&mut terminal, &plot, || {
            events.pop_front().ok_or_else(|| io::Error::other("no more events"))
        })
        .unwrap();

        // Esc closed the view, the trailing q was never read
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_plot_event_error_propagates() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let plot = duration_vs_popularity(&example());
        let result = run_plot(&mut terminal, &plot, || Err(io::Error::other("tty gone")));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[test]
    fn test_screen_guard_restores_raw_mode() {
        // without a tty entering fails, with one the guard is dropped at once;
        // raw mode must be off either way
        if let Ok(guard) = ScreenGuard::enter() {
            drop(guard);
        }
        assert!(!is_raw_mode_enabled().unwrap_or(false));
    }
}
