//! Tile grid geometry and rendering.
//!
//! Geometry is computed fresh every frame from the active preset; the
//! same rect list doubles as the mouse hit-testing table, so what you
//! click is exactly what was drawn.

use gridwatch_core::threshold::WarnState;
use gridwatch_core::{Slot, TileReading};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Sparkline};

use crate::rate_fmt;
use crate::theme;

// ── Geometry ────────────────────────────────────────────────────────

/// Split the grid area into `columns × rows` tile rects, row-major —
/// the same order as page cell indices.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub fn tile_rects(area: Rect, columns: usize, rows: usize) -> Vec<Rect> {
    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows as u32); rows]).split(area);

    let mut rects = Vec::with_capacity(columns * rows);
    for row_area in row_areas.iter() {
        let col_areas =
            Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns])
                .split(*row_area);
        rects.extend(col_areas.iter().copied());
    }
    rects
}

/// Which tile (page cell index) is under the given position, if any.
pub fn hit_test(rects: &[Rect], x: u16, y: u16) -> Option<usize> {
    rects
        .iter()
        .position(|rect| rect.contains(Position::new(x, y)))
}

/// The drag handle is the tile's top border row (where the title sits).
pub fn is_drag_handle(rect: Rect, y: u16) -> bool {
    y == rect.y
}

// ── Tile rendering ──────────────────────────────────────────────────

/// Everything the render path needs for one tile, assembled per frame.
pub struct TileView<'a> {
    pub slot: Option<&'a Slot>,
    pub reading: Option<&'a TileReading>,
    pub warn: WarnState,
    pub stale: bool,
    pub stale_age_ms: i64,
    /// Device no longer resolves against the registry snapshot.
    pub missing: bool,
    /// Device resolves but reports offline.
    pub offline: bool,
    pub title: String,
    pub selected: bool,
    pub drag_source: bool,
    pub drag_target: bool,
}

pub fn render_tile(frame: &mut Frame, rect: Rect, tile: &TileView) {
    let border_style = if tile.drag_source || tile.drag_target {
        theme::border_drag()
    } else if tile.warn.any() {
        theme::border_warn()
    } else if tile.selected {
        theme::border_selected()
    } else {
        theme::border_default()
    };

    let border_type = if tile.selected || tile.drag_target {
        BorderType::Thick
    } else {
        BorderType::Rounded
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title(Line::styled(tile.title.clone(), theme::title_style()));

    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let Some(slot) = tile.slot else {
        let hint = Paragraph::new(Line::styled("unassigned", theme::dim()));
        frame.render_widget(hint, inner);
        return;
    };

    if tile.missing {
        let msg = Paragraph::new(vec![
            Line::styled("device missing", theme::error_style()),
            Line::styled(slot.device.to_string(), theme::dim()),
        ]);
        frame.render_widget(msg, inner);
        return;
    }

    // Rates line, sparklines, status line (when the tile is tall enough).
    let with_status = inner.height >= 4 && (tile.stale || tile.offline);
    let spark_height = inner
        .height
        .saturating_sub(1 + u16::from(with_status))
        .max(1);
    let rx_height = spark_height.div_ceil(2);
    let tx_height = spark_height - rx_height;

    let areas = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(rx_height),
        Constraint::Length(tx_height),
        Constraint::Length(u16::from(with_status)),
    ])
    .split(inner);

    frame.render_widget(rates_line(tile), areas[0]);

    if let Some(reading) = tile.reading {
        if areas[1].height > 0 {
            render_sparkline(frame, areas[1], &reading.rx_history, theme::rx_style());
        }
        if areas[2].height > 0 {
            render_sparkline(frame, areas[2], &reading.tx_history, theme::tx_style());
        }
    }

    if with_status {
        let status = if tile.offline {
            Line::styled("offline", theme::error_style())
        } else {
            Line::styled(
                format!("stale {}", rate_fmt::fmt_age_ms(tile.stale_age_ms)),
                theme::stale_style(),
            )
        };
        frame.render_widget(Paragraph::new(status), areas[3]);
    }
}

fn rates_line(tile: &TileView<'_>) -> Paragraph<'static> {
    let (rx, tx) = tile
        .reading
        .map_or((None, None), |r| (r.rx_bps, r.tx_bps));

    let mut spans = vec![
        Span::styled(format!("▼ {}", rate_fmt::fmt_bps_opt(rx)), theme::rx_style()),
    ];
    if tile.warn.rx {
        spans.push(Span::styled(" !", theme::error_style()));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("▲ {}", rate_fmt::fmt_bps_opt(tx)),
        theme::tx_style(),
    ));
    if tile.warn.tx {
        spans.push(Span::styled(" !", theme::error_style()));
    }

    Paragraph::new(Line::from(spans))
}

fn render_sparkline(frame: &mut Frame, area: Rect, history: &[u64], style: ratatui::style::Style) {
    // Latest samples, right-aligned into the visible width.
    let width = usize::from(area.width);
    let start = history.len().saturating_sub(width);
    let spark = Sparkline::default()
        .data(history[start..].iter().copied())
        .style(style);
    frame.render_widget(spark, area);
}
