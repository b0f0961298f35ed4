//! Application core — event loop, input handling, wallboard rendering.
//!
//! One cooperative loop interleaves terminal events with the watch
//! channels published by the [`Wallboard`] facade. Derived state (page
//! slice, warn flags, staleness) is recomputed fresh on every frame —
//! nothing here caches what it can recompute.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tracing::{debug, info};

use gridwatch_core::threshold;
use gridwatch_core::{
    DeviceId, DeviceSummary, DragController, GridView, InterfaceInfo, PollSettings,
    TelemetrySnapshot, Wallboard,
};

use crate::editor::{Editor, EditorOutcome};
use crate::event::{Event, EventReader};
use crate::grid::{self, TileView};
use crate::term::Term;
use crate::theme;

const TOAST_TTL: Duration = Duration::from_secs(4);

struct Toast {
    message: String,
    error: bool,
    shown_at: Instant,
}

/// Top-level wallboard state and event loop.
pub struct App {
    wallboard: Wallboard,
    view: GridView,
    telemetry: Arc<TelemetrySnapshot>,
    devices: Arc<Vec<DeviceSummary>>,
    settings: PollSettings,
    drag: DragController,
    editor: Option<Editor>,
    /// Interface suggestions per device, cached for the session.
    interface_cache: HashMap<DeviceId, Vec<InterfaceInfo>>,
    toast: Option<Toast>,
    /// Keyboard-selected cell on the active page.
    selected_cell: usize,
    /// Tile rects from the last frame — the mouse hit-testing table.
    tile_rects: Vec<Rect>,
    running: bool,
}

impl App {
    pub fn new(wallboard: Wallboard) -> Self {
        let view = wallboard.grid_view();
        let telemetry = wallboard.telemetry();
        let devices = wallboard.devices();
        let settings = wallboard.settings();
        Self {
            wallboard,
            view,
            telemetry,
            devices,
            settings,
            drag: DragController::new(),
            editor: None,
            interface_cache: HashMap::new(),
            toast: None,
            selected_cell: 0,
            tile_rects: Vec::new(),
            running: true,
        }
    }

    /// Run the main event loop until quit, then tear the session down
    /// (which flushes pending persistence best-effort).
    pub async fn run(&mut self, terminal: &mut Term) -> Result<()> {
        self.wallboard.start();

        let mut events = EventReader::new(Duration::from_millis(250));
        let mut grid_rx = self.wallboard.subscribe_grid();
        let mut telemetry_rx = self.wallboard.subscribe_telemetry();
        let mut devices_rx = self.wallboard.subscribe_devices();
        let mut settings_rx = self.wallboard.subscribe_settings();

        info!("wallboard event loop started");

        while self.running {
            tokio::select! {
                maybe = events.next() => {
                    let Some(event) = maybe else { break };
                    self.handle_event(event).await;
                }
                Ok(()) = grid_rx.changed() => {
                    self.view = grid_rx.borrow_and_update().clone();
                    self.clamp_selection();
                }
                Ok(()) = telemetry_rx.changed() => {
                    self.telemetry = telemetry_rx.borrow_and_update().clone();
                }
                Ok(()) = devices_rx.changed() => {
                    self.devices = devices_rx.borrow_and_update().clone();
                }
                Ok(()) = settings_rx.changed() => {
                    self.settings = *settings_rx.borrow_and_update();
                }
            }

            terminal.draw(|frame| self.render(frame))?;
        }

        self.wallboard.shutdown().await;
        info!("wallboard event loop ended");
        Ok(())
    }

    // ── Event handling ───────────────────────────────────────────────

    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Tick => self.expire_toast(),
            Event::Resize => {}
            Event::Focus(focused) => {
                // Visibility gates polling; an unfocused wallboard costs
                // the backend nothing.
                self.wallboard.set_visible(focused);
                if !focused {
                    self.drag.cancel();
                }
            }
            Event::Key(key) => self.handle_key(key).await,
            Event::Mouse(mouse) => self.handle_mouse(mouse),
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.running = false;
            return;
        }

        // Modal editor captures everything while open.
        if let Some(mut editor) = self.editor.take() {
            match editor.handle_key(key, &self.devices) {
                EditorOutcome::Open => self.editor = Some(editor),
                EditorOutcome::Cancelled => {}
                EditorOutcome::Save(slot) => {
                    self.wallboard.set_slot(editor.slot_index, slot);
                    self.toast_info("tile saved");
                }
                EditorOutcome::Invalid(message) => {
                    self.toast_error(message);
                    self.editor = Some(editor);
                }
                EditorOutcome::FetchInterfaces(device) => {
                    self.load_interfaces(&mut editor, device).await;
                    self.editor = Some(editor);
                }
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('n') | KeyCode::Char(']') => self.wallboard.next_page(),
            KeyCode::Char('p') | KeyCode::Char('[') => self.wallboard.prev_page(),
            KeyCode::Char('g') => self.wallboard.set_layout(self.view.layout.next()),
            KeyCode::Char('i') => self.wallboard.set_interval(self.settings.interval.next()),
            KeyCode::Char(' ') => self.wallboard.toggle_pause(),
            KeyCode::Char('r') => self.refresh_devices().await,
            KeyCode::Char('s') => self.sync_now().await,
            KeyCode::Char('x') | KeyCode::Delete => {
                let global = self.view.global_index(self.selected_cell);
                self.wallboard.clear_slot(global);
            }
            KeyCode::Char('e') | KeyCode::Enter => self.open_editor(),
            KeyCode::Left => self.move_selection(-1, 0),
            KeyCode::Right => self.move_selection(1, 0),
            KeyCode::Up => self.move_selection(0, -1),
            KeyCode::Down => self.move_selection(0, 1),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.editor.is_some() {
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(cell) = grid::hit_test(&self.tile_rects, mouse.column, mouse.row)
                else {
                    return;
                };
                self.selected_cell = cell;
                // Only the title row acts as the drag handle; a press on
                // the tile body just selects.
                if grid::is_drag_handle(self.tile_rects[cell], mouse.row) {
                    let global = self.view.global_index(cell);
                    if self.drag.begin(global) {
                        debug!(source = global, "drag started");
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.drag.is_dragging() {
                    let target = grid::hit_test(&self.tile_rects, mouse.column, mouse.row)
                        .map(|cell| self.view.global_index(cell));
                    self.drag.hover(target);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some((source, target)) = self.drag.release() {
                    if source != target {
                        debug!(source, target, "drag swap");
                        self.wallboard.swap_slots(source, target);
                    }
                }
            }
            _ => {}
        }
    }

    // ── Actions ──────────────────────────────────────────────────────

    fn open_editor(&mut self) {
        let global = self.view.global_index(self.selected_cell);
        let existing = self
            .view
            .slots
            .get(global)
            .and_then(Option::as_ref)
            .cloned();
        if self.devices.is_empty() {
            self.toast_error("no devices known yet — try r to refresh".to_owned());
            return;
        }
        self.editor = Some(Editor::new(global, existing, &self.devices));
    }

    async fn load_interfaces(&mut self, editor: &mut Editor, device: DeviceId) {
        if let Some(cached) = self.interface_cache.get(&device) {
            editor.interfaces_loaded(cached.clone());
            return;
        }
        match self.wallboard.list_interfaces(&device).await {
            Ok(interfaces) => {
                self.interface_cache.insert(device, interfaces.clone());
                editor.interfaces_loaded(interfaces);
            }
            Err(e) => self.toast_error(format!("interface discovery failed: {e}")),
        }
    }

    async fn refresh_devices(&mut self) {
        match self.wallboard.refresh_devices().await {
            Ok(0) => self.toast_info("devices refreshed"),
            Ok(cleared) => self.toast_info(format!("devices refreshed — {cleared} slots cleared")),
            Err(e) => self.toast_error(format!("refresh failed: {e}")),
        }
    }

    async fn sync_now(&mut self) {
        match self.wallboard.sync_now().await {
            Ok(()) => self.toast_info("config synced"),
            Err(e) => self.toast_error(format!("sync failed: {e}")),
        }
    }

    fn move_selection(&mut self, dx: i32, dy: i32) {
        let columns = self.view.layout.columns();
        let capacity = self.view.layout.capacity();
        #[allow(clippy::cast_possible_wrap, clippy::as_conversions)]
        let mut cell = self.selected_cell as i32;
        cell += dx + dy * columns as i32;
        #[allow(clippy::cast_sign_loss, clippy::as_conversions)]
        if cell >= 0 && (cell as usize) < capacity {
            self.selected_cell = cell as usize;
        }
    }

    fn clamp_selection(&mut self) {
        let capacity = self.view.layout.capacity();
        if self.selected_cell >= capacity {
            self.selected_cell = capacity - 1;
        }
    }

    // ── Toasts ───────────────────────────────────────────────────────

    fn toast_info(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            error: false,
            shown_at: Instant::now(),
        });
    }

    fn toast_error(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            error: true,
            shown_at: Instant::now(),
        });
    }

    fn expire_toast(&mut self) {
        if let Some(toast) = &self.toast {
            if toast.shown_at.elapsed() > TOAST_TTL {
                self.toast = None;
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&mut self, frame: &mut Frame) {
        let areas = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

        self.render_header(frame, areas[0]);
        self.render_grid(frame, areas[1]);
        self.render_footer(frame, areas[2]);

        if let Some(editor) = &self.editor {
            editor.render(frame, frame.area(), &self.devices);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" GRIDWATCH ", theme::title_style()),
            Span::styled(
                format!(
                    " {}  page {}/{}  every {}",
                    self.view.layout,
                    self.view.page + 1,
                    self.view.page_count,
                    self.settings.interval,
                ),
                theme::dim(),
            ),
        ];
        if self.settings.paused {
            spans.push(Span::styled("  ⏸ paused", theme::stale_style()));
        }
        if !self.settings.visible {
            spans.push(Span::styled("  unfocused", theme::dim()));
        }
        spans.push(Span::styled(
            format!("  {} devices", self.devices.len()),
            theme::dim(),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    #[allow(clippy::cast_possible_wrap, clippy::as_conversions)]
    fn render_grid(&mut self, frame: &mut Frame, area: Rect) {
        let layout = self.view.layout;
        let rects = grid::tile_rects(area, layout.columns(), layout.rows());
        self.tile_rects = rects.clone();

        let now_ms = chrono::Utc::now().timestamp_millis();
        let page_slots = self.view.page_slots();
        let devices_known = !self.devices.is_empty();

        for (cell, (slot, rect)) in page_slots.iter().zip(rects.iter()).enumerate() {
            let global = self.view.global_index(cell);
            let tile = self.build_tile(*slot, global, cell, now_ms, devices_known);
            grid::render_tile(frame, *rect, &tile);
        }

        // Toast floats over the grid's bottom edge.
        if let Some(toast) = &self.toast {
            let style = if toast.error {
                theme::error_style()
            } else {
                theme::info_style()
            };
            let line = Line::styled(format!(" {} ", toast.message), style);
            let toast_area = Rect::new(
                area.x,
                area.y + area.height.saturating_sub(1),
                area.width,
                1,
            );
            frame.render_widget(Paragraph::new(line), toast_area);
        }
    }

    fn build_tile<'a>(
        &'a self,
        slot: Option<&'a gridwatch_core::Slot>,
        global: usize,
        cell: usize,
        now_ms: i64,
        devices_known: bool,
    ) -> TileView<'a> {
        let reading = slot.and_then(|s| self.telemetry.reading(&s.port_key()));
        let device = slot.and_then(|s| self.devices.iter().find(|d| d.id == s.device));

        let warn = slot.map_or_else(threshold::WarnState::default, |s| {
            threshold::evaluate(s, reading)
        });
        let last_seen = reading.map(|r| r.last_seen_ms);
        let stale = slot.is_some()
            && threshold::is_stale(
                self.settings.paused,
                last_seen,
                now_ms,
                self.settings.interval.as_millis(),
            );

        let title = match (slot, device) {
            (Some(s), Some(d)) => format!(" {} · {} ", d.identity, s.interface),
            (Some(s), None) => format!(" {} · {} ", s.device, s.interface),
            (None, _) => format!(" slot {} ", global + 1),
        };

        TileView {
            slot,
            reading,
            warn,
            stale,
            stale_age_ms: last_seen.map_or(0, |seen| now_ms - seen),
            missing: slot.is_some() && devices_known && device.is_none(),
            offline: device.is_some_and(|d| !d.online),
            title,
            selected: cell == self.selected_cell,
            drag_source: self.drag.source() == Some(global),
            drag_target: self.drag.target() == Some(global),
        }
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let hints = " e edit  x clear  drag title to move  n/p page  g layout  i interval  space pause  r refresh  s sync  q quit";
        frame.render_widget(
            Paragraph::new(Line::styled(hints, theme::dim())),
            area,
        );
    }
}
