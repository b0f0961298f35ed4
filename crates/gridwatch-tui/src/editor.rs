//! Slot editor modal — device picker → interface picker → thresholds.
//!
//! The interface list comes from interface discovery, cached per device
//! for the session by the app. Threshold values are authored in human
//! units and converted to raw bits per second on save; re-opening an
//! existing slot converts back to the largest unit that stays ≥ 1.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use gridwatch_core::threshold::{self, RateUnit};
use gridwatch_core::{DeviceId, DeviceSummary, InterfaceInfo, Slot};

use crate::theme;

/// What the app should do after a key was routed into the editor.
pub enum EditorOutcome {
    /// Editor consumed the key; nothing else to do.
    Open,
    /// User backed all the way out.
    Cancelled,
    /// A device was picked — the app resolves its interface list
    /// (session cache or a loud discovery call) and calls
    /// [`Editor::interfaces_loaded`].
    FetchInterfaces(DeviceId),
    /// Editing finished; bind this slot at [`Editor::slot_index`].
    Save(Slot),
    /// Threshold input failed validation; surface and stay open.
    Invalid(String),
}

enum Step {
    PickDevice {
        selected: usize,
    },
    PickInterface {
        selected: usize,
    },
    Thresholds {
        rx: Input,
        tx: Input,
        rx_unit: RateUnit,
        tx_unit: RateUnit,
        focus_tx: bool,
    },
}

/// Modal state machine for binding one tile.
pub struct Editor {
    /// Global slot index being edited.
    pub slot_index: usize,
    existing: Option<Slot>,
    device: Option<DeviceId>,
    interfaces: Vec<InterfaceInfo>,
    interface_name: Option<String>,
    step: Step,
}

impl Editor {
    pub fn new(slot_index: usize, existing: Option<Slot>, devices: &[DeviceSummary]) -> Self {
        let selected = existing
            .as_ref()
            .and_then(|slot| devices.iter().position(|d| d.id == slot.device))
            .unwrap_or(0);
        Self {
            slot_index,
            existing,
            device: None,
            interfaces: Vec::new(),
            interface_name: None,
            step: Step::PickDevice { selected },
        }
    }

    /// Feed the interface list for the picked device.
    pub fn interfaces_loaded(&mut self, interfaces: Vec<InterfaceInfo>) {
        let selected = self
            .existing
            .as_ref()
            .filter(|slot| Some(&slot.device) == self.device.as_ref())
            .and_then(|slot| interfaces.iter().position(|i| i.name == slot.interface))
            .unwrap_or(0);
        self.interfaces = interfaces;
        self.step = Step::PickInterface { selected };
    }

    pub fn handle_key(&mut self, key: KeyEvent, devices: &[DeviceSummary]) -> EditorOutcome {
        // Commit is handled before the step match so validation can
        // borrow the whole editor.
        if matches!(self.step, Step::Thresholds { .. }) && key.code == KeyCode::Enter {
            return self.save();
        }

        match &mut self.step {
            Step::PickDevice { selected } => match key.code {
                KeyCode::Esc => EditorOutcome::Cancelled,
                KeyCode::Up => {
                    *selected = selected.saturating_sub(1);
                    EditorOutcome::Open
                }
                KeyCode::Down => {
                    if *selected + 1 < devices.len() {
                        *selected += 1;
                    }
                    EditorOutcome::Open
                }
                KeyCode::Enter => match devices.get(*selected) {
                    Some(device) => {
                        self.device = Some(device.id.clone());
                        EditorOutcome::FetchInterfaces(device.id.clone())
                    }
                    None => EditorOutcome::Open,
                },
                _ => EditorOutcome::Open,
            },
            Step::PickInterface { selected } => match key.code {
                KeyCode::Esc => {
                    self.step = Step::PickDevice { selected: 0 };
                    EditorOutcome::Open
                }
                KeyCode::Up => {
                    *selected = selected.saturating_sub(1);
                    EditorOutcome::Open
                }
                KeyCode::Down => {
                    if *selected + 1 < self.interfaces.len() {
                        *selected += 1;
                    }
                    EditorOutcome::Open
                }
                KeyCode::Enter => {
                    let Some(name) = self.interfaces.get(*selected).map(|i| i.name.clone())
                    else {
                        return EditorOutcome::Open;
                    };
                    let step = thresholds_step(
                        self.existing.as_ref(),
                        self.device.as_ref(),
                        &name,
                    );
                    self.interface_name = Some(name);
                    self.step = step;
                    EditorOutcome::Open
                }
                _ => EditorOutcome::Open,
            },
            Step::Thresholds {
                rx,
                tx,
                rx_unit,
                tx_unit,
                focus_tx,
            } => match key.code {
                KeyCode::Esc => {
                    self.step = Step::PickInterface { selected: 0 };
                    EditorOutcome::Open
                }
                KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                    *focus_tx = !*focus_tx;
                    EditorOutcome::Open
                }
                KeyCode::Char('u') => {
                    if *focus_tx {
                        *tx_unit = tx_unit.next();
                    } else {
                        *rx_unit = rx_unit.next();
                    }
                    EditorOutcome::Open
                }
                _ => {
                    let input = if *focus_tx { tx } else { rx };
                    input.handle_event(&crossterm::event::Event::Key(key));
                    EditorOutcome::Open
                }
            },
        }
    }

    fn save(&self) -> EditorOutcome {
        let Step::Thresholds {
            rx,
            tx,
            rx_unit,
            tx_unit,
            ..
        } = &self.step
        else {
            return EditorOutcome::Open;
        };
        let (Some(device), Some(interface)) = (self.device.clone(), self.interface_name.clone())
        else {
            return EditorOutcome::Open;
        };

        let warn_rx = match parse_threshold(rx.value(), *rx_unit) {
            Ok(value) => value,
            Err(msg) => return EditorOutcome::Invalid(msg),
        };
        let warn_tx = match parse_threshold(tx.value(), *tx_unit) {
            Ok(value) => value,
            Err(msg) => return EditorOutcome::Invalid(msg),
        };

        let mut slot = Slot::new(device, interface);
        slot.warn_below_rx_bps = warn_rx;
        slot.warn_below_tx_bps = warn_tx;
        EditorOutcome::Save(slot)
    }

    // ── Rendering ────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect, devices: &[DeviceSummary]) {
        let modal = centered(area, 52, 14);
        frame.render_widget(Clear, modal);

        let (title, hint) = match &self.step {
            Step::PickDevice { .. } => {
                ("bind tile — pick device", "↑↓ move · enter pick · esc close")
            }
            Step::PickInterface { .. } => {
                ("bind tile — pick interface", "↑↓ move · enter pick · esc back")
            }
            Step::Thresholds { .. } => (
                "warn thresholds (blank = off)",
                "type value · u unit · tab switch · enter save",
            ),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_selected())
            .title(Line::styled(title, theme::title_style()));
        let inner = block.inner(modal);
        frame.render_widget(block, modal);

        let areas = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

        match &self.step {
            Step::PickDevice { selected } => {
                let items: Vec<ListItem> = devices
                    .iter()
                    .map(|device| {
                        let marker = if device.online { "●" } else { "○" };
                        ListItem::new(format!("{marker} {} ({})", device.identity, device.id))
                    })
                    .collect();
                render_list(frame, areas[0], items, *selected);
            }
            Step::PickInterface { selected } => {
                let items: Vec<ListItem> = self
                    .interfaces
                    .iter()
                    .map(|interface| {
                        let state = if interface.disabled {
                            "disabled"
                        } else if interface.running {
                            "running"
                        } else {
                            "down"
                        };
                        ListItem::new(format!("{}  [{}] {}", interface.name, interface.kind, state))
                    })
                    .collect();
                render_list(frame, areas[0], items, *selected);
            }
            Step::Thresholds {
                rx,
                tx,
                rx_unit,
                tx_unit,
                focus_tx,
            } => {
                let rows = Layout::vertical([Constraint::Length(1), Constraint::Length(1)])
                    .split(areas[0]);
                frame.render_widget(threshold_line("rx", rx, *rx_unit, !*focus_tx), rows[0]);
                frame.render_widget(threshold_line("tx", tx, *tx_unit, *focus_tx), rows[1]);
            }
        }

        frame.render_widget(Paragraph::new(Line::styled(hint, theme::dim())), areas[1]);
    }
}

/// Build the thresholds step, prefilled when re-editing the same
/// (device, interface) binding.
fn thresholds_step(
    existing: Option<&Slot>,
    device: Option<&DeviceId>,
    interface: &str,
) -> Step {
    let previous =
        existing.filter(|slot| Some(&slot.device) == device && slot.interface == interface);

    let (rx, rx_unit) = prefill(previous.and_then(|s| s.warn_below_rx_bps));
    let (tx, tx_unit) = prefill(previous.and_then(|s| s.warn_below_tx_bps));

    Step::Thresholds {
        rx,
        tx,
        rx_unit,
        tx_unit,
        focus_tx: false,
    }
}

fn prefill(bps: Option<u64>) -> (Input, RateUnit) {
    match bps {
        Some(bps) => {
            let (value, unit) = threshold::display_rate(bps);
            // Trim a trailing ".0" so round numbers read clean.
            let mut text = format!("{value}");
            if let Some(stripped) = text.strip_suffix(".0") {
                text = stripped.to_owned();
            }
            (Input::new(text), unit)
        }
        None => (Input::default(), RateUnit::default()),
    }
}

fn parse_threshold(raw: &str, unit: RateUnit) -> Result<Option<u64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value > 0.0 => Ok(Some(threshold::to_bps(value, unit))),
        Ok(_) => Err(format!("threshold must be positive: {trimmed:?}")),
        Err(_) => Err(format!("not a number: {trimmed:?}")),
    }
}

fn threshold_line<'a>(
    label: &'a str,
    input: &'a Input,
    unit: RateUnit,
    focused: bool,
) -> Paragraph<'a> {
    let cursor = if focused { "▏" } else { " " };
    let style = if focused {
        theme::title_style()
    } else {
        theme::dim()
    };
    Paragraph::new(Line::from(vec![
        Span::styled(format!("warn below {label}: "), style),
        Span::raw(input.value().to_owned()),
        Span::styled(cursor, style),
        Span::styled(format!(" {unit}"), style),
    ]))
}

fn render_list(frame: &mut Frame, area: Rect, items: Vec<ListItem>, selected: usize) {
    let list = List::new(items)
        .highlight_style(theme::title_style())
        .highlight_symbol("▸ ");
    let mut state = ListState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Center a `width × height` rect inside `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_threshold_is_off() {
        assert_eq!(parse_threshold("", RateUnit::Mbps).unwrap(), None);
        assert_eq!(parse_threshold("   ", RateUnit::Mbps).unwrap(), None);
    }

    #[test]
    fn thresholds_convert_at_edit_time() {
        assert_eq!(
            parse_threshold("2.5", RateUnit::Mbps).unwrap(),
            Some(2_500_000)
        );
        assert_eq!(parse_threshold("750", RateUnit::Kbps).unwrap(), Some(750_000));
        assert_eq!(
            parse_threshold("1", RateUnit::Gbps).unwrap(),
            Some(1_000_000_000)
        );
    }

    #[test]
    fn garbage_thresholds_are_rejected() {
        assert!(parse_threshold("fast", RateUnit::Mbps).is_err());
        assert!(parse_threshold("-3", RateUnit::Mbps).is_err());
        assert!(parse_threshold("0", RateUnit::Mbps).is_err());
    }

    #[test]
    fn prefill_picks_display_unit() {
        let (input, unit) = prefill(Some(40_000_000));
        assert_eq!(input.value(), "40");
        assert_eq!(unit, RateUnit::Mbps);

        let (input, unit) = prefill(None);
        assert_eq!(input.value(), "");
        assert_eq!(unit, RateUnit::Mbps);
    }

    #[test]
    fn picker_flow_reaches_thresholds() {
        use crossterm::event::{KeyEvent, KeyModifiers};

        let devices = vec![DeviceSummary {
            id: DeviceId::new("rb-4011"),
            identity: "core-router".into(),
            host: "10.0.0.1".into(),
            port: 8728,
            online: true,
        }];
        let mut editor = Editor::new(0, None, &devices);

        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert!(matches!(
            editor.handle_key(enter, &devices),
            EditorOutcome::FetchInterfaces(_)
        ));

        editor.interfaces_loaded(vec![InterfaceInfo {
            name: "ether1".into(),
            kind: "ether".into(),
            running: true,
            disabled: false,
        }]);
        assert!(matches!(
            editor.handle_key(enter, &devices),
            EditorOutcome::Open
        ));

        // Blank thresholds save a slot with no warn levels.
        match editor.handle_key(enter, &devices) {
            EditorOutcome::Save(slot) => {
                assert_eq!(slot.device.as_str(), "rb-4011");
                assert_eq!(slot.interface, "ether1");
                assert_eq!(slot.warn_below_rx_bps, None);
            }
            _ => panic!("expected Save"),
        }
    }
}
