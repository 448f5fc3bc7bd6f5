//! Display regions of the widget.
//!
//! A [`DisplaySurface`] owns the status line, the current-conditions
//! block, the hourly strip, the daily grid and the attribution link. Every
//! setter replaces its region wholesale. [`WidgetState`] keeps the painted
//! regions in memory; [`TerminalSurface`] wraps one and presents frames to
//! a writer.

use std::io::Write;

use serde::Serialize;

pub const PLACEHOLDER: &str = "—";
pub const LOADING_TEXT: &str = "Loading...";

const HOURLY_CARDS_PER_ROW: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    #[default]
    Idle,
    Loading,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusLine {
    pub fn loading() -> Self {
        Self {
            text: LOADING_TEXT.to_string(),
            kind: StatusKind::Loading,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: message.into(),
            kind: StatusKind::Error,
        }
    }

    pub fn cleared() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentView {
    pub location_name: String,
    pub location_meta: String,
    pub temperature: String,
    pub description: String,
    pub icon: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub pressure: String,
    pub uv: String,
    pub visibility: String,
}

impl Default for CurrentView {
    fn default() -> Self {
        let dash = || PLACEHOLDER.to_string();
        Self {
            location_name: dash(),
            location_meta: String::new(),
            temperature: dash(),
            description: String::new(),
            icon: String::new(),
            feels_like: dash(),
            humidity: dash(),
            wind: dash(),
            pressure: dash(),
            uv: dash(),
            visibility: dash(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourCard {
    pub hour: String,
    pub icon: String,
    pub temperature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayItem {
    pub day: String,
    pub icon: String,
    pub range: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub href: String,
    pub label: String,
}

pub trait DisplaySurface {
    fn set_status(&mut self, status: StatusLine);
    fn set_current(&mut self, current: CurrentView);
    fn set_hourly(&mut self, cards: Vec<HourCard>);
    fn set_daily(&mut self, items: Vec<DayItem>);
    fn set_attribution(&mut self, attribution: Attribution);

    /// Location name currently on screen, or `None` while the placeholder
    /// is still shown.
    fn displayed_location(&self) -> Option<&str>;

    /// Called once a search sequence has finished painting.
    fn commit(&mut self) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WidgetState {
    pub status: StatusLine,
    pub current: CurrentView,
    pub hourly: Vec<HourCard>,
    pub daily: Vec<DayItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
}

impl DisplaySurface for WidgetState {
    fn set_status(&mut self, status: StatusLine) {
        self.status = status;
    }

    fn set_current(&mut self, current: CurrentView) {
        self.current = current;
    }

    fn set_hourly(&mut self, cards: Vec<HourCard>) {
        self.hourly = cards;
    }

    fn set_daily(&mut self, items: Vec<DayItem>) {
        self.daily = items;
    }

    fn set_attribution(&mut self, attribution: Attribution) {
        self.attribution = Some(attribution);
    }

    fn displayed_location(&self) -> Option<&str> {
        let name = self.current.location_name.trim();
        (!name.is_empty() && name != PLACEHOLDER).then_some(name)
    }
}

impl WidgetState {
    pub fn to_text(&self) -> String {
        let current = &self.current;
        let mut lines = Vec::new();

        if !self.status.text.is_empty() {
            lines.push(status_text(&self.status));
        }

        if current.location_meta.is_empty() {
            lines.push(current.location_name.clone());
        } else {
            lines.push(format!("{} | {}", current.location_name, current.location_meta));
        }
        lines.push(
            [
                current.icon.as_str(),
                current.temperature.as_str(),
                current.description.as_str(),
            ]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        );
        lines.push(format!(
            "feels like {} | humidity {} | wind {}",
            current.feels_like, current.humidity, current.wind
        ));
        lines.push(format!(
            "pressure {} | uv {} | visibility {}",
            current.pressure, current.uv, current.visibility
        ));

        if !self.hourly.is_empty() {
            lines.push(String::new());
            for row in self.hourly.chunks(HOURLY_CARDS_PER_ROW) {
                lines.push(
                    row.iter()
                        .map(|card| format!("{:>5} {} {}", card.hour, card.icon, card.temperature))
                        .collect::<Vec<_>>()
                        .join("  "),
                );
            }
        }

        if !self.daily.is_empty() {
            lines.push(String::new());
            for item in &self.daily {
                lines.push(format!("{} {} {}", item.day, item.icon, item.range));
            }
        }

        if let Some(attribution) = &self.attribution {
            lines.push(String::new());
            lines.push(format!("data: {} ({})", attribution.label, attribution.href));
        }

        lines.join("\n")
    }
}

fn status_text(status: &StatusLine) -> String {
    match status.kind {
        StatusKind::Error => format!("error: {}", status.text),
        StatusKind::Idle | StatusKind::Loading => status.text.clone(),
    }
}

/// Terminal surface: status changes are written as they happen, a full
/// frame is written on commit when regions changed and no error is shown.
#[derive(Debug)]
pub struct TerminalSurface<W: Write> {
    state: WidgetState,
    out: W,
    frame_pending: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: WidgetState::default(),
            out,
            frame_pending: false,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes a line outside the widget regions, e.g. a prompt error.
    pub fn write_notice(&mut self, text: &str) {
        self.write_block(text);
    }

    fn write_block(&mut self, text: &str) {
        if let Err(error) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            tracing::warn!(%error, "failed to write to terminal");
        }
    }
}

impl<W: Write> DisplaySurface for TerminalSurface<W> {
    fn set_status(&mut self, status: StatusLine) {
        if status.kind != StatusKind::Idle {
            let line = status_text(&status);
            self.write_block(&line);
        }
        self.state.set_status(status);
    }

    fn set_current(&mut self, current: CurrentView) {
        self.state.set_current(current);
        self.frame_pending = true;
    }

    fn set_hourly(&mut self, cards: Vec<HourCard>) {
        self.state.set_hourly(cards);
        self.frame_pending = true;
    }

    fn set_daily(&mut self, items: Vec<DayItem>) {
        self.state.set_daily(items);
        self.frame_pending = true;
    }

    fn set_attribution(&mut self, attribution: Attribution) {
        self.state.set_attribution(attribution);
        self.frame_pending = true;
    }

    fn displayed_location(&self) -> Option<&str> {
        self.state.displayed_location()
    }

    fn commit(&mut self) {
        if !self.frame_pending || self.state.status.kind == StatusKind::Error {
            return;
        }
        self.frame_pending = false;
        let frame = self.state.to_text();
        self.write_block(&frame);
    }
}
