//! Transient notifications shown above the status bar

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::console::ui::{text_width, Styles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
    Warn,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Success => "✓",
            Severity::Error => "✕",
            Severity::Info => "ℹ",
            Severity::Warn => "⚠",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToastMessage {
    pub severity: Severity,
    pub summary: String,
    pub detail: Option<String>,
}

impl ToastMessage {
    pub fn new(severity: Severity, summary: &str, detail: Option<String>) -> Self {
        Self {
            severity,
            summary: summary.to_string(),
            detail,
        }
    }

    pub fn success(summary: &str, detail: impl Into<String>) -> Self {
        Self::new(Severity::Success, summary, Some(detail.into()))
    }

    pub fn error(summary: &str, detail: impl Into<String>) -> Self {
        Self::new(Severity::Error, summary, Some(detail.into()))
    }

    pub fn info(summary: &str, detail: impl Into<String>) -> Self {
        Self::new(Severity::Info, summary, Some(detail.into()))
    }

    pub fn warn(summary: &str, detail: impl Into<String>) -> Self {
        Self::new(Severity::Warn, summary, Some(detail.into()))
    }
}

/// Toast surface. Holds at most one visible message; a new one supersedes it.
pub struct Toast {
    current: Option<(ToastMessage, Instant)>,
    history: Vec<ToastMessage>,
    max_history: usize,
    life: Duration,
}

impl Toast {
    pub fn new(life: Duration) -> Self {
        Self {
            current: None,
            history: Vec::new(),
            max_history: 50,
            life,
        }
    }

    pub fn show(&mut self, message: ToastMessage) {
        self.show_at(message, Instant::now());
    }

    pub fn show_at(&mut self, message: ToastMessage, now: Instant) {
        self.dismiss();
        self.current = Some((message, now));
    }

    pub fn dismiss(&mut self) {
        if let Some((previous, _)) = self.current.take() {
            self.history.push(previous);
            if self.history.len() > self.max_history {
                self.history.remove(0);
            }
        }
    }

    /// Drop the current message once its life has elapsed. Returns whether it did.
    pub fn expire(&mut self, now: Instant) -> bool {
        let expired = matches!(&self.current, Some((_, shown)) if now.duration_since(*shown) >= self.life);
        if expired {
            self.dismiss();
        }
        expired
    }

    pub fn current(&self) -> Option<&ToastMessage> {
        self.current.as_ref().map(|(m, _)| m)
    }

    pub fn history(&self) -> &[ToastMessage] {
        &self.history
    }

    /// Draw the toast in the top-right corner of `area`
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let Some(message) = self.current() else {
            return;
        };

        let style = match message.severity {
            Severity::Success => Styles::success(),
            Severity::Error => Styles::error(),
            Severity::Info => Styles::info(),
            Severity::Warn => Styles::warning(),
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{} ", message.severity.icon()), style),
            Span::styled(message.summary.clone(), Styles::title()),
        ])];
        if let Some(detail) = &message.detail {
            lines.extend(detail.lines().map(|l| Line::from(l.to_string())));
        }

        let widest = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| text_width(&s.content)).sum::<usize>())
            .max()
            .unwrap_or(0) as u16;
        let width = (widest + 4).max(24).min(area.width);
        let height = (lines.len() as u16 + 2).min(area.height);
        let toast_area = Rect {
            x: area.x + area.width.saturating_sub(width + 1),
            y: area.y,
            width,
            height,
        };

        f.render_widget(Clear, toast_area);
        let toast = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).border_style(style));
        f.render_widget(toast, toast_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_expires_after_life() {
        let mut toast = Toast::new(Duration::from_millis(3000));
        let start = Instant::now();
        toast.show_at(ToastMessage::success("Sucesso", "ok"), start);

        assert!(!toast.expire(start + Duration::from_millis(2999)));
        assert!(toast.current().is_some());
        assert!(toast.expire(start + Duration::from_millis(3000)));
        assert!(toast.current().is_none());
        assert_eq!(toast.history().len(), 1);
    }

    #[test]
    fn test_new_toast_supersedes_current() {
        let mut toast = Toast::new(Duration::from_secs(3));
        toast.show(ToastMessage::info("Info", "first"));
        toast.show(ToastMessage::warn("Campos obrigatórios", "Nome é obrigatório"));

        let current = toast.current().unwrap();
        assert_eq!(current.severity, Severity::Warn);
        assert_eq!(toast.history()[0].detail.as_deref(), Some("first"));
    }
}
