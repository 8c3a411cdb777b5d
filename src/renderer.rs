use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    QueueableCommand, cursor,
    style::{self, ResetColor, SetForegroundColor},
    terminal,
};
use tokio_util::sync::CancellationToken;

use crate::display::{DisplayConfig, DisplayRecord};
use crate::state::AggregatedState;

pub struct Renderer<W> {
    out: W,
    state: Arc<AggregatedState>,
    config: DisplayConfig,
    period: Duration,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, state: Arc<AggregatedState>, config: DisplayConfig, period: Duration) -> Self {
        Renderer { out, state, config, period }
    }

    /// Redraws if the state changed since the last frame.
    pub fn tick(&mut self) -> io::Result<bool> {
        let Renderer { out, state, config, .. } = self;
        state.render_if_dirty(|records| draw_frame(out, records, config))
    }

    pub async fn run(mut self, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = interval.tick() => {}
            }
            if let Err(err) = self.tick() {
                tracing::warn!(error = %err, "failed to draw frame");
            }
        }
    }
}

/// Clears the screen and writes one frame: a blank line, then each record's lines.
pub fn draw_frame<'a, W: Write>(
    out: &mut W,
    records: &mut dyn Iterator<Item = &'a DisplayRecord>,
    config: &DisplayConfig,
) -> io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    out.queue(cursor::MoveTo(0, 0))?;
    out.queue(style::Print("\n"))?;
    for record in records {
        for line in record.lines(config) {
            out.queue(SetForegroundColor(line.color))?;
            out.queue(style::Print(line.text))?;
            out.queue(ResetColor)?;
            out.queue(style::Print("\n"))?;
        }
    }
    out.flush()
}
