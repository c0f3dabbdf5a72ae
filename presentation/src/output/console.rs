//! Live console output for a running discussion

use async_trait::async_trait;
use colored::{Color, Colorize};
use conclave_application::{DeliveryError, ObserverConnection};
use conclave_domain::{ConsensusResult, DiscussionEvent, Message, Role};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::Blue,
    Color::BrightRed,
];

/// Prints discussion events to stdout as they arrive.
///
/// Each role gets a stable color. Between turns a spinner on stderr shows
/// that the panel is still thinking.
pub struct ConsoleObserver {
    colors: HashMap<String, Color>,
    spinner: Mutex<Option<ProgressBar>>,
    show_spinner: bool,
}

impl ConsoleObserver {
    pub fn new(roles: &[Role]) -> Self {
        let colors = roles
            .iter()
            .enumerate()
            .map(|(i, role)| (role.name.clone(), PALETTE[i % PALETTE.len()]))
            .collect();
        Self {
            colors,
            spinner: Mutex::new(None),
            show_spinner: true,
        }
    }

    pub fn without_spinner(mut self) -> Self {
        self.show_spinner = false;
        self
    }

    /// Render one event; `None` for events with nothing to show
    pub fn format_event(&self, event: &DiscussionEvent) -> Option<String> {
        match event {
            DiscussionEvent::AgentMessage { message, .. } => Some(self.format_agent(message)),
            DiscussionEvent::UserMessage { message, .. } => Some(format!(
                "\n{} {}\n{}",
                format!("[turn {}]", message.turn).dimmed(),
                "You".magenta().bold(),
                message.content
            )),
            DiscussionEvent::ConsensusUpdate { consensus, .. } => {
                Some(Self::format_consensus(consensus))
            }
            DiscussionEvent::DiscussionComplete {
                status,
                total_turns,
                ..
            } => Some(format!(
                "\n{} after {} turn(s)",
                format!("Discussion {}", status).green().bold(),
                total_turns
            )),
            DiscussionEvent::DiscussionFailed {
                turn,
                error_class,
                error,
                ..
            } => Some(format!(
                "\n{} {}",
                format!("Discussion failed at turn {} ({}):", turn, error_class)
                    .red()
                    .bold(),
                error
            )),
        }
    }

    fn format_agent(&self, message: &Message) -> String {
        let name = message.author_role().unwrap_or("unknown");
        let color = self.colors.get(name).copied().unwrap_or(Color::White);
        let model = message
            .model
            .as_deref()
            .map(|m| format!(" ({})", m).dimmed().to_string())
            .unwrap_or_default();
        format!(
            "\n{} {}{}\n{}",
            format!("[turn {}]", message.turn).dimmed(),
            name.color(color).bold(),
            model,
            message.content
        )
    }

    fn format_consensus(consensus: &ConsensusResult) -> String {
        if consensus.reached {
            return format!(
                "{}",
                format!("  consensus reached ({:.2})", consensus.confidence)
                    .green()
                    .bold()
            );
        }
        if consensus.scores == Default::default() && consensus.confidence == 0.0 {
            return "  consensus: not evaluated yet".dimmed().to_string();
        }
        let line = format!(
            "  consensus {:.2} (lexical {:.2}, similarity {:.2}, adjudicated {:.2})",
            consensus.confidence,
            consensus.scores.lexical,
            consensus.scores.similarity,
            consensus.scores.adjudicated
        )
        .dimmed()
        .to_string();
        if consensus.stalemate {
            format!(
                "{}\n{}",
                line,
                format!("  stalemate: recommendation {}", consensus.recommendation)
                    .yellow()
                    .bold()
            )
        } else {
            line
        }
    }

    fn clear_spinner(&self) {
        let mut spinner = self.spinner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = spinner.take() {
            bar.finish_and_clear();
        }
    }

    fn start_spinner(&self, message: String) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.lock().unwrap_or_else(PoisonError::into_inner) = Some(bar);
    }
}

#[async_trait]
impl ObserverConnection for ConsoleObserver {
    async fn deliver(&self, event: &DiscussionEvent) -> Result<(), DeliveryError> {
        self.clear_spinner();
        if let Some(text) = self.format_event(event) {
            println!("{}", text);
        }
        if self.show_spinner && !event.is_final() {
            self.start_spinner(format!("Turn {} ...", event.turn() + 1));
        }
        Ok(())
    }

    fn label(&self) -> String {
        "console".to_string()
    }

    async fn close(&self) {
        self.clear_spinner();
    }
}
