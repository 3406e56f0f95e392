//! Terminal presentation of a session transcript.

use std::io::{self, Write};

use esg_runtime::SessionObserver;
use esg_session::{
    PendingInputKind, SessionController, SessionId, SessionSnapshot, TranscriptEntry,
};
use tokio::sync::watch;
use tracing::warn;

pub(crate) fn render_entry(entry: &TranscriptEntry) -> String {
    match entry {
        TranscriptEntry::CompanyProfile {
            sector,
            industry_group,
            industry,
            description,
        } => format!(
            "Company profile\n  Sector: {sector}\n  Industry group: {industry_group}\n  Industry: {industry}\n  Description: {description}"
        ),
        TranscriptEntry::TopicList { title, items } => {
            let mut rendered = title.clone();
            for item in items {
                rendered.push_str("\n  - ");
                rendered.push_str(item);
            }
            rendered
        }
        TranscriptEntry::TopicAssessment {
            topic,
            requirements,
            assessment,
            source_texts,
        } => {
            let mut rendered = format!(
                "Topic: {topic}\n  Reporting requirements: {requirements}\n  Assessment: {assessment}"
            );
            if !source_texts.is_empty() {
                rendered.push_str("\n  Sources:");
                for (index, text) in source_texts.iter().enumerate() {
                    rendered.push_str(&format!("\n    {}. {text}", index + 1));
                }
            }
            rendered
        }
        TranscriptEntry::PendingPrompt { payload } => format!("{} [yes/no]", payload.as_text()),
        TranscriptEntry::FreeformNote(text) => text.clone(),
    }
}

pub(crate) fn format_status(snapshot: &SessionSnapshot) -> String {
    if snapshot.session_id == 0 {
        return "no session started; use /submit <company> [paths...]".to_string();
    }
    let pending = snapshot
        .pending_input
        .map(|kind| kind.as_str())
        .unwrap_or("none");
    let mut status = format!(
        "session {} ({}): {}, {} entries, pending input: {pending}",
        snapshot.session_id,
        snapshot.subject,
        snapshot.state.as_str(),
        snapshot.transcript.len()
    );
    if let Some(activity) = snapshot.activity.current() {
        status.push_str(&format!(", activity: {activity}"));
    }
    status
}

/// Prints only entries past the watermark. A truncated tail lowers the
/// watermark so entries appended afterwards are printed once.
pub(crate) struct TerminalRenderer<W> {
    out: W,
    status: watch::Sender<SessionSnapshot>,
    session_id: Option<SessionId>,
    rendered: usize,
    last_activity: Option<String>,
    comment_hint_shown: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub(crate) fn new(out: W, status: watch::Sender<SessionSnapshot>) -> Self {
        Self {
            out,
            status,
            session_id: None,
            rendered: 0,
            last_activity: None,
            comment_hint_shown: false,
        }
    }

    pub(crate) fn render_snapshot(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        if self.session_id != Some(snapshot.session_id) {
            self.session_id = Some(snapshot.session_id);
            self.rendered = 0;
            self.last_activity = None;
            self.comment_hint_shown = false;
            if snapshot.session_id > 0 {
                writeln!(
                    self.out,
                    "== Report session {}: {} ==",
                    snapshot.session_id, snapshot.subject
                )?;
            }
        }

        let total = snapshot.transcript.len();
        self.rendered = self.rendered.min(total);
        for entry in &snapshot.transcript[self.rendered..] {
            writeln!(self.out, "{}\n", render_entry(entry))?;
        }
        self.rendered = total;

        let activity = snapshot.activity.current();
        if activity != self.last_activity.as_deref() {
            if let Some(message) = activity {
                writeln!(self.out, "... {message}")?;
            }
            self.last_activity = activity.map(str::to_string);
        }

        let awaiting_comment =
            snapshot.pending_input == Some(PendingInputKind::ConfirmationWithComment);
        if awaiting_comment && !self.comment_hint_shown {
            writeln!(self.out, "Enter a comment describing what should change:")?;
        }
        self.comment_hint_shown = awaiting_comment;
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> SessionObserver for TerminalRenderer<W> {
    fn session_updated(&mut self, session: &SessionController) {
        let snapshot = session.snapshot();
        if let Err(error) = self.render_snapshot(&snapshot) {
            warn!(%error, "failed to render session transcript");
        }
        self.status.send_replace(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use esg_session::{
        ActivityIndicator, PendingInputKind, PromptPayload, SessionSnapshot, TranscriptEntry,
        TransportState, END_OF_REPORT_NOTE, GRI_TOPICS_TITLE,
    };
    use tokio::sync::watch;

    use super::{format_status, render_entry, TerminalRenderer};

    fn snapshot(session_id: u64, transcript: Vec<TranscriptEntry>) -> SessionSnapshot {
        SessionSnapshot {
            session_id,
            subject: "Acme".to_string(),
            state: TransportState::Open,
            transcript,
            pending_input: None,
            activity: ActivityIndicator::default(),
        }
    }

    fn profile() -> TranscriptEntry {
        TranscriptEntry::CompanyProfile {
            sector: "Industrials".to_string(),
            industry_group: "Capital Goods".to_string(),
            industry: "Machinery".to_string(),
            description: "Makes anvils.".to_string(),
        }
    }

    fn prompt() -> TranscriptEntry {
        TranscriptEntry::PendingPrompt {
            payload: PromptPayload::text("Are these company details correct?"),
        }
    }

    fn renderer() -> TerminalRenderer<Vec<u8>> {
        let (status_tx, _status_rx) = watch::channel(snapshot(0, Vec::new()));
        TerminalRenderer::new(Vec::new(), status_tx)
    }

    #[test]
    fn unit_render_entry_formats_each_entry_kind() {
        assert!(render_entry(&profile()).contains("Industry group: Capital Goods"));
        assert_eq!(
            render_entry(&TranscriptEntry::topic_list(
                GRI_TOPICS_TITLE,
                vec!["GRI 305: Emissions".to_string(), "GRI 403: Safety".to_string()]
            )),
            "GRI Topics\n  - GRI 305: Emissions\n  - GRI 403: Safety"
        );
        let assessment = render_entry(&TranscriptEntry::TopicAssessment {
            topic: "GRI 305".to_string(),
            requirements: "Scope 1 emissions".to_string(),
            assessment: "Partially reported".to_string(),
            source_texts: vec!["p. 12".to_string(), "p. 40".to_string()],
        });
        assert!(assessment.ends_with("Sources:\n    1. p. 12\n    2. p. 40"));
        assert_eq!(
            render_entry(&prompt()),
            "Are these company details correct? [yes/no]"
        );
        assert_eq!(
            render_entry(&TranscriptEntry::note(END_OF_REPORT_NOTE)),
            "End of Report"
        );
    }

    #[test]
    fn functional_renderer_prints_new_entries_once() {
        let mut renderer = renderer();
        renderer
            .render_snapshot(&snapshot(1, vec![profile()]))
            .expect("render");
        renderer
            .render_snapshot(&snapshot(1, vec![profile(), prompt()]))
            .expect("render");
        let output = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert_eq!(output.matches("Company profile").count(), 1);
        assert_eq!(output.matches("[yes/no]").count(), 1);
        assert!(output.starts_with("== Report session 1: Acme =="));
    }

    #[test]
    fn functional_renderer_lowers_watermark_after_truncation() {
        let mut renderer = renderer();
        renderer
            .render_snapshot(&snapshot(1, vec![profile(), prompt()]))
            .expect("render");
        renderer
            .render_snapshot(&snapshot(1, vec![profile()]))
            .expect("render");
        renderer
            .render_snapshot(&snapshot(1, vec![profile(), prompt()]))
            .expect("render");
        let output = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert_eq!(output.matches("Company profile").count(), 1);
        assert_eq!(output.matches("[yes/no]").count(), 2);
    }

    #[test]
    fn functional_renderer_prompts_for_comment_once_per_rejection() {
        let mut renderer = renderer();
        let mut awaiting = snapshot(1, vec![profile(), prompt()]);
        awaiting.pending_input = Some(PendingInputKind::ConfirmationWithComment);
        renderer.render_snapshot(&awaiting).expect("render");
        renderer.render_snapshot(&awaiting).expect("render");
        let output = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert_eq!(output.matches("Enter a comment").count(), 1);
    }

    #[test]
    fn regression_renderer_restarts_watermark_for_new_session() {
        let mut renderer = renderer();
        renderer
            .render_snapshot(&snapshot(1, vec![profile(), prompt()]))
            .expect("render");
        renderer
            .render_snapshot(&snapshot(2, vec![profile()]))
            .expect("render");
        let output = String::from_utf8(renderer.into_inner()).expect("utf8");
        assert_eq!(output.matches("Company profile").count(), 2);
        assert!(output.contains("== Report session 2: Acme =="));
    }

    #[test]
    fn unit_format_status_reports_state_and_pending_input() {
        assert!(format_status(&snapshot(0, Vec::new())).starts_with("no session started"));
        let mut waiting = snapshot(3, vec![profile(), prompt()]);
        waiting.pending_input = Some(PendingInputKind::Confirmation);
        assert_eq!(
            format_status(&waiting),
            "session 3 (Acme): open, 2 entries, pending input: confirmation"
        );
    }
}
