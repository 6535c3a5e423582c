use std::fmt;

use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Backup,
    ForceBackup,
    Prepare,
    Unmount,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Backup => "backup",
            OperationKind::ForceBackup => "force-backup",
            OperationKind::Prepare => "prepare",
            OperationKind::Unmount => "unmount",
        }
    }

    /// Operations whose external tool talks to the user directly.
    pub fn needs_terminal(&self) -> bool {
        matches!(self, OperationKind::Prepare)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encryption passphrase. Zeroized on drop and never printed.
#[derive(Default)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: String) -> Self {
        Secret(Zeroizing::new(value))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, c: char) {
        self.0.push(c);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Moves the value out, leaving this secret empty.
    pub fn take(&mut self) -> Secret {
        std::mem::take(self)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug)]
pub enum OperationRequest {
    Backup { secret: Secret },
    ForceBackup { secret: Secret },
    Prepare { device: String },
    Unmount,
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Backup { .. } => OperationKind::Backup,
            OperationRequest::ForceBackup { .. } => OperationKind::ForceBackup,
            OperationRequest::Prepare { .. } => OperationKind::Prepare,
            OperationRequest::Unmount => OperationKind::Unmount,
        }
    }
}

/// Request under construction while the session walks through its input
/// states. Finalized into an [`OperationRequest`] once every input is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub kind: OperationKind,
    pub device: Option<String>,
}

impl PendingRequest {
    pub fn new(kind: OperationKind) -> Self {
        Self { kind, device: None }
    }

    pub fn with_device(mut self, device: String) -> Self {
        self.device = Some(device);
        self
    }

    /// Returns `None` when a required input is missing.
    pub fn finalize(self, secret: Option<Secret>) -> Option<OperationRequest> {
        match self.kind {
            OperationKind::Backup => secret
                .filter(|s| !s.is_empty())
                .map(|secret| OperationRequest::Backup { secret }),
            OperationKind::ForceBackup => secret
                .filter(|s| !s.is_empty())
                .map(|secret| OperationRequest::ForceBackup { secret }),
            OperationKind::Prepare => self
                .device
                .filter(|d| !d.trim().is_empty())
                .map(|device| OperationRequest::Prepare { device }),
            OperationKind::Unmount => Some(OperationRequest::Unmount),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Step,
    Info,
    Warning,
    Detail,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub kind: LineKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: LineKind, text: impl Into<String>) {
        self.lines.push(TranscriptLine {
            kind,
            text: text.into(),
        });
    }

    pub fn step(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!("{}", text);
        self.push(LineKind::Step, text);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(LineKind::Info, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!("{}", text);
        self.push(LineKind::Warning, text);
    }

    /// Multi-line tool output or report text, kept verbatim.
    pub fn detail(&mut self, text: impl AsRef<str>) {
        for line in text.as_ref().trim_end().lines() {
            self.push(LineKind::Detail, line);
        }
    }

    pub fn done(&mut self, text: impl Into<String>) {
        self.push(LineKind::Done, text);
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line.kind {
                LineKind::Warning => writeln!(f, "warning: {}", line.text)?,
                LineKind::Detail => writeln!(f, "    {}", line.text)?,
                _ => writeln!(f, "{}", line.text)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

#[derive(Debug, Clone)]
pub struct OperationResult {
    pub kind: OperationKind,
    pub transcript: Transcript,
    pub outcome: Outcome,
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(format!("{:?}", secret), "Secret(***)");
        let request = OperationRequest::Backup { secret };
        assert!(!format!("{:?}", request).contains("hunter2"));
    }

    #[test]
    fn take_leaves_secret_empty() {
        let mut buffer = Secret::default();
        for c in "pass".chars() {
            buffer.push(c);
        }
        let taken = buffer.take();
        assert!(buffer.is_empty());
        assert_eq!(taken.expose(), "pass");
    }

    #[test]
    fn pending_request_requires_inputs() {
        assert!(PendingRequest::new(OperationKind::Backup).finalize(None).is_none());
        assert!(PendingRequest::new(OperationKind::ForceBackup)
            .finalize(Some(Secret::default()))
            .is_none());
        assert!(PendingRequest::new(OperationKind::Prepare).finalize(None).is_none());

        let request = PendingRequest::new(OperationKind::Prepare)
            .with_device("/dev/sdb".to_string())
            .finalize(None);
        match request {
            Some(OperationRequest::Prepare { device }) => assert_eq!(device, "/dev/sdb"),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn transcript_display_marks_warnings() {
        let mut transcript = Transcript::new();
        transcript.step("Exporting the backup zpool");
        transcript.warn("failed to power off device");
        transcript.detail("NAME  SIZE\nNIXROOT  1T\n");
        let text = transcript.to_string();
        assert_eq!(
            text,
            "Exporting the backup zpool\nwarning: failed to power off device\n    NAME  SIZE\n    NIXROOT  1T\n"
        );
    }
}
