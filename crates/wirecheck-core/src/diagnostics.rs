use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A pin label that is not in the pin table. The label is left out of the
    /// net's channel list.
    UnknownPinLabel { label: String },

    /// None of the net's pin labels resolved, so the net has no driver.
    EmptyNet,
}

/// A non-fatal configuration problem found while resolving a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub layout: String,
    pub net_index: usize,
    pub net_label: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn unknown_pin_label(
        layout: &str,
        net_index: usize,
        net_label: &str,
        label: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            layout: layout.to_string(),
            net_index,
            net_label: net_label.to_string(),
            kind: DiagnosticKind::UnknownPinLabel {
                label: label.into(),
            },
        }
    }

    pub fn empty_net(layout: &str, net_index: usize, net_label: &str) -> Self {
        Self {
            severity: Severity::Error,
            layout: layout.to_string(),
            net_index,
            net_label: net_label.to_string(),
            kind: DiagnosticKind::EmptyNet,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UnknownPinLabel { label } => write!(
                f,
                "{}: unknown pin label '{}' in net {} ('{}') of layout '{}'",
                self.severity, label, self.net_index, self.net_label, self.layout
            ),
            DiagnosticKind::EmptyNet => write!(
                f,
                "{}: net {} ('{}') of layout '{}' has no resolvable pins",
                self.severity, self.net_index, self.net_label, self.layout
            ),
        }
    }
}
