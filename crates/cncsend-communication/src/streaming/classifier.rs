//! Response classifier
//!
//! Firmware replies are free text. Debounce reports and bracketed telemetry
//! frames (`{...}`, `<...>`) are worth an operator's attention; everything
//! else is routine.

use cncsend_core::{MessageLevel, MessageSink};

/// Default markers that route a response to the attention channel
pub const DEFAULT_ATTENTION_MARKERS: &[&str] = &["DEBOUNCE", "{", "<"];

/// Reporting channel for a completed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Routine output
    Normal,
    /// Diagnostic output that should stand out
    Attention,
}

impl ResponseClass {
    /// Message level used when emitting this class
    pub fn level(self) -> MessageLevel {
        match self {
            Self::Normal => MessageLevel::Info,
            Self::Attention => MessageLevel::Warning,
        }
    }
}

/// Marker-based classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseClassifier {
    markers: Vec<String>,
}

impl ResponseClassifier {
    /// Create a classifier with custom markers
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// The markers in use
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Classify a completed response
    pub fn classify(&self, response: &str) -> ResponseClass {
        if self
            .markers
            .iter()
            .any(|marker| !marker.is_empty() && response.contains(marker.as_str()))
        {
            ResponseClass::Attention
        } else {
            ResponseClass::Normal
        }
    }

    /// Classify and emit through `sink`
    pub fn report(&self, response: &str, sink: &mut dyn MessageSink) -> ResponseClass {
        let class = self.classify(response);
        sink.emit(class.level(), response);
        class
    }
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ATTENTION_MARKERS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_route_to_attention() {
        let classifier = ResponseClassifier::default();
        assert_eq!(classifier.classify("DEBOUNCE X\r\nDONE"), ResponseClass::Attention);
        assert_eq!(classifier.classify("{\"x\":1}DONE"), ResponseClass::Attention);
        assert_eq!(classifier.classify("<Idle>DONE"), ResponseClass::Attention);
    }

    #[test]
    fn test_plain_reply_is_normal() {
        let classifier = ResponseClassifier::default();
        assert_eq!(classifier.classify("OKDONE"), ResponseClass::Normal);
        assert_eq!(classifier.classify(""), ResponseClass::Normal);
    }

    #[test]
    fn test_report_emits_at_class_level() {
        let classifier = ResponseClassifier::default();
        let mut seen = Vec::new();
        {
            let mut sink = |level: MessageLevel, msg: &str| seen.push((level, msg.to_string()));
            classifier.report("<Run>DONE", &mut sink);
            classifier.report("OKDONE", &mut sink);
        }
        assert_eq!(
            seen,
            vec![
                (MessageLevel::Warning, "<Run>DONE".to_string()),
                (MessageLevel::Info, "OKDONE".to_string()),
            ]
        );
    }
}
