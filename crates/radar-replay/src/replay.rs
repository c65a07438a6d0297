//! Script-driven replay of the overlay bridge.
//!
//! A script is JSON Lines. Each non-blank line is one of:
//!
//! - a host message, exactly as the host would post it: `{"type":"update","frontSpeed":54}`
//! - a local UI action wrapped in `ui`: `{"ui":{"action":"toggleFullLock"}}`
//!
//! Lines starting with `#` or `//` are comments. After every line the
//! outbound calls it produced are written as JSON lines tagged with the
//! script line number.

use std::io::{BufRead, Write};

use radar_bridge::message::parse_inbound_value;
use radar_bridge::{
    BridgeConfig, HostBridge, HostSink, InboundMessage, OutboundCall, RecordingSink, UiAction,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ReplayError, Result};

/// One decoded script line.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptLine {
    Host(InboundMessage),
    Ui(UiAction),
    Blank,
}

/// Decode one line. The error is a human-readable reason.
pub fn parse_line(line: &str) -> std::result::Result<ScriptLine, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
        return Ok(ScriptLine::Blank);
    }
    let value: Value = serde_json::from_str(trimmed).map_err(|e| format!("JSON parse error: {e}"))?;
    if let Some(ui) = value.get("ui") {
        return serde_json::from_value(ui.clone())
            .map(ScriptLine::Ui)
            .map_err(|e| format!("invalid ui action: {e}"));
    }
    parse_inbound_value(value)
        .map(ScriptLine::Host)
        .map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Fail on the first undecodable line instead of skipping it.
    pub strict: bool,
    /// Also emit native banners as `{"line":N,"banner":"..."}`.
    pub banners: bool,
}

/// Counters for one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub lines: usize,
    pub host_messages: usize,
    pub ui_actions: usize,
    pub dropped: usize,
    pub outbound: usize,
}

#[derive(Serialize)]
struct CallRecord<'a> {
    line: usize,
    #[serde(flatten)]
    call: &'a OutboundCall,
}

#[derive(Serialize)]
struct BannerRecord<'a> {
    line: usize,
    banner: &'a str,
}

/// Runs scripts against a bridge and reports what leaves it.
pub struct Replayer {
    bridge: HostBridge<RecordingSink>,
    forward: Option<Box<dyn HostSink>>,
    options: ReplayOptions,
    last_banner: Option<u64>,
}

impl Replayer {
    #[must_use]
    pub fn new(config: &BridgeConfig, options: ReplayOptions) -> Self {
        Self {
            bridge: HostBridge::with_config(RecordingSink::new(), config),
            forward: None,
            options,
            last_banner: None,
        }
    }

    /// Stamp saved readings with this source instead of the wall clock.
    #[must_use]
    pub fn with_timestamp_source(mut self, source: fn() -> String) -> Self {
        self.bridge = self.bridge.with_timestamp_source(source);
        self
    }

    /// Also hand every outbound call to `sink`.
    #[must_use]
    pub fn forward_to(mut self, sink: Box<dyn HostSink>) -> Self {
        self.forward = Some(sink);
        self
    }

    #[must_use]
    pub const fn bridge(&self) -> &HostBridge<RecordingSink> {
        &self.bridge
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        for (index, line) in input.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            summary.lines += 1;
            match parse_line(&line) {
                Ok(ScriptLine::Blank) => continue,
                Ok(ScriptLine::Host(message)) => {
                    summary.host_messages += 1;
                    self.bridge.handle_message(message);
                }
                Ok(ScriptLine::Ui(action)) => {
                    summary.ui_actions += 1;
                    self.bridge.handle_ui(action);
                }
                Err(message) if self.options.strict => {
                    return Err(ReplayError::script(line_no, message));
                }
                Err(message) => {
                    warn!(target: "radar.replay", line = line_no, %message, "script line skipped");
                    summary.dropped += 1;
                    continue;
                }
            }
            summary.outbound += self.flush(line_no, out)?;
        }
        info!(
            target: "radar.replay",
            lines = summary.lines,
            dropped = summary.dropped,
            outbound = summary.outbound,
            "replay finished"
        );
        Ok(summary)
    }

    /// Write the overlay snapshot as one JSON line.
    pub fn dump_state<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer(&mut *out, &serde_json::json!({ "state": self.bridge.store().snapshot() }))?;
        writeln!(out)?;
        Ok(())
    }

    fn flush<W: Write>(&mut self, line: usize, out: &mut W) -> Result<usize> {
        let requests = self.bridge.sink().requests().to_vec();
        self.bridge.sink_mut().clear();
        for request in &requests {
            let call = OutboundCall::from(request);
            serde_json::to_writer(&mut *out, &CallRecord { line, call: &call })?;
            writeln!(out)?;
        }
        let count = requests.len();
        if let Some(forward) = self.forward.as_mut() {
            for request in requests {
                forward.send(request);
            }
        }

        if self.options.banners {
            if let Some(banner) = self.bridge.banner() {
                if self.last_banner != Some(banner.key) {
                    self.last_banner = Some(banner.key);
                    serde_json::to_writer(
                        &mut *out,
                        &BannerRecord {
                            line,
                            banner: &banner.message,
                        },
                    )?;
                    writeln!(out)?;
                }
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frozen() -> String {
        "00:00:00 01/01/2026".into()
    }

    fn replay(script: &str, options: ReplayOptions) -> (Result<ReplaySummary>, String) {
        let mut replayer =
            Replayer::new(&BridgeConfig::default(), options).with_timestamp_source(frozen);
        let mut out = Vec::new();
        let result = replayer.run(script.as_bytes(), &mut out);
        (result, String::from_utf8(out).expect("utf8 output"))
    }

    #[test]
    fn parse_line_classifies() {
        assert_eq!(parse_line("   "), Ok(ScriptLine::Blank));
        assert_eq!(parse_line("# comment"), Ok(ScriptLine::Blank));
        assert_eq!(parse_line(r#"{"type":"open"}"#), Ok(ScriptLine::Host(InboundMessage::Open)));
        assert_eq!(
            parse_line(r#"{"ui":{"action":"toggleLog"}}"#),
            Ok(ScriptLine::Ui(UiAction::ToggleLog))
        );
        assert!(parse_line(r#"{"ui":{"action":"explode"}}"#).is_err());
        assert!(parse_line("{").is_err());
    }

    #[test]
    fn outbound_calls_are_tagged_with_lines() {
        let script = "\
{\"type\":\"open\"}
{\"ui\":{\"action\":\"addBoloPlate\",\"plate\":\"abc\"}}
";
        let (result, out) = replay(script, ReplayOptions::default());
        let summary = result.expect("replay");
        assert_eq!(
            summary,
            ReplaySummary {
                lines: 2,
                host_messages: 1,
                ui_actions: 1,
                dropped: 0,
                outbound: 1,
            }
        );
        assert_eq!(out, "{\"line\":2,\"endpoint\":\"addBoloPlate\",\"body\":{\"plate\":\"ABC\"}}\n");
    }

    #[test]
    fn lenient_mode_skips_bad_lines() {
        let (result, out) = replay("{\"type\":\"nope\"}\n{\"type\":\"toggleLog\"}\n", ReplayOptions::default());
        assert_eq!(result.expect("replay").dropped, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn strict_mode_stops_with_line_number() {
        let options = ReplayOptions {
            strict: true,
            ..ReplayOptions::default()
        };
        let (result, _) = replay("{\"type\":\"open\"}\n\n{\"type\":\"nope\"}\n", options);
        match result {
            Err(ReplayError::Script { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected script error, got {other:?}"),
        }
    }

    #[test]
    fn banners_are_reported_once_per_show() {
        let options = ReplayOptions {
            banners: true,
            ..ReplayOptions::default()
        };
        let (result, out) = replay("{\"type\":\"toggleLog\"}\n{\"type\":\"open\"}\n", options);
        result.expect("replay");
        assert_eq!(out, "{\"line\":1,\"banner\":\"Log opened\"}\n");
    }
}
