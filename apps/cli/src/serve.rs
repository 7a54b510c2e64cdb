use anyhow::Result;
use badgeforge_bridge::{Bridge, Request};
use badgeforge_core::Envelope;
use std::io::{BufRead, Write};
use tracing::{debug, info};

/// One JSON request per input line, one JSON envelope per output line.
/// Blank lines are ignored; the loop ends at end of input.
pub fn serve(bridge: &Bridge, input: impl BufRead, mut output: impl Write) -> Result<()> {
    info!("serving requests on stdin");
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let envelope = match serde_json::from_str::<Request>(line) {
            Ok(request) => bridge.handle(request),
            Err(err) => {
                debug!(error = %err, "rejecting malformed request");
                Envelope::failure_with("invalid_request", format!("invalid request: {err}"))
            }
        };
        serde_json::to_writer(&mut output, &envelope)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }
    Ok(())
}
