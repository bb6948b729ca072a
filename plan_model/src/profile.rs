//! Loads recorded activations from a plain-text profile: one `ActEvent` per
//! line, `actor_id work_stream_id duration_us`, whitespace separated. This
//! mirrors the trace-file formats real profilers emit closely enough to
//! drive the collaborator traits without pulling in a tracing dependency.

use crate::traits::ActEvent;
use regst_graph::{Error, Result};
use std::io::BufRead;

pub fn load_act_events<R: BufRead>(reader: R) -> Result<Vec<ActEvent>> {
    let mut events = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let event = (|| -> Option<ActEvent> {
            let actor_id = fields.next()?.parse().ok()?;
            let work_stream_id = fields.next()?.parse().ok()?;
            let duration = fields.next()?.parse().ok()?;
            Some(ActEvent {
                actor_id,
                work_stream_id,
                duration,
            })
        })()
        .ok_or_else(|| {
            Error::misc(format!(
                "malformed act-event record on line {}: {line:?}",
                lineno + 1
            ))
        })?;
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_well_formed_lines() {
        let input = "# comment\n1 10 2.5\n2 10 1.25\n\n3 11 0.0\n";
        let events = load_act_events(Cursor::new(input)).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].actor_id, 1);
        assert_eq!(events[0].work_stream_id, 10);
        assert_eq!(events[0].duration, 2.5);
        assert_eq!(events[2].actor_id, 3);
    }

    #[test]
    fn rejects_malformed_line() {
        let input = "1 10\n";
        let err = load_act_events(Cursor::new(input)).unwrap_err();
        assert!(err.to_string().contains("malformed act-event record"));
    }
}
