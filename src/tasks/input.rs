use std::io::{self, BufRead};
use std::thread;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::select;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use viewer_wire::Identifier;

use crate::events::{ControlEvent, ViewerEvent};
use crate::filters::FilterField;
use crate::viewport::Point;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Control(ControlEvent),
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command {0:?}; try zoom-in, zoom-out, reset, wheel, drag, move, release, touch, touch-move, touch-end, set, apply, start, load, clear, state, quit")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0:?} is not a number")]
    NotANumber(String),
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let control = match (verb, args.as_slice()) {
        ("zoom-in" | "+", []) => ControlEvent::ZoomIn,
        ("zoom-out" | "-", []) => ControlEvent::ZoomOut,
        ("reset", []) => ControlEvent::ResetZoom,
        ("wheel", [dy]) => ControlEvent::Wheel {
            delta_y: number(dy)?,
        },
        ("wheel", _) => return Err(CommandError::Usage("wheel <delta-y>")),
        ("drag", [x, y]) => ControlEvent::PointerDown(point(x, y)?),
        ("drag", _) => return Err(CommandError::Usage("drag <x> <y>")),
        ("move", [x, y]) => ControlEvent::PointerMove(point(x, y)?),
        ("move", _) => return Err(CommandError::Usage("move <x> <y>")),
        ("release", []) => ControlEvent::PointerUp,
        ("touch", coords) => ControlEvent::TouchStart(contacts(coords, "touch <x> <y> [<x2> <y2>]")?),
        ("touch-move", coords) => {
            ControlEvent::TouchMove(contacts(coords, "touch-move <x> <y> [<x2> <y2>]")?)
        }
        ("touch-end", []) => ControlEvent::TouchEnd,
        ("set", [name, value]) => {
            let field = FilterField::parse(name).ok_or(CommandError::Usage(
                "set <saturation|warmth|brightness|contrast|sharpen> <value>",
            ))?;
            let value = value
                .parse::<f32>()
                .map_err(|_| CommandError::NotANumber((*value).to_string()))?;
            ControlEvent::SetFilter { field, value }
        }
        ("set", _) => return Err(CommandError::Usage("set <filter> <value>")),
        ("apply", []) => ControlEvent::ApplyFilter,
        ("start", []) => ControlEvent::StartJob {
            raw_path: String::new(),
        },
        // raw paths may contain spaces
        ("start", _) => ControlEvent::StartJob {
            raw_path: line["start".len()..].trim().to_string(),
        },
        ("load", [identifier]) => ControlEvent::Load(Identifier::non_empty(*identifier)),
        ("load", _) => return Err(CommandError::Usage("load <identifier>")),
        ("clear", []) => ControlEvent::Load(None),
        ("state", []) => ControlEvent::Report,
        ("quit" | "exit", []) => return Ok(Some(Command::Quit)),
        _ => return Err(CommandError::Unknown(line.to_string())),
    };
    Ok(Some(Command::Control(control)))
}

fn number(raw: &str) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::NotANumber(raw.to_string()))
}

fn point(x: &str, y: &str) -> Result<Point, CommandError> {
    Ok(Point::new(number(x)?, number(y)?))
}

fn contacts(coords: &[&str], usage: &'static str) -> Result<Vec<Point>, CommandError> {
    match coords {
        [x, y] => Ok(vec![point(x, y)?]),
        [x1, y1, x2, y2] => Ok(vec![point(x1, y1)?, point(x2, y2)?]),
        _ => Err(CommandError::Usage(usage)),
    }
}

/// Reads stdin on a dedicated thread, one line per message.
///
/// The thread is never joined; a read blocked on the terminal does not hold
/// up shutdown.
pub fn spawn_stdin_reader() -> Result<Receiver<io::Result<String>>> {
    let (tx, rx) = mpsc::channel(16);
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(rx)
}

/// Forwards parsed commands to the session.
///
/// `quit` always cancels; end of input cancels only when `eof_cancels` is set,
/// so piped scripts can leave the viewer running.
#[instrument(skip_all, name = "input")]
pub async fn run(
    mut lines: Receiver<io::Result<String>>,
    events: Sender<ViewerEvent>,
    eof_cancels: bool,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        let line = select! {
            _ = cancel.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            if eof_cancels {
                info!("input closed; initiating shutdown");
                cancel.cancel();
            } else {
                debug!("input closed");
            }
            break;
        };
        let line = line.context("failed to read command input")?;
        match parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => {
                info!("quit requested");
                cancel.cancel();
                break;
            }
            Ok(Some(Command::Control(control))) => {
                if events.send(control.into()).await.is_err() {
                    debug!("session closed; stopping input");
                    break;
                }
            }
            Err(err) => warn!("{err}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(line: &str) -> ControlEvent {
        match parse(line) {
            Ok(Some(Command::Control(event))) => event,
            other => panic!("{line:?} parsed to {other:?}"),
        }
    }

    #[test]
    fn parses_viewport_commands() {
        assert_eq!(control("zoom-in"), ControlEvent::ZoomIn);
        assert_eq!(control("  -  "), ControlEvent::ZoomOut);
        assert_eq!(control("reset"), ControlEvent::ResetZoom);
        assert_eq!(control("wheel -120"), ControlEvent::Wheel { delta_y: -120.0 });
        assert_eq!(
            control("drag 1 2.5"),
            ControlEvent::PointerDown(Point::new(1.0, 2.5))
        );
        assert_eq!(control("release"), ControlEvent::PointerUp);
    }

    #[test]
    fn touch_takes_one_or_two_contacts() {
        assert_eq!(
            control("touch 1 2"),
            ControlEvent::TouchStart(vec![Point::new(1.0, 2.0)])
        );
        assert_eq!(
            control("touch-move 0 0 10 0"),
            ControlEvent::TouchMove(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)])
        );
        assert!(matches!(parse("touch 1 2 3"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn parses_filter_and_job_commands() {
        assert_eq!(
            control("set Contrast 1.3"),
            ControlEvent::SetFilter {
                field: FilterField::Contrast,
                value: 1.3
            }
        );
        assert_eq!(
            control("start"),
            ControlEvent::StartJob {
                raw_path: String::new()
            }
        );
        assert_eq!(
            control("start /mnt/My Photos/a.ARW"),
            ControlEvent::StartJob {
                raw_path: "/mnt/My Photos/a.ARW".into()
            }
        );
        assert_eq!(
            control("load p.jpg"),
            ControlEvent::Load(Some(Identifier::from("p.jpg")))
        );
        assert_eq!(control("clear"), ControlEvent::Load(None));
        assert_eq!(control("state"), ControlEvent::Report);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("# comment"), Ok(None));
        assert_eq!(parse("quit"), Ok(Some(Command::Quit)));
        assert_eq!(
            parse("wheel up"),
            Err(CommandError::NotANumber("up".into()))
        );
        assert_eq!(parse("wheel NaN"), Err(CommandError::NotANumber("NaN".into())));
        assert!(matches!(parse("set gamma 2"), Err(CommandError::Usage(_))));
        assert!(matches!(parse("fly"), Err(CommandError::Unknown(_))));
    }
}
