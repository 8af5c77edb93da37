use std::io;
use std::time::Duration;

use raw_viewer::events::{ControlEvent, ViewerEvent};
use raw_viewer::tasks::input;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn script(lines: &[&str]) -> mpsc::Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel(lines.len().max(1));
    for line in lines {
        tx.try_send(Ok(line.to_string())).unwrap();
    }
    rx
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn commands_are_forwarded_until_quit() {
    let (events_tx, mut events_rx) = mpsc::channel::<ViewerEvent>(8);
    let cancel = CancellationToken::new();
    let lines = script(&["zoom-in", "fly away", "wheel -3", "quit", "reset"]);

    tokio::time::timeout(
        Duration::from_secs(2),
        input::run(lines, events_tx, false, cancel.clone()),
    )
    .await
    .expect("input task hung")
    .unwrap();

    assert!(cancel.is_cancelled());
    let mut forwarded = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        match event {
            ViewerEvent::Control(control) => forwarded.push(control),
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(
        forwarded,
        vec![ControlEvent::ZoomIn, ControlEvent::Wheel { delta_y: -3.0 }]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn end_of_input_cancels_only_when_asked() {
    let (events_tx, _events_rx) = mpsc::channel::<ViewerEvent>(8);
    let piped = CancellationToken::new();
    input::run(script(&["state"]), events_tx.clone(), false, piped.clone())
        .await
        .unwrap();
    assert!(!piped.is_cancelled());

    let terminal = CancellationToken::new();
    input::run(script(&[]), events_tx, true, terminal.clone())
        .await
        .unwrap();
    assert!(terminal.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_errors_stop_the_task() {
    let (events_tx, _events_rx) = mpsc::channel::<ViewerEvent>(8);
    let (tx, rx) = mpsc::channel(1);
    tx.send(Err(io::Error::other("stdin gone"))).await.unwrap();
    let err = input::run(rx, events_tx, false, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("stdin gone"));
}
