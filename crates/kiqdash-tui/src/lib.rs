// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod app;
pub mod error_popup;
pub mod frame;
pub mod metrics;
pub mod navbar;
pub mod table;
pub mod theme;
pub mod views;

pub use app::{
    App, AppOptions, Command, DEFAULT_REFRESH_INTERVAL, FetchData, FetchRequest, Message,
};

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use kiqdash_app::{JobPage, Overview, QueueSummary, SortedSet, Stats, WorkerSnapshot, format};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::widgets::Paragraph;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const INPUT_POLL: Duration = Duration::from_millis(120);

/// Read-only queries against the job system. Implementations are shared
/// across fetch threads and must enforce their own deadlines.
pub trait Gateway: Send + Sync + 'static {
    fn fetch_stats(&self) -> Result<Stats>;
    fn fetch_overview(&self) -> Result<Overview>;
    fn fetch_workers(&self) -> Result<WorkerSnapshot>;
    fn fetch_queues(&self) -> Result<Vec<QueueSummary>>;
    /// An empty set yields an empty page, never an error.
    fn fetch_paged(&self, set: SortedSet, offset: usize, limit: usize) -> Result<JobPage>;
}

pub fn execute_fetch<G: Gateway + ?Sized>(gateway: &G, request: FetchRequest) -> Result<FetchData> {
    let data = match request {
        FetchRequest::Stats => FetchData::Stats(gateway.fetch_stats()?),
        FetchRequest::Overview => FetchData::Overview(gateway.fetch_overview()?),
        FetchRequest::Workers => FetchData::Workers(gateway.fetch_workers()?),
        FetchRequest::Queues => FetchData::Queues(gateway.fetch_queues()?),
        FetchRequest::Page {
            set, offset, limit, ..
        } => FetchData::Page(gateway.fetch_paged(set, offset, limit)?),
    };
    Ok(data)
}

/// Runs `request` and packages the outcome as the message the controller
/// expects. Failures are flattened to their full context chain.
pub fn fetch_message<G: Gateway + ?Sized>(gateway: &G, request: FetchRequest) -> Message {
    let result = execute_fetch(gateway, request).map_err(|error| {
        let message = format!("{error:#}");
        warn!(request = request.label(), error = %message, "fetch failed");
        message
    });
    if result.is_ok() {
        debug!(request = request.label(), "fetch completed");
    }
    Message::Fetched {
        request,
        result,
        at: format::unix_now(),
    }
}

pub fn run_app<G: Gateway>(app: &mut App, gateway: Arc<G>) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let result = event_loop(&mut terminal, app, &gateway);

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    result
}

fn event_loop<B: Backend, G: Gateway>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    gateway: &Arc<G>,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let size = terminal.size().context("read terminal size")?;
    info!(
        width = size.width,
        height = size.height,
        refresh_ms = app.refresh_interval().as_millis() as u64,
        "dashboard started"
    );

    let mut pending = app.update(Message::Resize {
        width: size.width,
        height: size.height,
    });
    pending.extend(app.init());

    loop {
        for command in pending.drain(..) {
            if !run_command(command, gateway, &tx) {
                info!("dashboard stopped");
                return Ok(());
            }
        }

        terminal
            .draw(|frame| render(frame, app))
            .context("draw frame")?;

        if event::poll(INPUT_POLL).context("poll event")? {
            match event::read().context("read event")? {
                Event::Key(key) => pending.extend(app.update(Message::Key(key))),
                Event::Resize(width, height) => {
                    pending.extend(app.update(Message::Resize { width, height }));
                }
                _ => {}
            }
        }

        drain_messages(app, &rx, &mut pending);
    }
}

// Arrival order is preserved; nothing is dropped as stale.
fn drain_messages(app: &mut App, rx: &Receiver<Message>, pending: &mut Vec<Command>) {
    while let Ok(message) = rx.try_recv() {
        pending.extend(app.update(message));
    }
}

/// Starts the side effect of `command`. Returns `false` on quit.
fn run_command<G: Gateway>(command: Command, gateway: &Arc<G>, tx: &Sender<Message>) -> bool {
    match command {
        Command::Fetch(request) => {
            spawn_fetch(gateway, request, tx);
            true
        }
        Command::ScheduleTick(delay) => {
            spawn_tick(delay, tx);
            true
        }
        Command::Quit => false,
    }
}

fn spawn_fetch<G: Gateway>(gateway: &Arc<G>, request: FetchRequest, tx: &Sender<Message>) {
    let gateway = Arc::clone(gateway);
    let tx = tx.clone();
    debug!(request = request.label(), "fetch dispatched");
    thread::spawn(move || {
        let message = fetch_message(gateway.as_ref(), request);
        if tx.send(message).is_err() {
            debug!(request = request.label(), "dashboard gone before fetch finished");
        }
    });
}

fn spawn_tick(delay: Duration, tx: &Sender<Message>) {
    let tx = tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = tx.send(Message::Tick);
    });
}

fn render(frame: &mut ratatui::Frame<'_>, app: &App) {
    let screen = app.view();
    frame.render_widget(Paragraph::new(screen.into_text()), frame.area());
}

#[cfg(test)]
mod tests {
    use super::{
        App, AppOptions, Command, FetchData, FetchRequest, Gateway, Message, drain_messages,
        execute_fetch, fetch_message,
    };
    use anyhow::{Result, anyhow, bail};
    use kiqdash_app::{
        JobPage, Overview, PaneKind, QueueSummary, SortedSet, Stats, WorkerSnapshot,
    };
    use kiqdash_testkit::{DemoCluster, REFERENCE_NOW};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    struct DemoGateway {
        cluster: Mutex<DemoCluster>,
        paged_calls: AtomicUsize,
    }

    impl DemoGateway {
        fn new(seed: u64) -> Self {
            Self {
                cluster: Mutex::new(DemoCluster::generate(seed, REFERENCE_NOW)),
                paged_calls: AtomicUsize::new(0),
            }
        }

        fn cluster(&self) -> Result<std::sync::MutexGuard<'_, DemoCluster>> {
            self.cluster.lock().map_err(|_| anyhow!("cluster lock poisoned"))
        }
    }

    impl Gateway for DemoGateway {
        fn fetch_stats(&self) -> Result<Stats> {
            Ok(self.cluster()?.stats())
        }

        fn fetch_overview(&self) -> Result<Overview> {
            Ok(self.cluster()?.overview())
        }

        fn fetch_workers(&self) -> Result<WorkerSnapshot> {
            Ok(self.cluster()?.workers())
        }

        fn fetch_queues(&self) -> Result<Vec<QueueSummary>> {
            Ok(self.cluster()?.queues())
        }

        fn fetch_paged(&self, set: SortedSet, offset: usize, limit: usize) -> Result<JobPage> {
            self.paged_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.cluster()?.page(set, offset, limit))
        }
    }

    struct DownGateway;

    impl Gateway for DownGateway {
        fn fetch_stats(&self) -> Result<Stats> {
            Err(anyhow!("connection refused").context("connect to redis"))
        }

        fn fetch_overview(&self) -> Result<Overview> {
            bail!("down")
        }

        fn fetch_workers(&self) -> Result<WorkerSnapshot> {
            bail!("down")
        }

        fn fetch_queues(&self) -> Result<Vec<QueueSummary>> {
            bail!("down")
        }

        fn fetch_paged(&self, _set: SortedSet, _offset: usize, _limit: usize) -> Result<JobPage> {
            bail!("down")
        }
    }

    // Runs every fetch inline, the way the event loop would on threads.
    fn settle<G: Gateway>(app: &mut App, gateway: &G, mut commands: Vec<Command>) {
        while let Some(command) = commands.pop() {
            if let Command::Fetch(request) = command {
                commands.extend(app.update(fetch_message(gateway, request)));
            }
        }
    }

    #[test]
    fn execute_fetch_routes_each_request() -> Result<()> {
        let gateway = DemoGateway::new(3);
        let cluster = gateway.cluster()?.clone();

        assert_eq!(
            execute_fetch(&gateway, FetchRequest::Stats)?,
            FetchData::Stats(cluster.stats())
        );
        assert_eq!(
            execute_fetch(&gateway, FetchRequest::Queues)?,
            FetchData::Queues(cluster.queues())
        );
        let page = execute_fetch(
            &gateway,
            FetchRequest::Page {
                set: SortedSet::Dead,
                page: 1,
                offset: 0,
                limit: 5,
            },
        )?;
        assert_eq!(page, FetchData::Page(cluster.page(SortedSet::Dead, 0, 5)));
        Ok(())
    }

    #[test]
    fn failures_carry_the_context_chain() {
        let message = fetch_message(&DownGateway, FetchRequest::Stats);
        let Message::Fetched { result, .. } = message else {
            panic!("expected a fetch result");
        };
        assert_eq!(result, Err("connect to redis: connection refused".to_owned()));
    }

    #[test]
    fn dashboard_settles_against_demo_cluster() {
        let gateway = DemoGateway::new(17);
        let mut app = App::new(AppOptions::default());
        app.update(Message::Resize {
            width: 140,
            height: 32,
        });
        let commands = app.init();
        settle(&mut app, &gateway, commands);

        assert_eq!(app.state().connection_error, None);
        assert_eq!(Some(app.metrics().data()), gateway.cluster().ok().map(|c| c.stats()));

        for hotkey in ['2', '3', '4', '5', '6'] {
            let commands = app.update(Message::Key(crossterm::event::KeyEvent::new(
                crossterm::event::KeyCode::Char(hotkey),
                crossterm::event::KeyModifiers::NONE,
            )));
            settle(&mut app, &gateway, commands);
            let plain = app.view().to_plain();
            assert_eq!(plain.len(), 32);
            assert!(plain[1].contains(app.state().active_pane.label()));
        }
        assert_eq!(app.state().active_pane, PaneKind::Dead);
        assert_eq!(gateway.paged_calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unreachable_store_surfaces_connection_error() {
        let mut app = App::new(AppOptions::default());
        app.update(Message::Resize {
            width: 100,
            height: 24,
        });
        let commands = app.init();
        settle(&mut app, &DownGateway, commands);

        assert!(app.state().connection_error.is_some());
        let plain = app.view().to_plain();
        assert!(plain.iter().any(|line| line.contains("Connection Error")));
    }

    #[test]
    fn queued_messages_apply_in_arrival_order() {
        let mut app = App::new(AppOptions::default());
        app.update(Message::Resize {
            width: 100,
            height: 24,
        });
        let (tx, rx) = mpsc::channel();
        for processed in [1, 2, 3] {
            let stats = Stats {
                processed,
                ..Stats::default()
            };
            let sent = tx.send(Message::Fetched {
                request: FetchRequest::Stats,
                result: Ok(FetchData::Stats(stats)),
                at: REFERENCE_NOW,
            });
            assert!(sent.is_ok());
        }
        let mut pending = Vec::new();
        drain_messages(&mut app, &rx, &mut pending);
        assert!(pending.is_empty());
        assert_eq!(app.metrics().data().processed, 3);
    }

    #[test]
    fn gateway_is_shareable_across_threads() {
        let gateway = Arc::new(DemoGateway::new(5));
        let handles = (0..4)
            .map(|_| {
                let gateway = Arc::clone(&gateway);
                std::thread::spawn(move || fetch_message(gateway.as_ref(), FetchRequest::Workers))
            })
            .collect::<Vec<_>>();
        for handle in handles {
            let message = handle.join().expect("fetch thread panicked");
            assert!(matches!(
                message,
                Message::Fetched {
                    result: Ok(FetchData::Workers(_)),
                    ..
                }
            ));
        }
    }
}
