use std::time::Duration;

use anyhow::{ensure, Result};
use clap::Parser;
use fetch_core::{DataFetcher, FetchState};
use shared::{
    domain::{UserId, DEFAULT_USER_COUNT},
    protocol::{profile_url, UserPayload},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::watch,
    time::{interval_at, Instant},
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "https://jsonplaceholder.typicode.com")]
    server_url: String,
    #[arg(long, default_value_t = DEFAULT_USER_COUNT)]
    user_count: i64,
    #[arg(long, default_value_t = 1)]
    start_user: i64,
    #[arg(long)]
    auto_advance_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    ensure!(args.user_count >= 1, "user-count must be at least 1");
    ensure!(
        (1..=args.user_count).contains(&args.start_user),
        "start-user must be between 1 and user-count"
    );
    ensure!(
        args.auto_advance_ms != Some(0),
        "auto-advance-ms must be positive"
    );

    println!(
        "cycling {} demo users via {}",
        args.user_count, args.server_url
    );
    info!(server_url = %args.server_url, user_count = args.user_count, "app: starting user cycle");

    let cycle = UserCycle::new(args.server_url, args.user_count, UserId(args.start_user));
    let state = cycle.subscribe();

    match args.auto_advance_ms {
        Some(interval_ms) => run_auto_advance(cycle, state, interval_ms).await?,
        None => run_interactive(cycle, state).await?,
    }

    info!("app: exiting");
    Ok(())
}

struct UserCycle {
    server_url: String,
    user_count: i64,
    current_user: UserId,
    fetcher: DataFetcher<UserPayload>,
}

impl UserCycle {
    fn new(server_url: String, user_count: i64, first_user: UserId) -> Self {
        let cycle = Self {
            fetcher: DataFetcher::new(),
            server_url,
            user_count,
            current_user: first_user,
        };
        cycle
            .fetcher
            .set_url(profile_url(&cycle.server_url, first_user));
        cycle
    }

    fn subscribe(&self) -> watch::Receiver<FetchState<UserPayload>> {
        self.fetcher.subscribe()
    }

    fn advance(&mut self) {
        let next = self.current_user.next_in_cycle(self.user_count);
        debug!(from = self.current_user.0, to = next.0, "app: advancing selection");
        self.current_user = next;
        self.fetcher.set_url(profile_url(&self.server_url, next));
    }
}

async fn run_interactive(
    mut cycle: UserCycle,
    mut state: watch::Receiver<FetchState<UserPayload>>,
) -> Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    render_interactive(cycle.current_user, &state.borrow_and_update());
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                render_interactive(cycle.current_user, &state.borrow());
            }
            line = input.next_line() => {
                match line? {
                    Some(_) => cycle.advance(),
                    None => break,
                }
            }
        }
    }
    Ok(())
}

async fn run_auto_advance(
    mut cycle: UserCycle,
    mut state: watch::Receiver<FetchState<UserPayload>>,
    interval_ms: u64,
) -> Result<()> {
    let period = Duration::from_millis(interval_ms);
    // interval() fires immediately; delay the first advance by one period.
    let mut ticker = interval_at(Instant::now() + period, period);
    render(cycle.current_user, &state.borrow_and_update());
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                render(cycle.current_user, &state.borrow());
            }
            _ = ticker.tick() => cycle.advance(),
        }
    }
    Ok(())
}

fn render(user_id: UserId, state: &FetchState<UserPayload>) {
    for line in state_lines(user_id, state) {
        println!("{line}");
    }
}

fn render_interactive(user_id: UserId, state: &FetchState<UserPayload>) {
    render(user_id, state);
    if state.settled() {
        println!("[Enter] load next user (current: {})", user_id.0);
    }
}

fn state_lines(user_id: UserId, state: &FetchState<UserPayload>) -> Vec<String> {
    if state.loading {
        return vec![format!("loading user {} ...", user_id.0)];
    }
    if let Some(error) = &state.error {
        return vec![format!("error loading user {}: {error}", user_id.0)];
    }
    let Some(user) = &state.data else {
        return Vec::new();
    };
    let mut lines = vec![
        String::new(),
        user.name.clone(),
        format!("  email:   {}", user.email),
        format!("  phone:   {}", user.phone),
        format!("  website: http://{}", user.website),
        format!("  company: {}", user.company.name),
    ];
    if let Some(catch_phrase) = &user.company.catch_phrase {
        lines.push(format!("  \"{catch_phrase}\""));
    }
    lines.push(String::new());
    lines
}
