use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use kanban_core::form::{ActiveForm, ColumnForm, FormInput, TaskForm};
use kanban_core::store::{BoardEvent, BoardState, BoardStore};
use kanban_core::{Board, Command};
use kanban_sync::{BoardClient, ClientConfig, ClientEvent, ConnectionParams};

#[derive(Parser, Debug)]
#[command(author, version, about = "kanban: live board channel client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Join a board and log every state change until redirected or interrupted.
    Watch(WatchArgs),
    /// Play a short scripted session on a local-only board.
    Trial,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Slug of the board to join.
    slug: String,

    /// Base websocket URL of the board server.
    #[arg(long, default_value = "ws://127.0.0.1:8000")]
    server: String,

    /// Network address reported to the server.
    #[arg(long, default_value = "127.0.0.1")]
    client_ip: String,

    /// Session credential.
    #[arg(long)]
    token: Option<String>,

    /// Invitation token for joining the board.
    #[arg(long)]
    invite: Option<String>,

    /// Slug of the local user.
    #[arg(long)]
    user: Option<String>,

    /// Reconnection attempts before giving up.
    #[arg(long, default_value_t = 2)]
    max_retries: u32,

    /// Post this chat message once the board is live.
    #[arg(long)]
    say: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Watch(args) => watch(args).await,
        Commands::Trial => trial(),
    }
}

async fn watch(args: WatchArgs) -> anyhow::Result<()> {
    let config = ClientConfig {
        server_url: args.server,
        max_retries: args.max_retries,
        ..ClientConfig::default()
    };
    let mut params = ConnectionParams::new(args.slug, args.client_ip);
    params.auth_token = args.token;
    params.invite_token = args.invite;
    params.identity = args.user;

    let mut client = BoardClient::new(config, params);
    let mut events = client
        .take_event_rx()
        .context("event receiver already taken")?;
    if let Err(err) = client.connect().await {
        log::error!("{err}");
    }

    let mut pending_message = args.say;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ClientEvent::StateChanged(state)) => {
                    log_state(&state);
                    if state.can_send() {
                        if let Some(text) = pending_message.take() {
                            let command = Command::CreateMsg { board_msg: text };
                            client.dispatch(BoardEvent::StartCommand(command)).await?;
                        }
                    }
                }
                Some(ClientEvent::Redirect(target)) => {
                    log::info!("redirected to {target:?}");
                    break;
                }
                Some(ClientEvent::Connected) => log::info!("connected"),
                Some(ClientEvent::Disconnected) => log::info!("disconnected"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted");
                break;
            }
        }
    }

    client.close().await;
    Ok(())
}

fn log_state(state: &BoardState) {
    match &state.board {
        Some(board) => log::info!(
            "{:?}: {:?} with {} columns, {} tasks, {} members (role {:?}{})",
            state.phase,
            board.board_title,
            board.columns.len(),
            board.tasks.len(),
            board.memberships.len(),
            state.role,
            if state.is_sending() { ", sending" } else { "" },
        ),
        None => log::info!("{:?}", state.phase),
    }
    if let Some(notice) = &state.modal {
        log::warn!("notice: {notice}");
    }
}

fn trial() -> anyhow::Result<()> {
    let mut store = BoardStore::new();
    store.dispatch(BoardEvent::LoadTrialBoard);

    let Some(board) = store.state().board.clone() else {
        bail!("trial board did not load");
    };
    let columns: Vec<i64> = board.sorted_columns().iter().map(|c| c.column_id).collect();
    let &[todo, doing, done] = columns.as_slice() else {
        bail!("unexpected trial board layout");
    };
    let Some(first) = board.column_tasks(todo).first().map(|t| t.task_id) else {
        bail!("trial board has no starter task");
    };

    store.dispatch(BoardEvent::OpenForm(ActiveForm::Task(TaskForm {
        column_id: todo,
        task_id: None,
        text: String::new(),
    })));
    store.dispatch(BoardEvent::FormInput(FormInput::TaskText(
        "Write the release notes".to_string(),
    )));
    store.dispatch(BoardEvent::SubmitForm);

    store.dispatch(BoardEvent::MoveTask {
        task_id: first,
        old_index: 0,
        new_index: 0,
        old_column: todo,
        new_column: doing,
    });

    store.dispatch(BoardEvent::OpenForm(ActiveForm::Column(ColumnForm {
        column_title: "Review".to_string(),
        ..ColumnForm::default()
    })));
    store.dispatch(BoardEvent::SubmitForm);

    let review = store
        .state()
        .board
        .as_ref()
        .and_then(|b| b.columns.iter().find(|c| c.column_title == "Review"))
        .map(|c| (c.column_id, c.column_index));
    if let Some((column_id, old_index)) = review {
        store.dispatch(BoardEvent::MoveColumn {
            column_id,
            old_index,
            new_index: 2,
        });
    }
    store.dispatch(BoardEvent::DeleteColumn { column_id: done });

    match &store.state().board {
        Some(board) => print_board(board),
        None => bail!("trial board vanished"),
    }
    store.dispose();
    Ok(())
}

fn print_board(board: &Board) {
    println!("{}", board.board_title);
    for column in board.sorted_columns() {
        let count = board.column_task_count(column.column_id);
        let wip = if column.wip_limit_on {
            let flag = if board.wip_exceeded(column.column_id) { " over limit" } else { "" };
            format!(" ({count}/{}{flag})", column.wip_limit)
        } else {
            format!(" ({count})")
        };
        println!("  [{}] {}{}", column.column_index, column.column_title, wip);
        for task in board.column_tasks(column.column_id) {
            println!("      {}. {}", task.task_index, task.text);
        }
    }
}
