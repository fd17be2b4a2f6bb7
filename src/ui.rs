use crate::client::{TaskApi, TaskClient};
use crate::error::{ClientError, Ticket};
use crate::task::{StatusFilter, TaskPatch};
use crate::task_board::TaskBoard;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Frame, Terminal,
};
use std::io;

const HELP: &str = "a add  e edit  space toggle  d delete  tab/1-3 filter  r refresh  q quit";

pub async fn run_app<B: Backend, A: TaskApi>(
    terminal: &mut Terminal<B>,
    client: &mut TaskClient<A>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, client.board()))?;

        let Event::Key(key) = next_event().await? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let action = match key.code {
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Char('a') => {
                let title = ask("Enter task title").await?;
                terminal.clear()?;
                title.map(|title| client.add_task(&title))
            }
            KeyCode::Char('e') => match selected_id(client.board()) {
                Some(id) => {
                    let title = ask("Enter new title").await?;
                    terminal.clear()?;
                    title.map(|title| client.update_task(&id, TaskPatch::title(title)))
                }
                None => None,
            },
            KeyCode::Char(' ') => selected_id(client.board()).map(|id| client.toggle_complete(&id)),
            KeyCode::Char('d') => selected_id(client.board()).map(|id| client.delete_task(&id)),
            KeyCode::Char('r') => {
                // Failure leaves the banner up.
                let _ = client.refresh().await;
                None
            }
            KeyCode::Tab | KeyCode::Char('1' | '2' | '3') => {
                let filter = match key.code {
                    KeyCode::Char('1') => StatusFilter::All,
                    KeyCode::Char('2') => StatusFilter::Active,
                    KeyCode::Char('3') => StatusFilter::Completed,
                    _ => client.board().filter.next(),
                };
                client.board_mut().set_filter(filter);
                None
            }
            KeyCode::Up => {
                client.board_mut().select_previous();
                None
            }
            KeyCode::Down => {
                client.board_mut().select_next();
                None
            }
            _ => None,
        };

        if let Some(ticket) = started(action) {
            terminal.draw(|f| draw(f, client.board()))?;
            if let Err(error) = client.settle(ticket).await {
                tracing::error!(%error, "Could not settle action");
            }
        }
    }
}

fn started(action: Option<Result<Ticket, ClientError>>) -> Option<Ticket> {
    match action? {
        Ok(ticket) => Some(ticket),
        Err(error) => {
            tracing::info!(%error, "Action refused");
            None
        }
    }
}

fn selected_id(board: &TaskBoard) -> Option<String> {
    board.selected().map(|task| task.id.clone())
}

fn draw(f: &mut Frame, board: &TaskBoard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(if board.error.is_some() { 1 } else { 0 }),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let stats = board.stats();
    let titles = StatusFilter::ALL.iter().map(|filter| {
        let count = match filter {
            StatusFilter::All => stats.total,
            StatusFilter::Active => stats.active,
            StatusFilter::Completed => stats.completed,
        };
        format!("{} ({count})", filter.label())
    });
    let selected_tab = StatusFilter::ALL
        .iter()
        .position(|filter| *filter == board.filter)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(Block::default().title("Daily Task Manager").borders(Borders::ALL))
        .select(selected_tab)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    if let Some(error) = &board.error {
        f.render_widget(
            Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
            chunks[1],
        );
    }

    let tasks = board.visible_tasks();
    let list_title = format!("Tasks ({})", tasks.len());
    if tasks.is_empty() {
        let message = match board.filter {
            StatusFilter::All => "No tasks yet. Press 'a' to add your first task!".to_string(),
            other => format!("No {} tasks found.", other.label().to_lowercase()),
        };
        f.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title(list_title).borders(Borders::ALL)),
            chunks[2],
        );
    } else {
        let items: Vec<ListItem> = tasks
            .iter()
            .map(|t| {
                let (mark, style) = if t.completed {
                    let done = Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT);
                    ("[x] ", done)
                } else {
                    ("[ ] ", Style::default().fg(Color::White))
                };
                let mut spans = vec![Span::raw(mark), Span::styled(t.title.as_str(), style)];
                if t.is_placeholder() {
                    spans.push(Span::styled(" (saving)", Style::default().fg(Color::Yellow)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title(list_title).borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
        let mut state = ListState::default().with_selected(Some(board.selected_task));
        f.render_stateful_widget(list, chunks[2], &mut state);
    }

    f.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );
}

// Terminal reads block, so they run off the async workers.
async fn next_event() -> io::Result<Event> {
    tokio::task::spawn_blocking(event::read)
        .await
        .map_err(io::Error::other)?
}

async fn ask(message: &'static str) -> io::Result<Option<String>> {
    tokio::task::spawn_blocking(move || prompt(message))
        .await
        .map_err(io::Error::other)
}

fn prompt(message: &str) -> Option<String> {
    disable_raw_mode().ok();
    println!("{}", message);
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input);
    enable_raw_mode().ok();
    match read {
        Ok(_) if !input.trim().is_empty() => Some(input.trim().to_string()),
        _ => None,
    }
}
