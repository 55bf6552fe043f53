use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::event::KeyboardEnhancementFlags;
use crossterm::event::PopKeyboardEnhancementFlags;
use crossterm::event::PushKeyboardEnhancementFlags;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::supports_keyboard_enhancement;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::widgets::Wrap;
use ratatui::Terminal;
use tokio::sync::mpsc;

use super::cli::ChatOptions;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::GenerationCounter;
use crate::domain::models::Loading;
use crate::domain::models::TextArea;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;

const SIDEBAR_WIDTH: u16 = 32;

fn insert_text(textarea: &mut tui_textarea::TextArea<'_>, text: &str) {
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            textarea.insert_newline();
        }
        textarea.insert_str(line.trim_end_matches('\r'));
    }
}

fn sidebar_lines<'a>(app_state: &AppState<'_>) -> Vec<Line<'a>> {
    let heading = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let mut lines = vec![Line::from(Span::styled("Document sets", heading))];

    if app_state.is_manifest_loading {
        lines.push(Line::from("Loading..."));
    } else if app_state.document_sets.is_empty() {
        lines.push(Line::from("None available"));
    } else {
        for (idx, set) in app_state.document_sets.sets().iter().enumerate() {
            lines.push(Line::from(format!("({}) {}", idx + 1, set.display_name())));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Active documents", heading)));
    if app_state.files.is_empty() {
        lines.push(Line::from("None"));
    } else {
        for file in &app_state.files {
            lines.push(Line::from(format!("- {file}")));
        }
    }

    let status = if app_state.is_parsing {
        Span::styled("Reading documents", Style::default().fg(Color::Yellow))
    } else if app_state.is_loading {
        Span::styled("Waiting for a reply", Style::default().fg(Color::Yellow))
    } else if app_state.is_chat_ready() {
        Span::styled("Ready", Style::default().fg(Color::Green))
    } else {
        Span::styled("No documents", Style::default().fg(Color::DarkGray))
    };

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Status", heading)));
    lines.push(Line::from(status));

    return lines;
}

fn render_sidebar(frame: &mut Frame, rect: Rect, app_state: &AppState<'_>) {
    frame.render_widget(
        Paragraph::new(sidebar_lines(app_state))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title("Docchat")
                    .padding(Padding::new(1, 1, 0, 0)),
            )
            .wrap(Wrap { trim: false }),
        rect,
    );
}

fn render_hint(frame: &mut Frame, rect: Rect, hint: &str) {
    frame.render_widget(
        Paragraph::new(hint.to_string())
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().padding(Padding::new(2, 2, 1, 0)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        rect,
    );
}

fn render_error(frame: &mut Frame, rect: Rect, error: &str) {
    frame.render_widget(
        Paragraph::new(error.to_string())
            .style(Style::default().fg(Color::Red))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Red))
                    .title("Error"),
            )
            .wrap(Wrap { trim: true }),
        rect,
    );
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<'_>,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
    options: ChatOptions,
) -> Result<()> {
    let mut events = EventsService::new(rx);
    let mut chat_ready = app_state.is_chat_ready();
    let mut textarea = TextArea::new(chat_ready);
    let parsing = Loading::new("Reading your documents... /clear cancels.");
    let waiting = Loading::new("Waiting for a reply... /clear stops it.");

    tx.send(Action::LoadManifest())?;
    if !options.files.is_empty() {
        app_state.select_files(options.files, &tx)?;
    }
    app_state.pending_set = options.set;

    #[cfg(feature = "dev")]
    {
        insert_text(&mut textarea, "/set 1");
    }

    loop {
        if chat_ready != app_state.is_chat_ready() {
            chat_ready = app_state.is_chat_ready();
            let lines = textarea.lines().join("\n");
            textarea = TextArea::new(chat_ready);
            insert_text(&mut textarea, &lines);
        }

        terminal.draw(|frame| {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
                .split(frame.size());

            render_sidebar(frame, columns[0], app_state);

            let is_busy = app_state.is_parsing || app_state.is_loading;
            let mut constraints = vec![Constraint::Min(1)];
            if app_state.error.is_some() {
                constraints.push(Constraint::Length(4));
            }
            if is_busy {
                constraints.push(Constraint::Length(3));
            }
            constraints.push(Constraint::Max(4));

            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints(constraints)
                .split(columns[1]);

            if layout[0].width != app_state.last_known_width
                || layout[0].height != app_state.last_known_height
            {
                app_state.set_rect(layout[0]);
            }

            if let Some(hint) = app_state.empty_hint() {
                render_hint(frame, layout[0], hint);
            } else {
                app_state
                    .bubble_list
                    .render(frame, layout[0], app_state.scroll.position);
            }
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                layout[0].inner(&Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut app_state.scroll.scrollbar_state,
            );

            if let Some(error) = &app_state.error {
                render_error(frame, layout[1], error);
            }

            let input_rect = layout[layout.len() - 1];
            if is_busy {
                let loading_rect = layout[layout.len() - 2];
                if app_state.is_parsing {
                    parsing.render(frame, loading_rect);
                } else {
                    waiting.render(frame, loading_rect);
                }
            }
            frame.render_widget(textarea.widget(), input_rect);
        })?;

        match events.next().await? {
            Event::ManifestLoaded(res) => {
                app_state.handle_manifest_loaded(res);
                app_state.select_pending_set(&tx)?;
            }
            Event::FilesSelected(generation, file_names) => {
                app_state.handle_files_selected(generation, file_names);
            }
            Event::SessionReady(generation, file_names, session) => {
                app_state.handle_session_ready(generation, file_names, session);
            }
            Event::ProcessingFailed(generation, err) => {
                app_state.handle_processing_failed(generation, err);
            }
            Event::ReplyFragment(generation, text) => {
                app_state.handle_reply_fragment(generation, &text);
            }
            Event::ReplyDone(generation) => {
                app_state.handle_reply_done(generation);
            }
            Event::ReplyFailed(generation, err) => {
                app_state.handle_reply_failed(generation, err);
            }
            Event::KeyboardCharInput(input) => {
                textarea.input(input);
            }
            Event::KeyboardPaste(text) => {
                insert_text(&mut textarea, &text);
            }
            Event::KeyboardShiftEnter() => {
                textarea.insert_newline();
            }
            Event::KeyboardCTRLC() => {
                break;
            }
            Event::KeyboardEnter() => {
                let input_str = textarea.lines().join("\n");
                if input_str.trim().is_empty() {
                    continue;
                }

                textarea = TextArea::new(app_state.is_chat_ready());

                let (should_break, should_continue) =
                    app_state.handle_slash_commands(&input_str, &tx)?;
                if should_break {
                    break;
                }
                if should_continue {
                    continue;
                }

                if !app_state.send_message(input_str.trim(), &tx)? {
                    insert_text(&mut textarea, &input_str);
                }
            }
            Event::UIResize() => {
                continue;
            }
            Event::UIScrollDown() => {
                app_state.scroll.down();
            }
            Event::UIScrollUp() => {
                app_state.scroll.up();
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::UITick() => {
                continue;
            }
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(
        io::stdout(),
        PopKeyboardEnhancementFlags,
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
    generation: GenerationCounter,
    options: ChatOptions,
) -> Result<()> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;

    let enhanced_keyboard = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keyboard {
        crossterm::execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }

    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;
    let mut app_state = AppState::new(generation);

    start_loop(&mut terminal, &mut app_state, tx, rx, options).await?;

    if enhanced_keyboard {
        crossterm::execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return Ok(());
}
