//! The `ask` command and the answer output shared with `show`.

use std::error::Error;
use std::io::{self, IsTerminal, Write};

use ratatui::crossterm::{cursor, execute, terminal};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::cli::Context;
use crate::core::animator::TypingAnimator;
use crate::core::i18n;
use crate::core::speech::CommandSpeech;
use crate::ui::ansi::line_to_string;
use crate::ui::markdown::html::to_html;
use crate::ui::markdown::terminal::{render_lines, TerminalOptions};
use crate::ui::markdown::{parse, TexChecker};
use crate::ui::theme::Theme;

/// Output switches shared by `ask` and `show`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print the raw markdown answer
    #[arg(long, conflicts_with = "html")]
    pub raw: bool,
    /// Print the answer as an HTML fragment
    #[arg(long)]
    pub html: bool,
    /// Disable colors
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Styled,
    Plain,
    Raw,
    Html,
}

impl OutputFormat {
    pub fn select(args: &OutputArgs, is_tty: bool) -> Self {
        if args.html {
            OutputFormat::Html
        } else if args.raw {
            OutputFormat::Raw
        } else if args.no_color || !is_tty {
            OutputFormat::Plain
        } else {
            OutputFormat::Styled
        }
    }

    fn is_terminal_rendering(self) -> bool {
        matches!(self, OutputFormat::Styled | OutputFormat::Plain)
    }
}

pub struct AskOptions {
    pub question: String,
    pub backend: Option<String>,
    pub server: Option<String>,
    pub new: bool,
    pub speak: bool,
    pub animate: bool,
    pub output: OutputArgs,
}

/// Terminal width in columns, 0 when unknown.
pub fn terminal_width() -> usize {
    terminal::size().map(|(w, _)| usize::from(w)).unwrap_or(0)
}

/// Renders one answer in the requested format; the result ends with a newline.
pub fn render_answer(
    answer: &str,
    theme: &Theme,
    options: TerminalOptions,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Raw => format!("{answer}\n"),
        OutputFormat::Html => to_html(&parse(answer), &TexChecker),
        OutputFormat::Styled | OutputFormat::Plain => {
            let color = format == OutputFormat::Styled;
            render_lines(&parse(answer), theme, options)
                .iter()
                .map(|line| line_to_string(line, color) + "\n")
                .collect()
        }
    }
}

/// Screen rows taken by `text` when printed at `columns` wide.
pub fn rows_used(text: &str, columns: usize) -> usize {
    text.split('\n')
        .map(|line| {
            let width = UnicodeWidthStr::width(line);
            if columns == 0 || width == 0 {
                1
            } else {
                width.div_ceil(columns)
            }
        })
        .sum()
}

/// Prints the animation frames as they come, until the answer is complete or
/// Ctrl+C skips to the end.
async fn reveal(animator: &mut TypingAnimator) -> io::Result<String> {
    let mut frames = animator.subscribe();
    let mut shown = 0usize;
    let mut stdout = io::stdout();
    loop {
        let frame = frames.borrow_and_update().clone();
        if let Some(delta) = frame.text.get(shown..) {
            write!(stdout, "{delta}")?;
            stdout.flush()?;
            shown = frame.text.len();
        }
        if frame.done {
            return Ok(frame.text);
        }
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    return Ok(frame.text);
                }
            }
            _ = tokio::signal::ctrl_c() => animator.finish(),
        }
    }
}

/// Moves back over the revealed text so the rendered answer replaces it.
fn erase(text: &str, columns: usize) -> io::Result<()> {
    let mut stdout = io::stdout();
    let up = rows_used(text, columns).saturating_sub(1);
    execute!(stdout, cursor::MoveToColumn(0))?;
    if up > 0 {
        execute!(stdout, cursor::MoveUp(u16::try_from(up).unwrap_or(u16::MAX)))?;
    }
    execute!(stdout, terminal::Clear(terminal::ClearType::FromCursorDown))
}

pub async fn run_ask(ctx: &Context, options: AskOptions) -> Result<(), Box<dyn Error>> {
    let question = options.question.trim().to_string();
    if question.is_empty() {
        eprintln!("Usage: duochat ask <question>");
        std::process::exit(1);
    }

    let mut session = ctx
        .session(options.backend.as_deref(), options.server.as_deref())?
        .with_animator(TypingAnimator::new(ctx.config.typing_interval()));
    if options.new {
        session.new_conversation();
    }

    let cancel = session.cancel_token();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
    let strings = i18n::strings(session.store().settings().language);
    eprintln!("⏳ {}", strings.generating);
    let result = session.submit(&question).await;
    watcher.abort();
    let record = result?;

    let stdout_tty = io::stdout().is_terminal();
    let format = OutputFormat::select(&options.output, stdout_tty);
    let columns = terminal_width();
    let theme = Theme::from_settings(session.store().settings());
    let render_options = TerminalOptions {
        width: columns,
        syntax: ctx.config.syntax_enabled(),
    };

    if options.animate && stdout_tty && format.is_terminal_rendering() {
        let revealed = reveal(session.animator_mut()).await?;
        erase(&revealed, columns)?;
    } else {
        session.animator_mut().finish();
    }
    debug!(record = %record.id, ?format, "printing answer");
    print!("{}", render_answer(&record.answer, &theme, render_options, format));
    io::stdout().flush()?;

    if options.speak {
        let speech = CommandSpeech::new(ctx.config.speech_command());
        session.speak(&record, &speech);
        speech.wait().await?;
    }
    Ok(())
}
