//! Conversation commands: `new`, `list`, `show`, `switch`, `rename`, `export`.

use std::error::Error;
use std::io::{self, IsTerminal};
use std::path::Path;

use chrono::Local;
use ratatui::text::{Line, Span};

use crate::cli::ask::{render_answer, terminal_width, OutputArgs, OutputFormat};
use crate::cli::Context;
use crate::core::conversation::{Conversation, ExchangeRecord};
use crate::core::i18n;
use crate::core::speech::{CommandSpeech, SpeechPort};
use crate::core::store::ConversationStore;
use crate::ui::ansi::line_to_string;
use crate::ui::markdown::html::escape;
use crate::ui::markdown::terminal::TerminalOptions;
use crate::ui::theme::Theme;

pub fn new_conversation(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let mut session = ctx.session(None, None)?;
    let conversation = session.new_conversation();
    println!("{}  {}", conversation.id, conversation.title);
    Ok(())
}

/// One row of `duochat list`.
pub fn list_row(store: &ConversationStore, conversation: &Conversation) -> String {
    let marker = if store.current_conversation_id() == Some(conversation.id.as_str()) {
        "*"
    } else {
        " "
    };
    let count = store.exchanges_for(&conversation.id).len();
    format!(
        "{marker} {}  {}  ({count})  {}",
        conversation.id,
        conversation
            .updated_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M"),
        conversation.title
    )
}

pub fn list(ctx: &Context, search: Option<&str>) -> Result<(), Box<dyn Error>> {
    let store = ctx.open_store()?;
    let conversations = store.search(search.unwrap_or(""));
    if conversations.is_empty() {
        let strings = i18n::strings(store.settings().language);
        println!("{}", strings.no_conversations);
        return Ok(());
    }
    for conversation in conversations {
        println!("{}", list_row(&store, conversation));
    }
    Ok(())
}

/// `id`, else the current conversation.
fn resolve_id(store: &ConversationStore, id: Option<&str>) -> Result<String, Box<dyn Error>> {
    match id {
        Some(id) if store.conversation(id).is_some() => Ok(id.to_string()),
        Some(id) => Err(format!("Unknown conversation: {id}").into()),
        None => store
            .current_conversation_id()
            .map(str::to_string)
            .ok_or_else(|| "No current conversation; use 'duochat new' or pass an id".into()),
    }
}

/// Oldest exchange first, as a conversation reads.
pub fn render_transcript(
    records: &[&ExchangeRecord],
    theme: &Theme,
    options: TerminalOptions,
    format: OutputFormat,
) -> String {
    let mut out = String::new();
    for record in records.iter().rev() {
        match format {
            OutputFormat::Html => {
                out.push_str(&format!(
                    "<p class=\"question\">{}</p>\n",
                    escape(&record.question)
                ));
            }
            OutputFormat::Raw => out.push_str(&format!("> {}\n\n", record.question)),
            OutputFormat::Styled | OutputFormat::Plain => {
                let line = Line::from(vec![
                    Span::styled("❯ ", theme.user_prefix_style),
                    Span::styled(record.question.clone(), theme.text_style),
                ]);
                out.push_str(&line_to_string(&line, format == OutputFormat::Styled));
                out.push_str("\n\n");
            }
        }
        out.push_str(&render_answer(&record.answer, theme, options, format));
        if format != OutputFormat::Html {
            out.push('\n');
        }
    }
    out
}

pub async fn show(
    ctx: &Context,
    id: Option<&str>,
    speak: bool,
    output: &OutputArgs,
) -> Result<(), Box<dyn Error>> {
    let store = ctx.open_store()?;
    let id = resolve_id(&store, id)?;
    let records = store.exchanges_for(&id);
    let format = OutputFormat::select(output, io::stdout().is_terminal());
    let theme = Theme::from_settings(store.settings());
    let options = TerminalOptions {
        width: terminal_width(),
        syntax: ctx.config.syntax_enabled(),
    };

    if let Some(conversation) = store.conversation(&id) {
        if format != OutputFormat::Html {
            println!("# {}\n", conversation.title);
        }
    }
    print!("{}", render_transcript(&records, &theme, options, format));

    if speak {
        if let Some(latest) = records.first() {
            let speech = CommandSpeech::new(ctx.config.speech_command());
            speech.speak(&latest.answer, store.settings().language)?;
            speech.wait().await?;
        }
    }
    Ok(())
}

pub fn switch(ctx: &Context, id: &str) -> Result<(), Box<dyn Error>> {
    let mut store = ctx.open_store()?;
    store.select_conversation(id)?;
    println!("✅ Current conversation: {id}");
    Ok(())
}

pub fn rename(ctx: &Context, id: &str, title: &str) -> Result<(), Box<dyn Error>> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Title cannot be empty".into());
    }
    let mut store = ctx.open_store()?;
    store.rename_conversation(id, title)?;
    println!("✅ Renamed {id} to: {title}");
    Ok(())
}

pub fn export(ctx: &Context, id: Option<&str>, dir: &Path) -> Result<(), Box<dyn Error>> {
    let session = ctx.session(None, None)?;
    let id = resolve_id(session.store(), id)?;
    let path = session.export(&id, dir)?;
    println!("{}", path.display());
    Ok(())
}
