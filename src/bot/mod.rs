//! Telegram bot module - Log today's planned workout set by set from a phone

use std::sync::Arc;

use chrono::Local;
use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage},
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup},
    utils::command::BotCommands,
};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::db::Database;
use crate::session::{LoggingSession, SetInput};

type MyDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

const ACCEPT_PLANNED: &str = "set:planned";

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    /// A workout is being logged
    Logging { session: LoggingSession },
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Commands:")]
pub enum Command {
    #[command(description = "Start")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "List plans")]
    Plans,
    #[command(description = "Show today's workout")]
    Today,
    #[command(description = "Log today's workout")]
    Log,
    #[command(description = "Abandon the current session")]
    Cancel,
}

fn planned_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "As planned",
        ACCEPT_PLANNED,
    )]])
}

/// Start the Telegram bot
pub async fn run_bot(token: String, db_path: &str) -> anyhow::Result<()> {
    let bot = Bot::new(token);
    let db = Arc::new(Mutex::new(Database::open(db_path)?));
    info!(db_path, "bot starting");

    let handler = dptree::entry()
        .enter_dialogue::<Update, InMemStorage<State>, State>()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            Update::filter_message()
                .endpoint(handle_message),
        )
        .branch(
            Update::filter_callback_query()
                .endpoint(handle_callback),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<State>::new(), db])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: MyDialogue,
    db: Arc<Mutex<Database>>,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            let text = "liftplan\n\n\
                /plans - your plans\n\
                /today - today's workout\n\
                /log - log today's workout\n\
                /cancel - stop logging";
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }

        Command::Plans => {
            let plans = db.lock().await.list_plans()?;
            let text = if plans.is_empty() {
                "No plans yet.".to_string()
            } else {
                plans
                    .iter()
                    .map(|p| format!("#{} {} - {} weeks ({})", p.id, p.name, p.weeks, p.status.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Today => {
            let text = match today_session(&db).await? {
                Today::Ready(session) => format_workout(&session),
                Today::Unavailable(reason) => reason,
            };
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Log => match today_session(&db).await? {
            Today::Ready(session) => {
                let Some(prompt) = session.prompt() else {
                    bot.send_message(msg.chat.id, "Nothing to log today.").await?;
                    return Ok(());
                };
                dialogue.update(State::Logging { session }).await?;
                bot.send_message(msg.chat.id, format!("{}\n\nReply: reps [weight] [kg|lb]", prompt))
                    .reply_markup(planned_keyboard())
                    .await?;
            }
            Today::Unavailable(reason) => {
                bot.send_message(msg.chat.id, reason).await?;
            }
        },

        Command::Cancel => {
            dialogue.reset().await?;
            bot.send_message(msg.chat.id, "Session abandoned.").await?;
        }
    }

    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dialogue: MyDialogue,
    db: Arc<Mutex<Database>>,
) -> HandlerResult {
    bot.answer_callback_query(q.id).await?;

    if q.data.as_deref() != Some(ACCEPT_PLANNED) {
        return Ok(());
    }
    let Some(msg) = q.message else {
        return Ok(());
    };
    if let Some(State::Logging { session }) = dialogue.get().await? {
        record_set(&bot, msg.chat().id, &dialogue, &db, session, SetInput::default()).await?;
    }
    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    dialogue: MyDialogue,
    db: Arc<Mutex<Database>>,
) -> HandlerResult {
    let state = dialogue.get().await?.unwrap_or_default();

    match state {
        State::Logging { session } => {
            let has_video = msg.video().is_some();
            let Some(mut input) =
                set_text(msg.text().or(msg.caption()), has_video).and_then(SetInput::parse)
            else {
                bot.send_message(msg.chat.id, "Reply: reps [weight] [kg|lb], or + for the plan")
                    .await?;
                return Ok(());
            };
            input.video = msg.video().map(|v| v.file.id.to_string());
            record_set(&bot, msg.chat.id, &dialogue, &db, session, input).await?;
        }

        State::Start => {
            bot.send_message(msg.chat.id, "Send /log to start today's workout")
                .await?;
        }
    }

    Ok(())
}

/// Text to read a set from. A video's caption carries the set and a bare
/// video accepts the plan; stickers, photos and the like carry no set.
fn set_text(text: Option<&str>, has_video: bool) -> Option<&str> {
    match text {
        Some(text) => Some(text),
        None if has_video => Some("+"),
        None => None,
    }
}

async fn record_set(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &MyDialogue,
    db: &Arc<Mutex<Database>>,
    mut session: LoggingSession,
    input: SetInput,
) -> HandlerResult {
    if !session.record(input) {
        warn!(%chat_id, "set recorded after session finished");
        dialogue.reset().await?;
        return Ok(());
    }

    for video in session.take_pending_videos() {
        info!(%chat_id, video = %video, "form-check video attached");
    }

    if let Some(prompt) = session.prompt() {
        dialogue.update(State::Logging { session }).await?;
        bot.send_message(chat_id, prompt)
            .reply_markup(planned_keyboard())
            .await?;
        return Ok(());
    }

    let mut log = session.into_log();
    let saved = db.lock().await.save_log(&mut log);
    dialogue.reset().await?;

    match saved {
        Ok(_) => {
            let text = format!(
                "Workout done!\n\n{} sets, volume {:.0}",
                log.set_count(),
                log.total_volume()
            );
            bot.send_message(chat_id, text).await?;
        }
        Err(e) => {
            error!(%chat_id, "failed to save workout log: {:#}", e);
            bot.send_message(chat_id, "Could not save the workout, sorry.").await?;
        }
    }
    Ok(())
}

enum Today {
    Ready(LoggingSession),
    /// Reason shown to the user
    Unavailable(String),
}

/// Session for today's workout of the plan in progress
async fn today_session(db: &Arc<Mutex<Database>>) -> anyhow::Result<Today> {
    let Some(plan) = db.lock().await.active_plan()? else {
        return Ok(Today::Unavailable("No plan in progress.".to_string()));
    };
    let today = Local::now().date_naive();
    let Some((week, workout)) = plan.workout_on(today) else {
        return Ok(Today::Unavailable(format!("Rest day in '{}'.", plan.name)));
    };
    Ok(Today::Ready(LoggingSession::new(
        plan.id,
        week.position,
        workout.clone(),
        today,
    )))
}

fn format_workout(session: &LoggingSession) -> String {
    let mut text = format!("Today ({}):\n\n", session.log().day);
    for exercise in session.exercises() {
        text.push_str(&format!(
            "- {} {}x{} @ {} {}\n",
            exercise.name,
            exercise.sets,
            exercise.repetitions,
            exercise.weight,
            exercise.unit.label()
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_text_from_message() {
        assert_eq!(set_text(Some("5 100"), false), Some("5 100"));
        assert_eq!(set_text(Some("5 100"), true), Some("5 100"));
        assert_eq!(set_text(None, true), Some("+"));
    }

    #[test]
    fn test_non_text_message_logs_nothing() {
        assert_eq!(set_text(None, false), None);
        assert!(set_text(None, false).and_then(SetInput::parse).is_none());
    }
}
