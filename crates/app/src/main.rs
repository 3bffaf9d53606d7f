use std::fmt;
use std::time::Duration;

use arena_core::model::{SchoolId, UserId};
use services::{AppServices, Clock, SignUp};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_DB_URL: &str = "sqlite://arena.sqlite3?mode=rwc";
const DEFAULT_PACING_MS: u64 = 1500;
const DEFAULT_BOARD_LIMIT: usize = 10;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    UnknownSubcommand(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidAnswers { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing required {name}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownSubcommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidAnswers { raw } => {
                write!(f, "invalid --answers value (expected e.g. 1,0,2,1): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

/// Errors raised while driving a command after arguments parsed cleanly.
#[derive(Debug)]
enum CommandError {
    NotEnoughAnswers { given: usize },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NotEnoughAnswers { given } => {
                write!(f, "battle still running after {given} answers")
            }
        }
    }
}

impl std::error::Error for CommandError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn parse_answers(raw: &str) -> Result<Vec<usize>, ArgsError> {
    raw.split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ArgsError::InvalidAnswers {
            raw: raw.to_owned(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Chapters,
    Schools,
    Brief {
        code: String,
    },
    Play {
        code: String,
        answers: Vec<usize>,
        credentials: Option<Credentials>,
    },
    Leaderboard {
        limit: usize,
    },
    SignUp {
        credentials: Credentials,
        full_name: String,
        school_id: Option<SchoolId>,
    },
}

struct Args {
    db_url: String,
    pacing: Duration,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ARENA_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut pacing_ms = std::env::var("ARENA_PACING_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PACING_MS);

        let mut subcommand: Option<String> = None;
        let mut positional: Option<String> = None;
        let mut answers: Option<Vec<usize>> = None;
        let mut email: Option<String> = None;
        let mut password: Option<String> = None;
        let mut full_name: Option<String> = None;
        let mut school_id: Option<SchoolId> = None;
        let mut limit = DEFAULT_BOARD_LIMIT;

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--pacing-ms" => {
                    let value = require_value(&mut args, "--pacing-ms")?;
                    pacing_ms = parse_number(value, "--pacing-ms")?;
                }
                "--answers" => {
                    answers = Some(parse_answers(&require_value(&mut args, "--answers")?)?);
                }
                "--email" => email = Some(require_value(&mut args, "--email")?),
                "--password" => password = Some(require_value(&mut args, "--password")?),
                "--name" => full_name = Some(require_value(&mut args, "--name")?),
                "--school" => {
                    let id: u64 = parse_number(require_value(&mut args, "--school")?, "--school")?;
                    school_id = Some(SchoolId::new(id));
                }
                "--limit" => {
                    limit = parse_number(require_value(&mut args, "--limit")?, "--limit")?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if subcommand.is_none() => subcommand = Some(arg),
                _ if positional.is_none() => positional = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let credentials = match (email, password) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            (Some(_), None) => return Err(ArgsError::MissingValue { flag: "--password" }),
            (None, Some(_)) => return Err(ArgsError::MissingValue { flag: "--email" }),
            (None, None) => None,
        };

        let command = match subcommand.as_deref() {
            None | Some("chapters") => Command::Chapters,
            Some("schools") => Command::Schools,
            Some("brief") => Command::Brief {
                code: positional.ok_or(ArgsError::MissingArgument {
                    name: "chapter code",
                })?,
            },
            Some("play") => Command::Play {
                code: positional.ok_or(ArgsError::MissingArgument {
                    name: "chapter code",
                })?,
                answers: answers.ok_or(ArgsError::MissingValue { flag: "--answers" })?,
                credentials,
            },
            Some("leaderboard") => Command::Leaderboard { limit },
            Some("signup") => Command::SignUp {
                credentials: credentials.ok_or(ArgsError::MissingValue { flag: "--email" })?,
                full_name: full_name.ok_or(ArgsError::MissingValue { flag: "--name" })?,
                school_id,
            },
            Some(other) => return Err(ArgsError::UnknownSubcommand(other.to_owned())),
        };

        Ok(Self {
            db_url,
            pacing: Duration::from_millis(pacing_ms),
            command,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- chapters");
    eprintln!("  cargo run -p app -- schools");
    eprintln!("  cargo run -p app -- brief <code>");
    eprintln!("  cargo run -p app -- play <code> --answers 1,0,2,1 [--email <e> --password <p>]");
    eprintln!("  cargo run -p app -- leaderboard [--limit <n>]");
    eprintln!(
        "  cargo run -p app -- signup --email <e> --password <p> --name <full name> [--school <id>]"
    );
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --pacing-ms <ms>      Pause after each answer (default: {DEFAULT_PACING_MS})");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ARENA_DB_URL, ARENA_PACING_MS, RUST_LOG");
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("sqlite://") || trimmed.starts_with("sqlite:file:") {
        return trimmed.to_owned();
    }
    if trimmed == "sqlite::memory:" {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}?mode=rwc", absolute.display())
}

/// Creates the parent directory of a file-backed database.
fn prepare_sqlite_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse(argv).map_err(|e| {
        print_usage();
        e
    })?;

    init_tracing();
    prepare_sqlite_dir(&args.db_url)?;
    let app = AppServices::new_sqlite(&args.db_url, Clock::default(), args.pacing).await?;

    match args.command {
        Command::Chapters => list_chapters(&app).await,
        Command::Schools => list_schools(&app).await,
        Command::Brief { code } => brief(&app, &code).await,
        Command::Play {
            code,
            answers,
            credentials,
        } => play(&app, &code, &answers, credentials.as_ref()).await,
        Command::Leaderboard { limit } => leaderboard(&app, limit).await,
        Command::SignUp {
            credentials,
            full_name,
            school_id,
        } => {
            let profile = app
                .auth()
                .sign_up(SignUp {
                    email: credentials.email,
                    password: credentials.password,
                    full_name,
                    school_id,
                })
                .await?;
            println!("created {} <{}>", profile.full_name(), profile.email());
            Ok(())
        }
    }
}

async fn list_chapters(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let chapters = app.chapters().list_public_chapters().await?;
    if chapters.is_empty() {
        println!("no public chapters");
    }
    for chapter in chapters {
        println!(
            "{:<12} {:<8} {}",
            chapter.code(),
            chapter.difficulty().as_str(),
            chapter.name()
        );
    }
    Ok(())
}

async fn list_schools(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    for school in app.schools().list_schools().await? {
        println!(
            "{:>4}  {} ({})",
            school.id(),
            school.name(),
            school.region().unwrap_or("-")
        );
    }
    Ok(())
}

async fn brief(app: &AppServices, code: &str) -> Result<(), Box<dyn std::error::Error>> {
    let briefing = app.battles().briefing(code).await?;
    println!("{} [{}]", briefing.chapter.name(), briefing.chapter.code());
    if let Some(description) = briefing.chapter.description() {
        println!("{description}");
    }
    match &briefing.cheat_sheet {
        Some(sheet) => {
            println!("cheat sheet: {}", sheet.title().unwrap_or("untitled"));
            println!("  {}", sheet.image());
            println!("battle starts in {}s", briefing.countdown_secs);
        }
        None => println!("no cheat sheet, straight to battle"),
    }
    Ok(())
}

async fn play(
    app: &AppServices,
    code: &str,
    answers: &[usize],
    credentials: Option<&Credentials>,
) -> Result<(), Box<dyn std::error::Error>> {
    let player: Option<UserId> = match credentials {
        Some(c) => Some(app.auth().sign_in(&c.email, &c.password).await?.uid()),
        None => None,
    };

    let battles = app.battles();
    let mut run = battles.start(code).await?;
    for &option in answers {
        let Some(question) = run.current_question() else {
            break;
        };
        let text = question.text().to_owned();
        let answer = battles.answer(&mut run, option, player).await?;
        let verdict = if answer.submission.is_correct {
            "hit"
        } else {
            "miss"
        };
        println!(
            "{text} -> {verdict} (boss hp {:.2})",
            answer.submission.boss_hp_after
        );
        if answer.is_complete() {
            break;
        }
    }

    let outcome = run.outcome().ok_or(CommandError::NotEnoughAnswers {
        given: answers.len(),
    })?;
    println!(
        "{}: {}/{} correct ({:.0}%), score {} (bonus {})",
        outcome.state,
        outcome.correct_count,
        outcome.total_questions,
        outcome.accuracy * 100.0,
        outcome.final_score,
        outcome.overkill_bonus
    );
    Ok(())
}

async fn leaderboard(app: &AppServices, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("students");
    for row in app.leaderboard().students(limit).await? {
        println!(
            "{:>3}. {:<24} {:<24} {:>6} ({} battles)",
            row.rank, row.full_name, row.school_name, row.total_score, row.battles
        );
    }
    println!("schools");
    for row in app.leaderboard().schools(limit).await? {
        println!(
            "{:>3}. {:<32} {:>6} ({} students)",
            row.rank, row.name, row.total_score, row.students
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn parses_play_with_credentials() {
        let args = Args::parse(argv(&[
            "play",
            "sci-2024",
            "--answers",
            "1, 1,0,1",
            "--email",
            "alex@thunder.id",
            "--password",
            "lightning",
            "--db",
            "sqlite::memory:",
        ]))
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(
            args.command,
            Command::Play {
                code: "sci-2024".into(),
                answers: vec![1, 1, 0, 1],
                credentials: Some(Credentials {
                    email: "alex@thunder.id".into(),
                    password: "lightning".into(),
                }),
            }
        );
    }

    #[test]
    fn no_subcommand_lists_chapters() {
        let args = Args::parse(Vec::new()).unwrap();
        assert_eq!(args.command, Command::Chapters);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            Args::parse(argv(&["play", "SCI-2024", "--answers", "1,x"])),
            Err(ArgsError::InvalidAnswers { .. })
        ));
        assert!(matches!(
            Args::parse(argv(&["play", "SCI-2024"])),
            Err(ArgsError::MissingValue { flag: "--answers" })
        ));
        assert!(matches!(
            Args::parse(argv(&["brief"])),
            Err(ArgsError::MissingArgument { .. })
        ));
        assert!(matches!(
            Args::parse(argv(&["signup", "--email", "a@b.id"])),
            Err(ArgsError::MissingValue { flag: "--password" })
        ));
        assert!(matches!(
            Args::parse(argv(&["duel"])),
            Err(ArgsError::UnknownSubcommand(_))
        ));
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("data/arena.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/arena.sqlite3?mode=rwc"));
    }
}
