use std::fmt;

use arena_core::model::{AccessCode, AccessLevel, ChapterDraft, Difficulty, QuestionDraft};
use chrono::{DateTime, Utc};
use storage::repository::{NewSchoolRecord, Storage};

const DEFAULT_DB_URL: &str = "sqlite://arena.sqlite3?mode=rwc";
const DEFAULT_CHAPTER_CODE: &str = "SCI-2024";

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    chapter_code: String,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ARENA_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into());
        let mut chapter_code =
            std::env::var("ARENA_CHAPTER_CODE").unwrap_or_else(|_| DEFAULT_CHAPTER_CODE.into());
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--code" => {
                    chapter_code = require_value(&mut args, "--code")?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            chapter_code,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --code <access_code>      Demo chapter code (default: {DEFAULT_CHAPTER_CODE})");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  ARENA_DB_URL, ARENA_CHAPTER_CODE");
}

fn sample_questions() -> [(&'static str, [&'static str; 4], usize); 4] {
    [
        (
            "What is the powerhouse of the cell?",
            ["Nucleus", "Mitochondria", "Ribosome", "Endoplasmic Reticulum"],
            1,
        ),
        (
            "Which planet is known as the Red Planet?",
            ["Venus", "Mars", "Jupiter", "Saturn"],
            1,
        ),
        (
            "What is the chemical symbol for Gold?",
            ["Au", "Ag", "Fe", "Cu"],
            0,
        ),
        (
            "Who wrote 'Romeo and Juliet'?",
            [
                "Charles Dickens",
                "William Shakespeare",
                "Mark Twain",
                "Jane Austen",
            ],
            1,
        ),
    ]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);
    let code = AccessCode::parse(&args.chapter_code)?;

    if storage.chapters.get_chapter_by_code(&code).await?.is_some() {
        println!("Chapter {code} already present in {}; nothing to do", args.db_url);
        return Ok(());
    }

    let mut draft = ChapterDraft::named("General Science");
    draft.description = Some("Warm-up battle covering biology, space, chemistry and literature".into());
    draft.difficulty = Difficulty::Easy;
    draft.access_level = AccessLevel::Public;
    let chapter = storage
        .chapters
        .insert_new_chapter(draft.validate(code, now)?)
        .await?;

    let samples = sample_questions();
    for (text, options, correct) in samples {
        let question = QuestionDraft::new(
            chapter.id(),
            text,
            options.iter().map(|o| (*o).to_owned()).collect(),
            correct,
        )
        .validate()?;
        storage.questions.insert_new_question(question).await?;
    }

    let school = storage
        .schools
        .insert_new_school(NewSchoolRecord {
            name: "SMK Telkom Malang".into(),
            region: Some("Jawa Timur".into()),
        })
        .await?;

    println!(
        "Seeded chapter {} ({}) with {} questions and school {} into {}",
        chapter.id().value(),
        chapter.code(),
        samples.len(),
        school.name(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
