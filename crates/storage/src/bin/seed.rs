use std::fmt;
use std::path::PathBuf;

use exam_core::model::{Assessment, CorrectAnswer, Question, QuestionOption, Section, SectionKey};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    file: Option<PathBuf>,
    id: Option<String>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidId { raw } => write!(f, "invalid --id value: {raw:?}"),
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
        let mut db_url =
            std::env::var("EXAM_DB_URL").unwrap_or_else(|_| "sqlite:exam.sqlite3?mode=rwc".into());
        let mut file = std::env::var("EXAM_ASSESSMENT_FILE").ok().map(PathBuf::from);
        let mut id = None;

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
                "--file" => {
                    file = Some(PathBuf::from(require_value(&mut args, "--file")?));
                }
                "--id" => {
                    let value = require_value(&mut args, "--id")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidId { raw: value });
                    }
                    id = Some(value);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, file, id })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:exam.sqlite3?mode=rwc)");
    eprintln!("  --file <path>             Assessment JSON document (default: built-in mock)");
    eprintln!("  --id <assessment_id>      Override the document's id");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  EXAM_DB_URL, EXAM_ASSESSMENT_FILE");
}

fn sample_assessment() -> Assessment {
    let aptitude = Section {
        title: "General Aptitude".into(),
        description: "Verbal and quantitative aptitude".into(),
        questions: vec![
            Question::multiple_choice(
                "ga-1",
                "Choose the word closest in meaning to 'candid'.",
                vec![
                    QuestionOption::new("A", "frank"),
                    QuestionOption::new("B", "secretive"),
                    QuestionOption::new("C", "careless"),
                    QuestionOption::new("D", "bright"),
                ],
                Some(CorrectAnswer::new("A")),
            )
            .with_topic("Verbal Aptitude - Vocabulary"),
            Question::numerical(
                "ga-2",
                "A train covers 180 km in 2.5 hours. Its average speed in km/h is:",
                Some(CorrectAnswer::new("72")),
            )
            .with_topic("Quantitative Aptitude - Speed"),
        ],
        time_limit: None,
    };
    let core = Section {
        title: "Computer Science".into(),
        description: String::new(),
        questions: vec![
            Question::numerical(
                "cs-1",
                "Number of edges in a complete graph on 6 vertices:",
                Some(CorrectAnswer::new("15")),
            )
            .with_topic("Discrete Mathematics - Graphs"),
            Question::multiple_choice(
                "cs-2",
                "Worst-case time of binary search on n sorted elements:",
                vec![
                    QuestionOption::new("A", "O(1)"),
                    QuestionOption::new("B", "O(log n)"),
                    QuestionOption::new("C", "O(n)"),
                    QuestionOption::new("D", "O(n log n)"),
                ],
                Some(CorrectAnswer::new("B")),
            )
            .with_topic("Algorithms - Searching"),
        ],
        time_limit: None,
    };
    Assessment::new("gate-cs-mock", "GATE CS Mock Test")
        .with_section(SectionKey::Aptitude, aptitude)
        .with_section(SectionKey::Core, core)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut assessment = match &args.file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str::<Assessment>(&raw)?
        }
        None => sample_assessment(),
    };
    if let Some(id) = args.id {
        assessment.id = id;
    }

    let storage = Storage::sqlite(&args.db_url).await?;
    storage.assessments.upsert_assessment(&assessment).await?;

    let layout = assessment.layout();
    println!(
        "Seeded assessment {} ({} questions in {} sections) into {}",
        assessment.id,
        layout.len(),
        layout.spans().len(),
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
