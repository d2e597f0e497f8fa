use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use subsync_core::config;
use subsync_core::search::{align, AlignmentReport};
use subsync_core::subtitle::srt::write_entry;
use subsync_core::{
    Entry, IndexedSubtitle, SrtFormat, SubtitleFile, SubtitleReader, SubtitleSearch,
    SubtitleWriter,
};
use tracing_subscriber::EnvFilter;

/// Exit code when the query matched nothing.
const EXIT_NO_MATCH: u8 = 1;
/// Exit code for any failure.
const EXIT_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "subsync", about = "Find and resynchronize subtitle lines across SRT files")]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the entry of an SRT file that best matches a line of text
    Search {
        /// Subtitle file to search
        #[arg(short, long, env = "SUBSYNC_FILE")]
        file: PathBuf,

        /// Text to look for
        query: String,

        /// Print up to N ranked candidates instead of the single best entry
        #[arg(long)]
        top: Option<usize>,

        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Match every entry of a subtitle file against a reference file
    Align {
        /// Path to subtitle file to synchronize
        #[arg(long)]
        input_file: PathBuf,

        /// Language of subtitle file to synchronize
        #[arg(long)]
        input_lang: Option<String>,

        /// Path to reference subtitle file
        #[arg(long)]
        ref_file: PathBuf,

        /// Language of reference subtitle file
        #[arg(long)]
        ref_lang: Option<String>,

        /// Minimum score for a pair to count as matched
        #[arg(long, default_value_t = config::DEFAULT_ALIGN_MIN_SCORE)]
        min_score: f32,

        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Move every timestamp by a fixed offset
    Shift {
        #[arg(long)]
        input_file: PathBuf,

        /// Offset in milliseconds (negative moves earlier)
        #[arg(long, allow_hyphen_values = true)]
        by_ms: i64,

        /// Output path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Multiply every timestamp by a factor
    Scale {
        #[arg(long)]
        input_file: PathBuf,

        /// Scale factor, e.g. 1.0427 for 23.976 → 25 fps
        #[arg(long)]
        factor: f64,

        /// Output path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_json);

    match run(args.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("subsync_core=info,subsync=info")
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(command: Command) -> CliResult<ExitCode> {
    match command {
        Command::Search {
            file,
            query,
            top,
            json,
        } => {
            let subtitle = load_subtitle(&file)?;
            let indexed = IndexedSubtitle::new(&subtitle)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            match top {
                Some(k) => {
                    let hits = indexed.search_top(&query, k)?;
                    let found = !hits.is_empty();
                    let ranked: Vec<RankedEntry> = hits
                        .iter()
                        .map(|h| RankedEntry {
                            entry: h.entry,
                            score: h.score,
                        })
                        .collect();
                    print_entries(&mut out, &ranked, json)?;
                    Ok(match_exit_code(found))
                }
                None => {
                    let hit = indexed.search_scored(&query)?;
                    let ranked: Vec<RankedEntry> = hit
                        .iter()
                        .map(|h| RankedEntry {
                            entry: h.entry,
                            score: h.score,
                        })
                        .collect();
                    print_entries(&mut out, &ranked, json)?;
                    Ok(match_exit_code(hit.is_some()))
                }
            }
        }
        Command::Align {
            input_file,
            input_lang,
            ref_file,
            ref_lang,
            min_score,
            json,
        } => {
            tracing::info!(
                input_lang = input_lang.as_deref().unwrap_or("unknown"),
                ref_lang = ref_lang.as_deref().unwrap_or("unknown"),
                "aligning subtitle files"
            );
            if input_lang.is_some() && input_lang != ref_lang {
                tracing::warn!("input and reference languages differ; translate the input first for useful matches");
            }
            let input = load_subtitle(&input_file)?;
            let reference = load_subtitle(&ref_file)?;
            let indexed = IndexedSubtitle::new(&reference)?;
            let report = align(&input, &indexed, min_score)?;
            let stdout = io::stdout();
            print_report(&mut stdout.lock(), &report, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Shift {
            input_file,
            by_ms,
            output,
        } => {
            let subtitle = load_subtitle(&input_file)?;
            write_subtitle(&subtitle.shifted(by_ms), output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Scale {
            input_file,
            factor,
            output,
        } => {
            let subtitle = load_subtitle(&input_file)?;
            write_subtitle(&subtitle.scaled(factor)?, output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn match_exit_code(found: bool) -> ExitCode {
    if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_NO_MATCH)
    }
}

fn load_subtitle(path: &Path) -> CliResult<SubtitleFile> {
    let file = File::open(path).map_err(|e| format!("cannot open '{}': {}", path.display(), e))?;
    let subtitle = SrtFormat
        .read(file)
        .map_err(|e| format!("cannot parse '{}': {}", path.display(), e))?;
    tracing::info!(path = %path.display(), entries = subtitle.len(), "loaded subtitle file");
    Ok(subtitle)
}

fn write_subtitle(subtitle: &SubtitleFile, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("cannot create '{}': {}", path.display(), e))?;
            SrtFormat.write(subtitle, file)?;
            tracing::info!(path = %path.display(), entries = subtitle.len(), "wrote subtitle file");
        }
        None => SrtFormat.write(subtitle, io::stdout().lock())?,
    }
    Ok(())
}

#[derive(Serialize)]
struct RankedEntry<'a> {
    #[serde(flatten)]
    entry: &'a Entry,
    score: f32,
}

fn print_entries<W: Write>(out: &mut W, ranked: &[RankedEntry], json: bool) -> CliResult<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, ranked)?;
        writeln!(out)?;
        return Ok(());
    }
    if ranked.is_empty() {
        writeln!(out, "no match")?;
        return Ok(());
    }
    for (i, r) in ranked.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write_entry(out, r.entry)?;
    }
    Ok(())
}

fn print_report<W: Write>(out: &mut W, report: &AlignmentReport, json: bool) -> CliResult<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        return Ok(());
    }
    for a in &report.alignments {
        match (a.reference, a.score, a.offset_ms) {
            (Some(r), Some(score), Some(offset)) => {
                writeln!(out, "{:>6} -> {:<6} {:>+9} ms  score {:.3}", a.input, r, offset, score)?
            }
            _ => writeln!(out, "{:>6} -> -", a.input)?,
        }
    }
    writeln!(
        out,
        "matched {} of {}",
        report.matched,
        report.matched + report.unmatched
    )?;
    match report.median_offset_ms {
        Some(offset) => writeln!(out, "median offset: {:+} ms", offset)?,
        None => writeln!(out, "median offset: n/a")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::time::Duration;
    use subsync_core::EntryId;
    use tempfile::TempDir;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello there\n\n2\n00:00:03,000 --> 00:00:04,500\nGeneral Kenobi\n";

    fn write_sample(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("sample.srt");
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_shift_negative_offset() {
        let args = Args::try_parse_from([
            "subsync", "shift", "--input-file", "in.srt", "--by-ms", "-2500",
        ])
        .unwrap();
        match args.command {
            Command::Shift { by_ms, output, .. } => {
                assert_eq!(by_ms, -2500);
                assert!(output.is_none());
            }
            _ => panic!("expected shift"),
        }
    }

    #[test]
    fn test_parse_align_defaults() {
        let args = Args::try_parse_from([
            "subsync", "align", "--input-file", "a.srt", "--ref-file", "b.srt",
        ])
        .unwrap();
        match args.command {
            Command::Align { min_score, json, input_lang, .. } => {
                assert_eq!(min_score, config::DEFAULT_ALIGN_MIN_SCORE);
                assert!(!json);
                assert!(input_lang.is_none());
            }
            _ => panic!("expected align"),
        }
    }

    #[test]
    fn test_load_subtitle() {
        let dir = TempDir::new().unwrap();
        let sub = load_subtitle(&write_sample(&dir)).unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.entries[1].end, Duration::from_millis(4500));
    }

    #[test]
    fn test_load_subtitle_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_subtitle(&dir.path().join("nope.srt")).unwrap_err();
        assert!(err.to_string().contains("cannot open"));
    }

    #[test]
    fn test_shift_writes_file() {
        let dir = TempDir::new().unwrap();
        let input = write_sample(&dir);
        let output = dir.path().join("out.srt");
        run(Command::Shift {
            input_file: input,
            by_ms: 1500,
            output: Some(output.clone()),
        })
        .unwrap();
        let shifted = load_subtitle(&output).unwrap();
        assert_eq!(shifted.entries[0].start, Duration::from_millis(2500));
        assert_eq!(shifted.entries[1].end, Duration::from_millis(6000));
    }

    #[test]
    fn test_scale_rejects_negative_factor() {
        let dir = TempDir::new().unwrap();
        let input = write_sample(&dir);
        let result = run(Command::Scale {
            input_file: input,
            factor: -2.0,
            output: Some(dir.path().join("out.srt")),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_print_entries_text_and_json() {
        let dir = TempDir::new().unwrap();
        let sub = load_subtitle(&write_sample(&dir)).unwrap();
        let ranked = vec![RankedEntry {
            entry: &sub.entries[1],
            score: 1.25,
        }];

        let mut text = Vec::new();
        print_entries(&mut text, &ranked, false).unwrap();
        assert_eq!(
            String::from_utf8(text).unwrap(),
            "2\n00:00:03,000 --> 00:00:04,500\nGeneral Kenobi\n"
        );

        let mut json = Vec::new();
        print_entries(&mut json, &ranked, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value[0]["id"], 2);
        assert_eq!(value[0]["start"], 3000);
        assert_eq!(value[0]["score"], 1.25);

        let mut none = Vec::new();
        print_entries(&mut none, &[], false).unwrap();
        assert_eq!(String::from_utf8(none).unwrap(), "no match\n");
    }

    #[test]
    fn test_print_report_summary() {
        let dir = TempDir::new().unwrap();
        let reference = load_subtitle(&write_sample(&dir)).unwrap();
        let input = reference.shifted(-700);
        let indexed = IndexedSubtitle::new(&reference).unwrap();
        let report = align(&input, &indexed, 0.0).unwrap();
        assert_eq!(report.alignments[0].reference, Some(EntryId(1)));

        let mut out = Vec::new();
        print_report(&mut out, &report, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("matched 2 of 2"));
        assert!(text.contains("median offset: +700 ms"));
    }
}
