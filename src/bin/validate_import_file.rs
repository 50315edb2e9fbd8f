// Offline checker for import files: parses, resolves the header and validates every row
// without opening any database.
//
// Usage:
//   cargo run --bin validate_import_file -- <file> [--stage <stage>] [--max-errors <n>]
//
// Prints the report (or the error code and details) as JSON. Exit code 1 when the file would
// be rejected as a whole.

use anyhow::{bail, Context};
use material_tracker::api::ApiError;
use material_tracker::config::ImportLimits;
use material_tracker::domain::types::FileKind;
use material_tracker::importer::{ImportOptions, ImportPipeline, UniversalFileParser};
use material_tracker::logging;
use serde_json::json;
use std::path::PathBuf;

struct Args {
    path: PathBuf,
    stage: Option<String>,
    max_errors: usize,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut path = None;
    let mut stage = None;
    let mut max_errors = ImportLimits::default().max_reported_errors;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stage" => stage = Some(args.next().context("--stage 需要参数")?),
            "--max-errors" => {
                let raw = args.next().context("--max-errors 需要参数")?;
                max_errors = raw
                    .parse()
                    .with_context(|| format!("--max-errors 不是合法数字: {}", raw))?;
            }
            other if other.starts_with("--") => bail!("未知参数: {}", other),
            other => path = Some(PathBuf::from(other)),
        }
    }

    let path = path.context("Usage: validate_import_file <file> [--stage <stage>] [--max-errors <n>]")?;
    Ok(Args {
        path,
        stage,
        max_errors,
    })
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = parse_args()?;

    let file_name = args
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let kind = FileKind::from_file_name(&file_name)
        .with_context(|| format!("不支持的文件类型: {} (xlsx, xls, csv)", file_name))?;
    let bytes = std::fs::read(&args.path).with_context(|| format!("无法读取文件: {}", args.path.display()))?;

    tracing::info!(file = %args.path.display(), size = bytes.len(), ?kind, "开始离线校验");

    let options = ImportOptions {
        stage: args.stage,
        replace_mode: false,
    };
    let outcome = UniversalFileParser
        .parse(&bytes, kind)
        .and_then(|table| ImportPipeline::default().preview(&table, &options, args.max_errors));

    match outcome {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => {
            let err = ApiError::from(err);
            let body = json!({
                "code": err.code(),
                "message": err.to_string(),
                "details": err.details(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            std::process::exit(1);
        }
    }
}
