//! Generate command implementation.

use crate::cli::{GenerateArgs, PresetArg};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use cardsmith_domain::traits::FlashcardStore;
use cardsmith_extractor::{Extractor, ExtractorConfig, FileTextSource};
use cardsmith_llm::{ModelKey, ModelRegistry, OllamaProvider, UnicodeSentenceSegmenter};
use cardsmith_store::JsonStore;
use std::convert::Infallible;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Execute the generate command.
pub async fn execute_generate(
    args: GenerateArgs,
    config: &Config,
    store_path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    let pipeline = pipeline_config(&args, &config.pipeline)?;
    let endpoint = args.endpoint.clone().unwrap_or_else(|| config.models.endpoint.clone());
    let model = args.model.clone().unwrap_or_else(|| config.models.generator.clone());
    let timeout = Duration::from_secs(config.models.request_timeout_secs);

    let registry = ModelRegistry::new();
    let llm = registry.acquire(&ModelKey::generator(format!("{}@{}", model, endpoint)), || {
        connect(&endpoint, &model, timeout)
    })?;
    let detector = registry.acquire(&ModelKey::sentence("unicode"), || {
        Ok::<_, Infallible>(UnicodeSentenceSegmenter::new())
    })?;
    info!("Using model '{}' at {}", model, endpoint);

    let store = if args.dry_run {
        JsonStore::in_memory()
    } else {
        JsonStore::open(store_path)?
    };
    let extractor: Extractor<OllamaProvider, JsonStore, Arc<UnicodeSentenceSegmenter>> =
        Extractor::from_parts(llm, Arc::new(Mutex::new(store)), detector, pipeline);

    let source = args.file.to_string_lossy();
    let report = extractor
        .extract_from_source(&FileTextSource::new(), &source)
        .await?;

    println!("{}", formatter.format_report(&report)?);

    if args.dry_run {
        let store = extractor.store();
        let store = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        println!("{}", formatter.format_flashcards(store.flashcards())?);
        if formatter.is_verbose() {
            println!("{}", formatter.info("Dry run: nothing was written"));
        }
    }

    registry.release_all();
    Ok(())
}

/// Pipeline settings after applying the preset and command-line overrides.
///
/// A preset replaces the `[pipeline]` section of the configuration file.
fn pipeline_config(args: &GenerateArgs, base: &ExtractorConfig) -> Result<ExtractorConfig> {
    let mut pipeline = match args.preset {
        Some(PresetArg::Fast) => ExtractorConfig::fast(),
        Some(PresetArg::Thorough) => ExtractorConfig::thorough(),
        None => base.clone(),
    };
    if let Some(questions) = args.questions {
        pipeline.questions_per_chunk = questions;
    }
    if let Some(concurrency) = args.concurrency {
        pipeline.max_concurrent_chunks = concurrency;
    }
    if args.no_summary {
        pipeline.generate_summaries = false;
    }

    pipeline.validate().map_err(CliError::InvalidInput)?;
    Ok(pipeline)
}

fn connect(endpoint: &str, model: &str, timeout: Duration) -> std::result::Result<OllamaProvider, String> {
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(format!("endpoint must be an http(s) URL, got '{}'", endpoint));
    }
    if model.trim().is_empty() {
        return Err("model name is empty".to_string());
    }
    Ok(OllamaProvider::with_timeout(endpoint, model, timeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn generate_args(extra: &[&str]) -> GenerateArgs {
        let mut argv = vec!["cardsmith", "generate", "notes.txt"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Generate(args) => args,
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_overrides_apply_on_top_of_file_config() {
        let base = ExtractorConfig {
            target_chunk_words: 150,
            ..ExtractorConfig::default()
        };
        let pipeline = pipeline_config(&generate_args(&["-n", "6", "-j", "2", "--no-summary"]), &base).unwrap();

        assert_eq!(pipeline.target_chunk_words, 150);
        assert_eq!(pipeline.questions_per_chunk, 6);
        assert_eq!(pipeline.max_concurrent_chunks, 2);
        assert!(!pipeline.generate_summaries);
    }

    #[test]
    fn test_preset_replaces_file_config() {
        let base = ExtractorConfig {
            target_chunk_words: 150,
            ..ExtractorConfig::default()
        };
        let pipeline = pipeline_config(&generate_args(&["--preset", "thorough"]), &base).unwrap();
        assert_eq!(pipeline, ExtractorConfig::thorough());
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let result = pipeline_config(&generate_args(&["-n", "0"]), &ExtractorConfig::default());
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_connect_validates_endpoint() {
        let timeout = Duration::from_secs(5);
        assert!(connect("localhost:11434", "llama3", timeout).is_err());
        assert!(connect("http://localhost:11434", " ", timeout).is_err());
        let provider = connect("http://localhost:11434/", "llama3", timeout).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:11434");
    }

    #[test]
    fn test_bad_endpoint_surfaces_as_model_error() {
        let registry = ModelRegistry::new();
        let key = ModelKey::generator("llama3@ftp://example");
        let result = registry.acquire(&key, || connect("ftp://example", "llama3", Duration::from_secs(1)));
        let err: CliError = result.unwrap_err().into();
        assert!(matches!(err, CliError::Model(_)));
        assert!(err.to_string().contains("http(s) URL"));
    }
}
