//! Explain command implementation.
//!
//! Shows the token stream, parse tree and diagnostics for a query without
//! touching any task file.

use taskql::query::{tokenize, QueryEngine};

use super::config::{load_config, Config};
use super::{CommandContext, Result};
use crate::output::{format_explain_json, format_explain_text, ExplainReport};

/// Options for the explain command.
#[derive(Debug)]
pub struct ExplainOptions<'a> {
    /// Query text, or a saved query name when `saved` is set.
    pub query: &'a str,
    /// Look the query up in the config's saved queries.
    pub saved: bool,
    /// Include the token stream.
    pub tokens: bool,
}

/// Executes the explain command.
pub fn execute(ctx: &CommandContext, opts: &ExplainOptions<'_>) -> Result<()> {
    let config = load_config()?;
    let output = render(opts, &config, ctx.json_output, ctx.use_colors)?;

    if ctx.json_output {
        println!("{output}");
    } else if !ctx.quiet {
        print!("{output}");
    }

    Ok(())
}

fn render(opts: &ExplainOptions<'_>, config: &Config, json: bool, use_colors: bool) -> Result<String> {
    let text = config.resolve_query(opts.query, opts.saved)?;
    let engine = QueryEngine::new(config.vocabulary());
    let outcome = engine.parse_with_diagnostics(text);
    let tokens = opts.tokens.then(|| tokenize(text));

    let report = ExplainReport::new(text, &outcome.query, tokens.as_deref(), &outcome.diagnostics);

    if json {
        Ok(format_explain_json(&report)?)
    } else {
        Ok(format_explain_text(&report, use_colors && config.color_enabled()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(query: &str) -> ExplainOptions<'_> {
        ExplainOptions {
            query,
            saved: false,
            tokens: false,
        }
    }

    #[test]
    fn test_explain_text() {
        let text = render(&opts("is not blocked sort by due desc"), &Config::default(), false, false)
            .unwrap();
        assert!(text.contains("Normalized: is not blocked sort by due desc\n"));
        assert!(text.contains("  is not blocked\n"));
        assert!(text.contains("Sort: due desc\n"));
    }

    #[test]
    fn test_explain_reports_unknown_field_with_suggestion() {
        let text = render(&opts("stauts is done"), &Config::default(), false, false).unwrap();
        assert!(text.contains("Diagnostics:"));
        assert!(text.contains("did you mean 'status'?"));
    }

    #[test]
    fn test_explain_json_with_tokens() {
        let mut options = opts("tag includes #work");
        options.tokens = true;
        let json = render(&options, &Config::default(), true, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["input"], "tag includes #work");
        assert_eq!(value["tokens"].as_array().unwrap().len(), 3);
        assert_eq!(value["tokens"][2]["kind"], "TagLiteral");
        assert!(value["diagnostics"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_explain_saved_query() {
        let mut config = Config::default();
        config
            .queries
            .insert("next".to_string(), "todo sort by priority".to_string());

        let mut options = opts("next");
        options.saved = true;
        let text = render(&options, &config, false, false).unwrap();
        assert!(text.starts_with("Query: todo sort by priority\n"));
    }
}
