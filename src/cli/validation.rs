use crate::cli::args::CliArgs;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --format '{raw}', expected text, json, html or page"
            ));
        }
    }
    if let Some(ms) = args.debounce {
        if ms == 0 {
            return Err("invalid --debounce, expected a positive number of milliseconds".to_string());
        }
    }
    if args.interactive && args.output.is_some() {
        return Err("--interactive writes to stdout and cannot be combined with --output".to_string());
    }
    if let Some(region) = args.region.as_deref() {
        if region.trim().is_empty() {
            return Err("invalid --region, expected a region id".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn rejects_unknown_format() {
        let args = CliArgs::parse_from(["pricelist", "-f", "xml"]);
        assert!(validate(&args).unwrap_err().contains("--format"));
    }

    #[test]
    fn rejects_interactive_with_output_file() {
        let args = CliArgs::parse_from(["pricelist", "-i", "-o", "out.html"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn accepts_plain_query() {
        let args = CliArgs::parse_from(["pricelist", "-q", "a.b", "--format", "json", "--debounce", "250"]);
        assert!(validate(&args).is_ok());
    }
}
