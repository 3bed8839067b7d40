use kserving::apis::{default_object, DefaultingContext};
use kserving::config::Defaults;
use serde_json::Value;
use std::io::{self, BufWriter, Write};
use tracing::{info, warn};

/// Check if upgrade via defaulting is enabled via env var
fn is_upgrade_via_defaulting_enabled() -> bool {
    std::env::var("KSERVING_UPGRADE_VIA_DEFAULTING")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Build the defaulting context from the environment
pub fn build_context(defaults: Defaults, upgrade: bool) -> DefaultingContext {
    let ctx = DefaultingContext::new(defaults);
    if upgrade {
        ctx.with_upgrade_via_defaulting()
    } else {
        ctx
    }
}

/// Default every object in `input`, writing one JSON document per line
///
/// Returns the number of objects that could not be defaulted. An object that
/// decodes as JSON but fails defaulting is logged and skipped; malformed JSON
/// ends the stream with an error, since the reader cannot resynchronize.
/// Objects already written stay in `output`.
pub fn run<R: io::Read, W: Write>(
    input: R,
    output: &mut W,
    ctx: &DefaultingContext,
) -> anyhow::Result<usize> {
    let mut failed = 0;

    for (index, item) in serde_json::Deserializer::from_reader(input)
        .into_iter::<Value>()
        .enumerate()
    {
        let obj = item?;
        match default_object(obj, ctx) {
            Ok(defaulted) => {
                serde_json::to_writer(&mut *output, &defaulted)?;
                writeln!(output)?;
            }
            Err(e) => {
                warn!(index, error = %e, "Skipping object");
                failed += 1;
            }
        }
    }

    output.flush()?;
    Ok(failed)
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout carries the defaulted objects
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let defaults = Defaults::from_env()?;
    let upgrade = is_upgrade_via_defaulting_enabled();
    info!(
        upgrade_via_defaulting = upgrade,
        revision_timeout_seconds = defaults.revision_timeout_seconds,
        container_concurrency = defaults.container_concurrency,
        "Defaulting Configuration objects from stdin"
    );

    let ctx = build_context(defaults, upgrade);
    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());
    let failed = run(io::stdin().lock(), &mut output, &ctx)?;

    if failed > 0 {
        return Err(anyhow::anyhow!("{} object(s) could not be defaulted", failed));
    }

    info!("All objects defaulted");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
