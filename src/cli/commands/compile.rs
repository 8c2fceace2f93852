//! Compile command - minify one script through the compile service

use crate::cli::args::CompileArgs;
use crate::compiler::{ClosureCompiler, Compile};
use crate::config::Config;
use crate::error::{RelayError, RelayResult};
use crate::source::SourceLocator;
use tracing::info;

/// Execute the compile command
pub async fn execute(args: CompileArgs, config: &Config) -> RelayResult<()> {
    let locator = SourceLocator::from_config(&config.upstream);
    let source_url = locator
        .resolve(&args.path)
        .ok_or_else(|| RelayError::ScriptPath(args.path.clone()))?;

    info!("Compiling {}", source_url);
    let compiler = ClosureCompiler::new(config.compiler.clone());
    let code = compiler.compile(&source_url).await?;

    println!("{}", code);
    Ok(())
}
