//! Font family resolution command.

use clap::Args;
use tessera::config::RenderConfig;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct FontArgs {
    /// Font family lists, each as a CSS value (e.g., "Foo, serif")
    #[arg(required_unless_present = "list")]
    families: Vec<String>,

    /// Register families found on this system before resolving
    #[arg(long)]
    system_fonts: bool,

    /// Print the whole mapping table instead of resolving
    #[arg(long)]
    list: bool,
}

pub fn run(args: FontArgs, config: &RenderConfig) -> Result<(), CliError> {
    let mut map = config.font_map();
    if args.system_fonts {
        map = map.with_system_fonts();
    }

    if args.list {
        for (name, family) in map.iter() {
            println!("{:<24} {}", name, family);
        }
        println!("{:<24} {}", "(fallback)", map.fallback());
        return Ok(());
    }

    for value in &args.families {
        println!("{} -> {}", value, map.resolve_css(value));
    }
    Ok(())
}
