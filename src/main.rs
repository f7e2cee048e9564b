use crate::generator::workflow::{launch, next_steps};
use anyhow::{Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod generator;
mod llm;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let researcher = args.researcher()?;
    let topic = args.topic.clone();
    let config = args.into_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level())),
        )
        .with_target(false)
        .init();

    let topic = match topic {
        Some(topic) => topic,
        None if researcher.interactive => {
            println!("\n🎓 Welcome to Research Co-Pilot!");
            println!("I'll help you brainstorm and draft a research paper step by step.");
            inquire::Text::new("🔍 Enter your broad research topic:").prompt()?
        }
        None => bail!("❌ No topic provided"),
    };

    let report = launch(&config, &topic, &researcher).await?;

    println!("\n🎉 Research Co-Pilot workflow completed!");
    println!("📄 Final paper: {}", report.source.display());
    if report.artifact() != report.source.as_path() {
        println!("📄 PDF version: {}", report.artifact().display());
    }
    println!("\n💡 Next steps:");
    for (i, step) in next_steps(&report).iter().enumerate() {
        println!("{}. {}", i + 1, step);
    }

    Ok(())
}
