use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = excerpt::cli::Cli::parse();
    excerpt::init(cli.verbose);
    cli.run()
}
