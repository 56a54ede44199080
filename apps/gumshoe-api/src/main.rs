use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = gumshoe_api::Args::parse();
	gumshoe_api::run(args).await
}
