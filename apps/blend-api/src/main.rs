use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = blend_api::Args::parse();
	blend_api::run(args).await
}
