fn main() -> anyhow::Result<()> {
    rslkit::cli::run_cli()
}
